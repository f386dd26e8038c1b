//! Command-line front end for the moldable task scheduler.
//!
//! `heft` builds a schedule greedily from an instance alone; `approx`
//! packs an externally computed task classification with a makespan
//! guarantee; `generate` drives an external script to produce a grid of
//! random problem instances.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use anyhow::{ensure, Context};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mold_sched::io;
use mold_sched::models::Schedule;
use mold_sched::priority::PolicyKind;
use mold_sched::scheduler::{backfill, eft, EftConfig};

/// mold-sched - static scheduling of moldable tasks on CPUs and GPUs
#[derive(Parser, Debug)]
#[command(name = "mold-sched")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a schedule with the greedy earliest-finish-time heuristic
    Heft {
        /// Instance file with task profiles
        #[arg(short, long)]
        input: PathBuf,

        /// Priority policy (lpt, spt, ratio)
        #[arg(short, long)]
        priority: Option<String>,

        /// Restrict CPU tasks to a single core
        #[arg(short, long)]
        sequential: bool,

        /// Write the schedule as a semicolon-separated table
        #[arg(short, long)]
        csv: Option<PathBuf>,

        /// Write the schedule as a JSON rect dump
        #[arg(short = 'j', long)]
        rects: Option<PathBuf>,
    },

    /// Pack a solver classification with the 3/2-approximation strategy
    Approx {
        /// Instance file with task profiles
        #[arg(short, long)]
        input: PathBuf,

        /// Load bound the solution was computed for
        #[arg(short, long)]
        lambda: f64,

        /// Solver solution file with per-task class labels
        #[arg(short, long)]
        solution: PathBuf,

        /// Write the schedule as a semicolon-separated table
        #[arg(short, long)]
        csv: Option<PathBuf>,

        /// Write the schedule as a JSON rect dump
        #[arg(short = 'j', long)]
        rects: Option<PathBuf>,
    },

    /// Generate a grid of random problem instances
    Generate {
        /// Directory for problem files
        #[arg(short, long)]
        outdir: PathBuf,

        /// Instance generator script invoked once per problem
        #[arg(short, long)]
        generator: PathBuf,

        /// Compress generated files with bzip2
        #[arg(long)]
        compress: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report lines.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Heft {
            input,
            priority,
            sequential,
            csv,
            rects,
        } => run_heft(input, priority, sequential, csv, rects),
        Commands::Approx {
            input,
            lambda,
            solution,
            csv,
            rects,
        } => run_approx(input, lambda, solution, csv, rects),
        Commands::Generate {
            outdir,
            generator,
            compress,
        } => run_generate(outdir, generator, compress),
    }
}

fn run_heft(
    input: PathBuf,
    priority: Option<String>,
    sequential: bool,
    csv: Option<PathBuf>,
    rects: Option<PathBuf>,
) -> anyhow::Result<()> {
    let policy: PolicyKind = priority
        .as_deref()
        .map(str::parse)
        .transpose()?
        .unwrap_or_default();

    let instance = io::load_instance(&input)
        .with_context(|| format!("failed to load instance {}", input.display()))?;

    let config = EftConfig {
        policy,
        sequential_only: sequential,
    };
    let started = Instant::now();
    let schedule = eft::build_schedule(&instance, &config)?;
    let elapsed = started.elapsed();

    write_outputs(&schedule, csv.as_deref(), rects.as_deref())?;

    println!("total_solve_time: {:.6}", elapsed.as_secs_f64());
    println!("prio: {policy}");
    println!("seq_only: {}", u8::from(sequential));
    println!("makespan: {}", schedule.makespan());
    Ok(())
}

fn run_approx(
    input: PathBuf,
    lambda: f64,
    solution: PathBuf,
    csv: Option<PathBuf>,
    rects: Option<PathBuf>,
) -> anyhow::Result<()> {
    let instance = io::load_instance(&input)
        .with_context(|| format!("failed to load instance {}", input.display()))?;
    let classification = io::load_solution(&instance, &solution)
        .with_context(|| format!("failed to load solution {}", solution.display()))?;

    let started = Instant::now();
    let schedule = backfill::build_schedule(&instance, &classification, lambda)?;
    let elapsed = started.elapsed();

    write_outputs(&schedule, csv.as_deref(), rects.as_deref())?;

    println!("total_solve_time: {:.6}", elapsed.as_secs_f64());
    for violation in &schedule.violations {
        println!("ATTENTION ! {}", violation.message);
    }
    println!("bound: {}", 3.0 / 2.0 * lambda);
    println!("makespan: {}", schedule.makespan());
    Ok(())
}

fn write_outputs(
    schedule: &Schedule,
    csv: Option<&Path>,
    rects: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = csv {
        io::write_csv(schedule, path)
            .with_context(|| format!("failed to write schedule table {}", path.display()))?;
    }
    if let Some(path) = rects {
        io::write_rects(schedule, path)
            .with_context(|| format!("failed to write schedule rects {}", path.display()))?;
    }
    Ok(())
}

/// Problem grid: task count with the core and GPU ranges that make
/// sense for it (n, min_m, max_m, max_k).
const SIZE_GRID: [(usize, usize, usize, usize); 3] = [
    (10, 4, 16, 1),
    (100, 4, 64, 4),
    (1000, 16, 512, 32),
];

const CORE_COUNTS: [usize; 5] = [4, 16, 64, 256, 512];
const GPU_COUNTS: [usize; 6] = [1, 2, 4, 8, 16, 32];
const INSTANCES_PER_POINT: usize = 5;

fn run_generate(outdir: PathBuf, generator: PathBuf, compress: bool) -> anyhow::Result<()> {
    ensure!(
        outdir.is_dir(),
        "outdir {} is not a directory",
        outdir.display()
    );

    for (n, min_m, max_m, max_k) in SIZE_GRID {
        for m in CORE_COUNTS {
            if m < min_m || m > max_m {
                continue;
            }
            for k in GPU_COUNTS {
                if k > max_k {
                    continue;
                }
                for i in 0..INSTANCES_PER_POINT {
                    let outpath = outdir.join(format!("problem_n{n}_m{m}_k{k}_i{i}.in"));
                    println!(
                        "Rscript {} -n {n} -m {m} -k {k} -o {} -s {i}",
                        generator.display(),
                        outpath.display()
                    );
                    let status = Command::new("Rscript")
                        .arg(&generator)
                        .args(["-n", &n.to_string()])
                        .args(["-m", &m.to_string()])
                        .args(["-k", &k.to_string()])
                        .arg("-o")
                        .arg(&outpath)
                        .args(["-s", &i.to_string()])
                        .status()
                        .context("failed to run Rscript")?;
                    ensure!(status.success(), "generator failed for {}", outpath.display());

                    if compress {
                        let status = Command::new("bzip2")
                            .arg(&outpath)
                            .status()
                            .context("failed to run bzip2")?;
                        ensure!(status.success(), "bzip2 failed for {}", outpath.display());
                    }
                }
            }
        }
    }
    Ok(())
}
