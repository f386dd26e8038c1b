//! Instance, solution, and schedule serialization.
//!
//! Instances and solver solutions arrive as YAML documents whose task
//! entries are keyed `t1..tn`. Finished schedules leave either as a
//! semicolon-separated table with one row per contiguous resource block
//! or as a JSON dump of the whole aggregate for external renderers.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{SchedError, SchedResult};
use crate::models::{Instance, Schedule, Task};
use crate::scheduler::Classification;
use crate::validation::{validate_instance, validate_solution, ValidationResult};

const CSV_HEADER: &str = "name;type;setid;sres;nres;stime;etime";

#[derive(Debug, Deserialize)]
struct RawInstance {
    meta: RawMeta,
    cpudata: HashMap<String, Vec<f64>>,
    gpudata: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    n: usize,
    m: usize,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct RawSolution {
    work: f64,
    task_hash: HashMap<String, String>,
}

/// Parses and validates an instance from YAML text.
///
/// The document must provide a `cpudata` and a `gpudata` entry for every
/// task key `t1` through `t<n>`.
pub fn instance_from_str(text: &str) -> SchedResult<Instance> {
    let raw: RawInstance = serde_yaml::from_str(text)?;

    let mut tasks = Vec::with_capacity(raw.meta.n);
    for id in 1..=raw.meta.n as u32 {
        let key = task_key(id);
        let profile = raw.cpudata.get(&key).cloned().ok_or_else(|| {
            SchedError::InvalidInput(format!(
                "instance declares {} tasks but cpudata has no entry for {key:?}",
                raw.meta.n
            ))
        })?;
        let gpu_duration = raw.gpudata.get(&key).copied().ok_or_else(|| {
            SchedError::InvalidInput(format!(
                "instance declares {} tasks but gpudata has no entry for {key:?}",
                raw.meta.n
            ))
        })?;
        tasks.push(Task::new(id, profile, gpu_duration));
    }

    let instance = Instance::new(raw.meta.m, raw.meta.k, tasks);
    ensure_valid(validate_instance(&instance))?;
    Ok(instance)
}

/// Loads an instance from a YAML file.
pub fn load_instance(path: impl AsRef<Path>) -> SchedResult<Instance> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading instance");
    let text = fs::read_to_string(path)?;
    instance_from_str(&text)
}

/// Parses and validates a solver solution from YAML text.
///
/// The document carries the declared total `work` and a `task_hash`
/// mapping task keys to class labels, the literal strings `"1"`
/// through `"7"`.
pub fn solution_from_str(instance: &Instance, text: &str) -> SchedResult<Classification> {
    let raw: RawSolution = serde_yaml::from_str(text)?;

    let mut labels = HashMap::with_capacity(raw.task_hash.len());
    for (key, label) in &raw.task_hash {
        let id = parse_task_key(key)?;
        let class: u8 = label.parse().map_err(|_| {
            SchedError::InvalidInput(format!(
                "task {key:?} carries a non-numeric class label {label:?}"
            ))
        })?;
        labels.insert(id, class);
    }

    let classification = Classification::new(raw.work, labels);
    ensure_valid(validate_solution(instance, &classification))?;
    Ok(classification)
}

/// Loads a solver solution from a YAML file.
pub fn load_solution(instance: &Instance, path: impl AsRef<Path>) -> SchedResult<Classification> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading solution");
    let text = fs::read_to_string(path)?;
    solution_from_str(instance, &text)
}

/// Renders a schedule as a semicolon-separated table, one row per
/// contiguous resource block.
///
/// The `setid` column uses the zero-based class numbering; unclassified
/// tasks print 0 as well.
pub fn csv_string(schedule: &Schedule) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for assignment in &schedule.assignments {
        let set = assignment.class_id.saturating_sub(1);
        for block in &assignment.blocks {
            out.push_str(&format!(
                "{};{};{};{};{};{:.6};{:.6}\n",
                assignment.task_id,
                assignment.device.arch_id(),
                set,
                block.start,
                block.width,
                assignment.start_time,
                assignment.end_time
            ));
        }
    }
    out
}

/// Writes the CSV table to a file.
pub fn write_csv(schedule: &Schedule, path: impl AsRef<Path>) -> SchedResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing schedule table");
    fs::write(path, csv_string(schedule))?;
    Ok(())
}

/// Renders the whole schedule aggregate as pretty-printed JSON.
pub fn rects_string(schedule: &Schedule) -> SchedResult<String> {
    Ok(serde_json::to_string_pretty(schedule)?)
}

/// Writes the JSON rect dump to a file.
pub fn write_rects(schedule: &Schedule, path: impl AsRef<Path>) -> SchedResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing schedule rects");
    fs::write(path, rects_string(schedule)?)?;
    Ok(())
}

fn task_key(id: u32) -> String {
    format!("t{id}")
}

fn parse_task_key(key: &str) -> SchedResult<u32> {
    key.strip_prefix('t')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            SchedError::InvalidInput(format!("malformed task key {key:?}, expected \"t<id>\""))
        })
}

fn ensure_valid(result: ValidationResult) -> SchedResult<()> {
    result.map_err(|errors| {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        SchedError::InvalidInput(joined)
    })
}
