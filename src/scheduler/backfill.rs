//! Classification-driven backfill scheduler.
//!
//! Consumes a task classification computed by an external dual-approximation
//! load-balancing solver, together with the load bound λ it was computed
//! for, and packs each class with its own strategy. For a model-valid
//! classification the resulting makespan never exceeds 3/2 · λ.
//!
//! The class labels encode the solver's duration ranges; the packer trusts
//! them as given and only reports (or fails on) placements they make
//! impossible.
//!
//! # Class strategies, in placement order
//!
//! | Class | Device | Strategy |
//! |-------|--------|----------|
//! | 2 | CPU | sequential, two per core back to back, largest chased by smallest |
//! | 3 | CPU | moldable, narrowest width finishing within 3/2 · λ, fresh cores |
//! | 4 | CPU | moldable, width within λ, fresh cores after class 3 |
//! | 5 | CPU | moldable, width within λ/2, backfilled onto the class 4 cores |
//! | 1 | CPU | sequential leftovers, longest first onto the best core within the bound |
//! | 6 | GPU | one long task per GPU |
//! | 7 | GPU | short tasks, longest first onto the best GPU within the bound |
//!
//! # Reference
//! Bleuse et al. (2017), "Scheduling Independent Moldable Tasks on
//! Multi-Cores with GPUs", IEEE TPDS 28(9), Sec. 4

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

use crate::error::{SchedError, SchedResult};
use crate::models::{Assignment, DeviceKind, Instance, ResourceBlock, Schedule, Task, UnitPool};

/// Task classification produced by the external load-balancing solver.
#[derive(Debug, Clone)]
pub struct Classification {
    work: f64,
    labels: HashMap<u32, u8>,
}

impl Classification {
    /// Wraps a solver solution: the total work it declared and a class
    /// label (1 through 7) per task id.
    pub fn new(work: f64, labels: HashMap<u32, u8>) -> Self {
        Self { work, labels }
    }

    /// Total work the solver declared for this labeling.
    pub fn work(&self) -> f64 {
        self.work
    }

    /// Class label of one task.
    pub fn label(&self, task_id: u32) -> Option<u8> {
        self.labels.get(&task_id).copied()
    }

    /// Iterates over all (task id, label) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.labels.iter().map(|(&id, &label)| (id, label))
    }

    /// Number of labeled tasks.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no task is labeled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds a schedule for `instance` by packing the classified tasks.
///
/// `lambda` is the per-core load bound the classification was computed
/// for; the makespan guarantee is 3/2 · λ. Fails when the declared work
/// exceeds λ · m, when a task fits nowhere its label allows, or when the
/// platform is too small for a class.
///
/// A makespan above the guarantee or a placement count that differs from
/// the instance size does not fail the run; both are attached to the
/// returned schedule as violations.
pub fn build_schedule(
    instance: &Instance,
    classification: &Classification,
    lambda: f64,
) -> SchedResult<Schedule> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(SchedError::InvalidInput(format!(
            "lambda must be positive and finite, got {lambda}"
        )));
    }

    let capacity = lambda * instance.cores as f64;
    if classification.work() > capacity {
        return Err(SchedError::InvalidInput(format!(
            "solution invalid: declared work {} exceeds lambda * m = {}",
            classification.work(),
            capacity
        )));
    }

    let bound = 3.0 / 2.0 * lambda;

    let mut cores = UnitPool::new(DeviceKind::Cpu, instance.cores);
    let mut gpus = UnitPool::new(DeviceKind::Gpu, instance.gpus);
    let mut schedule = Schedule::new(instance.cores, instance.gpus);
    schedule.set_metadata("engine", "backfill");
    schedule.set_metadata("lambda", lambda.to_string());

    place_paired_sequential(&mut schedule, &mut cores, instance, classification)?;

    // Wide tasks claim fresh cores left to right.
    let class3 = members(instance, classification, 3);
    let cursor = cores.first_idle();
    place_moldable_run(&mut schedule, &mut cores, &class3, 3, bound, cursor)?;

    // Classes 4 and 5 share the same starting column: class 5 backfills
    // the cores class 4 began on, not the next idle ones.
    let shared_start = cores.first_idle();
    let class4 = members(instance, classification, 4);
    place_moldable_run(&mut schedule, &mut cores, &class4, 4, lambda, shared_start)?;

    let class5 = members(instance, classification, 5);
    place_moldable_run(&mut schedule, &mut cores, &class5, 5, lambda / 2.0, shared_start)?;

    backfill_sequential(&mut schedule, &mut cores, instance, classification, bound)?;

    place_gpu_exclusive(&mut schedule, &mut gpus, instance, classification)?;
    backfill_gpu(&mut schedule, &mut gpus, instance, classification, bound)?;

    let violations = schedule.audit(instance.len(), Some(bound));
    for violation in &violations {
        warn!(kind = ?violation.kind, "{}", violation.message);
    }
    schedule.violations = violations;

    info!(
        lambda,
        bound,
        tasks = schedule.assignment_count(),
        makespan = schedule.makespan(),
        "backfill run complete"
    );
    Ok(schedule)
}

/// Tasks carrying `class_id`, in ascending task id order.
fn members<'a>(
    instance: &'a Instance,
    classification: &Classification,
    class_id: u8,
) -> Vec<&'a Task> {
    instance
        .tasks()
        .iter()
        .filter(|t| classification.label(t.id) == Some(class_id))
        .collect()
}

/// Sequential duration of a task the solver put on the CPU side.
fn sequential_duration(task: &Task) -> SchedResult<f64> {
    task.sequential_duration()
        .ok_or_else(|| SchedError::InvalidInput(format!("task {} has no CPU profile", task.id)))
}

/// Orders class 2 for pairing: ascending by duration, then interleaved
/// back-front so each pair couples the largest remaining task with the
/// smallest one.
fn pairing_order(mut tasks: Vec<(&Task, f64)>) -> Vec<(&Task, f64)> {
    tasks.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut deque: VecDeque<(&Task, f64)> = tasks.into();
    let mut ordered = Vec::with_capacity(deque.len());
    while let Some(largest) = deque.pop_back() {
        ordered.push(largest);
        if let Some(smallest) = deque.pop_front() {
            ordered.push(smallest);
        }
    }
    ordered
}

/// Class 2: sequential tasks known to fit two per core within the bound.
fn place_paired_sequential(
    schedule: &mut Schedule,
    cores: &mut UnitPool,
    instance: &Instance,
    classification: &Classification,
) -> SchedResult<()> {
    let mut with_durations = Vec::new();
    for task in members(instance, classification, 2) {
        with_durations.push((task, sequential_duration(task)?));
    }
    let ordered = pairing_order(with_durations);

    let mut core = 0;
    let mut index = 0;
    while index + 1 < ordered.len() {
        place_sequential(schedule, cores, core, ordered[index].0, ordered[index].1, 2)?;
        place_sequential(schedule, cores, core, ordered[index + 1].0, ordered[index + 1].1, 2)?;
        core += 1;
        index += 2;
    }
    // An odd leftover gets a core of its own.
    if index < ordered.len() {
        place_sequential(schedule, cores, core, ordered[index].0, ordered[index].1, 2)?;
    }
    Ok(())
}

/// Appends one sequential task to the frontier of a specific core.
fn place_sequential(
    schedule: &mut Schedule,
    cores: &mut UnitPool,
    core: usize,
    task: &Task,
    duration: f64,
    class_id: u8,
) -> SchedResult<()> {
    if core >= cores.len() {
        return Err(SchedError::Infeasible(format!(
            "class {class_id} needs core {core} but the platform has only {} cores",
            cores.len()
        )));
    }
    let start = cores.available_at(core);
    let end = start + duration;
    cores.reserve_until(core, end);
    debug!(task = task.id, class = class_id, core, start, end, "sequential placement");
    schedule.add_assignment(Assignment::cpu(
        task.id,
        class_id,
        ResourceBlock::new(core, 1),
        start,
        end,
    ));
    Ok(())
}

/// Places one class of moldable tasks as contiguous blocks, each at the
/// narrowest width finishing within `width_bound`, walking the cursor
/// rightwards from `start`.
fn place_moldable_run(
    schedule: &mut Schedule,
    cores: &mut UnitPool,
    tasks: &[&Task],
    class_id: u8,
    width_bound: f64,
    start: Option<usize>,
) -> SchedResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }
    let mut cursor = start.ok_or_else(|| {
        SchedError::Infeasible(format!("class {class_id} has tasks but no idle core remains"))
    })?;

    for task in tasks {
        let width = task.min_procs_within(width_bound).ok_or_else(|| {
            SchedError::Infeasible(format!(
                "task {} fits within {width_bound} at no core count",
                task.id
            ))
        })?;
        if cursor + width > cores.len() {
            return Err(SchedError::Infeasible(format!(
                "task {} needs cores {cursor}..{} but the platform has only {} cores",
                task.id,
                cursor + width,
                cores.len()
            )));
        }
        let duration = task.cpu_profile[width - 1];
        let begin = cores.block_ready(cursor, width);
        let end = begin + duration;
        cores.reserve_block(cursor, width, end);
        debug!(
            task = task.id,
            class = class_id,
            core = cursor,
            width,
            start = begin,
            end,
            "moldable placement"
        );
        schedule.add_assignment(Assignment::cpu(
            task.id,
            class_id,
            ResourceBlock::new(cursor, width),
            begin,
            end,
        ));
        cursor += width;
    }
    Ok(())
}

/// Class 1: small sequential leftovers, longest first, each placed on
/// the core that finishes it earliest without breaking the bound.
fn backfill_sequential(
    schedule: &mut Schedule,
    cores: &mut UnitPool,
    instance: &Instance,
    classification: &Classification,
    bound: f64,
) -> SchedResult<()> {
    let mut tasks = Vec::new();
    for task in members(instance, classification, 1) {
        tasks.push((task, sequential_duration(task)?));
    }
    tasks.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (task, duration) in tasks {
        let core = best_unit_within(cores, duration, bound).ok_or_else(|| {
            SchedError::Infeasible(format!(
                "cannot schedule task {} (fits on no core within {bound})",
                task.id
            ))
        })?;
        place_sequential(schedule, cores, core, task, duration, 1)?;
    }
    Ok(())
}

/// Class 6: long GPU tasks, exactly one per GPU in id order.
fn place_gpu_exclusive(
    schedule: &mut Schedule,
    gpus: &mut UnitPool,
    instance: &Instance,
    classification: &Classification,
) -> SchedResult<()> {
    let tasks = members(instance, classification, 6);
    if tasks.len() > gpus.len() {
        return Err(SchedError::Infeasible(format!(
            "class 6 holds {} tasks but the platform has only {} GPUs",
            tasks.len(),
            gpus.len()
        )));
    }
    for (gpu, task) in tasks.into_iter().enumerate() {
        let start = gpus.available_at(gpu);
        let end = start + task.gpu_duration;
        gpus.reserve_until(gpu, end);
        debug!(task = task.id, class = 6, gpu, start, end, "gpu placement");
        schedule.add_assignment(Assignment::gpu(task.id, 6, gpu, start, end));
    }
    Ok(())
}

/// Class 7: short GPU tasks, longest first, each on the GPU that
/// finishes it earliest without breaking the bound.
fn backfill_gpu(
    schedule: &mut Schedule,
    gpus: &mut UnitPool,
    instance: &Instance,
    classification: &Classification,
    bound: f64,
) -> SchedResult<()> {
    let mut tasks = members(instance, classification, 7);
    tasks.sort_by(|a, b| b.gpu_duration.total_cmp(&a.gpu_duration));

    for task in tasks {
        let gpu = best_unit_within(gpus, task.gpu_duration, bound).ok_or_else(|| {
            SchedError::Infeasible(format!(
                "cannot schedule GPU task {} (fits on no GPU within {bound})",
                task.id
            ))
        })?;
        let start = gpus.available_at(gpu);
        let end = start + task.gpu_duration;
        gpus.reserve_until(gpu, end);
        debug!(task = task.id, class = 7, gpu, start, end, "gpu placement");
        schedule.add_assignment(Assignment::gpu(task.id, 7, gpu, start, end));
    }
    Ok(())
}

/// Lowest-finish unit that can still take `duration` within `bound`;
/// the lowest index wins ties.
fn best_unit_within(pool: &UnitPool, duration: f64, bound: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for unit in 0..pool.len() {
        let finish = pool.available_at(unit) + duration;
        if finish <= bound {
            match best {
                Some((_, current)) if current <= finish => {}
                _ => best = Some((unit, finish)),
            }
        }
    }
    best.map(|(unit, _)| unit)
}
