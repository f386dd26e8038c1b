//! Built-in priority policies.
//!
//! All three compare tasks through their reference durations: the CPU
//! time the active mode would grant (single core or full width) and the
//! GPU time.
//!
//! # Score Convention
//! All policies return lower scores for higher priority tasks.

use super::{PolicyContext, PolicyScore, PriorityPolicy};
use crate::models::Task;

/// Longest Processing Time.
///
/// Orders tasks by their best device time, largest first. The classic
/// list-scheduling choice for makespan on parallel machines.
///
/// # Reference
/// Graham (1969), "Bounds on Multiprocessing Timing Anomalies"
#[derive(Debug, Clone, Copy)]
pub struct Lpt;

impl PriorityPolicy for Lpt {
    fn name(&self) -> &'static str {
        "lpt"
    }

    fn evaluate(&self, task: &Task, context: &PolicyContext) -> PolicyScore {
        -context.cpu_duration(task).min(task.gpu_duration)
    }

    fn description(&self) -> &'static str {
        "Longest Processing Time"
    }
}

/// Shortest Processing Time.
///
/// Orders tasks by their best device time, smallest first.
///
/// # Reference
/// Smith (1956), optimal for minimizing mean flow time on a single machine.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl PriorityPolicy for Spt {
    fn name(&self) -> &'static str {
        "spt"
    }

    fn evaluate(&self, task: &Task, context: &PolicyContext) -> PolicyScore {
        context.cpu_duration(task).min(task.gpu_duration)
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

/// Largest CPU/GPU time ratio.
///
/// Orders tasks by how much they gain from the GPU, most GPU-friendly
/// first, so the accelerators are claimed by the tasks that profit most.
#[derive(Debug, Clone, Copy)]
pub struct Ratio;

impl PriorityPolicy for Ratio {
    fn name(&self) -> &'static str {
        "ratio"
    }

    fn evaluate(&self, task: &Task, context: &PolicyContext) -> PolicyScore {
        -(context.cpu_duration(task) / task.gpu_duration)
    }

    fn description(&self) -> &'static str {
        "CPU/GPU Acceleration Ratio"
    }
}
