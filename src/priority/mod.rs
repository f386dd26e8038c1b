//! Task priority policies for list scheduling.
//!
//! Provides the ordering half of the greedy EFT engine: a policy scores
//! every task, tasks are placed in ascending score order, and exact ties
//! fall back to ascending task id so repeated runs stay identical.
//!
//! # Usage
//!
//! ```
//! use mold_sched::models::Task;
//! use mold_sched::priority::{sort_indices, PolicyContext, PolicyKind};
//!
//! let tasks = vec![
//!     Task::new(1, vec![4.0], 9.0),
//!     Task::new(2, vec![7.0], 2.0),
//! ];
//! let ctx = PolicyContext { sequential_only: true };
//! let order = sort_indices(&tasks, PolicyKind::Lpt.policy(), &ctx);
//! assert_eq!(order, vec![0, 1]);
//! ```
//!
//! # References
//!
//! - Topcuoglu et al. (2002), "Performance-Effective and Low-Complexity
//!   Task Scheduling for Heterogeneous Computing"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

pub mod rules;

use std::fmt;
use std::str::FromStr;

use crate::error::SchedError;
use crate::models::Task;

/// Score returned by a priority policy.
///
/// Lower scores = higher priority (scheduled first).
pub type PolicyScore = f64;

/// Inputs a policy may consult besides the task itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyContext {
    /// Whether CPU tasks are restricted to a single core.
    pub sequential_only: bool,
}

impl PolicyContext {
    /// CPU duration used for prioritization: the single-core time in
    /// sequential-only mode, the full-width time otherwise.
    ///
    /// Infinite when the task has no CPU profile, which pushes the
    /// comparison entirely onto the GPU duration.
    pub fn cpu_duration(&self, task: &Task) -> f64 {
        let duration = if self.sequential_only {
            task.sequential_duration()
        } else {
            task.full_width_duration()
        };
        duration.unwrap_or(f64::INFINITY)
    }
}

/// A priority policy that scores tasks for ordering.
///
/// # Score Convention
/// **Lower score = higher priority.** Policies return smaller values for
/// tasks that should be placed first.
pub trait PriorityPolicy {
    /// Policy name as accepted on the command line.
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a task.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, task: &Task, context: &PolicyContext) -> PolicyScore;

    /// Policy description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

/// The selectable built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// Longest processing time first (the default).
    #[default]
    Lpt,
    /// Shortest processing time first.
    Spt,
    /// Largest CPU/GPU time ratio first.
    Ratio,
}

impl PolicyKind {
    /// The policy implementation behind this kind.
    pub fn policy(&self) -> &'static dyn PriorityPolicy {
        match self {
            PolicyKind::Lpt => &rules::Lpt,
            PolicyKind::Spt => &rules::Spt,
            PolicyKind::Ratio => &rules::Ratio,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.policy().name())
    }
}

impl FromStr for PolicyKind {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lpt" => Ok(PolicyKind::Lpt),
            "spt" => Ok(PolicyKind::Spt),
            "ratio" => Ok(PolicyKind::Ratio),
            other => Err(SchedError::InvalidInput(format!(
                "unknown priority policy {other:?} (expected lpt, spt, or ratio)"
            ))),
        }
    }
}

/// Returns task indices in scheduling order: ascending score under
/// `policy`, ties by ascending task id.
pub fn sort_indices(
    tasks: &[Task],
    policy: &dyn PriorityPolicy,
    context: &PolicyContext,
) -> Vec<usize> {
    let scores: Vec<PolicyScore> = tasks.iter().map(|t| policy.evaluate(t, context)).collect();
    let mut indices: Vec<usize> = (0..tasks.len()).collect();
    indices.sort_by(|&a, &b| {
        scores[a]
            .total_cmp(&scores[b])
            .then_with(|| tasks[a].id.cmp(&tasks[b].id))
    });
    indices
}
