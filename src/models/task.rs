//! Moldable task model.
//!
//! A task runs either on a contiguous group of identical CPU cores, with a
//! duration that depends on how many cores it is granted, or on a single
//! GPU with a fixed duration. The allotment is decided once, before
//! execution; tasks never migrate or preempt.
//!
//! # Reference
//! Bleuse et al. (2017), "Scheduling Independent Moldable Tasks on
//! Multi-Cores with GPUs", IEEE TPDS 28(9)

use serde::{Deserialize, Serialize};

/// A moldable task with a CPU duration profile and a GPU duration.
///
/// `cpu_profile[p - 1]` is the processing time when the task runs on `p`
/// cores. Profiles cover exactly the core counts `1..=m` of the target
/// platform and are non-increasing in `p` (more cores never slow a task
/// down). A GPU run always occupies exactly one GPU.
///
/// # Time Representation
/// Durations and schedule times are in abstract seconds relative to a
/// common origin (t=0). All durations are finite and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (1-based).
    pub id: u32,
    /// CPU duration by core count; index 0 holds the single-core time.
    pub cpu_profile: Vec<f64>,
    /// Duration on a single GPU.
    pub gpu_duration: f64,
}

impl Task {
    /// Creates a new task.
    pub fn new(id: u32, cpu_profile: Vec<f64>, gpu_duration: f64) -> Self {
        Self {
            id,
            cpu_profile,
            gpu_duration,
        }
    }

    /// Duration when the task runs on a single core.
    ///
    /// Returns `None` for an empty profile (a platform with no cores).
    pub fn sequential_duration(&self) -> Option<f64> {
        self.cpu_profile.first().copied()
    }

    /// Duration when the task runs on every core of the platform.
    pub fn full_width_duration(&self) -> Option<f64> {
        self.cpu_profile.last().copied()
    }

    /// Duration on `procs` cores (1-based), if the profile covers it.
    pub fn cpu_duration(&self, procs: usize) -> Option<f64> {
        if procs == 0 {
            return None;
        }
        self.cpu_profile.get(procs - 1).copied()
    }

    /// Number of core counts the profile covers.
    pub fn max_procs(&self) -> usize {
        self.cpu_profile.len()
    }

    /// Smallest core count whose duration fits within `bound`.
    ///
    /// Because profiles are non-increasing, the first qualifying entry is
    /// the canonical allotment. Returns `None` when even the full platform
    /// cannot finish the task within `bound`.
    pub fn min_procs_within(&self, bound: f64) -> Option<usize> {
        self.cpu_profile
            .iter()
            .position(|&d| d <= bound)
            .map(|i| i + 1)
    }
}

/// A scheduling instance: the platform dimensions plus every task profile.
///
/// Tasks are held in ascending id order and are read-only once loaded;
/// both scheduling engines consume the same instance without mutating it.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Number of identical CPU cores (m).
    pub cores: usize,
    /// Number of GPUs (k).
    pub gpus: usize,
    tasks: Vec<Task>,
}

impl Instance {
    /// Creates an instance, ordering tasks by ascending id.
    pub fn new(cores: usize, gpus: usize, mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|t| t.id);
        Self { cores, gpus, tasks }
    }

    /// Tasks in ascending id order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a task by id.
    pub fn task(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Number of tasks (n).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the instance has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_queries() {
        let task = Task::new(1, vec![10.0, 6.0, 4.0], 3.0);

        assert_eq!(task.sequential_duration(), Some(10.0));
        assert_eq!(task.full_width_duration(), Some(4.0));
        assert_eq!(task.cpu_duration(2), Some(6.0));
        assert_eq!(task.cpu_duration(0), None);
        assert_eq!(task.cpu_duration(4), None);
        assert_eq!(task.max_procs(), 3);
    }

    #[test]
    fn test_empty_profile() {
        let task = Task::new(1, vec![], 3.0);

        assert_eq!(task.sequential_duration(), None);
        assert_eq!(task.full_width_duration(), None);
        assert_eq!(task.min_procs_within(100.0), None);
    }

    #[test]
    fn test_min_procs_within() {
        let task = Task::new(1, vec![10.0, 6.0, 4.0, 3.0], 1.0);

        assert_eq!(task.min_procs_within(10.0), Some(1));
        assert_eq!(task.min_procs_within(6.0), Some(2));
        assert_eq!(task.min_procs_within(5.0), Some(3));
        assert_eq!(task.min_procs_within(3.0), Some(4));
        assert_eq!(task.min_procs_within(2.9), None);
    }

    #[test]
    fn test_min_procs_monotone_in_bound() {
        let task = Task::new(1, vec![20.0, 12.0, 9.0, 9.0, 7.0], 1.0);
        let bounds = [7.0, 8.0, 9.0, 11.0, 12.0, 19.0, 20.0, 50.0];

        for pair in bounds.windows(2) {
            let tight = task.min_procs_within(pair[0]).unwrap();
            let loose = task.min_procs_within(pair[1]).unwrap();
            assert!(loose <= tight, "bound {} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_instance_orders_by_id() {
        let instance = Instance::new(
            2,
            1,
            vec![
                Task::new(3, vec![3.0, 2.0], 1.0),
                Task::new(1, vec![10.0, 6.0], 4.0),
                Task::new(2, vec![8.0, 5.0], 100.0),
            ],
        );

        let ids: Vec<u32> = instance.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(instance.len(), 3);
        assert_eq!(instance.task(2).map(|t| t.gpu_duration), Some(100.0));
        assert!(instance.task(9).is_none());
    }
}
