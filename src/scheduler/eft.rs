//! Greedy earliest-finish-time list scheduler.
//!
//! # Algorithm
//!
//! 1. Sort tasks by the configured priority policy.
//! 2. For each task, compute the best CPU finish time: on the earliest
//!    single core in sequential-only mode, or on the whole synchronized
//!    core pool otherwise.
//! 3. Probe every GPU; move the task there only if some GPU finishes it
//!    strictly earlier. Exact ties stay on the CPU side.
//!
//! # Complexity
//! O(n log n + n * (m + k)) where n=tasks, m=cores, k=GPUs.
//!
//! # Reference
//! Topcuoglu et al. (2002), "Performance-Effective and Low-Complexity
//! Task Scheduling for Heterogeneous Computing"

use tracing::{debug, info, warn};

use crate::error::{SchedError, SchedResult};
use crate::models::{Assignment, DeviceKind, Instance, ResourceBlock, Schedule, Task, UnitPool};
use crate::priority::{sort_indices, PolicyContext, PolicyKind};

/// Configuration for one EFT run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EftConfig {
    /// Priority policy ordering the task list.
    pub policy: PolicyKind,
    /// Restrict every CPU task to a single core. When off, a CPU task
    /// occupies the full core pool as one synchronized block.
    pub sequential_only: bool,
}

/// A candidate CPU placement for one task.
struct CpuCandidate {
    block: ResourceBlock,
    start: f64,
    finish: f64,
}

/// Builds a schedule for `instance` with the greedy EFT heuristic.
///
/// # Example
///
/// ```
/// use mold_sched::models::{Instance, Task};
/// use mold_sched::scheduler::eft::{build_schedule, EftConfig};
///
/// let instance = Instance::new(2, 1, vec![
///     Task::new(1, vec![10.0, 6.0], 4.0),
///     Task::new(2, vec![8.0, 5.0], 100.0),
///     Task::new(3, vec![3.0, 2.0], 1.0),
/// ]);
///
/// let schedule = build_schedule(&instance, &EftConfig::default()).unwrap();
/// assert_eq!(schedule.assignment_count(), 3);
/// assert_eq!(schedule.makespan(), 5.0);
/// ```
pub fn build_schedule(instance: &Instance, config: &EftConfig) -> SchedResult<Schedule> {
    if instance.cores == 0 && instance.gpus == 0 && !instance.is_empty() {
        return Err(SchedError::InvalidInput(
            "instance declares no cores and no GPUs".to_string(),
        ));
    }

    let mut cores = UnitPool::new(DeviceKind::Cpu, instance.cores);
    let mut gpus = UnitPool::new(DeviceKind::Gpu, instance.gpus);
    let mut schedule = Schedule::new(instance.cores, instance.gpus);
    schedule.set_metadata("engine", "eft");
    schedule.set_metadata("policy", config.policy.to_string());
    schedule.set_metadata("sequential_only", if config.sequential_only { "1" } else { "0" });

    let context = PolicyContext {
        sequential_only: config.sequential_only,
    };
    let order = sort_indices(instance.tasks(), config.policy.policy(), &context);

    for index in order {
        let task = &instance.tasks()[index];

        let cpu = cpu_candidate(task, &cores, config.sequential_only);
        let mut best_finish = cpu.as_ref().map(|c| c.finish).unwrap_or(f64::INFINITY);

        // A GPU wins only on a strictly earlier finish; ties stay on the CPU.
        let mut chosen_gpu: Option<usize> = None;
        for gpu in 0..gpus.len() {
            let finish = gpus.available_at(gpu) + task.gpu_duration;
            if finish < best_finish {
                best_finish = finish;
                chosen_gpu = Some(gpu);
            }
        }

        if let Some(gpu) = chosen_gpu {
            let start = gpus.available_at(gpu);
            gpus.reserve_until(gpu, best_finish);
            debug!(task = task.id, gpu, start, finish = best_finish, "gpu placement");
            schedule.add_assignment(Assignment::gpu(task.id, 0, gpu, start, best_finish));
        } else {
            let candidate = cpu.ok_or_else(|| {
                SchedError::InvalidInput(format!("task {} fits no device of the platform", task.id))
            })?;
            cores.reserve_block(candidate.block.start, candidate.block.width, candidate.finish);
            debug!(
                task = task.id,
                core = candidate.block.start,
                width = candidate.block.width,
                start = candidate.start,
                finish = candidate.finish,
                "cpu placement"
            );
            schedule.add_assignment(Assignment::cpu(
                task.id,
                0,
                candidate.block,
                candidate.start,
                candidate.finish,
            ));
        }
    }

    let violations = schedule.audit(instance.len(), None);
    for violation in &violations {
        warn!(kind = ?violation.kind, "{}", violation.message);
    }
    schedule.violations = violations;

    info!(
        policy = %config.policy,
        tasks = schedule.assignment_count(),
        makespan = schedule.makespan(),
        "eft run complete"
    );
    Ok(schedule)
}

/// Best CPU option for one task under the active mode.
fn cpu_candidate(task: &Task, cores: &UnitPool, sequential_only: bool) -> Option<CpuCandidate> {
    if cores.is_empty() {
        return None;
    }
    if sequential_only {
        let duration = task.sequential_duration()?;
        // Select the core with the earliest availability; lowest index wins ties.
        let mut best: Option<(usize, f64)> = None;
        for core in 0..cores.len() {
            let available = cores.available_at(core);
            match best {
                Some((_, start)) if start <= available => {}
                _ => best = Some((core, available)),
            }
        }
        let (core, start) = best?;
        Some(CpuCandidate {
            block: ResourceBlock::new(core, 1),
            start,
            finish: start + duration,
        })
    } else {
        let duration = task.full_width_duration()?;
        let start = cores.block_ready(0, cores.len());
        Some(CpuCandidate {
            block: ResourceBlock::new(0, cores.len()),
            start,
            finish: start + duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn golden_instance() -> Instance {
        Instance::new(
            2,
            1,
            vec![
                Task::new(1, vec![10.0, 6.0], 4.0),
                Task::new(2, vec![8.0, 5.0], 100.0),
                Task::new(3, vec![3.0, 2.0], 1.0),
            ],
        )
    }

    #[test]
    fn test_full_width_lpt_golden() {
        let schedule = build_schedule(&golden_instance(), &EftConfig::default()).unwrap();

        assert!(schedule.is_valid());
        assert_eq!(schedule.assignment_count(), 3);
        assert_eq!(schedule.makespan(), 5.0);

        // Placement order follows lpt reference durations: t2 (5), t1 (4), t3 (1).
        let ids: Vec<u32> = schedule.assignments.iter().map(|a| a.task_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let t2 = schedule.assignment_for_task(2).unwrap();
        assert_eq!(t2.device, DeviceKind::Cpu);
        assert_eq!(t2.blocks, vec![ResourceBlock::new(0, 2)]);
        assert_eq!(t2.start_time, 0.0);
        assert_eq!(t2.end_time, 5.0);

        let t1 = schedule.assignment_for_task(1).unwrap();
        assert_eq!(t1.device, DeviceKind::Gpu);
        assert_eq!(t1.blocks, vec![ResourceBlock::new(0, 1)]);
        assert_eq!(t1.start_time, 0.0);
        assert_eq!(t1.end_time, 4.0);

        let t3 = schedule.assignment_for_task(3).unwrap();
        assert_eq!(t3.device, DeviceKind::Gpu);
        assert_eq!(t3.start_time, 4.0);
        assert_eq!(t3.end_time, 5.0);
    }

    #[test]
    fn test_spt_order() {
        let config = EftConfig {
            policy: PolicyKind::Spt,
            sequential_only: false,
        };
        let schedule = build_schedule(&golden_instance(), &config).unwrap();

        let ids: Vec<u32> = schedule.assignments.iter().map(|a| a.task_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        // t3 and t1 take the GPU back to back, t2 takes the full core pool.
        let t1 = schedule.assignment_for_task(1).unwrap();
        assert_eq!((t1.start_time, t1.end_time), (1.0, 5.0));
        assert_eq!(schedule.makespan(), 5.0);
    }

    #[test]
    fn test_sequential_mode_spreads_over_cores() {
        let instance = Instance::new(
            2,
            0,
            vec![
                Task::new(1, vec![4.0, 3.0], 100.0),
                Task::new(2, vec![4.0, 3.0], 100.0),
            ],
        );
        let config = EftConfig {
            policy: PolicyKind::Lpt,
            sequential_only: true,
        };
        let schedule = build_schedule(&instance, &config).unwrap();

        let t1 = schedule.assignment_for_task(1).unwrap();
        let t2 = schedule.assignment_for_task(2).unwrap();
        assert_eq!(t1.blocks, vec![ResourceBlock::new(0, 1)]);
        assert_eq!(t2.blocks, vec![ResourceBlock::new(1, 1)]);
        assert_eq!(schedule.makespan(), 4.0);
    }

    #[test]
    fn test_full_width_serializes_cpu_tasks() {
        // Without the GPU escape every task spans all cores in sequence.
        let instance = Instance::new(
            3,
            0,
            vec![
                Task::new(1, vec![9.0, 5.0, 4.0], 100.0),
                Task::new(2, vec![6.0, 4.0, 3.0], 100.0),
            ],
        );
        let schedule = build_schedule(&instance, &EftConfig::default()).unwrap();

        let t1 = schedule.assignment_for_task(1).unwrap();
        let t2 = schedule.assignment_for_task(2).unwrap();
        assert_eq!((t1.start_time, t1.end_time), (0.0, 4.0));
        assert_eq!((t2.start_time, t2.end_time), (4.0, 7.0));
        assert_eq!(t2.blocks, vec![ResourceBlock::new(0, 3)]);
    }

    #[test]
    fn test_exact_tie_prefers_cpu() {
        let instance = Instance::new(1, 1, vec![Task::new(1, vec![5.0], 5.0)]);
        let schedule = build_schedule(&instance, &EftConfig::default()).unwrap();

        let a = schedule.assignment_for_task(1).unwrap();
        assert_eq!(a.device, DeviceKind::Cpu);
    }

    #[test]
    fn test_gpu_only_platform() {
        let instance = Instance::new(
            0,
            2,
            vec![
                Task::new(1, vec![], 3.0),
                Task::new(2, vec![], 2.0),
                Task::new(3, vec![], 2.0),
            ],
        );
        let schedule = build_schedule(&instance, &EftConfig::default()).unwrap();

        assert!(schedule.is_valid());
        assert_eq!(schedule.assignment_count(), 3);
        assert_eq!(schedule.makespan(), 4.0);
    }

    #[test]
    fn test_empty_instance() {
        let instance = Instance::new(4, 2, vec![]);
        let schedule = build_schedule(&instance, &EftConfig::default()).unwrap();

        assert_eq!(schedule.assignment_count(), 0);
        assert_eq!(schedule.makespan(), 0.0);
        assert!(schedule.is_valid());
    }

    #[test]
    fn test_zero_resource_platform_rejected() {
        let instance = Instance::new(0, 0, vec![Task::new(1, vec![], 1.0)]);
        assert!(matches!(
            build_schedule(&instance, &EftConfig::default()),
            Err(SchedError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let instance = golden_instance();
        let config = EftConfig {
            policy: PolicyKind::Ratio,
            sequential_only: true,
        };
        let first = build_schedule(&instance, &config).unwrap();
        let second = build_schedule(&instance, &config).unwrap();
        assert_eq!(first, second);
    }

    fn random_instance(rng: &mut SmallRng, cores: usize, gpus: usize, n: usize) -> Instance {
        let mut tasks = Vec::with_capacity(n);
        for id in 1..=n {
            let mut profile = Vec::with_capacity(cores);
            let mut duration = rng.random_range(20.0..100.0_f64).round();
            for _ in 0..cores {
                profile.push(duration);
                duration = (duration - rng.random_range(0.0..5.0_f64).round()).max(1.0);
            }
            let gpu_duration = rng.random_range(1.0..50.0_f64).round();
            tasks.push(Task::new(id as u32, profile, gpu_duration));
        }
        Instance::new(cores, gpus, tasks)
    }

    #[test]
    fn test_random_instances_pass_audit() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            let cores = rng.random_range(1..8);
            let gpus = rng.random_range(0..4);
            let n = rng.random_range(0..40);
            let instance = random_instance(&mut rng, cores, gpus, n);

            for policy in [PolicyKind::Lpt, PolicyKind::Spt, PolicyKind::Ratio] {
                for sequential_only in [false, true] {
                    let config = EftConfig {
                        policy,
                        sequential_only,
                    };
                    let schedule = build_schedule(&instance, &config).unwrap();
                    assert!(schedule.is_valid());
                    assert_eq!(schedule.assignment_count(), instance.len());
                }
            }
        }
    }

    #[test]
    fn test_durations_match_profiles() {
        let mut rng = SmallRng::seed_from_u64(7);
        let instance = random_instance(&mut rng, 4, 2, 25);

        for sequential_only in [false, true] {
            let config = EftConfig {
                policy: PolicyKind::Lpt,
                sequential_only,
            };
            let schedule = build_schedule(&instance, &config).unwrap();
            for a in &schedule.assignments {
                let task = instance.task(a.task_id).unwrap();
                let expected = match a.device {
                    DeviceKind::Gpu => task.gpu_duration,
                    DeviceKind::Cpu => task.cpu_duration(a.unit_count()).unwrap(),
                };
                assert!((a.duration() - expected).abs() < 1e-9);
            }
        }
    }
}
