//! Schedule (solution) model.
//!
//! A schedule is a complete placement of tasks onto processing units and
//! time intervals. Post-condition problems are carried as violations so a
//! run can finish and still report that its guarantees were broken.
//!
//! # Reference
//! Bleuse et al. (2017), "Scheduling Independent Moldable Tasks on
//! Multi-Cores with GPUs", IEEE TPDS 28(9), Sec. 4

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::DeviceKind;

/// A complete schedule for one instance.
///
/// Contains task placements, any post-condition violations, and run
/// metadata (policy name, lambda, and similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Number of CPU cores the schedule was built for.
    pub cpu_pool_size: usize,
    /// Number of GPUs the schedule was built for.
    pub gpu_pool_size: usize,
    /// Task placements in the order the engine made them.
    pub assignments: Vec<Assignment>,
    /// Post-condition violations detected in this schedule.
    pub violations: Vec<Violation>,
    /// Run metadata recorded by the engines.
    pub metadata: BTreeMap<String, String>,
}

/// A contiguous range of processing units granted to one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceBlock {
    /// First unit index of the block.
    pub start: usize,
    /// Number of units in the block.
    pub width: usize,
}

/// A task-device-time placement.
///
/// Records that a task runs on a set of contiguous unit blocks of one
/// device kind during one time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Placed task id.
    pub task_id: u32,
    /// Device kind of every granted unit.
    pub device: DeviceKind,
    /// Class label for classification schedules; 0 when not applicable.
    pub class_id: u8,
    /// Granted unit blocks.
    pub blocks: Vec<ResourceBlock>,
    /// Start time.
    pub start_time: f64,
    /// End time.
    pub end_time: f64,
}

/// A post-condition violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Classification of post-condition violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Makespan exceeds the guaranteed bound.
    BoundExceeded,
    /// Fewer (or more) placements than instance tasks.
    Incomplete,
    /// Two tasks occupy the same unit at the same time.
    UnitOverlap,
    /// A placement references units outside its pool.
    UnitOutOfRange,
}

impl ResourceBlock {
    /// Creates a new block.
    pub fn new(start: usize, width: usize) -> Self {
        Self { start, width }
    }

    /// Whether `unit` falls inside this block.
    pub fn contains(&self, unit: usize) -> bool {
        unit >= self.start && unit < self.start + self.width
    }
}

impl Assignment {
    /// Creates a CPU placement over one contiguous core block.
    pub fn cpu(task_id: u32, class_id: u8, block: ResourceBlock, start_time: f64, end_time: f64) -> Self {
        Self {
            task_id,
            device: DeviceKind::Cpu,
            class_id,
            blocks: vec![block],
            start_time,
            end_time,
        }
    }

    /// Creates a GPU placement on a single device.
    pub fn gpu(task_id: u32, class_id: u8, gpu: usize, start_time: f64, end_time: f64) -> Self {
        Self {
            task_id,
            device: DeviceKind::Gpu,
            class_id,
            blocks: vec![ResourceBlock::new(gpu, 1)],
            start_time,
            end_time,
        }
    }

    /// Total duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Total processing units granted across all blocks.
    pub fn unit_count(&self) -> usize {
        self.blocks.iter().map(|b| b.width).sum()
    }

    /// Whether this placement occupies the given unit of its device kind.
    pub fn uses_unit(&self, unit: usize) -> bool {
        self.blocks.iter().any(|b| b.contains(unit))
    }
}

impl Violation {
    /// Creates a bound-exceeded violation.
    pub fn bound_exceeded(makespan: f64, bound: f64) -> Self {
        Self {
            kind: ViolationKind::BoundExceeded,
            message: format!("invalid solution: makespan {makespan} exceeds the guaranteed bound {bound}"),
        }
    }

    /// Creates an incomplete-schedule violation.
    pub fn incomplete(scheduled: usize, expected: usize) -> Self {
        Self {
            kind: ViolationKind::Incomplete,
            message: format!("problem detected: {scheduled} of {expected} tasks were scheduled"),
        }
    }

    /// Creates a unit-overlap violation.
    pub fn unit_overlap(device: DeviceKind, unit: usize, first: u32, second: u32) -> Self {
        Self {
            kind: ViolationKind::UnitOverlap,
            message: format!("tasks {first} and {second} overlap on {device} {unit}"),
        }
    }

    /// Creates an out-of-range violation.
    pub fn unit_out_of_range(device: DeviceKind, task_id: u32) -> Self {
        Self {
            kind: ViolationKind::UnitOutOfRange,
            message: format!("task {task_id} uses {device} units outside the pool"),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule for a platform of the given pool sizes.
    pub fn new(cpu_pool_size: usize, gpu_pool_size: usize) -> Self {
        Self {
            cpu_pool_size,
            gpu_pool_size,
            assignments: Vec::new(),
            violations: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Records a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Makespan: latest end time across all assignments (0 when empty).
    pub fn makespan(&self) -> f64 {
        self.assignments
            .iter()
            .map(|a| a.end_time)
            .fold(0.0, f64::max)
    }

    /// Finds the placement of a given task.
    pub fn assignment_for_task(&self, task_id: u32) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.task_id == task_id)
    }

    /// Returns all placements carrying a given class label.
    pub fn assignments_in_class(&self, class_id: u8) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.class_id == class_id)
            .collect()
    }

    /// Returns all placements touching one unit of a device kind.
    pub fn assignments_for_unit(&self, device: DeviceKind, unit: usize) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.device == device && a.uses_unit(unit))
            .collect()
    }

    /// Total busy time on one unit.
    pub fn unit_busy_time(&self, device: DeviceKind, unit: usize) -> f64 {
        self.assignments_for_unit(device, unit)
            .iter()
            .map(|a| a.duration())
            .sum()
    }

    /// Computes unit utilization: busy_time / makespan.
    ///
    /// Returns `None` for an empty schedule.
    pub fn unit_utilization(&self, device: DeviceKind, unit: usize) -> Option<f64> {
        let horizon = self.makespan();
        if horizon <= 0.0 {
            return None;
        }
        Some(self.unit_busy_time(device, unit) / horizon)
    }

    /// Mean utilization across a whole pool, with makespan as the horizon.
    pub fn pool_utilization(&self, device: DeviceKind) -> Option<f64> {
        let size = match device {
            DeviceKind::Cpu => self.cpu_pool_size,
            DeviceKind::Gpu => self.gpu_pool_size,
        };
        let horizon = self.makespan();
        if size == 0 || horizon <= 0.0 {
            return None;
        }
        let busy: f64 = (0..size).map(|u| self.unit_busy_time(device, u)).sum();
        Some(busy / (size as f64 * horizon))
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Runs the post-condition audit and returns everything it finds.
    ///
    /// Checks placement count against `expected_tasks`, the makespan
    /// against `bound` when given, unit ranges, and per-unit overlap.
    /// The caller decides whether the findings are fatal; the engines
    /// attach them to the schedule as warnings.
    pub fn audit(&self, expected_tasks: usize, bound: Option<f64>) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.assignment_count() != expected_tasks {
            violations.push(Violation::incomplete(self.assignment_count(), expected_tasks));
        }

        if let Some(bound) = bound {
            let makespan = self.makespan();
            if makespan > bound {
                violations.push(Violation::bound_exceeded(makespan, bound));
            }
        }

        self.audit_pool(DeviceKind::Cpu, self.cpu_pool_size, &mut violations);
        self.audit_pool(DeviceKind::Gpu, self.gpu_pool_size, &mut violations);

        violations
    }

    fn audit_pool(&self, device: DeviceKind, pool_size: usize, violations: &mut Vec<Violation>) {
        let mut per_unit: Vec<Vec<(f64, f64, u32)>> = vec![Vec::new(); pool_size];

        for a in self.assignments.iter().filter(|a| a.device == device) {
            for block in &a.blocks {
                if block.start + block.width > pool_size {
                    violations.push(Violation::unit_out_of_range(device, a.task_id));
                    continue;
                }
                for unit in block.start..block.start + block.width {
                    per_unit[unit].push((a.start_time, a.end_time, a.task_id));
                }
            }
        }

        // One report per clashing task pair, even when the overlap spans
        // several units of a wide block.
        let mut reported: Vec<(u32, u32)> = Vec::new();
        for (unit, intervals) in per_unit.iter_mut().enumerate() {
            intervals.sort_by(|x, y| x.0.total_cmp(&y.0));
            let mut frontier: Option<(f64, u32)> = None;
            for &(start, end, task_id) in intervals.iter() {
                if let Some((busy_until, holder)) = frontier {
                    if start < busy_until && !reported.contains(&(holder, task_id)) {
                        reported.push((holder, task_id));
                        violations.push(Violation::unit_overlap(device, unit, holder, task_id));
                    }
                }
                match frontier {
                    Some((busy_until, _)) if busy_until >= end => {}
                    _ => frontier = Some((end, task_id)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new(2, 1);
        s.add_assignment(Assignment::cpu(1, 0, ResourceBlock::new(0, 1), 0.0, 5.0));
        s.add_assignment(Assignment::gpu(2, 0, 0, 0.0, 4.0));
        s.add_assignment(Assignment::gpu(3, 0, 0, 4.0, 5.0));
        s
    }

    #[test]
    fn test_schedule_makespan() {
        let s = sample_schedule();
        assert_eq!(s.makespan(), 5.0);
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new(4, 2);
        assert_eq!(s.makespan(), 0.0);
        assert!(s.is_valid());
        assert_eq!(s.assignment_count(), 0);
    }

    #[test]
    fn test_assignment_queries() {
        let s = sample_schedule();

        let a = s.assignment_for_task(2).unwrap();
        assert_eq!(a.device, DeviceKind::Gpu);
        assert!(s.assignment_for_task(99).is_none());

        assert_eq!(s.assignments_for_unit(DeviceKind::Gpu, 0).len(), 2);
        assert_eq!(s.assignments_for_unit(DeviceKind::Cpu, 1).len(), 0);
    }

    #[test]
    fn test_assignment_geometry() {
        let a = Assignment::cpu(7, 3, ResourceBlock::new(2, 4), 1.0, 4.5);
        assert_eq!(a.duration(), 3.5);
        assert_eq!(a.unit_count(), 4);
        assert!(a.uses_unit(2));
        assert!(a.uses_unit(5));
        assert!(!a.uses_unit(6));
    }

    #[test]
    fn test_class_filter() {
        let mut s = Schedule::new(2, 2);
        s.add_assignment(Assignment::cpu(1, 2, ResourceBlock::new(0, 1), 0.0, 3.0));
        s.add_assignment(Assignment::cpu(2, 2, ResourceBlock::new(0, 1), 3.0, 5.0));
        s.add_assignment(Assignment::gpu(3, 6, 0, 0.0, 8.0));

        assert_eq!(s.assignments_in_class(2).len(), 2);
        assert_eq!(s.assignments_in_class(6).len(), 1);
        assert!(s.assignments_in_class(4).is_empty());
    }

    #[test]
    fn test_utilization() {
        let s = sample_schedule();

        let cpu0 = s.unit_utilization(DeviceKind::Cpu, 0).unwrap();
        assert!((cpu0 - 1.0).abs() < 1e-10);

        let cpu1 = s.unit_utilization(DeviceKind::Cpu, 1).unwrap();
        assert!(cpu1.abs() < 1e-10);

        // GPU 0 is busy 4 + 1 = 5 over horizon 5.
        let gpu0 = s.unit_utilization(DeviceKind::Gpu, 0).unwrap();
        assert!((gpu0 - 1.0).abs() < 1e-10);

        let cpu_pool = s.pool_utilization(DeviceKind::Cpu).unwrap();
        assert!((cpu_pool - 0.5).abs() < 1e-10);

        assert!(Schedule::new(2, 1).unit_utilization(DeviceKind::Cpu, 0).is_none());
    }

    #[test]
    fn test_metadata() {
        let mut s = Schedule::new(1, 0);
        s.set_metadata("policy", "lpt");
        assert_eq!(s.metadata.get("policy").map(String::as_str), Some("lpt"));
    }

    #[test]
    fn test_audit_clean() {
        let s = sample_schedule();
        assert!(s.audit(3, Some(5.0)).is_empty());
    }

    #[test]
    fn test_audit_incomplete() {
        let s = sample_schedule();
        let violations = s.audit(4, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Incomplete);
    }

    #[test]
    fn test_audit_bound_exceeded() {
        let s = sample_schedule();
        let violations = s.audit(3, Some(4.5));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::BoundExceeded);
    }

    #[test]
    fn test_audit_overlap_with_containment() {
        let mut s = Schedule::new(1, 0);
        s.add_assignment(Assignment::cpu(1, 0, ResourceBlock::new(0, 1), 0.0, 10.0));
        s.add_assignment(Assignment::cpu(2, 0, ResourceBlock::new(0, 1), 1.0, 2.0));
        s.add_assignment(Assignment::cpu(3, 0, ResourceBlock::new(0, 1), 3.0, 4.0));

        let violations = s.audit(3, None);
        let overlaps: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::UnitOverlap)
            .collect();
        // Both short tasks clash with the long holder, not with each other.
        assert_eq!(overlaps.len(), 2);
    }

    #[test]
    fn test_audit_overlap_reported_once_per_pair() {
        let mut s = Schedule::new(4, 0);
        s.add_assignment(Assignment::cpu(1, 0, ResourceBlock::new(0, 4), 0.0, 6.0));
        s.add_assignment(Assignment::cpu(2, 0, ResourceBlock::new(0, 4), 5.0, 9.0));

        let violations = s.audit(2, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnitOverlap);
    }

    #[test]
    fn test_audit_out_of_range() {
        let mut s = Schedule::new(2, 0);
        s.add_assignment(Assignment::cpu(1, 0, ResourceBlock::new(1, 2), 0.0, 3.0));

        let violations = s.audit(1, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnitOutOfRange);
    }

    #[test]
    fn test_back_to_back_is_not_overlap() {
        let mut s = Schedule::new(1, 0);
        s.add_assignment(Assignment::cpu(1, 0, ResourceBlock::new(0, 1), 0.0, 4.0));
        s.add_assignment(Assignment::cpu(2, 0, ResourceBlock::new(0, 1), 4.0, 7.0));

        assert!(s.audit(2, None).is_empty());
    }

    #[test]
    fn test_violation_factories() {
        let v1 = Violation::bound_exceeded(10.0, 9.0);
        assert_eq!(v1.kind, ViolationKind::BoundExceeded);

        let v2 = Violation::incomplete(2, 3);
        assert_eq!(v2.kind, ViolationKind::Incomplete);

        let v3 = Violation::unit_overlap(DeviceKind::Cpu, 0, 1, 2);
        assert_eq!(v3.kind, ViolationKind::UnitOverlap);
        assert!(v3.message.contains("cpu 0"));
    }
}
