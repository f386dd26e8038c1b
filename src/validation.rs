//! Input validation for scheduling instances and solver solutions.
//!
//! Checks structural integrity before any engine runs. Detects:
//! - Platforms with no processing units at all
//! - Duplicate task IDs
//! - CPU profiles whose length differs from the core count
//! - CPU profiles that grow when cores are added
//! - Non-positive or non-finite durations
//! - Solution labels for unknown tasks or outside the class range
//!
//! All problems are collected and reported together rather than one at
//! a time.

use crate::models::Instance;
use crate::scheduler::Classification;
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The platform has neither cores nor GPUs.
    NoResources,
    /// Two tasks share the same ID.
    DuplicateId,
    /// A CPU profile does not cover exactly 1..=m cores.
    ProfileLength,
    /// A CPU profile gets slower when cores are added.
    ProfileNotMonotonic,
    /// A duration is zero, negative, or not finite.
    InvalidDuration,
    /// A solution labels a task the instance does not contain.
    UnknownTask,
    /// A class label is outside 1..=7.
    ClassLabel,
    /// The declared work of a solution is negative or not finite.
    InvalidWork,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling instance.
///
/// Checks:
/// 1. At least one processing unit exists
/// 2. No duplicate task IDs
/// 3. Every CPU profile has exactly one entry per core count 1..=m
/// 4. Profiles are non-increasing in the core count
/// 5. All durations are positive and finite
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(instance: &Instance) -> ValidationResult {
    let mut errors = Vec::new();

    if instance.cores == 0 && instance.gpus == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoResources,
            "platform has neither cores nor GPUs",
        ));
    }

    let mut seen = HashSet::new();
    for task in instance.tasks() {
        if !seen.insert(task.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate task ID: {}", task.id),
            ));
        }

        if task.cpu_profile.len() != instance.cores {
            errors.push(ValidationError::new(
                ValidationErrorKind::ProfileLength,
                format!(
                    "task {} has {} CPU durations for {} cores",
                    task.id,
                    task.cpu_profile.len(),
                    instance.cores
                ),
            ));
        }

        for pair in task.cpu_profile.windows(2) {
            if pair[1] > pair[0] {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ProfileNotMonotonic,
                    format!(
                        "task {} slows down from {} to {} when given one more core",
                        task.id, pair[0], pair[1]
                    ),
                ));
                break;
            }
        }

        for &duration in &task.cpu_profile {
            if !(duration.is_finite() && duration > 0.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDuration,
                    format!("task {} has a CPU duration of {}", task.id, duration),
                ));
                break;
            }
        }

        if !(task.gpu_duration.is_finite() && task.gpu_duration > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("task {} has a GPU duration of {}", task.id, task.gpu_duration),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a solver solution against the instance it labels.
///
/// Checks:
/// 1. The declared work is finite and not negative
/// 2. Every labeled task exists in the instance
/// 3. Every label is a class in 1..=7
///
/// A task the solution leaves unlabeled is not an error here; the
/// backfill engine reports it as an incomplete schedule.
pub fn validate_solution(instance: &Instance, classification: &Classification) -> ValidationResult {
    let mut errors = Vec::new();

    let work = classification.work();
    if !work.is_finite() || work < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWork,
            format!("declared work is {work}"),
        ));
    }

    let mut labeled: Vec<(u32, u8)> = classification.iter().collect();
    labeled.sort_unstable();
    for (task_id, label) in labeled {
        if instance.task(task_id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTask,
                format!("solution labels unknown task {task_id}"),
            ));
        }
        if !(1..=7).contains(&label) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ClassLabel,
                format!("task {task_id} carries class {label}, expected 1..=7"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
