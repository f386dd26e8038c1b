//! Scheduling domain models.
//!
//! Provides the core data types for representing moldable-task scheduling
//! problems and their solutions: the instance (platform dimensions plus
//! task duration profiles), the processing-unit pools placement works
//! against, and the schedule that comes out.

mod platform;
mod schedule;
mod task;

pub use platform::{DeviceKind, UnitPool};
pub use schedule::{Assignment, ResourceBlock, Schedule, Violation, ViolationKind};
pub use task::{Instance, Task};
