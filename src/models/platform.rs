//! Processing-unit pools.
//!
//! The platform is two pools of identical units: m CPU cores and k GPUs.
//! Each unit carries only its availability frontier, the earliest time new
//! work can start on it. Interval bookkeeping belongs to the schedule; the
//! pools exist so that placement decisions stay O(1) per unit probed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device kind of a processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// An identical CPU core.
    Cpu,
    /// A GPU, always granted whole.
    Gpu,
}

impl DeviceKind {
    /// Numeric architecture id used by the flat delimited export
    /// (0 = CPU, 1 = GPU).
    pub fn arch_id(&self) -> u8 {
        match self {
            DeviceKind::Cpu => 0,
            DeviceKind::Gpu => 1,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Gpu => write!(f, "gpu"),
        }
    }
}

/// A pool of identical processing units of one device kind.
///
/// Frontiers start at t=0 and only move forward; releasing capacity is
/// impossible under the static no-preemption model.
#[derive(Debug, Clone)]
pub struct UnitPool {
    kind: DeviceKind,
    available_at: Vec<f64>,
}

impl UnitPool {
    /// Creates a pool of `size` idle units.
    pub fn new(kind: DeviceKind, size: usize) -> Self {
        Self {
            kind,
            available_at: vec![0.0; size],
        }
    }

    /// Device kind of every unit in this pool.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.available_at.len()
    }

    /// Whether the pool has no units.
    pub fn is_empty(&self) -> bool {
        self.available_at.is_empty()
    }

    /// Earliest time new work can start on `unit`.
    pub fn available_at(&self, unit: usize) -> f64 {
        self.available_at[unit]
    }

    /// Commits `unit` until `time`. Frontiers never move backwards.
    pub fn reserve_until(&mut self, unit: usize, time: f64) {
        let slot = &mut self.available_at[unit];
        *slot = slot.max(time);
    }

    /// Lowest-index unit whose frontier is still at t=0.
    pub fn first_idle(&self) -> Option<usize> {
        self.available_at.iter().position(|&t| t == 0.0)
    }

    /// Earliest time a task spanning `[start, start + width)` can begin:
    /// the maximum frontier over the block.
    pub fn block_ready(&self, start: usize, width: usize) -> f64 {
        self.available_at[start..start + width]
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Commits every unit of the block until `time`.
    pub fn reserve_block(&mut self, start: usize, width: usize, time: f64) {
        for unit in start..start + width {
            self.reserve_until(unit, time);
        }
    }
}
