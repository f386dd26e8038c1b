//! Static scheduling of independent moldable tasks on hybrid platforms.
//!
//! Targets machines with `m` identical CPU cores and `k` identical GPUs.
//! Each task declares a CPU duration for every core count 1..=m and a
//! single GPU duration; a schedule assigns every task to one device, one
//! contiguous resource block, and one time interval, with no preemption
//! and no migration.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Instance`, `UnitPool`,
//!   `Schedule`, `Assignment`, `Violation`
//! - **`priority`**: Task ordering policies for the greedy scheduler
//! - **`scheduler`**: The two construction engines, greedy EFT and
//!   classification backfill
//! - **`validation`**: Input integrity checks for instances and solver
//!   solutions
//! - **`io`**: YAML input parsing, CSV and JSON schedule output
//!
//! # References
//!
//! - Bleuse et al. (2017), "Scheduling Independent Moldable Tasks on
//!   Multi-Cores with GPUs", IEEE TPDS 28(9)
//! - Topcuoglu et al. (2002), "Performance-Effective and Low-Complexity
//!   Task Scheduling for Heterogeneous Computing", IEEE TPDS 13(3)
//! - Graham (1969), "Bounds on Multiprocessing Timing Anomalies"

pub mod error;
pub mod io;
pub mod models;
pub mod priority;
pub mod scheduler;
pub mod validation;

pub use error::{SchedError, SchedResult};
