//! Schedule construction engines.
//!
//! Two ways to turn an instance into a schedule:
//!
//! - [`eft::build_schedule`] is a greedy earliest-finish-time list
//!   scheduler. It needs nothing beyond the instance, works on any
//!   platform shape, and gives no makespan guarantee.
//! - [`backfill::build_schedule`] packs a task classification computed by
//!   an external load-balancing solver and guarantees a makespan of at
//!   most 3/2 of the solver's load bound λ.
//!
//! # References
//!
//! - Topcuoglu et al. (2002), "Performance-Effective and Low-Complexity
//!   Task Scheduling for Heterogeneous Computing", IEEE TPDS 13(3)
//! - Bleuse et al. (2017), "Scheduling Independent Moldable Tasks on
//!   Multi-Cores with GPUs", IEEE TPDS 28(9)

pub mod backfill;
pub mod eft;

pub use backfill::Classification;
pub use eft::EftConfig;
