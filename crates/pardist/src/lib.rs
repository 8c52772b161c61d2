//! Parallel index distribution for garbage collection phases.
//!
//! `pardist` assigns each index of a range `[0, count)` to exactly one of
//! several concurrently running worker threads — no duplicates, no gaps —
//! with minimal cross-thread contention. It is the work-distribution
//! primitive of a stop-the-world or concurrent GC phase: the phase driver
//! picks a count, constructs one [`IndexDistributor`], and every worker
//! thread drains it with [`IndexDistributor::do_indices`].
//!
//! # Features
//!
//! - **Two claiming strategies**: a single shared cursor
//!   ([`DistributionStrategy::Sequential`]) and a hierarchical claim tree
//!   ([`DistributionStrategy::ClaimTree`]) that spreads concurrent claims
//!   across independent sub-ranges at high worker counts
//! - **Lock-free claiming**: every claim is a bounded sequence of atomic
//!   operations; no worker ever blocks waiting on another
//! - **Strategy-aware sizing**: [`IndexDistributor::get_count`] rounds a
//!   requested count up to one the active strategy can tile cleanly
//!
//! # Quick Start
//!
//! ```
//! use pardist::IndexDistributor;
//!
//! // Round the desired count up to one the active strategy supports, and
//! // size any index-keyed storage with it.
//! let count = IndexDistributor::get_count(1000);
//! let distributor = IndexDistributor::new(count);
//!
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| {
//!             distributor.do_indices(|index| {
//!                 // process one index
//!                 let _ = index;
//!             });
//!         });
//!     }
//! });
//! ```
//!
//! # Strategy Selection
//!
//! The strategy is process-wide by default ([`set_default_config`], resolved
//! once by the embedding runtime) and overridable per instance, so both
//! strategies are testable side by side:
//!
//! ```
//! use pardist::{DistributionStrategy, DistributorConfig, IndexDistributor};
//!
//! let config = DistributorConfig::with_strategy(DistributionStrategy::Sequential);
//! let distributor = IndexDistributor::with_config(17, &config);
//! distributor.do_indices(|index| {
//!     let _ = index;
//! });
//! ```
//!
//! # Thread Safety
//!
//! An [`IndexDistributor`] is `Sync`: workers share one instance by
//! reference for the lifetime of a pass. A distributor covers exactly one
//! pass over one fixed count — construct a new instance per phase.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod claim_tree;
mod config;
mod distributor;
mod sequential;
mod trace;

pub use config::{
    default_config, set_default_config, DistributionStrategy, DistributorConfig, DEFAULT_FAN_OUT,
    DEFAULT_LEAF_COUNT,
};
pub use distributor::IndexDistributor;
