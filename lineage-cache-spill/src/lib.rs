//! On-disk half of residency (C3, C6): a [`LocalFileUtils`] implementation
//! over `std::fs`, its adaptive bandwidth estimator, and a concrete
//! `bincode`-over-`serde` matrix wire format.
//!
//! This crate plays the role `foyer-storage` plays for `foyer`: it is the
//! only place in the workspace that touches a filesystem. `lineage-cache-core`
//! depends only on the `LocalFileUtils`/`BandwidthEstimator` traits from
//! `lineage-cache-common`; this crate supplies the one real implementation a
//! host runtime would use.

pub mod bandwidth;
pub mod matrix;
pub mod store;

pub use bandwidth::AdaptiveBandwidthEstimator;
pub use matrix::Matrix;
pub use store::{process_unique_dir, DiskSpillStore};
