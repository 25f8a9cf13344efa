//! Analysis modules.
//!
//! Quarterly aggregation of records into a zero-filled grid.

pub mod aggregator;

pub use aggregator::*;
