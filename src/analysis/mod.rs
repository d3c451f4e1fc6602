//! Analysis modules.
//!
//! The aggregation pipeline: pure functions from the deal table to
//! the summary tables shown on the dashboard.

pub mod aggregator;

pub use aggregator::*;
