//! Dataset loading.
//!
//! This module reads the static deal snapshot into an immutable
//! [`DealTable`](crate::models::DealTable).

pub mod snapshot;

pub use snapshot::{load_deals, LoadError};
