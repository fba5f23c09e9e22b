//! Metric names and labels for plinth.
//!
//! Recording goes through the `metrics` crate facade, so nothing is collected
//! until the embedding application installs a recorder.
//!
//! ```rust,ignore
//! use plinth_metrics::{counter, discovery};
//!
//! counter!(discovery::PACKS_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, histogram};
