//! Result model and merge engine
//!
//! Defines the normalized hit types every adapter produces and the
//! container that folds adapter outcomes into one response.

mod container;
mod types;

pub use container::{dedup_by, format_elapsed, normalize, ResultContainer};
pub use types::*;
