//! Search orchestration module
//!
//! Fans one query out to every registered adapter concurrently, waits for
//! all of them to settle, and merges the outcomes with timing metadata.

mod executor;

pub use executor::{Aggregated, Aggregator, CapabilityCall};
