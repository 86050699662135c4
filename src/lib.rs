//! Scout: a metasearch aggregator
//!
//! Fans one query out to several independent web search providers at once,
//! waits for every provider to settle, and merges what comes back into a
//! single deduplicated response. Providers that fail or time out are left
//! out of the merge and reported as unresponsive; they never fail the call.

pub mod config;
pub mod engines;
pub mod locales;
pub mod metrics;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::{Adapter, AdapterRegistry};
pub use query::{Capability, Query, SafeSearch};
pub use results::{AggregatedResponse, AutocompleteResponse, ResultContainer};
pub use search::{Aggregated, Aggregator};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
