//! Provider adapters
//!
//! Defines the Adapter trait and provides a registry of the configured
//! adapters in fan-out order.

mod loader;
mod registry;
mod traits;

// Adapter implementations
pub mod bing;
pub mod brave;
pub mod duckduckgo;
pub mod google;
pub mod qwant;
pub mod wikipedia;
pub mod yahoo;

pub use loader::EngineLoader;
pub use registry::{AdapterEntry, AdapterFactory, AdapterRegistry};
pub use traits::*;
