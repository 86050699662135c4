//! Web server module
//!
//! Thin JSON service exposing the aggregation calls over HTTP.

mod handlers;
mod routes;
mod state;

pub use handlers::{ApiError, AutocompleteParams, SearchParams};
pub use routes::create_router;
pub use state::AppState;
