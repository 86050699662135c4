//! HTTP networking module
//!
//! Provides the HTTP client every provider adapter sends its request through.

mod client;
mod user_agent;

pub use client::HttpClient;
pub use user_agent::{
    accept_language, desktop_user_agent, ACCEPT_HTML, ACCEPT_JSON, DESKTOP_USER_AGENT,
    LEGACY_USER_AGENT,
};
