//! Query model
//!
//! A [`Query`] is built once per aggregation call from the inbound parameters
//! and handed unchanged to every adapter in the registry.

use crate::locales::{Locale, UnknownLocale};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors raised while validating inbound parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query text must not be empty")]
    EmptyQuery,
    #[error("page must be 1 or greater, got {0}")]
    InvalidPage(u32),
    #[error("page {page} is past the last page ({max_page})")]
    PageTooLarge { page: u32, max_page: u32 },
    #[error("unknown safe search level: {0}")]
    UnknownSafeSearch(String),
    #[error(transparent)]
    UnknownLocale(#[from] UnknownLocale),
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

/// Safe search level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    Off,
    Medium,
    High,
}

impl FromStr for SafeSearch {
    type Err = QueryError;

    /// Accepts names (`off`, `medium`, `high`) and levels (`0`, `1`, `2`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "medium" | "moderate" | "1" => Ok(Self::Medium),
            "high" | "strict" | "2" => Ok(Self::High),
            _ => Err(QueryError::UnknownSafeSearch(s.to_string())),
        }
    }
}

/// A kind of search an adapter may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Search,
    SearchImage,
    SearchVideo,
    SearchNews,
    Autocomplete,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Search,
        Capability::SearchImage,
        Capability::SearchVideo,
        Capability::SearchNews,
        Capability::Autocomplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::SearchImage => "search_image",
            Self::SearchVideo => "search_video",
            Self::SearchNews => "search_news",
            Self::Autocomplete => "autocomplete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" | "web" => Ok(Self::Search),
            "search_image" | "images" | "image" => Ok(Self::SearchImage),
            "search_video" | "videos" | "video" => Ok(Self::SearchVideo),
            "search_news" | "news" => Ok(Self::SearchNews),
            "autocomplete" | "suggest" => Ok(Self::Autocomplete),
            _ => Err(QueryError::UnknownCapability(s.to_string())),
        }
    }
}

/// Immutable per-request search input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    text: String,
    page: u32,
    safesearch: SafeSearch,
    locale: Locale,
}

impl Query {
    /// Validate and build a query
    pub fn new(
        text: impl Into<String>,
        page: u32,
        safesearch: SafeSearch,
        locale: Locale,
    ) -> Result<Self, QueryError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if page < 1 {
            return Err(QueryError::InvalidPage(page));
        }

        Ok(Self {
            text,
            page,
            safesearch,
            locale,
        })
    }

    /// Query with page 1, default safe search and default locale
    pub fn simple(text: impl Into<String>) -> Result<Self, QueryError> {
        Self::new(text, 1, SafeSearch::default(), Locale::default())
    }

    /// Same text with everything else pinned to the defaults
    pub fn for_autocomplete(&self) -> Self {
        Self {
            text: self.text.clone(),
            page: 1,
            safesearch: SafeSearch::default(),
            locale: Locale::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn safesearch(&self) -> SafeSearch {
        self.safesearch
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Zero-based offset for providers paging by `per_page` results.
    ///
    /// Saturates at `u32::MAX` for pages past what any provider serves.
    pub fn offset(&self, per_page: u32) -> u32 {
        (self.page - 1).saturating_mul(per_page)
    }
}
