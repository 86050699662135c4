//! Result type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upstream provider identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    DuckDuckGo,
    Qwant,
    Bing,
    Yahoo,
    Wikipedia,
    Brave,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::DuckDuckGo => "duckduckgo",
            Self::Qwant => "qwant",
            Self::Bing => "bing",
            Self::Yahoo => "yahoo",
            Self::Wikipedia => "wikipedia",
            Self::Brave => "brave",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields the normalize step needs from every hit type
pub trait Hit {
    /// Primary uniqueness key (link or url); missing keys compare as ""
    fn unique_key(&self) -> &str;

    /// Secondary uniqueness key
    fn title(&self) -> &str;

    /// Whether every required field is present
    fn is_valid(&self) -> bool;
}

/// A web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: Option<String>,
    pub content: String,
    pub provider: Provider,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        link: Option<String>,
        content: impl Into<String>,
        provider: Provider,
    ) -> Self {
        Self {
            title: title.into(),
            link,
            content: content.into(),
            provider,
        }
    }
}

impl Hit for SearchHit {
    fn unique_key(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.link.as_deref().is_some_and(|l| !l.is_empty())
            && !self.content.is_empty()
    }
}

/// An image search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHit {
    pub title: String,
    /// Page the image was found on
    pub url: Option<String>,
    pub thumbnail: String,
    /// Full-size image
    pub image: String,
    pub provider: Provider,
}

impl Hit for ImageHit {
    fn unique_key(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.url.as_deref().is_some_and(|u| !u.is_empty())
            && !self.thumbnail.is_empty()
    }
}

/// A video search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHit {
    pub title: String,
    pub url: Option<String>,
    pub thumbnail: String,
    /// Hosting site
    pub source: String,
    pub description: String,
    pub provider: Provider,
}

impl Hit for VideoHit {
    fn unique_key(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.url.as_deref().is_some_and(|u| !u.is_empty())
            && !self.thumbnail.is_empty()
    }
}

/// A news search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsHit {
    pub title: String,
    pub url: Option<String>,
    pub thumbnail: String,
    /// Publishing site
    pub source: String,
    pub description: String,
    pub provider: Provider,
}

impl Hit for NewsHit {
    fn unique_key(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    fn title(&self) -> &str {
        &self.title
    }

    /// Inline `data:` thumbnails are placeholder noise, not real images
    fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.url.as_deref().is_some_and(|u| !u.is_empty())
            && !self.thumbnail.starts_with("data:")
    }
}

/// A summary panel shown next to the hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBox {
    pub title: String,
    pub content: String,
    /// Human label of the source, e.g. "Wikipedia"
    pub source: String,
    pub link: Option<String>,
    pub provider: Provider,
}

/// Why a provider produced no usable outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Network,
    HttpStatus(u16),
    TooManyRequests,
    AccessDenied,
    Captcha,
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "Request timed out"),
            Self::Network => write!(f, "Network error"),
            Self::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            Self::TooManyRequests => write!(f, "Too many requests"),
            Self::AccessDenied => write!(f, "Access denied"),
            Self::Captcha => write!(f, "CAPTCHA required"),
            Self::Parse => write!(f, "Failed to parse response"),
        }
    }
}

/// Per-provider envelope the aggregator waits on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOutcome<T> {
    pub provider: Provider,
    pub success: bool,
    pub hits: Vec<T>,
    pub suggestion: Option<String>,
    pub knowledge_box: Option<KnowledgeBox>,
    /// Set exactly when `success` is false
    pub failure: Option<FailureKind>,
}

impl<T> AdapterOutcome<T> {
    /// Successful outcome with nothing in it
    pub fn empty(provider: Provider) -> Self {
        Self {
            provider,
            success: true,
            hits: Vec::new(),
            suggestion: None,
            knowledge_box: None,
            failure: None,
        }
    }

    pub fn with_hits(provider: Provider, hits: Vec<T>) -> Self {
        Self {
            hits,
            ..Self::empty(provider)
        }
    }

    pub fn failed(provider: Provider, failure: FailureKind) -> Self {
        Self {
            provider,
            success: false,
            hits: Vec::new(),
            suggestion: None,
            knowledge_box: None,
            failure: Some(failure),
        }
    }

    pub fn suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn knowledge_box(mut self, knowledge_box: Option<KnowledgeBox>) -> Self {
        self.knowledge_box = knowledge_box;
        self
    }
}

/// A provider left out of the merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresponsiveProvider {
    pub provider: Provider,
    pub error: FailureKind,
}

/// Consolidated answer for one aggregation call
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResponse<T> {
    pub hits: Vec<T>,
    pub suggestion: Option<String>,
    pub knowledge_box: Option<KnowledgeBox>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Human readable elapsed time, e.g. "412 ms"
    pub times: String,
    pub count: usize,
    pub unresponsive: Vec<UnresponsiveProvider>,
}

pub type ImageAggregatedResponse = AggregatedResponse<ImageHit>;
pub type VideoAggregatedResponse = AggregatedResponse<VideoHit>;
pub type NewsAggregatedResponse = AggregatedResponse<NewsHit>;

/// Consolidated autocomplete suggestions
#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<String>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub times: String,
    pub count: usize,
    pub unresponsive: Vec<UnresponsiveProvider>,
}

fn serialize_millis<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(elapsed.as_millis() as u64)
}
