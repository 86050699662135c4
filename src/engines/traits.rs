//! Adapter traits and types

use crate::network::HttpClient;
use crate::query::{Capability, Query};
use crate::results::{
    AdapterOutcome, FailureKind, ImageHit, NewsHit, Provider, SearchHit, VideoHit,
};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Errors an adapter can hit while fetching or parsing.
///
/// These never leave the adapter: [`settle`] turns them into a failed
/// [`AdapterOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("CAPTCHA detected")]
    Captcha,
    #[error("parse error: {0}")]
    Parse(String),
}

impl AdapterError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Classification reported to the aggregator
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Network,
            Self::Timeout => FailureKind::Timeout,
            Self::Status(429) => FailureKind::TooManyRequests,
            Self::Status(401) | Self::Status(403) => FailureKind::AccessDenied,
            Self::Status(code) => FailureKind::HttpStatus(*code),
            Self::Captcha => FailureKind::Captcha,
            Self::Parse(_) => FailureKind::Parse,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// HTTP GET request to be made by an adapter
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Cookies to send, in name order
    pub cookies: BTreeMap<String, String>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            cookies: BTreeMap::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a cookie
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }
}

/// HTTP response from an adapter request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json(&self) -> Result<serde_json::Value, AdapterError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the provider answered with a bot check page
    pub fn is_captcha(&self) -> bool {
        self.url.contains("/sorry/")
            || self.text.contains("unusual traffic")
            || self.text.contains("automated requests")
    }
}

/// The set of capabilities an adapter implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

const fn bit(capability: Capability) -> u8 {
    1 << capability as u8
}

impl CapabilitySet {
    pub const NONE: CapabilitySet = CapabilitySet(0);

    pub const fn of(capabilities: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < capabilities.len() {
            bits |= bit(capabilities[i]);
            i += 1;
        }
        Self(bits)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & bit(capability) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

/// Construction-time configuration shared by every adapter instance
#[derive(Clone)]
pub struct AdapterContext {
    pub client: HttpClient,
    /// Timeout for search, image, video and news requests
    pub timeout: Duration,
    /// Timeout for autocomplete requests
    pub autocomplete_timeout: Duration,
    /// Replaces the scheme and host of every provider endpoint
    pub base_url: Option<String>,
}

impl AdapterContext {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(2),
            autocomplete_timeout: Duration::from_millis(500),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeouts(mut self, timeout: Duration, autocomplete_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.autocomplete_timeout = autocomplete_timeout;
        self
    }

    /// Resolve a provider endpoint against the base URL override
    pub fn endpoint(&self, url: &str) -> String {
        rebase(url, self.base_url.as_deref())
    }

    /// Execute one request, mapping transport and status failures
    pub async fn fetch(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse, AdapterError> {
        let response = tokio::time::timeout(
            timeout,
            self.client.execute_with_timeout(request, timeout),
        )
        .await
        .map_err(|_| AdapterError::Timeout)??;

        if !response.is_success() {
            return Err(AdapterError::Status(response.status));
        }

        Ok(response)
    }
}

/// Capability contract every provider adapter implements.
///
/// Capabilities an adapter leaves out fall back to an empty successful
/// outcome; the registry also skips calling them at all.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Provider identity used to tag every outcome
    fn provider(&self) -> Provider;

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        AdapterOutcome::empty(self.provider())
    }

    async fn search_image(&self) -> AdapterOutcome<ImageHit> {
        AdapterOutcome::empty(self.provider())
    }

    async fn search_video(&self) -> AdapterOutcome<VideoHit> {
        AdapterOutcome::empty(self.provider())
    }

    async fn search_news(&self) -> AdapterOutcome<NewsHit> {
        AdapterOutcome::empty(self.provider())
    }

    async fn autocomplete(&self) -> AdapterOutcome<String> {
        AdapterOutcome::empty(self.provider())
    }
}

/// Static description of a concrete adapter type
pub trait ProviderAdapter: Adapter + Sized + 'static {
    const PROVIDER: Provider;
    const CAPABILITIES: CapabilitySet;

    /// Translate the query into provider parameters
    fn new(query: &Query, ctx: &AdapterContext) -> Self;
}

/// Turn an adapter's internal result into the outcome envelope
pub fn settle<T>(
    provider: Provider,
    capability: Capability,
    result: Result<AdapterOutcome<T>, AdapterError>,
) -> AdapterOutcome<T> {
    match result {
        Ok(outcome) => {
            debug!(
                "{} {} returned {} hits",
                provider,
                capability,
                outcome.hits.len()
            );
            outcome
        }
        Err(e) => {
            warn!("{} {} failed: {}", provider, capability, e);
            AdapterOutcome::failed(provider, e.kind())
        }
    }
}

/// Replace the scheme and host of `url` with `base`
pub fn rebase(url: &str, base: Option<&str>) -> String {
    let (Some(base), Ok(parsed)) = (base, Url::parse(url)) else {
        return url.to_string();
    };

    let mut rebased = format!("{}{}", base.trim_end_matches('/'), parsed.path());
    if let Some(query) = parsed.query() {
        rebased.push('?');
        rebased.push_str(query);
    }
    rebased
}

/// Compile a CSS selector
pub fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::parse(format!("bad selector {}: {:?}", css, e)))
}

/// The element wrapping a page's result list.
///
/// A page without it is a consent wall or a redesign, not an empty result
/// page, so it fails the outcome.
pub fn results_root<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>, AdapterError> {
    let wrapper = selector(css)?;
    document
        .select(&wrapper)
        .next()
        .ok_or_else(|| AdapterError::parse(format!("result container {} missing", css)))
}

/// Trimmed text of the first match, or "" when nothing matches
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Trimmed attribute of the first match
pub fn first_attr(element: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
}

/// String at a JSON pointer, or "" when missing
pub fn json_str(value: &serde_json::Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Suggestion lists shaped like `[query, [s1, s2, ...]]`
pub fn parse_suggestion_list(value: &serde_json::Value) -> Result<Vec<String>, AdapterError> {
    let list = value
        .get(1)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AdapterError::parse("suggestion list missing"))?;

    Ok(list
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_set() {
        let set = CapabilitySet::of(&[Capability::Search, Capability::Autocomplete]);
        assert!(set.contains(Capability::Search));
        assert!(set.contains(Capability::Autocomplete));
        assert!(!set.contains(Capability::SearchNews));
        assert_eq!(set.iter().count(), 2);
        assert!(!CapabilitySet::NONE.contains(Capability::Search));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(
            rebase("https://api.qwant.com/v3/search/web?x=1", Some("http://127.0.0.1:9000/")),
            "http://127.0.0.1:9000/v3/search/web?x=1"
        );
        assert_eq!(
            rebase("https://www.bing.com/search", None),
            "https://www.bing.com/search"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(AdapterError::Status(429).kind(), FailureKind::TooManyRequests);
        assert_eq!(AdapterError::Status(403).kind(), FailureKind::AccessDenied);
        assert_eq!(AdapterError::Status(500).kind(), FailureKind::HttpStatus(500));
        assert_eq!(AdapterError::parse("x").kind(), FailureKind::Parse);
    }

    #[test]
    fn test_settle_failure_is_tagged() {
        let outcome: AdapterOutcome<SearchHit> =
            settle(Provider::Yahoo, Capability::Search, Err(AdapterError::Timeout));
        assert!(!outcome.success);
        assert_eq!(outcome.provider, Provider::Yahoo);
        assert_eq!(outcome.failure, Some(FailureKind::Timeout));
    }

    #[test]
    fn test_parse_suggestion_list() {
        let value = json!(["rust", ["rust lang", "rust book", 3]]);
        assert_eq!(
            parse_suggestion_list(&value).unwrap(),
            vec!["rust lang", "rust book"]
        );
        assert!(parse_suggestion_list(&json!({"x": 1})).is_err());
    }

    #[test]
    fn test_results_root() {
        let page = Html::parse_document(r#"<div id="links"><div class="result"></div></div>"#);
        assert!(results_root(&page, "#links").is_ok());

        let consent = Html::parse_document("<form action=\"/consent\">Before you continue</form>");
        let err = results_root(&consent, "#links").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_json_str() {
        let value = json!({"a": {"b": "c"}});
        assert_eq!(json_str(&value, "/a/b"), "c");
        assert_eq!(json_str(&value, "/a/missing"), "");
    }
}
