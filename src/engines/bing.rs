//! Bing adapter (web search only)

use super::traits::*;
use crate::locales::Locale;
use crate::query::{Capability, Query, SafeSearch};
use crate::results::{AdapterOutcome, Provider, SearchHit};
use async_trait::async_trait;
use base64::Engine as _;
use scraper::Html;

const SEARCH_URL: &str = "https://www.bing.com/search";

/// Bing query text with the language operator, e.g. `language:DE rust`
pub fn localized_query(text: &str, locale: Locale) -> String {
    format!("language:{} {}", locale.language().to_uppercase(), text)
}

/// Value of the `ADLT` field in the `SRCHHPGUSR` cookie
pub fn adult_param(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::Off => "OFF",
        SafeSearch::Medium => "MODERATE",
        SafeSearch::High => "STRICT",
    }
}

/// Bing adapter instance for one query
pub struct Bing {
    ctx: AdapterContext,
    query: String,
    first: u32,
    adult: &'static str,
}

impl ProviderAdapter for Bing {
    const PROVIDER: Provider = Provider::Bing;
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Search]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        Self {
            ctx: ctx.clone(),
            query: localized_query(query.text(), query.locale()),
            first: query.offset(10).saturating_add(1),
            adult: adult_param(query.safesearch()),
        }
    }
}

impl Bing {
    fn request(&self) -> EngineRequest {
        EngineRequest::get(self.ctx.endpoint(SEARCH_URL))
            .param("q", &self.query)
            .param("first", self.first.to_string())
            .cookie("SRCHHPGUSR", format!("ADLT={}", self.adult))
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        let response = self.ctx.fetch(self.request(), self.ctx.timeout).await?;
        parse_web(&response.text)
    }
}

#[async_trait]
impl Adapter for Bing {
    fn provider(&self) -> Provider {
        Provider::Bing
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Bing, Capability::Search, self.fetch_web().await)
    }
}

/// Decode Bing's `https://www.bing.com/ck/a?...&u=a1<base64>` tracking links.
///
/// Anything that is not a tracking link is returned unchanged.
pub fn decode_tracking_url(url: &str) -> String {
    if !url.starts_with("https://www.bing.com/ck/a?") {
        return url.to_string();
    }

    let Ok(parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    parsed
        .query_pairs()
        .find(|(k, _)| k == "u")
        .and_then(|(_, encoded)| {
            let payload = encoded.strip_prefix("a1")?.trim_end_matches('=').to_string();
            base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(payload.as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
        .unwrap_or_else(|| url.to_string())
}

fn parse_web(html: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, "#b_results")?;

    let result_selector = selector("li.b_algo")?;
    let title_selector = selector("h2")?;
    let link_selector = selector("h2 a")?;
    let attribution_selector = selector("div.b_attribution")?;
    let snippet_selector = selector("p")?;

    let hits = root
        .select(&result_selector)
        .map(|element| {
            // Fall back to the displayed attribution when the anchor is relative
            let link = first_attr(element, &link_selector, "href")
                .filter(|href| href.starts_with("http"))
                .map(|href| decode_tracking_url(&href))
                .or_else(|| {
                    Some(first_text(element, &attribution_selector)).filter(|t| !t.is_empty())
                });

            SearchHit::new(
                first_text(element, &title_selector),
                link,
                first_text(element, &snippet_selector),
                Provider::Bing,
            )
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Bing, hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <ol id="b_results">
          <li class="b_algo">
            <h2><a href="https://www.bing.com/ck/a?!&amp;p=abc&amp;u=a1aHR0cHM6Ly93d3cucnVzdC1sYW5nLm9yZy8&amp;ntb=1">Rust Programming Language</a></h2>
            <div class="b_attribution"><cite>https://www.rust-lang.org</cite></div>
            <p>A language empowering everyone.</p>
          </li>
          <li class="b_algo">
            <h2><a href="/relative">Crates</a></h2>
            <div class="b_attribution"><cite>https://crates.io</cite></div>
            <p>The Rust package registry.</p>
          </li>
        </ol>
    "#;

    #[test]
    fn test_translation() {
        assert_eq!(localized_query("rust", Locale::DeDe), "language:DE rust");
        assert_eq!(localized_query("rust", Locale::En), "language:EN rust");
        assert_eq!(adult_param(SafeSearch::Medium), "MODERATE");
    }

    #[test]
    fn test_request_paging() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap());
        let query = Query::new("rust", 2, SafeSearch::Off, Locale::FrFr).unwrap();
        let request = Bing::new(&query, &ctx).request();

        assert!(request.url.contains("bing.com"));
        assert_eq!(request.params.get("first").map(String::as_str), Some("11"));
        assert_eq!(request.params.get("q").map(String::as_str), Some("language:FR rust"));
        assert_eq!(
            request.cookies.get("SRCHHPGUSR").map(String::as_str),
            Some("ADLT=OFF")
        );
    }

    #[test]
    fn test_decode_tracking_url() {
        let url = "https://www.bing.com/ck/a?!&p=abc&u=a1aHR0cHM6Ly93d3cucnVzdC1sYW5nLm9yZy8&ntb=1";
        assert_eq!(decode_tracking_url(url), "https://www.rust-lang.org/");
        assert_eq!(
            decode_tracking_url("https://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_parse_web() {
        let outcome = parse_web(PAGE).unwrap();

        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.hits[0].title, "Rust Programming Language");
        assert_eq!(outcome.hits[0].link.as_deref(), Some("https://www.rust-lang.org/"));
        assert_eq!(outcome.hits[1].link.as_deref(), Some("https://crates.io"));
        assert_eq!(outcome.hits[1].content, "The Rust package registry.");
        assert!(outcome.suggestion.is_none());
    }

    #[test]
    fn test_page_without_result_list_is_parse_failure() {
        let challenge = "<html><body><div id=\"challenge\">Verify you are human</div></body></html>";
        assert!(matches!(parse_web(challenge), Err(AdapterError::Parse(_))));

        let empty = parse_web(r#"<ol id="b_results"><li class="b_no">No results</li></ol>"#).unwrap();
        assert!(empty.success && empty.hits.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_capabilities_are_empty() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap())
            .with_base_url("http://127.0.0.1:9");
        let bing = Bing::new(&Query::simple("rust").unwrap(), &ctx);

        let images = bing.search_image().await;
        let suggestions = bing.autocomplete().await;

        assert!(images.success && images.hits.is_empty());
        assert!(suggestions.success && suggestions.hits.is_empty());
        assert!(!Bing::CAPABILITIES.contains(Capability::SearchNews));
    }

    #[tokio::test]
    async fn test_search_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "language:EN rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = Bing::new(&Query::simple("rust").unwrap(), &ctx).search().await;

        assert!(outcome.success);
        assert_eq!(outcome.hits.len(), 2);
        assert!(outcome.hits.iter().all(|h| h.provider == Provider::Bing));
    }
}
