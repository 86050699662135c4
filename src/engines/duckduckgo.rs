//! DuckDuckGo adapter
//!
//! Web search scrapes the no-script HTML endpoint, which also carries the
//! "did you mean" correction. Autocomplete uses the `ac` list endpoint.

use super::traits::*;
use crate::locales::Locale;
use crate::query::{Capability, Query, SafeSearch};
use crate::results::{AdapterOutcome, Provider, SearchHit};
use async_trait::async_trait;
use scraper::Html;
use url::Url;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html";
const AUTOCOMPLETE_URL: &str = "https://ac.duckduckgo.com/ac/";

/// DuckDuckGo region code: `region-lang`, or `lang-lang` for bare languages
pub fn region_param(locale: Locale) -> String {
    let lang = locale.language();
    match locale.region() {
        Some(region) => format!("{}-{}", region.to_lowercase(), lang),
        None => format!("{}-{}", lang, lang),
    }
}

/// DuckDuckGo `kp` parameter
pub fn safe_param(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::Off => "-2",
        SafeSearch::Medium => "-1",
        SafeSearch::High => "1",
    }
}

/// DuckDuckGo adapter instance for one query
pub struct DuckDuckGo {
    ctx: AdapterContext,
    query: String,
    kl: String,
    kp: &'static str,
    offset: u32,
}

impl ProviderAdapter for DuckDuckGo {
    const PROVIDER: Provider = Provider::DuckDuckGo;
    const CAPABILITIES: CapabilitySet =
        CapabilitySet::of(&[Capability::Search, Capability::Autocomplete]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        Self {
            ctx: ctx.clone(),
            query: query.text().to_string(),
            kl: region_param(query.locale()),
            kp: safe_param(query.safesearch()),
            offset: query.offset(30),
        }
    }
}

impl DuckDuckGo {
    fn request(&self) -> EngineRequest {
        let mut request = EngineRequest::get(self.ctx.endpoint(SEARCH_URL))
            .param("q", &self.query)
            .param("kl", &self.kl)
            .param("kp", self.kp);
        if self.offset > 0 {
            request = request.param("s", self.offset.to_string());
        }
        request
    }

    fn autocomplete_request(&self) -> EngineRequest {
        EngineRequest::get(self.ctx.endpoint(AUTOCOMPLETE_URL))
            .param("q", &self.query)
            .param("type", "list")
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        let response = self.ctx.fetch(self.request(), self.ctx.timeout).await?;
        parse_web(&response.text)
    }

    async fn fetch_suggestions(&self) -> Result<AdapterOutcome<String>, AdapterError> {
        let response = self
            .ctx
            .fetch(self.autocomplete_request(), self.ctx.autocomplete_timeout)
            .await?;
        let suggestions = parse_suggestion_list(&response.json()?)?;
        Ok(AdapterOutcome::with_hits(Provider::DuckDuckGo, suggestions))
    }
}

#[async_trait]
impl Adapter for DuckDuckGo {
    fn provider(&self) -> Provider {
        Provider::DuckDuckGo
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::DuckDuckGo, Capability::Search, self.fetch_web().await)
    }

    async fn autocomplete(&self) -> AdapterOutcome<String> {
        settle(
            Provider::DuckDuckGo,
            Capability::Autocomplete,
            self.fetch_suggestions().await,
        )
    }
}

/// Resolve `//duckduckgo.com/l/?uddg=<target>` redirects
pub fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .filter(|u| u.path() == "/l/")
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

fn parse_web(html: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, "#links")?;

    let result_selector = selector("div.result:not(.result--ad)")?;
    let title_selector = selector("h2.result__title")?;
    let link_selector = selector("a.result__a, a.result__url")?;
    let snippet_selector = selector("a.result__snippet")?;
    let suggestion_selector = selector("div#did_you_mean a")?;

    let suggestion = document
        .select(&suggestion_selector)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string());

    let hits = root
        .select(&result_selector)
        .map(|element| {
            SearchHit::new(
                first_text(element, &title_selector),
                first_attr(element, &link_selector, "href").map(|href| unwrap_redirect(&href)),
                first_text(element, &snippet_selector),
                Provider::DuckDuckGo,
            )
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::DuckDuckGo, hits).suggestion(suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"
        <div id="did_you_mean"><a href="/html?q=rust">rust</a></div>
        <div id="links" class="results">
        <div class="result results_links">
          <h2 class="result__title"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=x">Rust</a></h2>
          <a class="result__snippet" href="#">Fast, reliable, productive.</a>
        </div>
        <div class="result result--ad">
          <h2 class="result__title"><a class="result__a" href="https://ads.example">Ad</a></h2>
          <a class="result__snippet" href="#">Buy now.</a>
        </div>
        <div class="result">
          <h2 class="result__title"><a class="result__a" href="https://docs.rs/">Docs.rs</a></h2>
          <a class="result__snippet" href="#">Documentation host.</a>
        </div>
        </div>
    "##;

    #[test]
    fn test_region_param() {
        assert_eq!(region_param(Locale::EnUs), "us-en");
        assert_eq!(region_param(Locale::DeDe), "de-de");
        assert_eq!(region_param(Locale::Fr), "fr-fr");
        assert_eq!(safe_param(SafeSearch::High), "1");
    }

    #[test]
    fn test_request_offset() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap());
        let first = DuckDuckGo::new(&Query::simple("rust").unwrap(), &ctx).request();
        assert!(!first.params.contains_key("s"));

        let query = Query::new("rust", 3, SafeSearch::Off, Locale::EnGb).unwrap();
        let third = DuckDuckGo::new(&query, &ctx).request();
        assert_eq!(third.params.get("s").map(String::as_str), Some("60"));
        assert_eq!(third.params.get("kl").map(String::as_str), Some("gb-en"));
        assert_eq!(third.params.get("kp").map(String::as_str), Some("-2"));
    }

    #[test]
    fn test_parse_web() {
        let outcome = parse_web(PAGE).unwrap();

        assert_eq!(outcome.suggestion.as_deref(), Some("rust"));
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.hits[0].link.as_deref(), Some("https://www.rust-lang.org/"));
        assert_eq!(outcome.hits[0].content, "Fast, reliable, productive.");
        assert_eq!(outcome.hits[1].title, "Docs.rs");
    }

    #[test]
    fn test_parse_without_suggestion() {
        let outcome = parse_web(r#"<div id="links" class="results"></div>"#).unwrap();
        assert!(outcome.success);
        assert!(outcome.hits.is_empty());
        assert!(outcome.suggestion.is_none());
    }

    #[test]
    fn test_page_without_result_list_is_parse_failure() {
        let anomaly = "<html><body><div class=\"anomaly-modal\">Select all squares</div></body></html>";
        assert!(matches!(parse_web(anomaly), Err(AdapterError::Parse(_))));
    }

    #[tokio::test]
    async fn test_autocomplete_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ac/"))
            .and(query_param("type", "list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"["do",["dog","door"]]"#),
            )
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = DuckDuckGo::new(&Query::simple("do").unwrap(), &ctx)
            .autocomplete()
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.hits, vec!["dog", "door"]);
    }

    #[tokio::test]
    async fn test_malformed_autocomplete_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = DuckDuckGo::new(&Query::simple("do").unwrap(), &ctx)
            .autocomplete()
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.failure, Some(crate::results::FailureKind::Parse));
    }
}
