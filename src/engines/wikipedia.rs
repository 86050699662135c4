//! Wikipedia adapter
//!
//! Contributes only a knowledge box to web search, taken from the REST
//! page summary of the article named by the query.

use super::traits::*;
use crate::locales::Locale;
use crate::query::{Capability, Query};
use crate::results::{AdapterOutcome, KnowledgeBox, Provider, SearchHit};
use async_trait::async_trait;
use serde::Deserialize;

/// Page summary URL on the wiki matching the locale's language
pub fn summary_url(text: &str, locale: Locale) -> String {
    format!(
        "https://{}.wikipedia.org/api/rest_v1/page/summary/{}",
        locale.language(),
        urlencoding::encode(text)
    )
}

#[derive(Debug, Deserialize)]
struct Summary {
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: Option<String>,
}

/// Wikipedia adapter instance for one query
pub struct Wikipedia {
    ctx: AdapterContext,
    url: String,
}

impl ProviderAdapter for Wikipedia {
    const PROVIDER: Provider = Provider::Wikipedia;
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Search]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        Self {
            ctx: ctx.clone(),
            url: summary_url(query.text(), query.locale()),
        }
    }
}

impl Wikipedia {
    async fn fetch_summary(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        let request = EngineRequest::get(self.ctx.endpoint(&self.url))
            .header("Accept", crate::network::ACCEPT_JSON);

        match self.ctx.fetch(request, self.ctx.timeout).await {
            Ok(response) => parse_summary(&response.text),
            // No article by that name
            Err(AdapterError::Status(404)) => Ok(AdapterOutcome::empty(Provider::Wikipedia)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Adapter for Wikipedia {
    fn provider(&self) -> Provider {
        Provider::Wikipedia
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Wikipedia, Capability::Search, self.fetch_summary().await)
    }
}

fn parse_summary(text: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let summary: Summary = serde_json::from_str(text)?;

    let knowledge_box = (!summary.extract.trim().is_empty()).then(|| KnowledgeBox {
        title: summary.title,
        content: summary.extract,
        source: "Wikipedia".to_string(),
        link: summary
            .content_urls
            .and_then(|urls| urls.desktop)
            .and_then(|desktop| desktop.page),
        provider: Provider::Wikipedia,
    });

    Ok(AdapterOutcome::empty(Provider::Wikipedia).knowledge_box(knowledge_box))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUMMARY: &str = r#"{
        "type": "standard",
        "title": "Rust (programming language)",
        "extract": "Rust is a general-purpose programming language.",
        "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Rust_(programming_language)"}}
    }"#;

    #[test]
    fn test_summary_url() {
        assert_eq!(
            summary_url("rust lang", Locale::DeDe),
            "https://de.wikipedia.org/api/rest_v1/page/summary/rust%20lang"
        );
        assert!(summary_url("x", Locale::EnUs).starts_with("https://en.wikipedia.org/"));
    }

    #[test]
    fn test_parse_summary() {
        let outcome = parse_summary(SUMMARY).unwrap();

        assert!(outcome.hits.is_empty());
        let kb = outcome.knowledge_box.unwrap();
        assert_eq!(kb.title, "Rust (programming language)");
        assert_eq!(kb.source, "Wikipedia");
        assert_eq!(
            kb.link.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[test]
    fn test_empty_extract_has_no_knowledge_box() {
        let outcome = parse_summary(r#"{"title": "Nothing", "extract": ""}"#).unwrap();
        assert!(outcome.success);
        assert!(outcome.knowledge_box.is_none());
    }

    #[test]
    fn test_capabilities() {
        assert!(Wikipedia::CAPABILITIES.contains(Capability::Search));
        assert!(!Wikipedia::CAPABILITIES.contains(Capability::Autocomplete));
    }

    #[tokio::test]
    async fn test_search_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SUMMARY))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = Wikipedia::new(&Query::simple("Rust").unwrap(), &ctx)
            .search()
            .await;

        assert!(outcome.success);
        assert!(outcome.knowledge_box.is_some());
    }

    #[tokio::test]
    async fn test_missing_article_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = Wikipedia::new(&Query::simple("Qwxzy").unwrap(), &ctx)
            .search()
            .await;

        assert!(outcome.success);
        assert!(outcome.knowledge_box.is_none());
    }
}
