//! Google adapter
//!
//! Web, image, video and news search scrape the basic HTML pages; the image,
//! video and news pages are requested with a legacy user agent so Google
//! serves markup that does not need scripts. Autocomplete uses the JSON
//! suggest endpoint.

use super::traits::*;
use crate::locales::Locale;
use crate::network::{accept_language, LEGACY_USER_AGENT};
use crate::query::{Capability, Query, SafeSearch};
use crate::results::{AdapterOutcome, ImageHit, NewsHit, Provider, SearchHit, VideoHit};
use async_trait::async_trait;
use scraper::Html;
use url::Url;

const SEARCH_URL: &str = "https://www.google.com/search";
const AUTOCOMPLETE_URL: &str = "https://suggestqueries.google.com/complete/search";
/// Wrapper of the result list on the regular and the basic HTML pages
const RESULTS_ROOT: &str = "#search, #main";

/// Google `safe` parameter
pub fn safe_param(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::Off => "off",
        SafeSearch::Medium => "medium",
        SafeSearch::High => "high",
    }
}

/// Google `lr` and `hl` parameters, e.g. `("lang_de", "de")`
pub fn locale_params(locale: Locale) -> (String, String) {
    let lang = locale.language();
    (format!("lang_{}", lang), lang.to_string())
}

/// Google adapter instance for one query
pub struct Google {
    ctx: AdapterContext,
    query: String,
    locale: Locale,
    lr: String,
    hl: String,
    safe: &'static str,
    start: u32,
}

impl ProviderAdapter for Google {
    const PROVIDER: Provider = Provider::Google;
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[
        Capability::Search,
        Capability::SearchImage,
        Capability::SearchVideo,
        Capability::SearchNews,
        Capability::Autocomplete,
    ]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        let (lr, hl) = locale_params(query.locale());
        Self {
            ctx: ctx.clone(),
            query: query.text().to_string(),
            locale: query.locale(),
            lr,
            hl,
            safe: safe_param(query.safesearch()),
            start: query.offset(10),
        }
    }
}

impl Google {
    /// Request for the result page; `tbm` selects images, videos or news
    fn request(&self, tbm: Option<&str>) -> EngineRequest {
        let mut request = EngineRequest::get(self.ctx.endpoint(SEARCH_URL))
            .param("q", &self.query)
            .param("ie", "utf8")
            .param("oe", "utf8")
            .param("safe", self.safe)
            .param("start", self.start.to_string())
            .param("lr", &self.lr)
            .param("hl", &self.hl)
            .header("Accept-Language", accept_language(self.locale));

        if let Some(tbm) = tbm {
            request = request
                .param("tbm", tbm)
                .header("User-Agent", LEGACY_USER_AGENT);
        }
        request
    }

    fn autocomplete_request(&self) -> EngineRequest {
        EngineRequest::get(self.ctx.endpoint(AUTOCOMPLETE_URL))
            .param("client", "firefox")
            .param("q", &self.query)
            .param("hl", &self.hl)
    }

    async fn fetch_page(&self, tbm: Option<&str>) -> Result<String, AdapterError> {
        let response = self.ctx.fetch(self.request(tbm), self.ctx.timeout).await?;
        if response.is_captcha() {
            return Err(AdapterError::Captcha);
        }
        Ok(response.text)
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        let html = self.fetch_page(None).await?;
        parse_web(&html)
    }

    async fn fetch_images(&self) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
        let html = self.fetch_page(Some("isch")).await?;
        parse_images(&html)
    }

    async fn fetch_videos(&self) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
        let html = self.fetch_page(Some("vid")).await?;
        parse_videos(&html)
    }

    async fn fetch_news(&self) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
        let html = self.fetch_page(Some("nws")).await?;
        parse_news(&html)
    }

    async fn fetch_suggestions(&self) -> Result<AdapterOutcome<String>, AdapterError> {
        let response = self
            .ctx
            .fetch(self.autocomplete_request(), self.ctx.autocomplete_timeout)
            .await?;
        let suggestions = parse_suggestion_list(&response.json()?)?;
        Ok(AdapterOutcome::with_hits(Provider::Google, suggestions))
    }
}

#[async_trait]
impl Adapter for Google {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Google, Capability::Search, self.fetch_web().await)
    }

    async fn search_image(&self) -> AdapterOutcome<ImageHit> {
        settle(Provider::Google, Capability::SearchImage, self.fetch_images().await)
    }

    async fn search_video(&self) -> AdapterOutcome<VideoHit> {
        settle(Provider::Google, Capability::SearchVideo, self.fetch_videos().await)
    }

    async fn search_news(&self) -> AdapterOutcome<NewsHit> {
        settle(Provider::Google, Capability::SearchNews, self.fetch_news().await)
    }

    async fn autocomplete(&self) -> AdapterOutcome<String> {
        settle(Provider::Google, Capability::Autocomplete, self.fetch_suggestions().await)
    }
}

/// Resolve Google's `/url?q=...` redirect links to the target
pub fn unwrap_redirect(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let parsed = if href.starts_with('/') {
        Url::parse(&format!("https://www.google.com{}", href)).ok()?
    } else {
        Url::parse(href).ok()?
    };

    let is_redirect = parsed.path() == "/url"
        && parsed.host_str().is_some_and(|h| h.ends_with("google.com"));
    if !is_redirect {
        return href.starts_with("http").then(|| href.to_string());
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "url" || k == "q")
        .map(|(_, v)| v.into_owned())
        .filter(|v| v.starts_with("http"))
}

fn parse_web(html: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.g")?;
    let title_selector = selector("h3")?;
    let link_selector = selector("div.yuRUbf > a, a")?;
    let snippet_selector = selector("div.VwiC3b, div.IsZvec, span.aCOpRe")?;
    let suggestion_selector = selector(".card-section > a")?;

    let suggestion = document
        .select(&suggestion_selector)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string());

    let hits = root
        .select(&result_selector)
        .map(|element| {
            let link = first_attr(element, &link_selector, "href")
                .and_then(|href| unwrap_redirect(&href));
            SearchHit::new(
                first_text(element, &title_selector),
                link,
                first_text(element, &snippet_selector),
                Provider::Google,
            )
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Google, hits).suggestion(suggestion))
}

fn parse_images(html: &str) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("td.e3goi")?;
    let title_selector = selector("span.fYyStc")?;
    let thumbnail_selector = selector("img.yWs4tf, img")?;
    let link_selector = selector("a")?;

    let hits = root
        .select(&result_selector)
        .map(|element| {
            let thumbnail = first_attr(element, &thumbnail_selector, "src").unwrap_or_default();
            ImageHit {
                title: first_text(element, &title_selector),
                url: first_attr(element, &link_selector, "href")
                    .and_then(|href| unwrap_redirect(&href)),
                image: thumbnail.clone(),
                thumbnail,
                provider: Provider::Google,
            }
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Google, hits))
}

fn parse_videos(html: &str) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.ezO2md")?;
    let title_selector = selector("span.CVA68e")?;
    let link_selector = selector("a.fuLhoc")?;
    let thumbnail_selector = selector("img.iUhyd")?;
    let source_selector = selector("span.fYyStc")?;

    let hits = root
        .select(&result_selector)
        .map(|element| {
            // "youtube.com · 3 days ago" -> "youtube.com"
            let source = first_text(element, &source_selector)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            VideoHit {
                title: first_text(element, &title_selector),
                url: first_attr(element, &link_selector, "href")
                    .and_then(|href| unwrap_redirect(&href)),
                thumbnail: first_attr(element, &thumbnail_selector, "src").unwrap_or_default(),
                description: source.clone(),
                source,
                provider: Provider::Google,
            }
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Google, hits))
}

fn parse_news(html: &str) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.ezO2md")?;
    let title_selector = selector("span.CVA68e")?;
    let link_selector = selector("a.fuLhoc")?;
    let thumbnail_selector = selector("img.iUhyd")?;
    let source_selector = selector("span.fYyStc")?;

    let hits = root
        .select(&result_selector)
        .map(|element| NewsHit {
            title: first_text(element, &title_selector),
            url: first_attr(element, &link_selector, "href")
                .and_then(|href| unwrap_redirect(&href)),
            thumbnail: first_attr(element, &thumbnail_selector, "src").unwrap_or_default(),
            source: first_text(element, &source_selector),
            description: String::new(),
            provider: Provider::Google,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Google, hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEB_PAGE: &str = r#"
        <html><body>
          <div class="card-section"><a href="/search?q=rust+lang">rust lang</a></div>
          <div id="search">
          <div class="g">
            <div class="yuRUbf"><a href="https://www.rust-lang.org/"><h3>Rust Programming Language</h3></a></div>
            <div class="VwiC3b">A language empowering everyone.</div>
          </div>
          <div class="g">
            <a href="/url?q=https://doc.rust-lang.org/book/&amp;sa=U"><h3>The Rust Book</h3></a>
            <div class="IsZvec">Learn Rust.</div>
          </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_locale_translation() {
        assert_eq!(
            locale_params(Locale::DeDe),
            ("lang_de".to_string(), "de".to_string())
        );
        assert_eq!(locale_params(Locale::Fr).0, "lang_fr");
        assert_eq!(safe_param(SafeSearch::High), "high");
    }

    #[test]
    fn test_request_params() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap());
        let query = Query::new("rust", 3, SafeSearch::Medium, Locale::EnGb).unwrap();
        let google = Google::new(&query, &ctx);

        let request = google.request(None);
        assert!(request.url.contains("google.com"));
        assert_eq!(request.params.get("start").map(String::as_str), Some("20"));
        assert_eq!(request.params.get("safe").map(String::as_str), Some("medium"));
        assert_eq!(request.params.get("lr").map(String::as_str), Some("lang_en"));
        assert!(!request.params.contains_key("tbm"));

        let news = google.request(Some("nws"));
        assert_eq!(news.params.get("tbm").map(String::as_str), Some("nws"));
        assert_eq!(
            news.headers.get("User-Agent").map(String::as_str),
            Some(LEGACY_USER_AGENT)
        );
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("/url?q=https://example.com/a&sa=U").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            unwrap_redirect("/url?url=https://example.com/b").as_deref(),
            Some("https://example.com/b")
        );
        assert_eq!(
            unwrap_redirect("https://example.com/c").as_deref(),
            Some("https://example.com/c")
        );
        assert_eq!(unwrap_redirect("/search?q=x"), None);
        assert_eq!(unwrap_redirect(""), None);
    }

    #[test]
    fn test_parse_web() {
        let outcome = parse_web(WEB_PAGE).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.suggestion.as_deref(), Some("rust lang"));
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.hits[0].title, "Rust Programming Language");
        assert_eq!(outcome.hits[0].link.as_deref(), Some("https://www.rust-lang.org/"));
        assert_eq!(outcome.hits[0].content, "A language empowering everyone.");
        assert_eq!(
            outcome.hits[1].link.as_deref(),
            Some("https://doc.rust-lang.org/book/")
        );
    }

    #[test]
    fn test_parse_news_tolerates_missing_fields() {
        let html = r#"
            <div id="main"><div class="ezO2md">
              <a class="fuLhoc" href="/url?q=https://news.example/story"><span class="CVA68e">Headline</span></a>
              <span class="fYyStc">news.example</span>
            </div></div>
        "#;
        let outcome = parse_news(html).unwrap();

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].url.as_deref(), Some("https://news.example/story"));
        assert_eq!(outcome.hits[0].thumbnail, "");
        assert_eq!(outcome.hits[0].source, "news.example");
    }

    #[test]
    fn test_page_without_results_is_parse_failure() {
        let consent = "<html><body><form action=\"https://consent.google.com/save\"></form></body></html>";
        assert!(matches!(parse_web(consent), Err(AdapterError::Parse(_))));
        assert!(matches!(parse_videos(consent), Err(AdapterError::Parse(_))));

        let empty = parse_images(r#"<div id="main"><p>No results</p></div>"#).unwrap();
        assert!(empty.success && empty.hits.is_empty());
    }

    #[tokio::test]
    async fn test_consent_wall_is_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Before you continue</body></html>"))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = Google::new(&Query::simple("rust").unwrap(), &ctx).search().await;

        assert!(!outcome.success);
        assert_eq!(outcome.failure, Some(crate::results::FailureKind::Parse));
    }

    #[tokio::test]
    async fn test_search_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(WEB_PAGE))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let google = Google::new(&Query::simple("rust").unwrap(), &ctx);

        let outcome = google.search().await;

        assert!(outcome.success);
        assert_eq!(outcome.provider, Provider::Google);
        assert_eq!(outcome.hits.len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_failed_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let google = Google::new(&Query::simple("rust").unwrap(), &ctx);

        let outcome = google.search_image().await;

        assert!(!outcome.success);
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.provider, Provider::Google);
        assert_eq!(outcome.failure, Some(crate::results::FailureKind::HttpStatus(503)));
    }

    #[tokio::test]
    async fn test_autocomplete_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/complete/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"["ru",["rust","rugby","ruby"]]"#),
            )
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let google = Google::new(&Query::simple("ru").unwrap(), &ctx);

        let outcome = google.autocomplete().await;

        assert!(outcome.success);
        assert_eq!(outcome.hits, vec!["rust", "rugby", "ruby"]);
    }
}
