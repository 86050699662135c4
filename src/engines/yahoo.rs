//! Yahoo adapter
//!
//! Scrapes the web, image, video and news result pages. Result links go
//! through Yahoo's redirector, which carries the target in an `RU=` segment.

use super::traits::*;
use crate::locales::Locale;
use crate::query::{Capability, Query};
use crate::results::{AdapterOutcome, ImageHit, NewsHit, Provider, SearchHit, VideoHit};
use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use tracing::debug;

const SEARCH_URL: &str = "https://search.yahoo.com/search";
const IMAGE_URL: &str = "https://images.search.yahoo.com/images/search";
const VIDEO_URL: &str = "https://video.search.yahoo.com/search/video";
const NEWS_URL: &str = "https://news.search.yahoo.com/search";

// Result list wrappers of each vertical
const WEB_ROOT: &str = "#web";
const IMAGE_ROOT: &str = "#results, #sres";
const VIDEO_ROOT: &str = "#results";
const NEWS_ROOT: &str = "#web";

/// Yahoo `vl` parameter, e.g. `lang_fr`
pub fn language_param(locale: Locale) -> String {
    format!("lang_{}", locale.language())
}

/// Target of a `.../RU=<encoded>/RK=.../RS=...` redirect link
pub fn decode_redirect(href: &str) -> Option<String> {
    let start = href.find("/RU=")? + "/RU=".len();
    let rest = &href[start..];
    let encoded = rest.split("/R").next().unwrap_or(rest);
    let decoded = urlencoding::decode(encoded).ok()?.into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

/// JSON carried in the `data` attribute of each image result
#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    rurl: String,
    #[serde(default)]
    alt: String,
    #[serde(default)]
    ith: String,
    #[serde(default)]
    iurl: String,
}

/// Yahoo adapter instance for one query
pub struct Yahoo {
    ctx: AdapterContext,
    query: String,
    vl: String,
    b: u32,
}

impl ProviderAdapter for Yahoo {
    const PROVIDER: Provider = Provider::Yahoo;
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[
        Capability::Search,
        Capability::SearchImage,
        Capability::SearchVideo,
        Capability::SearchNews,
    ]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        Self {
            ctx: ctx.clone(),
            query: query.text().to_string(),
            vl: language_param(query.locale()),
            b: query.offset(10).saturating_add(1),
        }
    }
}

impl Yahoo {
    fn request(&self, url: &str) -> EngineRequest {
        EngineRequest::get(self.ctx.endpoint(url))
            .param("p", &self.query)
            .param("b", self.b.to_string())
            .param("vl", &self.vl)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, AdapterError> {
        let response = self.ctx.fetch(self.request(url), self.ctx.timeout).await?;
        Ok(response.text)
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        parse_web(&self.fetch_page(SEARCH_URL).await?)
    }

    async fn fetch_images(&self) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
        parse_images(&self.fetch_page(IMAGE_URL).await?)
    }

    async fn fetch_videos(&self) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
        parse_videos(&self.fetch_page(VIDEO_URL).await?)
    }

    async fn fetch_news(&self) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
        parse_news(&self.fetch_page(NEWS_URL).await?)
    }
}

#[async_trait]
impl Adapter for Yahoo {
    fn provider(&self) -> Provider {
        Provider::Yahoo
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Yahoo, Capability::Search, self.fetch_web().await)
    }

    async fn search_image(&self) -> AdapterOutcome<ImageHit> {
        settle(Provider::Yahoo, Capability::SearchImage, self.fetch_images().await)
    }

    async fn search_video(&self) -> AdapterOutcome<VideoHit> {
        settle(Provider::Yahoo, Capability::SearchVideo, self.fetch_videos().await)
    }

    async fn search_news(&self) -> AdapterOutcome<NewsHit> {
        settle(Provider::Yahoo, Capability::SearchNews, self.fetch_news().await)
    }
}

fn parse_web(html: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, WEB_ROOT)?;

    let result_selector = selector("li > div.dd")?;
    let title_selector = selector("h3.title > a")?;
    let display_url_selector = selector("span.fz-ms.fw-m")?;
    let snippet_selector = selector("p.fz-ms")?;
    let suggestion_selector = selector(".stxt > a.fc-blue")?;

    let suggestion = document
        .select(&suggestion_selector)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string());

    let hits = root
        .select(&result_selector)
        .map(|element| {
            // Prefer the redirect target; the displayed URL reads "example.com › path"
            let link = first_attr(element, &title_selector, "href")
                .and_then(|href| decode_redirect(&href))
                .or_else(|| {
                    first_text(element, &display_url_selector)
                        .split_whitespace()
                        .next()
                        .map(String::from)
                });

            SearchHit::new(
                first_text(element, &title_selector),
                link,
                first_text(element, &snippet_selector),
                Provider::Yahoo,
            )
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Yahoo, hits).suggestion(suggestion))
}

fn parse_images(html: &str) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, IMAGE_ROOT)?;
    let result_selector = selector("li.ld")?;

    let hits = root
        .select(&result_selector)
        .filter_map(|element| {
            let raw = element.value().attr("data")?;
            match serde_json::from_str::<ImageData>(raw) {
                Ok(data) => Some(ImageHit {
                    title: data.alt,
                    url: Some(data.rurl),
                    thumbnail: data.ith,
                    image: data.iurl,
                    provider: Provider::Yahoo,
                }),
                Err(e) => {
                    debug!("Skipping Yahoo image with bad data attribute: {}", e);
                    None
                }
            }
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Yahoo, hits))
}

fn parse_videos(html: &str) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, VIDEO_ROOT)?;

    let result_selector = selector("li.vr")?;
    let anchor_selector = selector("a")?;
    let thumbnail_selector = selector("img")?;
    let source_selector = selector("cite.url")?;
    let age_selector = selector("div.v-age")?;

    let hits = root
        .select(&result_selector)
        .map(|element| VideoHit {
            title: first_attr(element, &anchor_selector, "aria-label").unwrap_or_default(),
            url: first_attr(element, &anchor_selector, "data-rurl"),
            thumbnail: first_attr(element, &thumbnail_selector, "src").unwrap_or_default(),
            source: first_text(element, &source_selector),
            description: first_text(element, &age_selector),
            provider: Provider::Yahoo,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Yahoo, hits))
}

fn parse_news(html: &str) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, NEWS_ROOT)?;

    let result_selector = selector("li")?;
    let anchor_selector = selector("a.thmb")?;
    let thumbnail_selector = selector("img")?;
    let source_selector = selector("span.s-source")?;

    let hits = root
        .select(&result_selector)
        .map(|element| NewsHit {
            title: first_attr(element, &anchor_selector, "title").unwrap_or_default(),
            url: first_attr(element, &anchor_selector, "href")
                .and_then(|href| decode_redirect(&href)),
            thumbnail: first_attr(element, &thumbnail_selector, "src").unwrap_or_default(),
            source: first_text(element, &source_selector),
            description: String::new(),
            provider: Provider::Yahoo,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Yahoo, hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpClient;
    use crate::query::SafeSearch;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEB: &str = r##"
        <div class="stxt">Including results for <a class="fc-blue" href="#">rust language</a></div>
        <div id="web"><ol>
          <li><div class="dd algo">
            <h3 class="title"><a href="https://r.search.yahoo.com/_ylt=A/RV=2/RE=1/RO=10/RU=https%3a%2f%2fwww.rust-lang.org%2f/RK=2/RS=abc-">Rust</a></h3>
            <span class="fz-ms fw-m">www.rust-lang.org › learn</span>
            <p class="fz-ms">A language empowering everyone.</p>
          </div></li>
          <li><div class="dd algo">
            <h3 class="title"><a href="/plain">Crates</a></h3>
            <span class="fz-ms fw-m">crates.io › search</span>
            <p class="fz-ms">Package registry.</p>
          </div></li>
        </ol></div>
    "##;

    #[test]
    fn test_translation() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap());
        let query = Query::new("rust", 2, SafeSearch::Off, Locale::EsEs).unwrap();
        let request = Yahoo::new(&query, &ctx).request(SEARCH_URL);

        assert_eq!(request.params.get("b").map(String::as_str), Some("11"));
        assert_eq!(request.params.get("vl").map(String::as_str), Some("lang_es"));
        assert_eq!(request.params.get("p").map(String::as_str), Some("rust"));
    }

    #[test]
    fn test_decode_redirect() {
        assert_eq!(
            decode_redirect("https://r.search.yahoo.com/_ylt=x/RU=https%3a%2f%2fa.example%2fb/RK=2/RS=y").as_deref(),
            Some("https://a.example/b")
        );
        assert_eq!(decode_redirect("https://a.example/b"), None);
    }

    #[test]
    fn test_parse_web() {
        let outcome = parse_web(WEB).unwrap();

        assert_eq!(outcome.suggestion.as_deref(), Some("rust language"));
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.hits[0].link.as_deref(), Some("https://www.rust-lang.org/"));
        assert_eq!(outcome.hits[1].link.as_deref(), Some("crates.io"));
        assert_eq!(outcome.hits[1].content, "Package registry.");
    }

    #[test]
    fn test_parse_images_skips_bad_data() {
        let html = r#"
            <ul id="sres">
              <li class="ld" data='{"rurl":"https://p/crab","alt":"Crab","ith":"https://t/crab.jpg","iurl":"https://i/crab.jpg"}'></li>
              <li class="ld" data='not json'></li>
              <li class="ld"></li>
            </ul>
        "#;
        let outcome = parse_images(html).unwrap();

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].title, "Crab");
        assert_eq!(outcome.hits[0].url.as_deref(), Some("https://p/crab"));
    }

    #[test]
    fn test_parse_videos() {
        let html = r#"
            <ol id="results"><li class="vr">
              <a data-rurl="https://www.youtube.com/watch?v=1" aria-label="Learn Rust"><img src="https://t/1.jpg"></a>
              <cite class="url">youtube.com</cite>
              <div class="v-age">2 days ago</div>
            </li></ol>
        "#;
        let outcome = parse_videos(html).unwrap();

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].title, "Learn Rust");
        assert_eq!(outcome.hits[0].source, "youtube.com");
        assert_eq!(outcome.hits[0].description, "2 days ago");
    }

    #[test]
    fn test_page_without_result_list_is_parse_failure() {
        let consent = "<html><body><form class=\"consent-form\">Yahoo is part of the Yahoo family of brands</form></body></html>";
        assert!(matches!(parse_web(consent), Err(AdapterError::Parse(_))));
        assert!(matches!(parse_images(consent), Err(AdapterError::Parse(_))));
        assert!(matches!(parse_videos(consent), Err(AdapterError::Parse(_))));
        assert!(matches!(parse_news(consent), Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_last_page_does_not_overflow() {
        let ctx = AdapterContext::new(HttpClient::new().unwrap());
        let query = Query::new("rust", u32::MAX, SafeSearch::Off, Locale::En).unwrap();
        let request = Yahoo::new(&query, &ctx).request(SEARCH_URL);

        assert_eq!(request.params.get("b").map(String::as_str), Some("4294967295"));
    }

    #[tokio::test]
    async fn test_news_against_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("p", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div id="web"><ul><li>
                    <a class="thmb" title="Rust 2.0" href="https://r.news.yahoo.com/_ylt=x/RV=2/RE=1/RO=10/RU=https%3a%2f%2fnews.example%2frust/RK=2/RS=y"><img src="https://t/n.jpg"></a>
                    <span class="s-source">News Example</span>
                </li></ul></div>"#,
            ))
            .mount(&server)
            .await;

        let ctx = AdapterContext::new(HttpClient::new().unwrap()).with_base_url(server.uri());
        let outcome = Yahoo::new(&Query::simple("rust").unwrap(), &ctx)
            .search_news()
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].url.as_deref(), Some("https://news.example/rust"));
        assert_eq!(outcome.hits[0].source, "News Example");
    }
}
