//! Brave Search adapter
//!
//! Web, video and news search scrape the HTML pages; image search and
//! autocomplete use Brave's JSON endpoints. Safe search and language are
//! passed as cookies.

use super::traits::*;
use crate::locales::Locale;
use crate::network::LEGACY_USER_AGENT;
use crate::query::{Capability, Query, SafeSearch};
use crate::results::{AdapterOutcome, ImageHit, NewsHit, Provider, SearchHit, VideoHit};
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

const SEARCH_URL: &str = "https://search.brave.com/search";
const IMAGE_URL: &str = "https://search.brave.com/api/images";
const VIDEO_URL: &str = "https://search.brave.com/videos";
const NEWS_URL: &str = "https://search.brave.com/news";
const AUTOCOMPLETE_URL: &str = "https://search.brave.com/api/suggest";
/// Wrapper of the result list on the web, video and news pages
const RESULTS_ROOT: &str = "#results";

/// Value of the `safesearch` cookie
pub fn safe_cookie(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::Off => "off",
        SafeSearch::Medium => "moderate",
        SafeSearch::High => "strict",
    }
}

/// Value of the `ul_lang` cookie, e.g. `en-us`
pub fn language_cookie(locale: Locale) -> String {
    locale.tag().to_lowercase()
}

/// Brave adapter instance for one query
pub struct Brave {
    ctx: AdapterContext,
    query: String,
    safesearch: &'static str,
    lang: String,
    offset: u32,
}

impl ProviderAdapter for Brave {
    const PROVIDER: Provider = Provider::Brave;
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[
        Capability::Search,
        Capability::SearchImage,
        Capability::SearchVideo,
        Capability::SearchNews,
        Capability::Autocomplete,
    ]);

    fn new(query: &Query, ctx: &AdapterContext) -> Self {
        Self {
            ctx: ctx.clone(),
            query: query.text().to_string(),
            safesearch: safe_cookie(query.safesearch()),
            lang: language_cookie(query.locale()),
            offset: query.offset(1),
        }
    }
}

impl Brave {
    fn request(&self, url: &str) -> EngineRequest {
        let mut request = EngineRequest::get(self.ctx.endpoint(url))
            .param("q", &self.query)
            .cookie("safesearch", self.safesearch)
            .cookie("ul_lang", &self.lang);
        if self.offset > 0 {
            request = request.param("offset", self.offset.to_string());
        }
        request
    }

    async fn fetch_page(&self, request: EngineRequest) -> Result<String, AdapterError> {
        let response = self.ctx.fetch(request, self.ctx.timeout).await?;
        Ok(response.text)
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        parse_web(&self.fetch_page(self.request(SEARCH_URL)).await?)
    }

    async fn fetch_images(&self) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
        let request = self
            .request(IMAGE_URL)
            .header("User-Agent", LEGACY_USER_AGENT)
            .header("Accept", crate::network::ACCEPT_JSON);
        parse_images(&self.fetch_page(request).await?)
    }

    async fn fetch_videos(&self) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
        parse_videos(&self.fetch_page(self.request(VIDEO_URL)).await?)
    }

    async fn fetch_news(&self) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
        parse_news(&self.fetch_page(self.request(NEWS_URL)).await?)
    }

    async fn fetch_suggestions(&self) -> Result<AdapterOutcome<String>, AdapterError> {
        let request = EngineRequest::get(self.ctx.endpoint(AUTOCOMPLETE_URL)).param("q", &self.query);
        let response = self
            .ctx
            .fetch(request, self.ctx.autocomplete_timeout)
            .await?;
        let suggestions = parse_suggestion_list(&response.json()?)?;
        Ok(AdapterOutcome::with_hits(Provider::Brave, suggestions))
    }
}

#[async_trait]
impl Adapter for Brave {
    fn provider(&self) -> Provider {
        Provider::Brave
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Brave, Capability::Search, self.fetch_web().await)
    }

    async fn search_image(&self) -> AdapterOutcome<ImageHit> {
        settle(Provider::Brave, Capability::SearchImage, self.fetch_images().await)
    }

    async fn search_video(&self) -> AdapterOutcome<VideoHit> {
        settle(Provider::Brave, Capability::SearchVideo, self.fetch_videos().await)
    }

    async fn search_news(&self) -> AdapterOutcome<NewsHit> {
        settle(Provider::Brave, Capability::SearchNews, self.fetch_news().await)
    }

    async fn autocomplete(&self) -> AdapterOutcome<String> {
        settle(Provider::Brave, Capability::Autocomplete, self.fetch_suggestions().await)
    }
}

/// Pattern matching the URL of a `background-image: url(...)` declaration
pub fn background_image_pattern() -> Result<Regex, AdapterError> {
    Regex::new(r#"url\(\s*["']?([^"')]*)["']?\s*\)"#)
        .map_err(|e| AdapterError::parse(e.to_string()))
}

/// URL inside a `background-image: url(...)` declaration
pub fn background_image(pattern: &Regex, style: &str) -> Option<String> {
    pattern
        .captures(style)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn parse_web(html: &str) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.snippet")?;
    let title_selector = selector(".snippet-title")?;
    let link_selector = selector("a.result-header, a")?;
    let snippet_selector = selector(".snippet-description")?;
    let suggestion_selector = selector("div.altered-query-text > a")?;

    let suggestion = document
        .select(&suggestion_selector)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string());

    let hits = root
        .select(&result_selector)
        .map(|element| {
            SearchHit::new(
                first_text(element, &title_selector),
                first_attr(element, &link_selector, "href"),
                first_text(element, &snippet_selector),
                Provider::Brave,
            )
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Brave, hits).suggestion(suggestion))
}

fn parse_images(text: &str) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let results = value
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| AdapterError::parse("image results missing"))?;

    let hits = results
        .iter()
        .map(|image| ImageHit {
            title: json_str(image, "/title"),
            url: image.get("url").and_then(|u| u.as_str()).map(String::from),
            thumbnail: json_str(image, "/thumbnail/src"),
            image: json_str(image, "/properties/url"),
            provider: Provider::Brave,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Brave, hits))
}

fn parse_videos(html: &str) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.card")?;
    let link_selector = selector("a")?;
    let source_selector = selector("div.anchor")?;
    let title_selector = selector("div.title")?;
    let thumbnail_selector = selector("div.img-bg")?;
    let footer_selector = selector("div.card-footer")?;
    let background = background_image_pattern()?;

    let hits = root
        .select(&result_selector)
        .map(|element| VideoHit {
            title: first_text(element, &title_selector),
            url: first_attr(element, &link_selector, "href"),
            thumbnail: first_attr(element, &thumbnail_selector, "style")
                .and_then(|style| background_image(&background, &style))
                .unwrap_or_default(),
            source: first_text(element, &source_selector),
            description: first_text(element, &footer_selector),
            provider: Provider::Brave,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Brave, hits))
}

fn parse_news(html: &str) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
    let document = Html::parse_document(html);
    let root = results_root(&document, RESULTS_ROOT)?;

    let result_selector = selector("div.snippet")?;
    let title_selector = selector(".snippet-title")?;
    let description_selector = selector(".snippet-description")?;
    let link_selector = selector("a")?;
    let thumbnail_selector = selector("img.thumb")?;
    let source_selector = selector("span.netloc")?;

    let hits = root
        .select(&result_selector)
        .map(|element| NewsHit {
            title: first_text(element, &title_selector),
            url: first_attr(element, &link_selector, "href"),
            thumbnail: first_attr(element, &thumbnail_selector, "src").unwrap_or_default(),
            source: first_text(element, &source_selector),
            description: first_text(element, &description_selector),
            provider: Provider::Brave,
        })
        .collect();

    Ok(AdapterOutcome::with_hits(Provider::Brave, hits))
}
