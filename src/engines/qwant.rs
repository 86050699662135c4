//! Qwant adapter
//!
//! Every capability goes through Qwant's JSON API. The envelope and result
//! lists are decoded into typed structs, so a response missing them is a
//! parse failure. Items are read field by field: a missing or mistyped field
//! becomes an empty string and an item that is not an object is skipped.

use super::traits::*;
use crate::locales::Locale;
use crate::query::{Capability, Query, SafeSearch};
use crate::results::{AdapterOutcome, ImageHit, NewsHit, Provider, SearchHit, VideoHit};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const API_URL: &str = "https://api.qwant.com/v3/search";
const AUTOCOMPLETE_URL: &str = "https://api.qwant.com/api/suggest";
const PAGE_SIZE: u32 = 10;

/// Qwant locale, always `lang_REGION`, e.g. `fr_FR`
pub fn locale_param(locale: Locale) -> String {
    format!("{}_{}", locale.language(), locale.default_region())
}

/// Qwant `safesearch` parameter
pub fn safe_param(safesearch: SafeSearch) -> &'static str {
    match safesearch {
        SafeSearch::Off => "0",
        SafeSearch::Medium => "1",
        SafeSearch::High => "2",
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct WebData {
    result: WebResult,
    #[serde(default)]
    query: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    items: WebItems,
}

#[derive(Debug, Deserialize)]
struct WebItems {
    mainline: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    result: ListResult,
}

#[derive(Debug, Deserialize)]
struct ListResult {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SuggestData {
    items: Vec<Value>,
}

/// Qwant adapter instance for one query
pub struct Qwant {
    ctx: AdapterContext,
    query: String,
    locale: String,
    safesearch: &'static str,
    offset: u32,
}

impl ProviderAdapter for Qwant {
    const PROVIDER: Provider = Provider::Qwant;
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
            locale: locale_param(query.locale()),
            safesearch: safe_param(query.safesearch()),
            offset: query.offset(PAGE_SIZE),
        }
    }
}

impl Qwant {
    /// Request against one of the `web`, `images`, `videos` or `news` verticals
    fn request(&self, vertical: &str) -> EngineRequest {
        EngineRequest::get(self.ctx.endpoint(&format!("{}/{}", API_URL, vertical)))
            .param("q", &self.query)
            .param("count", PAGE_SIZE.to_string())
            .param("offset", self.offset.to_string())
            .param("locale", &self.locale)
            .param("safesearch", self.safesearch)
            .param("t", vertical)
            .header("Accept", crate::network::ACCEPT_JSON)
    }

    async fn fetch_data<T: DeserializeOwned>(&self, vertical: &str) -> Result<T, AdapterError> {
        let response = self.ctx.fetch(self.request(vertical), self.ctx.timeout).await?;
        decode(&response.text)
    }

    async fn fetch_web(&self) -> Result<AdapterOutcome<SearchHit>, AdapterError> {
        Ok(web_outcome(self.fetch_data("web").await?))
    }

    async fn fetch_images(&self) -> Result<AdapterOutcome<ImageHit>, AdapterError> {
        Ok(image_outcome(self.fetch_data("images").await?))
    }

    async fn fetch_videos(&self) -> Result<AdapterOutcome<VideoHit>, AdapterError> {
        Ok(video_outcome(self.fetch_data("videos").await?))
    }

    async fn fetch_news(&self) -> Result<AdapterOutcome<NewsHit>, AdapterError> {
        Ok(news_outcome(self.fetch_data("news").await?))
    }

    async fn fetch_suggestions(&self) -> Result<AdapterOutcome<String>, AdapterError> {
        let request = EngineRequest::get(self.ctx.endpoint(AUTOCOMPLETE_URL))
            .param("q", &self.query)
            .header("Accept", crate::network::ACCEPT_JSON);
        let response = self
            .ctx
            .fetch(request, self.ctx.autocomplete_timeout)
            .await?;
        let data: SuggestData = decode(&response.text)?;
        let suggestions = objects(data.items)
            .map(|item| json_str(&item, "/value"))
            .filter(|value| !value.is_empty())
            .collect();
        Ok(AdapterOutcome::with_hits(Provider::Qwant, suggestions))
    }
}

#[async_trait]
impl Adapter for Qwant {
    fn provider(&self) -> Provider {
        Provider::Qwant
    }

    async fn search(&self) -> AdapterOutcome<SearchHit> {
        settle(Provider::Qwant, Capability::Search, self.fetch_web().await)
    }

    async fn search_image(&self) -> AdapterOutcome<ImageHit> {
        settle(Provider::Qwant, Capability::SearchImage, self.fetch_images().await)
    }

    async fn search_video(&self) -> AdapterOutcome<VideoHit> {
        settle(Provider::Qwant, Capability::SearchVideo, self.fetch_videos().await)
    }

    async fn search_news(&self) -> AdapterOutcome<NewsHit> {
        settle(Provider::Qwant, Capability::SearchNews, self.fetch_news().await)
    }

    async fn autocomplete(&self) -> AdapterOutcome<String> {
        settle(Provider::Qwant, Capability::Autocomplete, self.fetch_suggestions().await)
    }
}

/// Unwrap the `data` envelope every Qwant response carries
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, AdapterError> {
    let envelope: Envelope<T> = serde_json::from_str(text)?;
    Ok(envelope.data)
}

/// Object items of a result list; anything else is skipped
fn objects(items: Vec<Value>) -> impl Iterator<Item = Value> {
    items.into_iter().filter(|item| {
        let keep = item.is_object();
        if !keep {
            debug!("Skipping Qwant item that is not an object: {}", item);
        }
        keep
    })
}

/// String field as an optional link
fn json_link(item: &Value, pointer: &str) -> Option<String> {
    Some(json_str(item, pointer)).filter(|url| !url.is_empty())
}

fn web_outcome(data: WebData) -> AdapterOutcome<SearchHit> {
    let web_items: Vec<Value> = data
        .result
        .items
        .mainline
        .into_iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("web"))
        .flat_map(|mut block| match block.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => {
                debug!("Skipping Qwant web block without an item list");
                Vec::new()
            }
        })
        .collect();

    let hits = objects(web_items)
        .map(|item| {
            SearchHit::new(
                json_str(&item, "/title"),
                json_link(&item, "/url"),
                json_str(&item, "/desc"),
                Provider::Qwant,
            )
        })
        .collect();

    let suggestion = data
        .query
        .map(|query| json_str(&query, "/queryContext/alteredQuery"))
        .filter(|altered| !altered.is_empty());

    AdapterOutcome::with_hits(Provider::Qwant, hits).suggestion(suggestion)
}

fn image_outcome(data: ListData) -> AdapterOutcome<ImageHit> {
    let hits = objects(data.result.items)
        .map(|item| ImageHit {
            title: json_str(&item, "/title"),
            url: json_link(&item, "/url"),
            thumbnail: json_str(&item, "/thumbnail"),
            image: json_str(&item, "/media"),
            provider: Provider::Qwant,
        })
        .collect();

    AdapterOutcome::with_hits(Provider::Qwant, hits)
}

fn video_outcome(data: ListData) -> AdapterOutcome<VideoHit> {
    let hits = objects(data.result.items)
        .map(|item| VideoHit {
            title: json_str(&item, "/title"),
            url: json_link(&item, "/url"),
            thumbnail: json_str(&item, "/thumbnail"),
            source: json_str(&item, "/source"),
            description: json_str(&item, "/desc"),
            provider: Provider::Qwant,
        })
        .collect();

    AdapterOutcome::with_hits(Provider::Qwant, hits)
}

fn news_outcome(data: ListData) -> AdapterOutcome<NewsHit> {
    let hits = objects(data.result.items)
        .map(|item| NewsHit {
            title: json_str(&item, "/title"),
            url: json_link(&item, "/url"),
            // Thumbnail of the first attached media
            thumbnail: json_str(&item, "/media/0/pict/url"),
            source: json_str(&item, "/domain"),
            description: String::new(),
            provider: Provider::Qwant,
        })
        .collect();

    AdapterOutcome::with_hits(Provider::Qwant, hits)
}
