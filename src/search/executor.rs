//! Aggregation: fan out one query to every adapter, join, fold, finish

use crate::engines::{Adapter, AdapterEntry, AdapterRegistry};
use crate::metrics::Metrics;
use crate::query::{Capability, Query};
use crate::results::{
    AdapterOutcome, AggregatedResponse, AutocompleteResponse, Hit, ImageHit, NewsHit,
    ResultContainer, SearchHit, VideoHit,
};
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Ties a hit type to the adapter method that produces it
pub trait CapabilityCall: Sized + Send + 'static {
    const CAPABILITY: Capability;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>>;
}

impl CapabilityCall for SearchHit {
    const CAPABILITY: Capability = Capability::Search;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>> {
        adapter.search()
    }
}

impl CapabilityCall for ImageHit {
    const CAPABILITY: Capability = Capability::SearchImage;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>> {
        adapter.search_image()
    }
}

impl CapabilityCall for VideoHit {
    const CAPABILITY: Capability = Capability::SearchVideo;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>> {
        adapter.search_video()
    }
}

impl CapabilityCall for NewsHit {
    const CAPABILITY: Capability = Capability::SearchNews;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>> {
        adapter.search_news()
    }
}

impl CapabilityCall for String {
    const CAPABILITY: Capability = Capability::Autocomplete;

    fn call(adapter: &dyn Adapter) -> BoxFuture<'_, AdapterOutcome<Self>> {
        adapter.autocomplete()
    }
}

/// Response of [`Aggregator::aggregate`], one variant per capability
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Aggregated {
    Search(AggregatedResponse<SearchHit>),
    Images(AggregatedResponse<ImageHit>),
    Videos(AggregatedResponse<VideoHit>),
    News(AggregatedResponse<NewsHit>),
    Autocomplete(AutocompleteResponse),
}

impl Aggregated {
    pub fn count(&self) -> usize {
        match self {
            Self::Search(r) => r.count,
            Self::Images(r) => r.count,
            Self::Videos(r) => r.count,
            Self::News(r) => r.count,
            Self::Autocomplete(r) => r.count,
        }
    }
}

/// Fans queries out across the registry and merges what comes back.
///
/// Holds no per-call state; one instance serves every request.
#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<AdapterRegistry>,
    metrics: Option<Arc<Metrics>>,
}

impl Aggregator {
    /// Create a new aggregator over a registry
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    /// Report every settled adapter call to a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Dispatch by capability
    pub async fn aggregate(&self, capability: Capability, query: &Query) -> Aggregated {
        match capability {
            Capability::Search => Aggregated::Search(self.search(query).await),
            Capability::SearchImage => Aggregated::Images(self.search_image(query).await),
            Capability::SearchVideo => Aggregated::Videos(self.search_video(query).await),
            Capability::SearchNews => Aggregated::News(self.search_news(query).await),
            Capability::Autocomplete => Aggregated::Autocomplete(self.autocomplete(query).await),
        }
    }

    pub async fn search(&self, query: &Query) -> AggregatedResponse<SearchHit> {
        self.run(query).await
    }

    pub async fn search_image(&self, query: &Query) -> AggregatedResponse<ImageHit> {
        self.run(query).await
    }

    pub async fn search_video(&self, query: &Query) -> AggregatedResponse<VideoHit> {
        self.run(query).await
    }

    pub async fn search_news(&self, query: &Query) -> AggregatedResponse<NewsHit> {
        self.run(query).await
    }

    /// Suggestions for the query text; page, safe search and locale are
    /// pinned to their defaults
    pub async fn autocomplete(&self, query: &Query) -> AutocompleteResponse {
        let query = query.for_autocomplete();
        let start = Instant::now();

        let outcomes = self.fan_out::<String>(&query).await;
        let response = ResultContainer::fold(outcomes).finish_autocomplete(start.elapsed());

        info!(
            "Autocomplete '{}': {} suggestions in {}, {} unresponsive",
            query.text(),
            response.count,
            response.times,
            response.unresponsive.len()
        );
        response
    }

    async fn run<T: CapabilityCall + Hit>(&self, query: &Query) -> AggregatedResponse<T> {
        let start = Instant::now();

        let outcomes = self.fan_out::<T>(query).await;
        let response = ResultContainer::fold(outcomes).finish(start.elapsed());

        info!(
            "{} '{}' page {}: {} hits in {}, {} unresponsive",
            T::CAPABILITY,
            query.text(),
            query.page(),
            response.count,
            response.times,
            response.unresponsive.len()
        );
        response
    }

    /// Call the capability on every adapter at once and wait for all of them.
    ///
    /// Outcomes come back in registry order whatever order they settle in.
    async fn fan_out<T: CapabilityCall>(&self, query: &Query) -> Vec<AdapterOutcome<T>> {
        if let Some(ref metrics) = self.metrics {
            metrics.record_aggregation(T::CAPABILITY);
        }

        debug!(
            "Dispatching {} '{}' to {} adapters",
            T::CAPABILITY,
            query.text(),
            self.registry.len()
        );

        let calls = self
            .registry
            .entries()
            .iter()
            .map(|entry| self.dispatch::<T>(entry, query));

        join_all(calls).await
    }

    async fn dispatch<T: CapabilityCall>(
        &self,
        entry: &AdapterEntry,
        query: &Query,
    ) -> AdapterOutcome<T> {
        if !entry.supports(T::CAPABILITY) {
            return AdapterOutcome::empty(entry.provider);
        }

        let adapter = entry.build(query);
        let start = Instant::now();
        let outcome = T::call(adapter.as_ref()).await;
        let elapsed = start.elapsed();

        if let Some(ref metrics) = self.metrics {
            metrics.record_outcome(entry.provider, outcome.failure, elapsed);
        }

        debug!(
            "{} {} settled in {:?} (success: {})",
            entry.name, T::CAPABILITY, elapsed, outcome.success
        );
        outcome
    }
}
