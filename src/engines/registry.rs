//! Adapter registry in fan-out order

use super::traits::{Adapter, AdapterContext, CapabilitySet, ProviderAdapter};
use crate::query::{Capability, Query};
use crate::results::Provider;
use std::sync::Arc;

/// Builds a fresh adapter instance for one query
pub type AdapterFactory = Arc<dyn Fn(&Query, &AdapterContext) -> Box<dyn Adapter> + Send + Sync>;

/// One registered adapter: identity, capabilities and how to build it
#[derive(Clone)]
pub struct AdapterEntry {
    /// Configured engine name
    pub name: String,
    pub provider: Provider,
    pub capabilities: CapabilitySet,
    pub ctx: AdapterContext,
    factory: AdapterFactory,
}

impl AdapterEntry {
    /// Entry for a concrete adapter type
    pub fn of<A: ProviderAdapter>(name: impl Into<String>, ctx: AdapterContext) -> Self {
        Self {
            name: name.into(),
            provider: A::PROVIDER,
            capabilities: A::CAPABILITIES,
            ctx,
            factory: Arc::new(|query: &Query, ctx: &AdapterContext| {
                Box::new(A::new(query, ctx)) as Box<dyn Adapter>
            }),
        }
    }

    /// Entry with an arbitrary factory
    pub fn new(
        name: impl Into<String>,
        provider: Provider,
        capabilities: CapabilitySet,
        ctx: AdapterContext,
        factory: AdapterFactory,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            capabilities,
            ctx,
            factory,
        }
    }

    /// Instantiate the adapter for a query
    pub fn build(&self, query: &Query) -> Box<dyn Adapter> {
        (self.factory)(query, &self.ctx)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Ordered list of adapters.
///
/// Registration order decides which adapter wins suggestion and knowledge
/// box ties and the order hits appear in.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: Vec<AdapterEntry>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter
    pub fn register(&mut self, entry: AdapterEntry) {
        self.entries.push(entry);
    }

    /// Entries in registry order
    pub fn entries(&self) -> &[AdapterEntry] {
        &self.entries
    }

    /// Get an entry by configured name
    pub fn get(&self, name: &str) -> Option<&AdapterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Configured names in registry order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Entries implementing a capability
    pub fn supporting(&self, capability: Capability) -> impl Iterator<Item = &AdapterEntry> {
        self.entries.iter().filter(move |e| e.supports(capability))
    }

    /// Get number of registered adapters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{bing::Bing, qwant::Qwant, wikipedia::Wikipedia};
    use crate::network::HttpClient;

    fn ctx() -> AdapterContext {
        AdapterContext::new(HttpClient::new().unwrap())
    }

    #[test]
    fn test_registry_keeps_order() {
        let mut registry = AdapterRegistry::new();
        registry.register(AdapterEntry::of::<Qwant>("qwant", ctx()));
        registry.register(AdapterEntry::of::<Bing>("bing", ctx()));
        registry.register(AdapterEntry::of::<Wikipedia>("wikipedia", ctx()));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["qwant", "bing", "wikipedia"]);
        assert_eq!(registry.get("bing").map(|e| e.provider), Some(Provider::Bing));
    }

    #[test]
    fn test_supporting_filters_by_capability() {
        let mut registry = AdapterRegistry::new();
        registry.register(AdapterEntry::of::<Qwant>("qwant", ctx()));
        registry.register(AdapterEntry::of::<Bing>("bing", ctx()));

        let news: Vec<_> = registry
            .supporting(Capability::SearchNews)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(news, vec!["qwant"]);
        assert_eq!(registry.supporting(Capability::Search).count(), 2);
    }

    #[test]
    fn test_build_tags_provider() {
        let entry = AdapterEntry::of::<Bing>("bing", ctx());
        let adapter = entry.build(&Query::simple("rust").unwrap());
        assert_eq!(adapter.provider(), Provider::Bing);
    }
}
