//! Builds the adapter registry from configuration

use super::registry::{AdapterEntry, AdapterRegistry};
use super::traits::AdapterContext;
use super::{bing, brave, duckduckgo, google, qwant, wikipedia, yahoo};
use crate::config::{timeout_secs, EngineConfig, Settings};
use crate::query::Capability;
use crate::network::HttpClient;
use anyhow::Result;
use tracing::{info, warn};

/// Loader for initializing adapters from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Register every enabled engine, in configuration order
    pub fn load(settings: &Settings, client: HttpClient) -> Result<AdapterRegistry> {
        let mut registry = AdapterRegistry::new();

        let base = AdapterContext::new(client).with_timeouts(
            settings.outgoing.request_timeout()?,
            settings.outgoing.autocomplete_timeout()?,
        );

        for config in &settings.engines {
            if config.disabled {
                info!("Skipping disabled engine: {}", config.name);
                continue;
            }

            match Self::create_entry(config, &base) {
                Ok(entry) => {
                    info!("Loaded engine: {} ({})", config.name, config.engine);
                    registry.register(entry);
                }
                Err(e) => {
                    warn!("Failed to load engine {}: {}", config.name, e);
                }
            }
        }

        if registry.is_empty() {
            warn!("No engines loaded, every search will come back empty");
        } else {
            for capability in Capability::ALL {
                if registry.supporting(capability).next().is_none() {
                    warn!("No loaded engine supports {}", capability);
                }
            }
        }
        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Create a registry entry for one configured engine
    fn create_entry(config: &EngineConfig, base: &AdapterContext) -> Result<AdapterEntry> {
        let mut ctx = base.clone();
        if let Some(timeout) = config.timeout {
            ctx.timeout = timeout_secs("timeout", timeout)?;
        }
        if let Some(ref base_url) = config.base_url {
            url::Url::parse(base_url)?;
            ctx = ctx.with_base_url(base_url.clone());
        }

        let name = config.name.clone();
        let entry = match config.engine.as_str() {
            "google" => AdapterEntry::of::<google::Google>(name, ctx),
            "duckduckgo" => AdapterEntry::of::<duckduckgo::DuckDuckGo>(name, ctx),
            "qwant" => AdapterEntry::of::<qwant::Qwant>(name, ctx),
            "bing" => AdapterEntry::of::<bing::Bing>(name, ctx),
            "yahoo" => AdapterEntry::of::<yahoo::Yahoo>(name, ctx),
            "wikipedia" => AdapterEntry::of::<wikipedia::Wikipedia>(name, ctx),
            "brave" => AdapterEntry::of::<brave::Brave>(name, ctx),
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown engine type: {} (available: {})",
                    other,
                    Self::available_engines().join(", ")
                ));
            }
        };

        Ok(entry)
    }

    /// Engine types `create_entry` knows how to build
    pub fn available_engines() -> Vec<&'static str> {
        vec![
            "google",
            "duckduckgo",
            "qwant",
            "bing",
            "yahoo",
            "wikipedia",
            "brave",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Provider;
    use std::time::Duration;

    #[test]
    fn test_default_registry_order() {
        let registry = EngineLoader::load(&Settings::default(), HttpClient::new().unwrap()).unwrap();

        assert_eq!(
            registry.names(),
            vec!["google", "duckduckgo", "qwant", "bing", "yahoo", "wikipedia", "brave"]
        );
        assert_eq!(registry.entries()[0].ctx.timeout, Duration::from_secs(2));
        assert_eq!(
            registry.entries()[0].ctx.autocomplete_timeout,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_overrides_and_skips() {
        let mut settings = Settings::default();
        settings.engines = vec![
            EngineConfig {
                timeout: Some(0.75),
                base_url: Some("http://127.0.0.1:9000".to_string()),
                ..EngineConfig::new("brave")
            },
            EngineConfig {
                disabled: true,
                ..EngineConfig::new("bing")
            },
            EngineConfig::new("altavista"),
            EngineConfig {
                engine: "wikipedia".to_string(),
                ..EngineConfig::new("wiki")
            },
        ];

        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap()).unwrap();

        assert_eq!(registry.names(), vec!["brave", "wiki"]);
        let brave = registry.get("brave").unwrap();
        assert_eq!(brave.ctx.timeout, Duration::from_millis(750));
        assert_eq!(brave.ctx.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(registry.get("wiki").map(|e| e.provider), Some(Provider::Wikipedia));
    }

    #[test]
    fn test_invalid_outgoing_timeout_is_an_error() {
        let mut settings = Settings::default();
        settings.outgoing.request_timeout = -1.0;
        let err = EngineLoader::load(&settings, HttpClient::new().unwrap())
            .err()
            .unwrap();
        assert!(err.to_string().contains("outgoing.request_timeout"));

        let mut settings = Settings::default();
        settings.outgoing.autocomplete_timeout = f64::NAN;
        assert!(EngineLoader::load(&settings, HttpClient::new().unwrap()).is_err());
    }

    #[test]
    fn test_available_engines_all_load() {
        let mut settings = Settings::default();
        settings.engines = EngineLoader::available_engines()
            .into_iter()
            .map(EngineConfig::new)
            .collect();

        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap()).unwrap();
        assert_eq!(registry.len(), EngineLoader::available_engines().len());
        for capability in Capability::ALL {
            assert!(registry.supporting(capability).next().is_some());
        }
    }

    #[test]
    fn test_invalid_timeout_is_skipped() {
        let mut settings = Settings::default();
        settings.engines = vec![EngineConfig {
            timeout: Some(-1.0),
            ..EngineConfig::new("qwant")
        }];

        let registry = EngineLoader::load(&settings, HttpClient::new().unwrap()).unwrap();
        assert!(registry.is_empty());
    }
}
