//! Settings structures for Scout configuration

use crate::locales::Locale;
use crate::query::SafeSearch;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    /// Registry order; earlier engines win suggestion and knowledge box ties
    pub engines: Vec<EngineConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            search: SearchSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            engines: default_engines(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SCOUT_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("SCOUT_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("SCOUT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SCOUT_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("SCOUT_REQUEST_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.outgoing.request_timeout = timeout;
            }
        }
    }

    /// Get engine config by name
    pub fn get_engine(&self, name: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.name == name)
    }

    /// Enabled engines in registry order
    pub fn enabled_engines(&self) -> Vec<&EngineConfig> {
        self.engines.iter().filter(|e| !e.disabled).collect()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug mode
    pub debug: bool,
    /// Instance name reported by /health
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Scout".to_string(),
        }
    }
}

/// Search defaults applied when a request leaves a field out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub safe_search: SafeSearch,
    pub default_locale: Locale,
    /// Highest page a request may ask for (0 = unlimited)
    pub max_page: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            safe_search: SafeSearch::default(),
            default_locale: Locale::default(),
            max_page: 10,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-adapter timeout for search capabilities, in seconds
    pub request_timeout: f64,
    /// Per-adapter timeout for autocomplete, in seconds
    pub autocomplete_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Fixed user agent (none = random)
    pub useragent: Option<String>,
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 2.0,
            autocomplete_timeout: 0.5,
            pool_maxsize: 20,
            verify_ssl: true,
            useragent: None,
            proxies: ProxySettings::default(),
        }
    }
}

impl OutgoingSettings {
    /// `request_timeout` as a duration
    pub fn request_timeout(&self) -> Result<Duration> {
        timeout_secs("outgoing.request_timeout", self.request_timeout)
    }

    /// `autocomplete_timeout` as a duration
    pub fn autocomplete_timeout(&self) -> Result<Duration> {
        timeout_secs("outgoing.autocomplete_timeout", self.autocomplete_timeout)
    }
}

/// Convert a timeout in seconds; it must be finite and greater than zero
pub fn timeout_secs(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|timeout| !timeout.is_zero())
        .ok_or_else(|| anyhow::anyhow!("{} must be a positive number of seconds, got {}", name, secs))
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name (unique identifier)
    pub name: String,
    /// Adapter to use
    pub engine: String,
    /// Whether engine is disabled
    pub disabled: bool,
    /// Custom search timeout for this engine, in seconds
    pub timeout: Option<f64>,
    /// Replaces the scheme and host of every provider endpoint
    pub base_url: Option<String>,
}

impl EngineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            engine: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// Default engine configurations, in registry order
fn default_engines() -> Vec<EngineConfig> {
    ["google", "duckduckgo", "qwant", "bing", "yahoo", "wikipedia", "brave"]
        .into_iter()
        .map(EngineConfig::new)
        .collect()
}
