//! Metrics collection module
//!
//! Tracks per-provider response times, failure counts and aggregation
//! volume. Recording never fails; a poisoned lock is recovered.

use crate::query::Capability;
use crate::results::{FailureKind, Provider};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Response times kept per provider for the rolling average
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    successes: u64,
    failures: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// Shared metrics collector
pub struct Metrics {
    aggregations: RwLock<HashMap<Capability, u64>>,
    total: AtomicU64,
    providers: RwLock<HashMap<Provider, ProviderCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            aggregations: RwLock::new(HashMap::new()),
            total: AtomicU64::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    fn providers_mut(&self) -> RwLockWriteGuard<'_, HashMap<Provider, ProviderCounters>> {
        self.providers.write().unwrap_or_else(|e| e.into_inner())
    }

    fn providers(&self) -> RwLockReadGuard<'_, HashMap<Provider, ProviderCounters>> {
        self.providers.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Count one aggregation call
    pub fn record_aggregation(&self, capability: Capability) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let mut aggregations = self.aggregations.write().unwrap_or_else(|e| e.into_inner());
        *aggregations.entry(capability).or_insert(0) += 1;
    }

    /// Record one settled adapter call
    pub fn record_outcome(&self, provider: Provider, failure: Option<FailureKind>, elapsed: Duration) {
        let mut providers = self.providers_mut();
        let counters = providers.entry(provider).or_default();

        counters.calls += 1;
        match failure {
            None => counters.successes += 1,
            Some(kind) => {
                counters.failures += 1;
                if kind == FailureKind::Timeout {
                    counters.timeouts += 1;
                }
            }
        }

        if counters.response_times.len() >= RESPONSE_WINDOW {
            counters.response_times.pop_front();
        }
        counters.response_times.push_back(elapsed.as_millis() as u64);
    }

    /// Get total aggregation calls
    pub fn total_aggregations(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Get average response time for a provider, in ms
    pub fn avg_response_time(&self, provider: Provider) -> Option<u64> {
        let providers = self.providers();
        providers.get(&provider).and_then(|c| average(&c.response_times))
    }

    /// Get reliability percentage for a provider
    pub fn reliability(&self, provider: Provider) -> f64 {
        let providers = self.providers();
        providers.get(&provider).map_or(100.0, reliability)
    }

    /// Snapshot of everything recorded so far
    pub fn snapshot(&self) -> MetricsSnapshot {
        let aggregations = self
            .aggregations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(capability, count)| (capability.as_str().to_string(), *count))
            .collect();

        let providers = self
            .providers()
            .iter()
            .map(|(provider, counters)| {
                (
                    provider.name().to_string(),
                    ProviderStats {
                        calls: counters.calls,
                        failures: counters.failures,
                        timeouts: counters.timeouts,
                        avg_response_time_ms: average(&counters.response_times),
                        reliability: reliability(counters),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            total_aggregations: self.total_aggregations(),
            aggregations,
            providers,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn average(times: &VecDeque<u64>) -> Option<u64> {
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    if counters.calls == 0 {
        100.0
    } else {
        (counters.successes as f64 / counters.calls as f64) * 100.0
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

/// Serializable view served by `/stats`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_aggregations: u64,
    pub aggregations: BTreeMap<String, u64>,
    pub providers: BTreeMap<String, ProviderStats>,
}
