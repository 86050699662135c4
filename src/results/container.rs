//! Result container that folds adapter outcomes into one response
//!
//! Outcomes must be added in registry order. The container never reorders
//! hits: the final list is registry order, then each adapter's own order,
//! with duplicates and invalid hits removed.

use super::types::*;
use std::collections::HashSet;
use std::time::Duration;

/// Accumulates settled adapter outcomes for one aggregation call
#[derive(Debug, Clone)]
pub struct ResultContainer<T> {
    hits: Vec<T>,
    suggestion: Option<String>,
    knowledge_box: Option<KnowledgeBox>,
    unresponsive: Vec<UnresponsiveProvider>,
}

impl<T> Default for ResultContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultContainer<T> {
    /// Create a new empty container
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            suggestion: None,
            knowledge_box: None,
            unresponsive: Vec::new(),
        }
    }

    /// Fold outcomes in the order given
    pub fn fold(outcomes: impl IntoIterator<Item = AdapterOutcome<T>>) -> Self {
        let mut container = Self::new();
        for outcome in outcomes {
            container.add_outcome(outcome);
        }
        container
    }

    /// Fold in one outcome. Failed outcomes only leave an unresponsive record.
    pub fn add_outcome(&mut self, outcome: AdapterOutcome<T>) {
        if !outcome.success {
            self.unresponsive.push(UnresponsiveProvider {
                provider: outcome.provider,
                error: outcome.failure.unwrap_or(FailureKind::Network),
            });
            return;
        }

        self.hits.extend(outcome.hits);

        if self.suggestion.is_none() {
            self.suggestion = outcome.suggestion.filter(|s| !s.trim().is_empty());
        }

        if self.knowledge_box.is_none() {
            self.knowledge_box = outcome.knowledge_box;
        }
    }
}

impl<T: Hit> ResultContainer<T> {
    /// Normalize the hits and package the response
    pub fn finish(self, elapsed: Duration) -> AggregatedResponse<T> {
        let hits = normalize(self.hits);
        let count = hits.len();

        AggregatedResponse {
            hits,
            suggestion: self.suggestion,
            knowledge_box: self.knowledge_box,
            elapsed,
            times: format_elapsed(elapsed),
            count,
            unresponsive: self.unresponsive,
        }
    }
}

impl ResultContainer<String> {
    /// Flatten autocomplete suggestions, keeping the first of each
    pub fn finish_autocomplete(self, elapsed: Duration) -> AutocompleteResponse {
        let suggestions = dedup_by(self.hits, |s| s.as_str());
        let count = suggestions.len();

        AutocompleteResponse {
            suggestions,
            elapsed,
            times: format_elapsed(elapsed),
            count,
            unresponsive: self.unresponsive,
        }
    }
}

/// Dedup by unique key, then by title, then drop invalid hits
pub fn normalize<T: Hit>(hits: Vec<T>) -> Vec<T> {
    let hits = dedup_by(hits, |h| h.unique_key());
    let hits = dedup_by(hits, |h| h.title());
    hits.into_iter().filter(|h| h.is_valid()).collect()
}

/// Keep the first item for every key, preserving order
pub fn dedup_by<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(key(item).to_string()))
        .collect()
}

/// Format elapsed time the way responses report it
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{} ms", elapsed.as_millis())
}
