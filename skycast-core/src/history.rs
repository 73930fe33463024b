//! Bounded, deduplicated list of recently searched cities.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{HISTORY_KEY, KeyValueStore};

/// Maximum number of remembered searches.
pub const HISTORY_CAPACITY: usize = 5;

/// Most-recent-first list of query strings. Never longer than
/// [`HISTORY_CAPACITY`], never holds the same string twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory(Vec<String>);

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from arbitrary entries, keeping the first occurrence of
    /// each string and at most [`HISTORY_CAPACITY`] of them.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::with_capacity(HISTORY_CAPACITY);
        for entry in entries {
            let entry = entry.into();
            if out.len() == HISTORY_CAPACITY {
                break;
            }
            if !out.contains(&entry) {
                out.push(entry);
            }
        }
        Self(out)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, city: &str) -> bool {
        self.0.iter().any(|c| c == city)
    }

    /// History after a successful search for `city`.
    ///
    /// A city already present leaves the list untouched (no move to front).
    /// A new city goes to the front and the oldest entry falls off when the
    /// list is full.
    pub fn recorded(&self, city: &str) -> SearchHistory {
        if self.contains(city) {
            return self.clone();
        }

        let mut next = Vec::with_capacity(self.0.len() + 1);
        next.push(city.to_string());
        next.extend(self.0.iter().cloned());
        next.truncate(HISTORY_CAPACITY);
        Self(next)
    }
}

impl<'a> IntoIterator for &'a SearchHistory {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Persists [`SearchHistory`] under the `weatherHistory` key.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted history. Missing or corrupt data yields an empty
    /// history.
    pub fn load(&self) -> SearchHistory {
        let Some(raw) = self.store.get(HISTORY_KEY) else {
            return SearchHistory::new();
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => {
                let history = SearchHistory::from_entries(entries.iter().cloned());
                if history.entries() != entries.as_slice() {
                    tracing::debug!(
                        stored = entries.len(),
                        kept = history.len(),
                        "normalized stored history"
                    );
                }
                history
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable search history");
                SearchHistory::new()
            }
        }
    }

    /// Record a search for `city` on top of `current` and persist the result.
    ///
    /// Nothing is written when `city` is already in the history.
    pub fn record(&self, current: &SearchHistory, city: &str) -> SearchHistory {
        if current.contains(city) {
            return current.clone();
        }

        let next = current.recorded(city);
        self.save(&next);
        next
    }

    /// Overwrite the persisted history. A failed write is logged.
    pub fn save(&self, history: &SearchHistory) {
        let result = serde_json::to_string(history)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(HISTORY_KEY, &json));

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist search history");
        }
    }
}
