//! State holder tying the provider, history store and reading cache together.
//!
//! The read model ([`DashboardState`]) lives in a `tokio::sync::watch`
//! channel so renderers can subscribe instead of polling. Every fetch gets a
//! sequence number when issued; a completion is applied only if no
//! later-issued fetch has completed first. Stale completions change nothing,
//! neither the state nor storage.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Mutex, watch};

use crate::{
    cache::ReadingCache,
    history::{HistoryStore, SearchHistory},
    model::WeatherReading,
    provider::WeatherProvider,
    storage::KeyValueStore,
};

/// City looked up on startup when nothing is cached.
pub const DEFAULT_CITY: &str = "Jakarta";

/// What the interface shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub reading: Option<WeatherReading>,
    pub error: Option<String>,
    pub history: SearchHistory,
}

impl DashboardState {
    /// State while a fetch is in flight: the old reading stays, the error goes.
    pub fn fetch_started(&self) -> Self {
        Self { error: None, ..self.clone() }
    }

    pub fn fetch_succeeded(&self, reading: WeatherReading) -> Self {
        Self { reading: Some(reading), error: None, history: self.history.clone() }
    }

    /// Failure keeps the previous reading on screen next to the message.
    pub fn fetch_failed(&self, message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), ..self.clone() }
    }

    pub fn with_history(&self, history: SearchHistory) -> Self {
        Self { history, ..self.clone() }
    }
}

/// Result of a caller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input; nothing was fetched.
    Skipped,
    /// A new reading is shown.
    Updated,
    /// The lookup failed and the error message is shown.
    Failed,
    /// A fetch issued later completed first; this result was dropped.
    Stale,
}

#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    history: HistoryStore,
    readings: ReadingCache,
    state: watch::Sender<DashboardState>,
    issued: AtomicU64,
    /// Sequence number of the last completion that touched the state.
    applied: Mutex<u64>,
}

impl Dashboard {
    /// Restore persisted history and last reading. Never fails: unreadable
    /// storage starts the dashboard empty.
    pub fn new(provider: Box<dyn WeatherProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        let history = HistoryStore::new(store.clone());
        let readings = ReadingCache::new(store);

        let initial = DashboardState {
            reading: readings.load_last(),
            error: None,
            history: history.load(),
        };
        tracing::debug!(
            cached_reading = initial.reading.is_some(),
            history_len = initial.history.len(),
            "dashboard state restored"
        );

        let (state, _) = watch::channel(initial);

        Self {
            provider,
            history,
            readings,
            state,
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Fetch [`DEFAULT_CITY`] when no named reading was restored. The implicit
    /// fetch is never recorded in history. Returns `None` when nothing was
    /// fetched.
    pub async fn startup(&self) -> Option<SearchOutcome> {
        if self.state.borrow().reading.as_ref().is_some_and(WeatherReading::has_location) {
            return None;
        }

        tracing::info!(city = DEFAULT_CITY, "no cached reading; fetching default city");
        Some(self.fetch(DEFAULT_CITY, false).await)
    }

    /// Search for `city` as typed. Blank input is ignored without touching
    /// the network or the state.
    pub async fn search(&self, city: &str) -> SearchOutcome {
        if city.trim().is_empty() {
            return SearchOutcome::Skipped;
        }

        self.fetch(city, true).await
    }

    /// Re-run a search for an entry picked from the history panel.
    ///
    /// Goes through the same history rule as a typed search, so an entry
    /// already listed keeps its position.
    pub async fn select_from_history(&self, city: &str) -> SearchOutcome {
        self.search(city).await
    }

    async fn fetch(&self, city: &str, record: bool) -> SearchOutcome {
        let seq = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        self.state.send_if_modified(|state| {
            if state.error.is_none() {
                return false;
            }
            *state = state.fetch_started();
            true
        });

        let result = self.provider.fetch_weather(city).await;

        // Held until the result is persisted so completions apply and write
        // in sequence order.
        let mut applied = self.applied.lock().await;
        if seq <= *applied {
            tracing::debug!(city, seq, applied = *applied, "discarding stale fetch result");
            return SearchOutcome::Stale;
        }
        *applied = seq;

        let mut pending = PendingWrites::default();
        let outcome = match result {
            Ok(reading) => {
                self.state.send_if_modified(|state| {
                    let mut next = state.fetch_succeeded(reading.clone());
                    if record {
                        let history = state.history.recorded(city);
                        if history != state.history {
                            pending.history = Some(history.clone());
                            next = next.with_history(history);
                        }
                    }
                    if next == *state {
                        return false;
                    }
                    *state = next;
                    true
                });
                pending.reading = Some(reading);
                SearchOutcome::Updated
            }
            Err(err) => {
                let message = err.to_string();
                self.state.send_if_modified(|state| {
                    if state.error.as_deref() == Some(message.as_str()) {
                        return false;
                    }
                    *state = state.fetch_failed(message.as_str());
                    true
                });
                SearchOutcome::Failed
            }
        };

        self.persist(pending).await;
        outcome
    }

    /// Write an applied result to storage on the blocking pool, outside the
    /// watch lock.
    async fn persist(&self, pending: PendingWrites) {
        if pending.reading.is_none() && pending.history.is_none() {
            return;
        }

        let readings = self.readings.clone();
        let history = self.history.clone();
        let written = tokio::task::spawn_blocking(move || {
            if let Some(reading) = &pending.reading {
                readings.save_last(reading);
            }
            if let Some(entries) = &pending.history {
                history.save(entries);
            }
        })
        .await;

        if let Err(err) = written {
            tracing::warn!(error = %err, "persisting dashboard state failed");
        }
    }
}

#[derive(Debug, Default)]
struct PendingWrites {
    reading: Option<WeatherReading>,
    history: Option<SearchHistory>,
}
