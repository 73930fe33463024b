use std::sync::Arc;

use crate::{
    model::WeatherReading,
    storage::{KeyValueStore, LAST_WEATHER_KEY},
};

/// Remembers the last successful reading across restarts.
#[derive(Debug, Clone)]
pub struct ReadingCache {
    store: Arc<dyn KeyValueStore>,
}

impl ReadingCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load_last(&self) -> Option<WeatherReading> {
        let raw = self.store.get(LAST_WEATHER_KEY)?;
        match serde_json::from_str::<WeatherReading>(&raw) {
            Ok(reading) if reading.has_location() => Some(reading),
            Ok(_) => {
                tracing::warn!("ignoring cached reading without a city name");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable cached reading");
                None
            }
        }
    }

    /// Overwrite the cached reading. A failed write is logged; the in-memory
    /// state stays authoritative.
    pub fn save_last(&self, reading: &WeatherReading) {
        let result = serde_json::to_string(reading)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(LAST_WEATHER_KEY, &json));

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist last reading");
        }
    }
}
