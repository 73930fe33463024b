//! Core library for the `skycast` weather dashboard.
//!
//! This crate defines:
//! - Configuration & API key resolution
//! - The OpenWeather client behind the `WeatherProvider` abstraction
//! - Domain models (readings, conditions) and display formatting
//! - Search history and last-reading persistence over a key-value store
//! - The `Dashboard` state holder that drives searches
//!
//! It is used by `skycast-cli`, but can be driven by any other front end.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod history;
pub mod model;
pub mod provider;
pub mod storage;

pub use cache::ReadingCache;
pub use config::Config;
pub use dashboard::{DEFAULT_CITY, Dashboard, DashboardState, SearchOutcome};
pub use format::{ReadingView, TimeLocale, Zone};
pub use history::{HISTORY_CAPACITY, HistoryStore, SearchHistory};
pub use model::{WeatherCondition, WeatherReading};
pub use provider::{
    CITY_NOT_FOUND, FetchError, LookupFailure, WeatherProvider, openweather::WeatherClient,
    provider_from_config,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
