use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

use crate::{Config, WeatherReading, provider::openweather::WeatherClient};

pub mod openweather;

/// The one message a caller ever sees for a failed lookup.
pub const CITY_NOT_FOUND: &str = "City not found!";

/// Why a lookup failed. Kept for logs and `Error::source`; callers only see
/// [`FetchError::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum LookupFailure {
    #[error("request to weather provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather provider responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse weather payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("weather payload names no city")]
    Unnamed,
}

/// Failure surfaced by [`WeatherProvider::fetch_weather`]. Network trouble and
/// unknown cities look the same to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{}", CITY_NOT_FOUND)]
    NotFound(#[source] LookupFailure),
}

impl FetchError {
    pub fn cause(&self) -> &LookupFailure {
        match self {
            FetchError::NotFound(cause) => cause,
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, FetchError>;
}

/// Build the OpenWeather client using the API key resolved from `config`
/// and the environment.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key()?;
    Ok(Box::new(WeatherClient::new(api_key)))
}
