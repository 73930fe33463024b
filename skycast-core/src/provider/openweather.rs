use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::model::{WeatherCondition, WeatherReading};

use super::{FetchError, LookupFailure, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeather "current weather" client, metric units.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Look up current conditions for `city`. One request, no retries; every
    /// failure collapses into [`FetchError::NotFound`].
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, FetchError> {
        match self.lookup(city).await {
            Ok(reading) => {
                tracing::debug!(resolved = %reading.city_name, "weather lookup succeeded");
                Ok(reading)
            }
            Err(cause) => {
                tracing::warn!(error = %cause, "weather lookup failed");
                Err(FetchError::NotFound(cause))
            }
        }
    }

    async fn lookup(&self, city: &str) -> Result<WeatherReading, LookupFailure> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("units", "metric"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(LookupFailure::Status { status, body: truncate_body(&body) });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        let reading = WeatherReading::from(parsed);
        if !reading.has_location() {
            return Err(LookupFailure::Unnamed);
        }
        Ok(reading)
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, FetchError> {
        WeatherClient::fetch_weather(self, city).await
    }
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    wind: Option<OwWind>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

impl From<OwCurrentResponse> for WeatherReading {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (country_code, sunrise, sunset) = match parsed.sys {
            Some(sys) => (sys.country, sys.sunrise, sys.sunset),
            None => (None, None, None),
        };

        let condition = parsed
            .weather
            .into_iter()
            .next()
            .and_then(|w| w.main)
            .map(WeatherCondition::from);

        WeatherReading {
            city_name: parsed.name,
            country_code,
            temperature_celsius: parsed.main.as_ref().and_then(|m| m.temp),
            condition,
            humidity_percent: parsed.main.as_ref().and_then(|m| m.humidity),
            wind_speed_meters_per_second: parsed.wind.and_then(|w| w.speed),
            sunrise_epoch_seconds: sunrise,
            sunset_epoch_seconds: sunset,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
