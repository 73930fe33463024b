use serde::{Deserialize, Serialize};

/// Weather category reported by the provider (`weather[0].main`).
///
/// Unrecognized categories are kept verbatim so nothing is lost when the
/// provider introduces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Thunderstorm,
    Snow,
    Other(String),
}

impl WeatherCondition {
    pub fn as_str(&self) -> &str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Clouds => "Clouds",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Other(raw) => raw,
        }
    }

    /// Glyph shown next to the condition. Unknown categories get a globe.
    pub fn icon(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "☀️",
            WeatherCondition::Clouds => "☁️",
            WeatherCondition::Rain => "🌧️",
            WeatherCondition::Thunderstorm => "⛈️",
            WeatherCondition::Snow => "❄️",
            WeatherCondition::Other(_) => "🌍",
        }
    }
}

impl From<String> for WeatherCondition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Clear" => WeatherCondition::Clear,
            "Clouds" => WeatherCondition::Clouds,
            "Rain" => WeatherCondition::Rain,
            "Thunderstorm" => WeatherCondition::Thunderstorm,
            "Snow" => WeatherCondition::Snow,
            _ => WeatherCondition::Other(value),
        }
    }
}

impl From<&str> for WeatherCondition {
    fn from(value: &str) -> Self {
        WeatherCondition::from(value.to_string())
    }
}

impl From<WeatherCondition> for String {
    fn from(value: WeatherCondition) -> Self {
        match value {
            WeatherCondition::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized snapshot of current conditions for one location.
///
/// Only `city_name` is guaranteed; every other field may be missing from the
/// provider payload and is rendered as empty text in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub city_name: String,
    pub country_code: Option<String>,
    pub temperature_celsius: Option<f64>,
    pub condition: Option<WeatherCondition>,
    pub humidity_percent: Option<u8>,
    pub wind_speed_meters_per_second: Option<f64>,
    pub sunrise_epoch_seconds: Option<i64>,
    pub sunset_epoch_seconds: Option<i64>,
}

impl WeatherReading {
    /// A reading without a city name is not shown and does not count as
    /// cached.
    pub fn has_location(&self) -> bool {
        !self.city_name.trim().is_empty()
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.condition.as_ref().map(WeatherCondition::icon)
    }
}
