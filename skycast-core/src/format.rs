//! Display helpers that turn a [`WeatherReading`] into the strings shown on
//! the weather card. Everything here is pure and infallible.

use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};

use crate::model::WeatherReading;

/// Where sunrise/sunset times are projected before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Fixed offset east of UTC, `None` when out of range.
    pub fn east_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Zone::Fixed)
    }
}

/// Hour/minute formatting rules for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLocale {
    separator: char,
    zone: Zone,
}

impl TimeLocale {
    /// `id-ID` style: two-digit hour and minute joined by a dot (`05.33`).
    pub fn indonesian(zone: Zone) -> Self {
        Self { separator: '.', zone }
    }

    /// Colon-separated 24h clock (`05:33`).
    pub fn iso(zone: Zone) -> Self {
        Self { separator: ':', zone }
    }

    /// Indonesian formatting in the machine's local zone.
    pub fn system() -> Self {
        Self::indonesian(Zone::Local)
    }

    /// Format an epoch timestamp as hour and minute of day.
    ///
    /// Timestamps chrono cannot represent produce a placeholder rather than
    /// an error.
    pub fn format_time(&self, epoch_seconds: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp(epoch_seconds, 0) else {
            return format!("--{}--", self.separator);
        };

        let (hour, minute) = match self.zone {
            Zone::Local => {
                let t = utc.with_timezone(&Local);
                (t.hour(), t.minute())
            }
            Zone::Fixed(offset) => {
                let t = utc.with_timezone(&offset);
                (t.hour(), t.minute())
            }
        };

        format!("{hour:02}{}{minute:02}", self.separator)
    }
}

impl Default for TimeLocale {
    fn default() -> Self {
        Self::system()
    }
}

/// Temperature rounded to whole degrees, e.g. `31°C`.
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°C", celsius.round() as i64)
}

/// Display strings for the weather card. Absent fields become empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadingView {
    pub location: String,
    pub temperature: String,
    pub icon: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
    pub sunrise: String,
    pub sunset: String,
}

impl ReadingView {
    pub fn new(reading: &WeatherReading, locale: &TimeLocale) -> Self {
        let location = match reading.country_code.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {country}", reading.city_name),
            _ => reading.city_name.clone(),
        };

        Self {
            location,
            temperature: reading.temperature_celsius.map(format_temperature).unwrap_or_default(),
            icon: reading.icon().unwrap_or_default().to_string(),
            condition: reading
                .condition
                .as_ref()
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            humidity: reading.humidity_percent.map(|h| format!("{h}%")).unwrap_or_default(),
            wind: reading
                .wind_speed_meters_per_second
                .map(|w| format!("{w} m/s"))
                .unwrap_or_default(),
            sunrise: reading
                .sunrise_epoch_seconds
                .map(|ts| locale.format_time(ts))
                .unwrap_or_default(),
            sunset: reading
                .sunset_epoch_seconds
                .map(|ts| locale.format_time(ts))
                .unwrap_or_default(),
        }
    }
}
