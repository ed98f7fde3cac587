use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Hourly forecast as returned by the one-call endpoint with everything but `hourly` excluded
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ForecastResponse {
    pub hourly: Vec<HourlyEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HourlyEntry {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub weather: Vec<WeatherCondition>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherCondition {
    pub id: u32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

impl HourlyEntry {
    /// Returns the timestamp of the entry in UTC, or None if it is out of range
    pub fn valid_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.dt, 0)
    }

    /// Condition code of the primary weather descriptor
    pub fn condition_code(&self) -> Option<u32> {
        self.weather.first().map(|w| w.id)
    }
}
