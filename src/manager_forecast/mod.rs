use std::time::Duration;
use log::info;
use reqwest::blocking::Client;
use thiserror::Error;
use crate::config::{ForecastParameters, Secrets};
use crate::models::ForecastResponse;

/// Anything that can produce an hourly forecast for a position
pub trait ForecastSource {
    /// Retrieves the hourly forecast for the given position
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude in decimal degrees
    /// * 'lon' - longitude in decimal degrees
    fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastResponse, ForecastError>;
}

/// Struct for fetching hourly weather forecasts from OpenWeatherMap's one-call API
pub struct OpenWeather {
    client: Client,
    endpoint: String,
    api_key: String,
    units: String,
}

impl OpenWeather {
    /// Returns an OpenWeather struct ready for fetching forecasts
    ///
    /// # Arguments
    ///
    /// * 'config' - forecast configuration
    /// * 'secrets' - secrets holding the api key
    pub fn new(config: &ForecastParameters, secrets: &Secrets) -> Result<OpenWeather, ForecastError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(OpenWeather {
            client,
            endpoint: config.endpoint.clone(),
            api_key: secrets.weather_api_key.clone(),
            units: config.units.clone(),
        })
    }

    /// Builds the query for a one-call request, only hourly data is requested
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude in decimal degrees
    /// * 'lon' - longitude in decimal degrees
    fn query(&self, lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.clone()),
            ("exclude", "current,minutely,daily".to_string()),
        ]
    }
}

impl ForecastSource for OpenWeather {
    fn fetch(&self, lat: f64, lon: f64) -> Result<ForecastResponse, ForecastError> {
        let response = self.client
            .get(&self.endpoint)
            .query(&self.query(lat, lon))
            .send()?;

        let status = response.status();
        let json = response.text()?;
        if !status.is_success() {
            return Err(ForecastError::HttpStatus(status.as_u16(), json));
        }

        let forecast: ForecastResponse = serde_json::from_str(&json)
            .map_err(|e| ForecastError::ParseError(e.to_string()))?;

        info!("Forecast received with {} hourly entries", forecast.hourly.len());

        Ok(forecast)
    }
}

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("HttpStatus: {0}: {1}")]
    HttpStatus(u16, String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
}
