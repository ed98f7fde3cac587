use std::env;
use std::fs;
use std::path::PathBuf;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GeoRef {
    pub lat: f64,
    pub lon: f64,
}

impl Default for GeoRef {
    fn default() -> Self {
        Self { lat: 50.064651, lon: 19.944981 }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScheduleParameters {
    pub cron: String,
    pub run_on_startup: bool,
    pub grace_seconds: i64,
}

impl Default for ScheduleParameters {
    fn default() -> Self {
        Self {
            cron: "0 0 7 * * *".to_string(),
            run_on_startup: true,
            grace_seconds: 60,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ForecastParameters {
    pub endpoint: String,
    pub units: String,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openweathermap.org/data/3.0/onecall".to_string(),
            units: "metric".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SmsParameters {
    pub endpoint: String,
    pub message: String,
}

impl Default for SmsParameters {
    fn default() -> Self {
        Self {
            endpoint: "https://api.twilio.com/2010-04-01".to_string(),
            message: "There might be raining today. Don't forget your umbrella! ☂️".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MailParameters {
    pub smtp_endpoint: String,
    pub subject: String,
    pub content_path: PathBuf,
}

impl Default for MailParameters {
    fn default() -> Self {
        Self {
            smtp_endpoint: "smtp.gmail.com".to_string(),
            subject: "Daily weather report!".to_string(),
            content_path: PathBuf::from("content.txt"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReportParameters {
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl Default for ReportParameters {
    fn default() -> Self {
        Self {
            output_dir: env::temp_dir(),
            file_name: "daily_weather.png".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LevelFilter::Info,
            log_to_stdout: true,
        }
    }
}

/// Credentials and identifiers read from the process environment
///
#[derive(Clone)]
pub struct Secrets {
    pub weather_api_key: String,
    pub twilio_sid: String,
    pub twilio_token: String,
    pub sender_pnr: String,
    pub recipient_pnr: String,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_email: String,
}

impl Secrets {
    /// Reads all secrets from the process environment
    pub fn from_env() -> Result<Self, LoadConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads all secrets through the given lookup function
    ///
    /// # Arguments
    ///
    /// * 'lookup' - returns the value of a variable, or None if it is not set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoadConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| LoadConfigurationError::MissingVariable(key.to_string()))
        };

        Ok(Self {
            weather_api_key: var("WEATHER_API_KEY")?,
            twilio_sid: var("TWILIO_SID")?,
            twilio_token: var("TWILIO_TOKEN")?,
            sender_pnr: var("SENDER_PNR")?,
            recipient_pnr: var("RECIPIENT_PNR")?,
            sender_email: var("SENDER_EMAIL")?,
            sender_password: var("SENDER_PASSWORD")?,
            recipient_email: var("RECIPIENT_EMAIL")?,
        })
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Settings {
    pub location: GeoRef,
    pub schedule: ScheduleParameters,
    pub forecast: ForecastParameters,
    pub sms: SmsParameters,
    pub mail: MailParameters,
    pub report: ReportParameters,
    pub general: General,
}

pub struct Config {
    pub settings: Settings,
    pub secrets: Secrets,
}

/// Loads the configuration file (if any) and the environment secrets and returns a struct
/// with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file, defaults are used for all settings if None
pub fn load_config(config_path: Option<&str>) -> Result<Config, LoadConfigurationError> {
    let settings = match config_path {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let secrets = Secrets::from_env()?;

    Ok(Config { settings, secrets })
}

/// Loads the settings part of the configuration
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
fn load_settings(config_path: &str) -> Result<Settings, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| LoadConfigurationError::FileError(format!("{}: {}", config_path, e)))?;

    parse_settings(&toml)
}

/// Parses settings from a TOML document
///
/// # Arguments
///
/// * 'toml' - the document
fn parse_settings(toml: &str) -> Result<Settings, LoadConfigurationError> {
    toml::from_str(toml).map_err(|e| LoadConfigurationError::ParseError(e.to_string()))
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum LoadConfigurationError {
    #[error("FileError: {0}")]
    FileError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("MissingVariable: {0}")]
    MissingVariable(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("WEATHER_API_KEY", "owm-key"),
            ("TWILIO_SID", "AC123"),
            ("TWILIO_TOKEN", "token"),
            ("SENDER_PNR", "+15550001"),
            ("RECIPIENT_PNR", "+15550002"),
            ("SENDER_EMAIL", "sender@example.com"),
            ("SENDER_PASSWORD", "secret"),
            ("RECIPIENT_EMAIL", "recipient@example.com"),
        ])
    }

    #[test]
    fn secrets_are_read_through_lookup() {
        let vars = full_env();
        let secrets = Secrets::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(secrets.weather_api_key, "owm-key");
        assert_eq!(secrets.twilio_sid, "AC123");
        assert_eq!(secrets.recipient_email, "recipient@example.com");
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let mut vars = full_env();
        vars.remove("TWILIO_TOKEN");

        let err = Secrets::from_lookup(|k| vars.get(k).map(|v| v.to_string())).err().unwrap();
        assert!(matches!(err, LoadConfigurationError::MissingVariable(ref k) if k == "TWILIO_TOKEN"));
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("SENDER_EMAIL", "");

        assert!(Secrets::from_lookup(|k| vars.get(k).map(|v| v.to_string())).is_err());
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings = parse_settings(r#"
            [location]
            lat = 59.33
            lon = 18.06

            [schedule]
            run_on_startup = false

            [general]
            log_level = "debug"
        "#).unwrap();

        assert_eq!(settings.location.lat, 59.33);
        assert_eq!(settings.location.lon, 18.06);
        assert!(!settings.schedule.run_on_startup);
        assert_eq!(settings.schedule.cron, "0 0 7 * * *");
        assert_eq!(settings.general.log_level, LevelFilter::Debug);
        assert_eq!(settings.forecast.units, "metric");
        assert_eq!(settings.mail.subject, "Daily weather report!");
        assert_eq!(settings.report.file_name, "daily_weather.png");
    }

    #[test]
    fn empty_document_gives_defaults() {
        let settings = parse_settings("").unwrap();

        assert_eq!(settings.location.lat, 50.064651);
        assert_eq!(settings.location.lon, 19.944981);
        assert_eq!(settings.mail.smtp_endpoint, "smtp.gmail.com");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_settings("[location\nlat = ").err().unwrap();
        assert!(matches!(err, LoadConfigurationError::ParseError(_)));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = load_settings("/nonexistent/weather_notifier.toml").err().unwrap();
        assert!(matches!(err, LoadConfigurationError::FileError(_)));
    }
}
