use log::info;
use thiserror::Error;
use crate::config::{load_config, Config, LoadConfigurationError};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_forecast::{ForecastError, ForecastSource, OpenWeather};
use crate::manager_mail::{Mail, MailError, MailSender};
use crate::manager_sms::{Notifier, SmsError, Twilio};
use crate::report::{ChartReport, ReportRenderer};
use crate::scheduler::{SchedulerError, Trigger};

pub struct Mgr {
    pub forecast: Box<dyn ForecastSource>,
    pub sms: Box<dyn Notifier>,
    pub report: Box<dyn ReportRenderer>,
    pub mail: Box<dyn MailSender>,
}

/// Command line options
pub struct Args {
    pub config_path: Option<String>,
    pub once: bool,
}

impl Args {
    /// Parses `--config=<path>` and `--once` from the given arguments, anything else is ignored
    ///
    /// # Arguments
    ///
    /// * 'args' - program arguments, including the program name
    pub fn parse(args: &[String]) -> Args {
        let config_path = args.iter()
            .find(|p| p.starts_with("--config="))
            .and_then(|p| p.split_once('='))
            .map(|(_, path)| path.to_string());
        let once = args.iter().any(|a| a == "--once");

        Args { config_path, once }
    }
}

/// Initializes and returns configuration, the trigger and a Mgr struct holding the initialized services
///
/// # Arguments
///
/// * 'args' - parsed command line options
pub fn init(args: &Args) -> Result<(Config, Trigger, Mgr), InitializationError> {
    // Load configuration
    let config = load_config(args.config_path.as_deref())?;

    // Setup logging
    let _ = setup_logger(config.settings.general.log_path.as_deref(), config.settings.general.log_level, config.settings.general.log_to_stdout)?;

    // Print version
    info!("starting weather notifier version: {}", env!("CARGO_PKG_VERSION"));

    let trigger = Trigger::new(&config.settings.schedule)?;

    // Instantiate structs
    let forecast = OpenWeather::new(&config.settings.forecast, &config.secrets)?;
    let sms = Twilio::new(&config.settings.sms, &config.secrets)?;
    let report = ChartReport::new(&config.settings.report);
    let mail = Mail::new(&config.settings.mail, &config.secrets)?;

    let mgr = Mgr {
        forecast: Box::new(forecast),
        sms: Box::new(sms),
        report: Box::new(report),
        mail: Box::new(mail),
    };

    Ok((config, trigger, mgr))
}

/// Error depicting errors that occur while initializing the notifier
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("SchedulerSetupError: {0}")]
    SchedulerSetupError(#[from] SchedulerError),
    #[error("ForecastSetupError: {0}")]
    ForecastSetupError(#[from] ForecastError),
    #[error("SmsSetupError: {0}")]
    SmsSetupError(#[from] SmsError),
    #[error("MailSetupError: {0}")]
    MailSetupError(#[from] MailError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_config_and_once() {
        let parsed = Args::parse(&args(&["weather_notifier", "--config=/etc/weather.toml", "--once"]));

        assert_eq!(parsed.config_path.as_deref(), Some("/etc/weather.toml"));
        assert!(parsed.once);
    }

    #[test]
    fn defaults_to_daemon_without_config() {
        let parsed = Args::parse(&args(&["weather_notifier"]));

        assert_eq!(parsed.config_path, None);
        assert!(!parsed.once);
    }
}
