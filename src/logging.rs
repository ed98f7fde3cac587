use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};
use thiserror::Error;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {M} - {m}{n}";

/// Sets up log4rs with a console appender and/or a file appender
///
/// # Arguments
///
/// * 'log_path' - file to append log lines to, no file logging if None
/// * 'log_level' - the level to log at
/// * 'log_to_stdout' - whether to also log to stdout
pub fn setup_logger(log_path: Option<&str>, log_level: LevelFilter, log_to_stdout: bool) -> Result<Handle, LoggerError> {
    let mut builder = Config::builder();
    let mut root = Root::builder();

    if let Some(path) = log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path)
            .map_err(|e| LoggerError(format!("log file {}: {}", path, e)))?;

        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    if log_to_stdout || log_path.is_none() {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();

        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let config = builder
        .build(root.build(log_level))
        .map_err(|e| LoggerError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| LoggerError(e.to_string()))
}

/// Error depicting errors that occur while setting up the logger
///
#[derive(Debug, Error)]
#[error("LoggerError: {0}")]
pub struct LoggerError(pub String);
