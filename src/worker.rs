use log::info;
use thiserror::Error;
use crate::config::Settings;
use crate::initialization::Mgr;
use crate::manager_forecast::ForecastError;
use crate::manager_mail::MailError;
use crate::manager_sms::SmsError;
use crate::rain_alert::alert_on_rain;
use crate::report::ReportError;

/// Runs the daily notification pipeline: fetch forecast, warn about rain, render and mail the report.
/// The first failing step aborts the run; nothing already done is rolled back.
///
/// # Arguments
///
/// * 'mgr' - struct with configured managers
/// * 'settings' - configuration settings
pub fn run(mgr: &Mgr, settings: &Settings) -> Result<(), WorkerError> {
    let forecast = mgr.forecast.fetch(settings.location.lat, settings.location.lon)?;

    let sms_sent = alert_on_rain(&forecast, mgr.sms.as_ref(), &settings.sms.message)?;

    let report = mgr.report.render(&forecast)?;

    mgr.mail.send_report(&report)?;

    info!("Run completed, sms sent: {}, report: {}", sms_sent, report.display());

    Ok(())
}

/// Error depicting errors that occur while running the pipeline
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error while fetching forecast: {0}")]
    ForecastError(#[from] ForecastError),
    #[error("error while sending rain alert: {0}")]
    SmsError(#[from] SmsError),
    #[error("error while rendering report: {0}")]
    ReportError(#[from] ReportError),
    #[error("error while mailing report: {0}")]
    MailError(#[from] MailError),
}
