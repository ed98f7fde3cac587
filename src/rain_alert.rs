use log::info;
use crate::manager_sms::{Notifier, SmsError};
use crate::models::{ForecastResponse, HourlyEntry};

/// Number of upcoming hours inspected for precipitation
const ALERT_HOURS: usize = 12;

/// Condition codes below this are thunderstorm, drizzle, rain and snow
const PRECIPITATION_LIMIT: u32 = 600;

/// Returns true if any of the upcoming hours has a precipitation class condition.
/// Entries without a condition descriptor don't count as precipitation.
///
/// # Arguments
///
/// * 'forecast' - hourly forecast, possibly shorter than the inspected window
pub fn will_rain(forecast: &ForecastResponse) -> bool {
    first_precipitation(forecast).is_some()
}

/// Returns the first upcoming hour with a precipitation class condition
///
/// # Arguments
///
/// * 'forecast' - hourly forecast
fn first_precipitation(forecast: &ForecastResponse) -> Option<&HourlyEntry> {
    forecast.hourly
        .iter()
        .take(ALERT_HOURS)
        .find(|h| h.condition_code().is_some_and(|code| code < PRECIPITATION_LIMIT))
}

/// Sends one SMS if rain is expected, returns whether a message was sent
///
/// # Arguments
///
/// * 'forecast' - hourly forecast
/// * 'notifier' - where to send the warning
/// * 'message' - warning text
pub fn alert_on_rain(forecast: &ForecastResponse, notifier: &dyn Notifier, message: &str) -> Result<bool, SmsError> {
    let Some(hour) = first_precipitation(forecast) else {
        info!("No rain expected in the next {} hours", ALERT_HOURS);
        return Ok(false);
    };

    if let (Some(time), Some(condition)) = (hour.valid_time(), hour.weather.first()) {
        info!("Precipitation expected from {}: {} ({})", time.format("%H:%M UTC"), condition.main, condition.description);
    }

    let receipt = notifier.send_sms(message)?;
    info!("Rain alert SMS status: {}", receipt.status);

    Ok(true)
}
