use std::fmt;
use std::fmt::Formatter;
use std::thread;
use chrono::{DateTime, TimeDelta, Utc};
use cron::Schedule;
use log::{error, info, warn};
use thiserror::Error;
use crate::config::ScheduleParameters;

/// How far back to look for the latest fire time of the schedule
const LOOKBACK_DAYS: i64 = 8;

/// Information about one trigger invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TimerInfo {
    pub scheduled: DateTime<Utc>,
    pub fired: DateTime<Utc>,
    pub past_due: bool,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for TimerInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "scheduled {}, fired {}, past due: {}", self.scheduled.to_rfc3339(), self.fired.to_rfc3339(), self.past_due)
    }
}

/// Cron based trigger for the daily run
pub struct Trigger {
    schedule: Schedule,
    grace: TimeDelta,
    run_on_startup: bool,
}

impl Trigger {
    /// Returns a new Trigger
    ///
    /// # Arguments
    ///
    /// * 'config' - schedule configuration, the cron expression is evaluated in UTC
    pub fn new(config: &ScheduleParameters) -> Result<Trigger, SchedulerError> {
        let schedule = config.cron.parse::<Schedule>()
            .map_err(|e| SchedulerError::InvalidCronExpression(format!("{}: {}", config.cron, e)))?;

        let grace = TimeDelta::try_seconds(config.grace_seconds.max(0))
            .ok_or_else(|| SchedulerError::InvalidGrace(config.grace_seconds))?;

        Ok(Trigger {
            schedule,
            grace,
            run_on_startup: config.run_on_startup,
        })
    }

    /// Returns the first fire time strictly after the given time
    ///
    /// # Arguments
    ///
    /// * 'after' - time to search from
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Returns the latest fire time at or before the given time, looking back at most eight days
    ///
    /// # Arguments
    ///
    /// * 'at' - time to search back from
    pub fn last_at_or_before(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let from = at - TimeDelta::days(LOOKBACK_DAYS);
        self.schedule
            .after(&from)
            .take_while(|t| *t <= at)
            .last()
    }

    /// Builds timer info for an invocation
    ///
    /// # Arguments
    ///
    /// * 'scheduled' - when the invocation was due
    /// * 'fired' - when it actually started
    pub fn timer_info(&self, scheduled: DateTime<Utc>, fired: DateTime<Utc>) -> TimerInfo {
        TimerInfo {
            scheduled,
            fired,
            past_due: fired - scheduled > self.grace,
        }
    }

    /// Runs the job once for the latest due fire time, as when started by an external timer.
    /// Whatever the job returns is returned.
    ///
    /// # Arguments
    ///
    /// * 'now' - current time
    /// * 'job' - the job to run
    pub fn run_once<F, E>(&self, now: DateTime<Utc>, mut job: F) -> Result<(), E>
    where
        F: FnMut(&TimerInfo) -> Result<(), E>,
        E: fmt::Display,
    {
        let scheduled = self.last_at_or_before(now).unwrap_or(now);
        let timer = self.timer_info(scheduled, now);

        invoke(&timer, &mut job)
    }

    /// Runs the job for every fire time of the schedule, never returns unless the schedule runs out.
    /// A failing job is logged and the trigger waits for the next fire time.
    ///
    /// # Arguments
    ///
    /// * 'job' - the job to run
    pub fn run_forever<F, E>(&self, mut job: F)
    where
        F: FnMut(&TimerInfo) -> Result<(), E>,
        E: fmt::Display,
    {
        if self.run_on_startup {
            let now = Utc::now();
            let _ = invoke(&self.timer_info(now, now), &mut job);
        }

        loop {
            let Some(next) = self.next_after(Utc::now()) else {
                warn!("Schedule has no upcoming fire time, stopping");
                return;
            };
            info!("Next run scheduled at {}", next.to_rfc3339());

            if let Ok(wait) = (next - Utc::now()).to_std() {
                thread::sleep(wait);
            }

            let _ = invoke(&self.timer_info(next, Utc::now()), &mut job);
        }
    }
}

/// Logs the invocation and runs the job
///
/// # Arguments
///
/// * 'timer' - invocation info
/// * 'job' - the job to run
fn invoke<F, E>(timer: &TimerInfo, job: &mut F) -> Result<(), E>
where
    F: FnMut(&TimerInfo) -> Result<(), E>,
    E: fmt::Display,
{
    if timer.past_due {
        warn!("The timer is past due! {}", timer);
    }
    info!("Timer trigger executed: {}", timer);

    job(timer).inspect_err(|e| error!("Run failed: {}", e))
}

/// Error depicting errors that occur while setting up the trigger
///
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("InvalidCronExpression: {0}")]
    InvalidCronExpression(String),
    #[error("InvalidGrace: {0} seconds is out of range")]
    InvalidGrace(i64),
}
