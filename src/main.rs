use std::env;
use anyhow::Result;
use chrono::Utc;
use crate::initialization::{init, Args};
use crate::worker::run;

mod config;
mod initialization;
mod logging;
mod manager_forecast;
mod manager_mail;
mod manager_sms;
mod models;
mod rain_alert;
mod report;
mod scheduler;
mod worker;

fn main() -> Result<()> {
    let args = Args::parse(&env::args().collect::<Vec<String>>());

    // Load config and set up all managers. If initialization fails, we are pretty much out of luck
    // and can't even log.
    let (config, trigger, mgr) = init(&args)?;

    if args.once {
        // Started by an external timer, a failed run is a failed process
        trigger.run_once(Utc::now(), |_| run(&mgr, &config.settings))?;
    } else {
        trigger.run_forever(|_| run(&mgr, &config.settings));
    }

    Ok(())
}
