//! `seeder watch` — mirror every seed on a timer until ctrl-c.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use seeder_core::config::parse_interval;

use super::load_settings;
use crate::ConfigArg;

/// Arguments for `seeder watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Time between ticks, e.g. `30s`, `5m`, `1h`. Overrides `watch.interval`.
    #[arg(short = 'n', long, value_parser = interval_arg)]
    pub interval: Option<Duration>,

    #[command(flatten)]
    pub config: ConfigArg,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings(self.config.path.as_deref())?;
        seeder_daemon::start_blocking(settings, self.interval).context("watch exited with error")
    }
}

fn interval_arg(s: &str) -> std::result::Result<Duration, String> {
    parse_interval(s).map_err(|e| e.to_string())
}
