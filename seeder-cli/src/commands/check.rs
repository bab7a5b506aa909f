//! `seeder check` — run every seed once and report.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use seeder_sync::SeedOutcome;

use super::load_settings;
use crate::ConfigArg;

/// Arguments for `seeder check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings(self.config.path.as_deref())?;
        if settings.seeds.is_empty() {
            println!("No seeds configured.");
            return Ok(());
        }

        let report = seeder_daemon::check_blocking(settings).context("check run failed")?;
        for err in &report.rejected {
            println!("{} {err}", "✗".red().bold());
        }
        for outcome in &report.summary.outcomes {
            print_outcome(outcome);
        }

        let failed = report.rejected.len() + report.summary.failed();
        if failed > 0 {
            bail!("{failed} seed(s) failed");
        }
        Ok(())
    }
}

fn print_outcome(outcome: &SeedOutcome) {
    let name = &outcome.name;
    match (&outcome.copy, &outcome.close) {
        (Ok(report), Ok(())) => {
            let mark = if report.stale.is_some() {
                "!".yellow().bold()
            } else {
                "✓".green().bold()
            };
            println!("{mark} '{name}' {} bytes", report.written);
            if let Some(err) = &report.stale {
                println!("    stale: {err}");
            }
        }
        (Err(err), _) => println!("{} '{name}' {err}", "✗".red().bold()),
        (Ok(_), Err(err)) => println!("{} '{name}' close failed: {err}", "✗".red().bold()),
    }
}
