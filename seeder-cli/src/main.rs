//! Seeder — mirror remote parameters, secrets and objects into local files.
//!
//! # Usage
//!
//! ```text
//! seeder watch [--interval 1h] [--config PATH]
//! seeder check [--config PATH]
//! seeder resolve <LOCATOR> [--normalize] [--scheme s3|http|https] [--region R]
//!                [--bucket B] [--key K] [--version-id V]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use commands::{check::CheckArgs, resolve::ResolveArgs, watch::WatchArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "seeder",
    version,
    about = "Mirror remote parameters, secrets and objects into local files",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-check every seed on a timer and rewrite its file.
    Watch(WatchArgs),

    /// Run every seed once; exit non-zero if any failed.
    Check(CheckArgs),

    /// Print the canonical address of an object locator as JSON.
    Resolve(ResolveArgs),
}

/// Shared `--config` option.
#[derive(Args, Debug, Default)]
pub struct ConfigArg {
    /// Settings file. Defaults to `~/.seeder.yaml`.
    #[arg(short, long = "config", value_name = "PATH")]
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Watch(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Resolve(args) => args.run(),
    }
}
