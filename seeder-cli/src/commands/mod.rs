pub mod check;
pub mod resolve;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use seeder_core::{config, Settings};

/// Load settings from `--config`, or `~/.seeder.yaml` when absent.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config::default_path().context("could not locate settings file")?,
    };
    config::load_at(&path).with_context(|| format!("failed to load {}", path.display()))
}
