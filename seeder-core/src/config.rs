//! Settings file loading.
//!
//! The settings file defaults to `~/.seeder.yaml`. Every loader has two forms:
//! - `fn_at(…)` — explicit home or path; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::Settings;

pub const SETTINGS_FILE: &str = ".seeder.yaml";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// `<home>/.seeder.yaml` — pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(SETTINGS_FILE)
}

/// `default_path_at` convenience wrapper.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    Ok(default_path_at(&home()?))
}

/// Load settings from `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    // Surface a bad interval at load time rather than on the first tick.
    settings.interval()?;
    Ok(settings)
}

/// Load from `~/.seeder.yaml`.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&default_path()?)
}

impl Settings {
    /// Configured watch interval, or [`DEFAULT_INTERVAL`].
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        match &self.watch.interval {
            Some(text) => parse_interval(text),
            None => Ok(DEFAULT_INTERVAL),
        }
    }
}

/// Parse `<n>[ms|s|m|h]`. A bare number is seconds; zero is rejected.
pub fn parse_interval(text: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidInterval(text.to_owned());
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let n: u64 = digits.parse().map_err(|_| invalid())?;
    let duration = match unit {
        "ms" => Duration::from_millis(n),
        "" | "s" => Duration::from_secs(n),
        "m" => Duration::from_secs(n.checked_mul(60).ok_or_else(invalid)?),
        "h" => Duration::from_secs(n.checked_mul(60 * 60).ok_or_else(invalid)?),
        _ => return Err(invalid()),
    };
    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
