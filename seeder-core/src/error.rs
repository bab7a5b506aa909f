//! Error types for seeder-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve a locator into an [`Address`](crate::Address).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text is not a URL at all.
    #[error("unable to parse given endpoint URL: {0}")]
    UnparsableInput(#[from] url::ParseError),

    /// Bare `s3://` locator without a bucket, or a path-style URL without one.
    #[error("bucket name could not be found")]
    MissingBucket,

    /// Structured `http`/`https` URL without a host. Text such as
    /// `https://` never gets this far and reports
    /// `UnparsableInput(EmptyHost)` instead.
    #[error("hostname could not be found")]
    MissingHost,

    #[error("unable to parse scheme type: {0}")]
    UnsupportedScheme(String),

    /// The host does not look like an object-store endpoint.
    #[error("an invalid object-store endpoint URL: {0}")]
    InvalidEndpoint(String),
}

/// All errors that can arise while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the file it concerns.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.seeder.yaml`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    #[error("settings not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("invalid interval '{0}'; expected <n>[ms|s|m|h], e.g. 30s or 1h")]
    InvalidInterval(String),
}
