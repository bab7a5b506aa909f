//! Error types for seeder-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use seeder_core::ParseError;

/// Failure reported by a remote-store fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Throttling, timeouts, dropped connections; the next tick may succeed.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Other(String),
}

/// All errors that can arise while moving a value from a source to a target.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A refresh failed and there was no earlier snapshot to fall back on.
    #[error("fetch failed for {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: FetchError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed's locator could not be resolved; the seed is never activated.
    #[error("invalid locator for seed '{seed}': {source}")]
    Locator {
        seed: String,
        #[source]
        source: ParseError,
    },

    /// A fetcher or target panicked mid-tick. The seed stays in the set.
    #[error("seed panicked: {0}")]
    Panicked(String),
}

/// Which end of a seed failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// A copy that stopped early. Bytes already written stay written.
#[derive(Debug, Error)]
#[error("copy failed at {side} after {written} bytes: {source}")]
pub struct TransferError {
    pub written: u64,
    pub side: Side,
    #[source]
    pub source: SyncError,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
