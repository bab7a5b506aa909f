//! A seed binds one refreshing source to one lazy target.
//!
//! `copy` then `close` once per tick; both ends re-arm themselves, so the
//! same seed is reused for every tick of a watch loop.

use seeder_core::{SeedName, SeedSpec};

use crate::error::{FetchError, Side, SyncError, TransferError};
use crate::fetch::{Fetch, RemoteKey};
use crate::source::{RefreshOutcome, RefreshingSource};
use crate::target::Target;

/// Transfer buffer size.
const CHUNK: usize = 32 * 1024;

/// Result of one successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub written: u64,
    /// SHA-256 hex digest of the streamed snapshot.
    pub digest: Option<String>,
    /// Set when the refresh failed and the cached value was streamed instead.
    pub stale: Option<FetchError>,
    /// `true` when the refresh replaced the cached value.
    pub updated: bool,
}

pub struct Seed<F> {
    name: SeedName,
    source: RefreshingSource<F>,
    target: Target,
}

impl<F: Fetch> Seed<F> {
    pub fn new(name: SeedName, source: RefreshingSource<F>, target: Target) -> Self {
        Self {
            name,
            source,
            target,
        }
    }

    /// Build a seed from its configuration. The source locator is resolved
    /// here; a seed whose locator does not parse is never constructed.
    pub fn from_spec(spec: &SeedSpec, fetcher: F) -> Result<Self, SyncError> {
        let key = RemoteKey::from_spec(&spec.source).map_err(|source| SyncError::Locator {
            seed: spec.name.to_string(),
            source,
        })?;
        Ok(Self::new(
            spec.name.clone(),
            RefreshingSource::new(key, fetcher),
            Target::from_spec(&spec.target),
        ))
    }

    pub fn name(&self) -> &SeedName {
        &self.name
    }

    pub fn source(&self) -> &RefreshingSource<F> {
        &self.source
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Stream the source into the target until end-of-data.
    ///
    /// The target is opened after the first successful read, so an empty
    /// value still truncates the file and a failed first refresh leaves the
    /// file untouched. Bytes written before a failure stay written.
    pub fn copy(&mut self) -> Result<CopyReport, TransferError> {
        let mut buf = vec![0u8; CHUNK];
        let mut written: u64 = 0;
        let mut opened = false;

        loop {
            let n = self.source.read_chunk(&mut buf).map_err(|source| TransferError {
                written,
                side: Side::Source,
                source,
            })?;
            let fail = |source| TransferError {
                written,
                side: Side::Target,
                source,
            };
            if !opened {
                self.target.open().map_err(fail)?;
                opened = true;
            }
            if n == 0 {
                break;
            }
            self.target.write_all_chunk(&buf[..n]).map_err(fail)?;
            written += n as u64;
        }

        self.target.flush().map_err(|source| TransferError {
            written,
            side: Side::Target,
            source,
        })?;

        Ok(CopyReport {
            written,
            digest: self.source.snapshot().map(|s| s.digest().to_owned()),
            stale: self.source.take_stale(),
            updated: self.source.last_refresh() == Some(RefreshOutcome::Updated),
        })
    }

    /// Close the source, then the target. Both are attempted; the first
    /// error is returned.
    pub fn close(&mut self) -> Result<(), SyncError> {
        let source = self.source.close();
        let target = self.target.close();
        source.and(target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
