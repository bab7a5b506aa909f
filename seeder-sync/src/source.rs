//! Self-refreshing source.
//!
//! A [`RefreshingSource`] caches the last fetched [`Snapshot`] and streams it
//! as an ordinary reader. Once a stream has signalled end-of-data the source
//! is [`StreamState::Exhausted`]; the next read refreshes from the remote
//! store and rewinds, so one handle serves every copy cycle:
//!
//! ```text
//! Exhausted ──read──▶ refresh ──▶ Armed ──read──▶ Streaming ──end-of-data──▶ Exhausted
//! ```
//!
//! The cached snapshot is replaced only when the remote modification time is
//! strictly newer. A failed refresh keeps the previous snapshot and records
//! the failure as stale; with no previous snapshot the read fails instead.

use std::io;

use crate::error::{FetchError, SyncError};
use crate::fetch::{Fetch, RemoteKey, Snapshot};

/// Position of the stream within the current read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Snapshot ready; the next read starts at offset zero.
    Armed,
    Streaming { offset: usize },
    /// End-of-data was signalled; the next read refreshes first.
    Exhausted,
}

/// What a successful refresh did to the cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// First fetch, or the remote value is newer than the cached one.
    Updated,
    /// Remote modification time is not newer; cached snapshot kept.
    Unchanged,
}

pub struct RefreshingSource<F> {
    key: RemoteKey,
    fetcher: F,
    snapshot: Option<Snapshot>,
    state: StreamState,
    last_refresh: Option<RefreshOutcome>,
    stale: Option<FetchError>,
}

impl<F: Fetch> RefreshingSource<F> {
    /// Build a source. Nothing is fetched until the first read.
    pub fn new(key: RemoteKey, fetcher: F) -> Self {
        Self {
            key,
            fetcher,
            snapshot: None,
            state: StreamState::Exhausted,
            last_refresh: None,
            stale: None,
        }
    }

    pub fn key(&self) -> &RemoteKey {
        &self.key
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The snapshot currently being served, if any fetch has succeeded.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Outcome of the refresh that started the current read cycle.
    pub fn last_refresh(&self) -> Option<RefreshOutcome> {
        self.last_refresh
    }

    /// Take the refresh failure the current cycle is serving stale data for.
    pub fn take_stale(&mut self) -> Option<FetchError> {
        self.stale.take()
    }

    /// Fetch, compare, and cache. Rewinds the stream on success.
    ///
    /// On failure the cached snapshot is left untouched.
    pub fn refresh(&mut self) -> Result<RefreshOutcome, FetchError> {
        let fresh = self.fetcher.fetch(&self.key)?;
        let outcome = match &self.snapshot {
            Some(current) if fresh.modified_at() <= current.modified_at() => {
                RefreshOutcome::Unchanged
            }
            _ => {
                self.snapshot = Some(fresh);
                RefreshOutcome::Updated
            }
        };
        self.state = StreamState::Armed;
        self.stale = None;
        self.last_refresh = Some(outcome);
        Ok(outcome)
    }

    /// Read the next chunk of the current snapshot into `buf`.
    ///
    /// Returns `Ok(0)` at end-of-data, after which the source is exhausted.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, SyncError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.state == StreamState::Exhausted {
            self.begin_cycle()?;
        }

        let Some(snapshot) = &self.snapshot else {
            self.state = StreamState::Exhausted;
            return Ok(0);
        };
        let offset = match self.state {
            StreamState::Streaming { offset } => offset,
            StreamState::Armed | StreamState::Exhausted => 0,
        };
        let value = snapshot.value();
        if offset >= value.len() {
            self.state = StreamState::Exhausted;
            return Ok(0);
        }

        let n = buf.len().min(value.len() - offset);
        buf[..n].copy_from_slice(&value[offset..offset + n]);
        self.state = StreamState::Streaming { offset: offset + n };
        Ok(n)
    }

    /// Drop the position within the current cycle; the next read refreshes.
    /// Idempotent.
    pub fn close(&mut self) -> Result<(), SyncError> {
        self.state = StreamState::Exhausted;
        Ok(())
    }

    fn begin_cycle(&mut self) -> Result<(), SyncError> {
        match self.refresh() {
            Ok(outcome) => {
                tracing::debug!("refreshed {}: {:?}", self.key, outcome);
                Ok(())
            }
            Err(err) if self.snapshot.is_some() => {
                tracing::warn!("refresh failed for {}, serving cached value: {}", self.key, err);
                self.state = StreamState::Armed;
                self.stale = Some(err);
                Ok(())
            }
            Err(err) => Err(SyncError::Fetch {
                key: self.key.to_string(),
                source: err,
            }),
        }
    }
}

impl<F: Fetch> io::Read for RefreshingSource<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(io::Error::other)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Read;

    /// Replays scripted responses; repeats the last one when the script runs out.
    struct Scripted {
        responses: RefCell<VecDeque<Result<Snapshot, FetchError>>>,
        calls: RefCell<usize>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Snapshot, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Fetch for Scripted {
        fn fetch(&self, _key: &RemoteKey) -> Result<Snapshot, FetchError> {
            *self.calls.borrow_mut() += 1;
            let mut responses = self.responses.borrow_mut();
            if responses.len() > 1 {
                responses.pop_front().expect("non-empty")
            } else {
                responses.front().cloned().expect("script must not be empty")
            }
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn key() -> RemoteKey {
        RemoteKey::Parameter {
            name: "/certs/chain".to_string(),
        }
    }

    fn read_all<F: Fetch>(source: &mut RefreshingSource<F>) -> Vec<u8> {
        let mut out = Vec::new();
        source.read_to_end(&mut out).expect("read_to_end");
        out
    }

    #[test]
    fn construction_does_not_fetch() {
        let fetcher = Scripted::new(vec![Ok(Snapshot::new("v1", t0()))]);
        let source = RefreshingSource::new(key(), &fetcher);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(source.state(), StreamState::Exhausted);
    }

    #[test]
    fn each_cycle_refreshes_exactly_once_and_restarts_at_zero() {
        let fetcher = Scripted::new(vec![Ok(Snapshot::new("v1", t0()))]);
        let mut source = RefreshingSource::new(key(), &fetcher);

        assert_eq!(read_all(&mut source), b"v1");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(source.state(), StreamState::Exhausted);

        assert_eq!(read_all(&mut source), b"v1");
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn small_buffers_stream_the_whole_value() {
        let fetcher = Scripted::new(vec![Ok(Snapshot::new("abcdefg", t0()))]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        let mut buf = [0u8; 3];
        let mut out = Vec::new();
        loop {
            let n = source.read_chunk(&mut buf).expect("read");
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"abcdefg");
        assert_eq!(fetcher.calls(), 1, "mid-stream reads must not refetch");
    }

    #[test]
    fn newer_modification_replaces_value() {
        let fetcher = Scripted::new(vec![
            Ok(Snapshot::new("v1", t0())),
            Ok(Snapshot::new("v2", t0() + Duration::seconds(1))),
        ]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        assert_eq!(read_all(&mut source), b"v1");
        assert_eq!(read_all(&mut source), b"v2");
        assert_eq!(source.last_refresh(), Some(RefreshOutcome::Updated));
    }

    #[test]
    fn not_newer_modification_keeps_cached_value() {
        let fetcher = Scripted::new(vec![
            Ok(Snapshot::new("v1", t0())),
            Ok(Snapshot::new("same-time", t0())),
            Ok(Snapshot::new("older", t0() - Duration::seconds(5))),
        ]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        source.refresh().expect("first");
        let before = source.snapshot().cloned();

        assert_eq!(source.refresh().unwrap(), RefreshOutcome::Unchanged);
        assert_eq!(source.snapshot().cloned(), before);
        assert_eq!(source.refresh().unwrap(), RefreshOutcome::Unchanged);
        assert_eq!(source.snapshot().cloned(), before);
    }

    #[test]
    fn failed_refresh_serves_cached_value_and_reports_stale() {
        let fetcher = Scripted::new(vec![
            Ok(Snapshot::new("v1", t0())),
            Err(FetchError::Transient("throttled".to_string())),
        ]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        assert_eq!(read_all(&mut source), b"v1");
        assert!(source.take_stale().is_none());

        assert_eq!(read_all(&mut source), b"v1");
        assert_eq!(
            source.take_stale(),
            Some(FetchError::Transient("throttled".to_string()))
        );
    }

    #[test]
    fn failed_first_refresh_fails_the_read_and_retries_next_time() {
        let fetcher = Scripted::new(vec![
            Err(FetchError::NotFound("/certs/chain".to_string())),
            Ok(Snapshot::new("late", t0())),
        ]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        let mut buf = [0u8; 16];
        let err = source.read_chunk(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Fetch {
                source: FetchError::NotFound(_),
                ..
            }
        ));
        assert_eq!(source.state(), StreamState::Exhausted);

        assert_eq!(read_all(&mut source), b"late");
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn close_mid_stream_forces_refresh_on_next_read() {
        let fetcher = Scripted::new(vec![Ok(Snapshot::new("abcdef", t0()))]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        let mut buf = [0u8; 2];
        source.read_chunk(&mut buf).expect("read");
        assert_eq!(source.state(), StreamState::Streaming { offset: 2 });

        source.close().expect("close");
        source.close().expect("close is idempotent");
        assert_eq!(read_all(&mut source), b"abcdef");
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn empty_value_signals_end_immediately() {
        let fetcher = Scripted::new(vec![Ok(Snapshot::new("", t0()))]);
        let mut source = RefreshingSource::new(key(), &fetcher);
        assert!(read_all(&mut source).is_empty());
        assert_eq!(source.state(), StreamState::Exhausted);
    }
}
