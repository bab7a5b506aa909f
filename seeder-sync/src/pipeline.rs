//! Shared tick entrypoint used by the `check` command and the watch loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use seeder_core::{SeedName, SeedSpec};

use crate::error::{Side, SyncError, TransferError};
use crate::fetch::Fetch;
use crate::seed::{CopyReport, Seed};

/// What happened to one seed during a tick.
#[derive(Debug)]
pub struct SeedOutcome {
    pub name: SeedName,
    pub copy: Result<CopyReport, TransferError>,
    pub close: Result<(), SyncError>,
}

impl SeedOutcome {
    pub fn is_success(&self) -> bool {
        self.copy.is_ok() && self.close.is_ok()
    }
}

/// Per-seed outcomes of one tick, in configuration order.
#[derive(Debug, Default)]
pub struct TickSummary {
    pub outcomes: Vec<SeedOutcome>,
}

impl TickSummary {
    /// Total bytes written across all seeds, including partial copies.
    pub fn written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match &o.copy {
                Ok(report) => report.written,
                Err(err) => err.written,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Build one seed per spec, all sharing `fetcher`.
///
/// Seeds whose locator does not parse are returned as errors and left out;
/// the rest keep their configuration order.
pub fn build_seeds<F: Fetch + Clone>(
    specs: &[SeedSpec],
    fetcher: F,
) -> (Vec<Seed<F>>, Vec<SyncError>) {
    let mut seeds = Vec::with_capacity(specs.len());
    let mut rejected = Vec::new();
    for spec in specs {
        match Seed::from_spec(spec, fetcher.clone()) {
            Ok(seed) => seeds.push(seed),
            Err(e) => {
                tracing::warn!("skipping seed {}: {}", spec.name, e);
                rejected.push(e);
            }
        }
    }
    (seeds, rejected)
}

/// Copy then close every seed, sequentially. One seed's failure never stops
/// the others, and a panic inside a fetcher or target is reported as that
/// seed's failure.
pub fn run_tick<F: Fetch>(seeds: &mut [Seed<F>]) -> TickSummary {
    let mut summary = TickSummary::default();
    for seed in seeds.iter_mut() {
        let copy = panic::catch_unwind(AssertUnwindSafe(|| seed.copy())).unwrap_or_else(|payload| {
            Err(TransferError {
                written: 0,
                side: Side::Source,
                source: SyncError::Panicked(panic_message(payload)),
            })
        });
        let close = panic::catch_unwind(AssertUnwindSafe(|| seed.close()))
            .unwrap_or_else(|payload| Err(SyncError::Panicked(panic_message(payload))));
        log_outcome(seed.name(), &copy, &close);
        summary.outcomes.push(SeedOutcome {
            name: seed.name().clone(),
            copy,
            close,
        });
    }
    summary
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}

fn log_outcome(
    name: &SeedName,
    copy: &Result<CopyReport, TransferError>,
    close: &Result<(), SyncError>,
) {
    match copy {
        Ok(report) => {
            let digest = report.digest.as_deref().unwrap_or("-");
            match &report.stale {
                Some(err) => tracing::warn!(
                    "seed {}: wrote {} bytes (stale: {}) sha256={}",
                    name,
                    report.written,
                    err,
                    digest
                ),
                None => tracing::info!(
                    "seed {}: wrote {} bytes{} sha256={}",
                    name,
                    report.written,
                    if report.updated { " (updated)" } else { "" },
                    digest
                ),
            }
        }
        Err(err) => tracing::error!("seed {}: {}", name, err),
    }
    if let Err(err) = close {
        tracing::error!("seed {}: close failed: {}", name, err);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use seeder_core::{SourceSpec, TargetSpec};
    use tempfile::TempDir;

    use super::*;
    use crate::error::FetchError;
    use crate::fetch::{RemoteKey, Snapshot};

    /// Answers by parameter name; unknown names are `NotFound`.
    struct ByName(Vec<(&'static str, &'static str)>);

    impl Fetch for ByName {
        fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, FetchError> {
            let RemoteKey::Parameter { name } = key else {
                return Err(FetchError::Other("unsupported".into()));
            };
            self.0
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| Snapshot::new(*v, Utc::now()))
                .ok_or_else(|| FetchError::NotFound(name.clone()))
        }
    }

    fn spec(name: &str, param: &str, dir: &std::path::Path) -> SeedSpec {
        SeedSpec {
            name: SeedName::from(name),
            source: SourceSpec::Parameter {
                name: param.to_string(),
            },
            target: TargetSpec::File {
                path: dir.to_path_buf(),
                name: format!("{name}.txt"),
            },
        }
    }

    #[test]
    fn empty_tick_is_success() {
        let summary = run_tick::<ByName>(&mut []);
        assert!(summary.is_success());
        assert_eq!(summary.written(), 0);
    }

    #[test]
    fn bad_locator_is_rejected_and_siblings_survive() {
        let tmp = TempDir::new().expect("tempdir");
        let mut specs = vec![spec("a", "/a", tmp.path())];
        specs.push(SeedSpec {
            name: SeedName::from("broken"),
            source: SourceSpec::Object {
                uri: "s3:///no-bucket".into(),
                normalize: false,
                region: None,
            },
            target: TargetSpec::File {
                path: tmp.path().to_path_buf(),
                name: "broken".into(),
            },
        });
        specs.push(spec("b", "/b", tmp.path()));

        let (seeds, rejected) = build_seeds(&specs, Arc::new(ByName(vec![])));
        assert_eq!(seeds.len(), 2);
        assert_eq!(rejected.len(), 1);
        let names: Vec<_> = seeds.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn failing_seed_does_not_block_the_next() {
        let tmp = TempDir::new().expect("tempdir");
        let specs = vec![
            spec("missing", "/missing", tmp.path()),
            spec("present", "/present", tmp.path()),
        ];
        let (mut seeds, _) = build_seeds(&specs, Arc::new(ByName(vec![("/present", "ok")])));

        let summary = run_tick(&mut seeds);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.outcomes[0].is_success());
        assert!(summary.outcomes[1].is_success());
        assert_eq!(summary.written(), 2);
        assert_eq!(std::fs::read(tmp.path().join("present.txt")).unwrap(), b"ok");
        assert!(!tmp.path().join("missing.txt").exists());
    }

    /// Panics on one parameter, answers every other one.
    struct Volatile;

    impl Fetch for Volatile {
        fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, FetchError> {
            match key {
                RemoteKey::Parameter { name } if name == "/explode" => {
                    panic!("backend blew up on {name}")
                }
                _ => Ok(Snapshot::new("fine", Utc::now())),
            }
        }
    }

    #[test]
    fn panicking_fetch_fails_only_its_seed() {
        let tmp = TempDir::new().expect("tempdir");
        let specs = vec![
            spec("explode", "/explode", tmp.path()),
            spec("calm", "/calm", tmp.path()),
        ];
        let (mut seeds, _) = build_seeds(&specs, Arc::new(Volatile));

        for _ in 0..2 {
            let summary = run_tick(&mut seeds);
            assert_eq!(summary.failed(), 1);
            let err = summary.outcomes[0].copy.as_ref().unwrap_err();
            assert_eq!(err.side, Side::Source);
            assert!(
                matches!(err.source, SyncError::Panicked(ref m) if m.contains("/explode")),
                "{err}"
            );
            assert!(summary.outcomes[1].is_success());
        }
        assert_eq!(seeds.len(), 2);
        assert_eq!(std::fs::read(tmp.path().join("calm.txt")).unwrap(), b"fine");
        assert!(!tmp.path().join("explode.txt").exists());
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic");
    }
}
