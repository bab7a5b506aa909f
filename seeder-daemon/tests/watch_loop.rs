use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use seeder_core::{SeedName, SeedSpec, SourceSpec, TargetSpec};
use seeder_daemon::watch;
use seeder_sync::{Fetch, FetchError, RemoteKey, Snapshot};
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Serves the current value of a shared cell and counts fetches.
#[derive(Clone)]
struct Cell {
    value: Arc<Mutex<String>>,
    fetches: Arc<AtomicUsize>,
}

impl Cell {
    fn new(value: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(value.to_string())),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Fetch for Cell {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match key {
            RemoteKey::Parameter { name } if name == "/missing" => {
                Err(FetchError::NotFound(name.clone()))
            }
            RemoteKey::Parameter { name } if name == "/explode" => panic!("fetch of {name} panicked"),
            _ => Ok(Snapshot::new(self.value.lock().unwrap().clone(), Utc::now())),
        }
    }
}

fn seed(name: &str, param: &str, dir: &Path) -> SeedSpec {
    SeedSpec {
        name: SeedName::from(name),
        source: SourceSpec::Parameter {
            name: param.to_string(),
        },
        target: TargetSpec::File {
            path: dir.to_path_buf(),
            name: name.to_string(),
        },
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn first_tick_runs_immediately() {
    let tmp = TempDir::new().expect("tempdir");
    let cell = Cell::new("hello");
    let (tx, rx) = broadcast::channel(1);
    let specs = vec![seed("greeting", "/greeting", tmp.path())];

    let handle = {
        let cell = cell.clone();
        tokio::spawn(async move { watch(&specs, cell, Duration::from_secs(3600), rx).await })
    };

    let path = tmp.path().join("greeting");
    wait_until(|| std::fs::read_to_string(&path).ok().as_deref() == Some("hello")).await;
    tx.send(()).expect("shutdown");

    let report = handle.await.expect("join").expect("watch");
    assert_eq!(report.ticks, 1);
    assert_eq!(cell.fetches(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn later_ticks_pick_up_new_values_and_survive_failures() {
    let tmp = TempDir::new().expect("tempdir");
    let cell = Cell::new("v1");
    let (tx, rx) = broadcast::channel(1);
    let specs = vec![
        seed("broken", "/missing", tmp.path()),
        seed("value", "/value", tmp.path()),
    ];

    let handle = {
        let cell = cell.clone();
        tokio::spawn(async move { watch(&specs, cell, Duration::from_millis(20), rx).await })
    };

    let path = tmp.path().join("value");
    wait_until(|| std::fs::read_to_string(&path).ok().as_deref() == Some("v1")).await;
    cell.set("v2");
    wait_until(|| std::fs::read_to_string(&path).ok().as_deref() == Some("v2")).await;
    tx.send(()).expect("shutdown");

    let report = handle.await.expect("join").expect("watch");
    assert!(report.ticks >= 2, "ticks = {}", report.ticks);
    assert_eq!(report.failed_ticks, report.ticks, "the broken seed fails every tick");
    assert!(!tmp.path().join("broken").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_seed_does_not_stop_the_loop() {
    let tmp = TempDir::new().expect("tempdir");
    let cell = Cell::new("v1");
    let (tx, rx) = broadcast::channel(1);
    let specs = vec![
        seed("explode", "/explode", tmp.path()),
        seed("value", "/value", tmp.path()),
    ];

    let handle = {
        let cell = cell.clone();
        tokio::spawn(async move { watch(&specs, cell, Duration::from_millis(20), rx).await })
    };

    let path = tmp.path().join("value");
    wait_until(|| std::fs::read_to_string(&path).ok().as_deref() == Some("v1")).await;
    cell.set("v2");
    wait_until(|| std::fs::read_to_string(&path).ok().as_deref() == Some("v2")).await;
    tx.send(()).expect("shutdown");

    let report = handle.await.expect("join").expect("watch keeps running");
    assert!(report.ticks >= 2, "ticks = {}", report.ticks);
    assert_eq!(report.failed_ticks, report.ticks);
    assert!(!tmp.path().join("explode").exists());
}

#[tokio::test]
async fn seeds_with_bad_locators_are_skipped() {
    let tmp = TempDir::new().expect("tempdir");
    let (tx, rx) = broadcast::channel(1);
    tx.send(()).expect("shutdown");
    let specs = vec![SeedSpec {
        name: SeedName::from("bad"),
        source: SourceSpec::Object {
            uri: "gs://bucket/key".into(),
            normalize: false,
            region: None,
        },
        target: TargetSpec::File {
            path: tmp.path().to_path_buf(),
            name: "bad".into(),
        },
    }];

    let report = watch(&specs, Cell::new("x"), Duration::from_secs(1), rx)
        .await
        .expect("a bad seed is not fatal");
    assert_eq!(report.ticks, 0);
}
