use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use seeder_aws::AwsFetcher;
use seeder_core::{SeedSpec, Settings};
use seeder_sync::{build_seeds, run_tick, Fetch, Seed, SyncError, TickSummary};

use crate::error::{io_err, DaemonError};

/// Totals for a finished watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchReport {
    pub ticks: u64,
    /// Ticks in which at least one seed failed.
    pub failed_ticks: u64,
}

/// Result of a single `check` run.
#[derive(Debug)]
pub struct CheckReport {
    /// Seeds that could not be built (bad locator).
    pub rejected: Vec<SyncError>,
    pub summary: TickSummary,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty() && self.summary.is_success()
    }
}

// ---------------------------------------------------------------------------
// Blocking entrypoints
// ---------------------------------------------------------------------------

/// Start the watch loop and block the current thread until ctrl-c.
pub fn start_blocking(settings: Settings, interval: Option<Duration>) -> Result<(), DaemonError> {
    init_tracing();
    build_runtime()?.block_on(run(settings, interval))
}

/// Run one tick and block until it finishes.
pub fn check_blocking(settings: Settings) -> Result<CheckReport, DaemonError> {
    init_tracing();
    build_runtime()?.block_on(run_check(settings))
}

fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

// ---------------------------------------------------------------------------
// Async entrypoints
// ---------------------------------------------------------------------------

/// Watch every configured seed until ctrl-c. `interval` overrides the
/// configured one.
pub async fn run(settings: Settings, interval: Option<Duration>) -> Result<(), DaemonError> {
    let interval = match interval {
        Some(interval) => interval,
        None => settings.interval()?,
    };
    let fetcher = AwsFetcher::load(&settings.aws).await;

    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, finishing current tick");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(DaemonError::Signal(err.to_string())),
                },
            }
        })
    };

    let result = watch(&settings.seeds, fetcher, interval, shutdown_tx.subscribe()).await;
    // Release the signal task if the loop ended on its own.
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;

    let report = result?;
    tracing::info!(
        ticks = report.ticks,
        failed_ticks = report.failed_ticks,
        "watch stopped"
    );
    Ok(())
}

/// Build every configured seed against the AWS stores and run one tick.
pub async fn run_check(settings: Settings) -> Result<CheckReport, DaemonError> {
    let fetcher = AwsFetcher::load(&settings.aws).await;
    check(&settings.seeds, fetcher).await
}

/// Build seeds from `specs` and run a single tick on a blocking thread.
pub async fn check<F>(specs: &[SeedSpec], fetcher: F) -> Result<CheckReport, DaemonError>
where
    F: Fetch + Clone + Send + 'static,
{
    let (seeds, rejected) = build_seeds(specs, fetcher);
    let (_, summary) = tick_blocking(seeds).await?;
    Ok(CheckReport { rejected, summary })
}

/// Build seeds from `specs` and run [`watch_loop`] over them.
/// Seeds with a bad locator are reported and left out.
pub async fn watch<F>(
    specs: &[SeedSpec],
    fetcher: F,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<WatchReport, DaemonError>
where
    F: Fetch + Clone + Send + 'static,
{
    let (seeds, rejected) = build_seeds(specs, fetcher);
    for err in &rejected {
        tracing::error!(error = %err, "seed rejected");
    }
    tracing::info!(
        seeds = seeds.len(),
        rejected = rejected.len(),
        interval_ms = interval.as_millis() as u64,
        "watching"
    );
    watch_loop(seeds, interval, shutdown_rx).await
}

/// Tick every `interval` until a shutdown message arrives.
///
/// The first tick runs immediately; ticks missed while a slow tick was
/// running are skipped rather than replayed. Shutdown is only observed
/// between ticks, so an in-flight tick always completes.
pub async fn watch_loop<F>(
    mut seeds: Vec<Seed<F>>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<WatchReport, DaemonError>
where
    F: Fetch + Send + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report = WatchReport::default();

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let started = Instant::now();
                let (back, summary) = tick_blocking(seeds).await?;
                seeds = back;

                report.ticks += 1;
                if !summary.is_success() {
                    report.failed_ticks += 1;
                }
                tracing::info!(
                    tick = report.ticks,
                    seeds = summary.outcomes.len(),
                    failed = summary.failed(),
                    written = summary.written(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "tick complete"
                );
            }
        }
    }

    Ok(report)
}

/// Move the seeds onto a blocking thread for one tick and hand them back.
async fn tick_blocking<F>(
    mut seeds: Vec<Seed<F>>,
) -> Result<(Vec<Seed<F>>, TickSummary), DaemonError>
where
    F: Fetch + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let summary = run_tick(&mut seeds);
        (seeds, summary)
    })
    .await
    .map_err(|err| DaemonError::Join {
        task: "tick",
        message: err.to_string(),
    })
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// A second call is a no-op.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
