//! # seeder-sync
//!
//! Self-refreshing sources, lazily reopened targets, and the seed that binds
//! one to the other.
//!
//! Build seeds with [`pipeline::build_seeds`], then call [`pipeline::run_tick`]
//! once per timer tick. The same seeds are reused on every tick.

pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod seed;
pub mod source;
pub mod target;

pub use error::{FetchError, Side, SyncError, TransferError};
pub use fetch::{Fetch, RemoteKey, Snapshot};
pub use pipeline::{build_seeds, run_tick, SeedOutcome, TickSummary};
pub use seed::{CopyReport, Seed};
pub use source::{RefreshOutcome, RefreshingSource, StreamState};
pub use target::{LazyFile, Target};
