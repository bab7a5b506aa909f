//! # seeder-aws
//!
//! [`AwsFetcher`] answers every [`seeder_sync::RemoteKey`] from the matching
//! AWS store: Systems Manager parameters, Secrets Manager secrets and S3
//! objects.
//!
//! The SDK is async; [`seeder_sync::Fetch`] is blocking. The fetcher captures
//! the runtime handle it was built on and blocks on it, so `fetch` must be
//! called from a blocking thread (`spawn_blocking`), never from a runtime
//! worker.

pub mod classify;
pub mod endpoint;
pub mod fetcher;

pub use endpoint::ObjectEndpoint;
pub use fetcher::AwsFetcher;
