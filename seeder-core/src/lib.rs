//! Seeder core library — locator parsing, configuration model, errors.
//!
//! Public API surface:
//! - [`address`] — canonical object-store [`Address`] and its [`AddressParser`]
//! - [`types`] — newtypes and configuration structs
//! - [`config`] — load settings from YAML
//! - [`error`] — [`ParseError`], [`ConfigError`]

pub mod address;
pub mod config;
pub mod error;
pub mod types;

pub use address::{Address, AddressParser, Locator, Scheme, Style, Usage, DEFAULT_REGION};
pub use error::{ConfigError, ParseError};
pub use types::{AwsSettings, SeedName, SeedSpec, Settings, SourceSpec, TargetSpec, WatchSettings};
