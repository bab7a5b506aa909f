//! Per-address S3 client settings.

use seeder_core::{Address, Style, DEFAULT_REGION};

/// Client overrides derived from a resolved [`Address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEndpoint {
    /// `None` keeps the region of the shared SDK config.
    pub region: Option<String>,
    pub force_path_style: bool,
    pub accelerate: bool,
    pub dual_stack: bool,
}

impl ObjectEndpoint {
    /// Bare `s3://` locators carry no region unless one was forced, so an
    /// address still on the default region defers to the configured one.
    pub fn for_address(address: &Address) -> Self {
        let region = match address.style() {
            Style::Bare if address.region() == DEFAULT_REGION => None,
            _ => Some(address.region().to_owned()),
        };
        Self {
            region,
            force_path_style: address.is_path_style(),
            accelerate: address.is_accelerated(),
            dual_stack: address.is_dual_stack(),
        }
    }
}
