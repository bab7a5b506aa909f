//! `seeder resolve` — print the canonical address of a locator.

use anyhow::{Context, Result};
use clap::Args;
use seeder_core::{AddressParser, Scheme};

/// Arguments for `seeder resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Locator to resolve: `s3://bucket/key`, a path-style or a host-style URL.
    pub locator: String,

    /// Strip trailing `/` from the key.
    #[arg(long)]
    pub normalize: bool,

    /// Force the scheme (`s3`, `http`, `https`).
    #[arg(long)]
    pub scheme: Option<Scheme>,

    /// Force the region.
    #[arg(long)]
    pub region: Option<String>,

    /// Force the bucket.
    #[arg(long)]
    pub bucket: Option<String>,

    /// Force the key; an empty value clears it.
    #[arg(long)]
    pub key: Option<String>,

    /// Force the object version.
    #[arg(long)]
    pub version_id: Option<String>,
}

impl ResolveArgs {
    pub fn run(self) -> Result<()> {
        let mut parser = AddressParser::new().normalize_key(self.normalize);
        if let Some(scheme) = self.scheme {
            parser = parser.scheme(scheme);
        }
        if let Some(region) = self.region {
            parser = parser.region(region);
        }
        if let Some(bucket) = self.bucket {
            parser = parser.bucket(bucket);
        }
        if let Some(key) = self.key {
            parser = parser.key(key);
        }
        if let Some(version_id) = self.version_id {
            parser = parser.version_id(version_id);
        }

        let address = parser
            .parse_str(&self.locator)
            .with_context(|| format!("cannot resolve '{}'", self.locator))?;
        println!("{}", serde_json::to_string_pretty(&address)?);
        Ok(())
    }
}
