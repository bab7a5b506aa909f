//! Configuration types for seeds.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Source and target kinds are closed, adjacently tagged enums so the YAML
//! reads `type: <kind>` followed by a `spec:` mapping.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a seed; used only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedName(pub String);

impl fmt::Display for SeedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SeedName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SeedName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source / target kinds
// ---------------------------------------------------------------------------

/// Where a seed's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec")]
pub enum SourceSpec {
    /// Key/value parameter store entry.
    #[serde(rename = "ssm-parameter")]
    Parameter { name: String },

    /// Secrets store entry.
    #[serde(rename = "secretsmanager")]
    Secret {
        #[serde(rename = "secretId")]
        secret_id: String,
    },

    /// Object store entry named by a locator (`s3://`, path-style or host-style URL).
    #[serde(rename = "s3-object")]
    Object {
        uri: String,
        #[serde(default)]
        normalize: bool,
        /// Overrides the region inferred from `uri`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },
}

impl SourceSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceSpec::Parameter { .. } => "ssm-parameter",
            SourceSpec::Secret { .. } => "secretsmanager",
            SourceSpec::Object { .. } => "s3-object",
        }
    }
}

/// Where a seed's value is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec")]
pub enum TargetSpec {
    /// Local file `<path>/<name>`; `path` is created on demand.
    #[serde(rename = "file")]
    File { path: PathBuf, name: String },
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// One configured source → target pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSpec {
    pub name: SeedName,
    pub source: SourceSpec,
    pub target: TargetSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WatchSettings {
    /// Wait between ticks, e.g. `30s`, `5m`, `1h`. Defaults to one hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// Optional overrides for remote-store client construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AwsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Root of the seeder YAML settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub watch: WatchSettings,
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub seeds: Vec<SeedSpec>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
