//! The remote-store boundary: what a fetcher is asked for and what it returns.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use seeder_core::{Address, AddressParser, ParseError, SourceSpec};

/// Identity of one remote value, resolved once when a seed is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteKey {
    /// Key/value parameter store entry.
    Parameter { name: String },
    /// Secrets store entry.
    Secret { id: String },
    /// Object store entry.
    Object(Address),
}

impl RemoteKey {
    /// Resolve a configured source. Object locators go through the
    /// [`AddressParser`] here, exactly once per seed.
    pub fn from_spec(spec: &SourceSpec) -> Result<Self, ParseError> {
        match spec {
            SourceSpec::Parameter { name } => Ok(RemoteKey::Parameter { name: name.clone() }),
            SourceSpec::Secret { secret_id } => Ok(RemoteKey::Secret {
                id: secret_id.clone(),
            }),
            SourceSpec::Object {
                uri,
                normalize,
                region,
            } => {
                let mut parser = AddressParser::new().normalize_key(*normalize);
                if let Some(region) = region {
                    parser = parser.region(region.clone());
                }
                parser.parse_str(uri).map(RemoteKey::Object)
            }
        }
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteKey::Parameter { name } => write!(f, "ssm-parameter:{name}"),
            RemoteKey::Secret { id } => write!(f, "secretsmanager:{id}"),
            RemoteKey::Object(address) => fmt::Display::fmt(address, f),
        }
    }
}

/// One fetched value and the remote modification time it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    value: Vec<u8>,
    modified_at: DateTime<Utc>,
    digest: String,
}

impl Snapshot {
    pub fn new(value: impl Into<Vec<u8>>, modified_at: DateTime<Utc>) -> Self {
        let value = value.into();
        let digest = {
            let mut h = Sha256::new();
            h.update(&value);
            hex::encode(h.finalize())
        };
        Self {
            value,
            modified_at,
            digest,
        }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// SHA-256 hex digest of the value.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A remote-store client. Implementations block until the value arrives.
pub trait Fetch {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, crate::FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, crate::FetchError> {
        (**self).fetch(key)
    }
}

impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, crate::FetchError> {
        (**self).fetch(key)
    }
}

impl<T: Fetch + ?Sized> Fetch for Box<T> {
    fn fetch(&self, key: &RemoteKey) -> Result<Snapshot, crate::FetchError> {
        (**self).fetch(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_spec_resolves_through_parser() {
        let spec = SourceSpec::Object {
            uri: "https://certs.s3.us-west-2.amazonaws.com/live/".to_string(),
            normalize: true,
            region: Some("eu-west-1".to_string()),
        };
        let RemoteKey::Object(address) = RemoteKey::from_spec(&spec).expect("resolve") else {
            panic!("expected object key");
        };
        assert_eq!(address.bucket(), "certs");
        assert_eq!(address.key(), Some("live"));
        assert_eq!(address.region(), "eu-west-1");
    }

    #[test]
    fn bad_object_locator_is_a_parse_error() {
        let spec = SourceSpec::Object {
            uri: "s3:///nobucket".to_string(),
            normalize: false,
            region: None,
        };
        assert_eq!(
            RemoteKey::from_spec(&spec).unwrap_err(),
            ParseError::MissingBucket
        );
    }

    #[test]
    fn display_names_the_store() {
        let key = RemoteKey::from_spec(&SourceSpec::Parameter {
            name: "/certs/chain".to_string(),
        })
        .unwrap();
        assert_eq!(key.to_string(), "ssm-parameter:/certs/chain");
    }

    #[test]
    fn snapshot_digest_is_sha256_hex() {
        let snap = Snapshot::new(b"hello".to_vec(), Utc::now());
        assert_eq!(
            snap.digest(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(snap.len(), 5);
    }
}
