//! Object-store locator resolution.
//!
//! Turns any of the equivalent textual forms that name one object into a
//! single canonical [`Address`]:
//!
//! | Form          | Example                                                  |
//! |---------------|----------------------------------------------------------|
//! | bare          | `s3://certs/chain.pem`                                   |
//! | path-style    | `https://s3.us-west-2.amazonaws.com/certs/chain.pem`     |
//! | host-style    | `https://certs.s3.us-west-2.amazonaws.com/chain.pem`     |
//! | accelerated   | `https://certs.s3-accelerate.dualstack.amazonaws.com/x`  |
//! | website       | `http://certs.s3-website-eu-west-1.amazonaws.com/x`      |
//!
//! Parsing is a pure function of the locator and the [`AddressParser`]
//! overrides; it never touches the network.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::error::ParseError;

/// Region used when none can be read from the locator (bare scheme, or a
/// host that only carries the provider domain).
pub const DEFAULT_REGION: &str = "us-east-1";

/// Query parameter selecting a specific object revision.
const VERSION_ID_PARAM: &str = "versionId";

/// Host token standing in for "no region" (`s3.amazonaws.com`).
const PROVIDER_DOMAIN: &str = "amazonaws";

const DUAL_STACK: &str = "dualstack";

// Captures: 1 = bucket prefix incl. trailing dot, 2 = usage token, 3 = region/domain token.
static ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+\.)?s3[.-](?:(accelerated?|dualstack|website)[.-])?([a-z0-9-]+)\.")
        .expect("endpoint pattern is valid")
});

// ---------------------------------------------------------------------------
// Address components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// `s3://bucket/key`, with no host-style ambiguity.
    #[serde(rename = "s3")]
    Bare,
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Bare => "s3",
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s3" => Ok(Scheme::Bare),
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Where the bucket name lives in the locator.
///
/// Exactly one of host-style / path-style holds for `http`/`https`;
/// bare locators are neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Bare,
    Host,
    Path,
}

/// Endpoint flavour. Accelerated and website endpoints exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    Accelerated,
    Website,
}

/// Canonical, immutable identity of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(skip)]
    url: Url,
    scheme: Scheme,
    style: Style,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
    dual_stack: bool,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
}

impl Address {
    /// The structured URL this address was resolved from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key; `None` addresses the whole bucket.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn is_host_style(&self) -> bool {
        self.style == Style::Host
    }

    pub fn is_path_style(&self) -> bool {
        self.style == Style::Path
    }

    pub fn is_accelerated(&self) -> bool {
        self.usage == Some(Usage::Accelerated)
    }

    pub fn is_website(&self) -> bool {
        self.usage == Some(Usage::Website)
    }

    pub fn is_dual_stack(&self) -> bool {
        self.dual_stack
    }
}

/// Renders the bare form, `s3://bucket/key`.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}", self.bucket)?;
        if let Some(key) = &self.key {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_str(s)
    }
}

// ---------------------------------------------------------------------------
// Locator input
// ---------------------------------------------------------------------------

/// Parser input: raw text, or a URL that has already been parsed.
#[derive(Debug, Clone, Copy)]
pub enum Locator<'a> {
    Text(&'a str),
    Url(&'a Url),
}

impl<'a> From<&'a str> for Locator<'a> {
    fn from(s: &'a str) -> Self {
        Locator::Text(s)
    }
}

impl<'a> From<&'a String> for Locator<'a> {
    fn from(s: &'a String) -> Self {
        Locator::Text(s.as_str())
    }
}

impl<'a> From<&'a Url> for Locator<'a> {
    fn from(u: &'a Url) -> Self {
        Locator::Url(u)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Locator parser carrying override options.
///
/// Overrides are applied after structural parsing and win over anything
/// inferred from the locator. Key normalization runs last.
///
/// ```
/// use seeder_core::AddressParser;
///
/// let addr = AddressParser::new()
///     .region("eu-west-1")
///     .normalize_key(true)
///     .parse("s3://certs/live/")
///     .unwrap();
/// assert_eq!(addr.key(), Some("live"));
/// assert_eq!(addr.region(), "eu-west-1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParser {
    scheme: Option<Scheme>,
    bucket: Option<String>,
    key: Option<String>,
    version_id: Option<String>,
    region: Option<String>,
    normalize_key: bool,
}

impl AddressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the scheme. Switching to bare drops style and endpoint flags;
    /// switching a bare address to `http`/`https` makes it path-style.
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Force the key. An empty key clears it.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Strip trailing `/` from the key, so `a/complex/key/` becomes `a/complex/key`.
    pub fn normalize_key(mut self, normalize: bool) -> Self {
        self.normalize_key = normalize;
        self
    }

    pub fn parse<'a>(&self, locator: impl Into<Locator<'a>>) -> Result<Address, ParseError> {
        match locator.into() {
            Locator::Text(s) => self.parse_str(s),
            Locator::Url(u) => self.parse_url(u),
        }
    }

    /// Parse locator text. The key is taken from the path exactly as
    /// written, so `.` and `..` segments survive.
    pub fn parse_str(&self, s: &str) -> Result<Address, ParseError> {
        let url = Url::parse(s)?;
        let path = match raw_path(s.trim()) {
            Some(raw) => decode_path(raw),
            None => decode_path(url.path()),
        };
        self.resolve(url, &path)
    }

    /// Parse a structured URL. Its path has already been normalised by
    /// [`Url::parse`], so dot segments are gone by the time it gets here.
    pub fn parse_url(&self, url: &Url) -> Result<Address, ParseError> {
        self.resolve(url.clone(), &decode_path(url.path()))
    }

    fn resolve(&self, url: Url, path: &str) -> Result<Address, ParseError> {
        let scheme: Scheme = url.scheme().parse()?;
        let mut address = match scheme {
            Scheme::Bare => resolve_bare(url, path)?,
            Scheme::Http | Scheme::Https => resolve_endpoint(url, scheme, path)?,
        };
        self.apply_overrides(&mut address);
        Ok(address)
    }

    fn apply_overrides(&self, address: &mut Address) {
        if let Some(scheme) = self.scheme {
            match (address.scheme, scheme) {
                (_, Scheme::Bare) => {
                    address.style = Style::Bare;
                    address.usage = None;
                    address.dual_stack = false;
                }
                (Scheme::Bare, _) => address.style = Style::Path,
                _ => {}
            }
            address.scheme = scheme;
        }
        if let Some(bucket) = &self.bucket {
            address.bucket = bucket.clone();
        }
        if let Some(key) = &self.key {
            address.key = Some(key.clone()).filter(|k| !k.is_empty());
        }
        if let Some(version_id) = &self.version_id {
            address.version_id = Some(version_id.clone());
        }
        if let Some(region) = &self.region {
            address.region = region.clone();
        }
        if self.normalize_key {
            address.key = address.key.as_deref().and_then(normalize_key);
        }
    }
}

/// Trailing-separator normalization for keys.
///
/// Returns `None` when nothing but separators remain. Idempotent:
/// `normalize_key(normalize_key(k)) == normalize_key(k)`.
pub fn normalize_key(key: &str) -> Option<String> {
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Parse text with default options.
pub fn parse_str(s: &str) -> Result<Address, ParseError> {
    AddressParser::new().parse_str(s)
}

/// Parse an already-structured URL with default options.
pub fn parse_url(url: &Url) -> Result<Address, ParseError> {
    AddressParser::new().parse_url(url)
}

/// Whether `s` resolves to an address.
pub fn validate(s: &str) -> bool {
    parse_str(s).is_ok()
}

/// Whether `url` resolves to an address.
pub fn validate_url(url: &Url) -> bool {
    parse_url(url).is_ok()
}

// ---------------------------------------------------------------------------
// Scheme-specific resolution
// ---------------------------------------------------------------------------

fn resolve_bare(url: Url, path: &str) -> Result<Address, ParseError> {
    let bucket = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(ParseError::MissingBucket)?
        .to_owned();
    let key = key_from_path(path);
    let version_id = version_id(&url);

    Ok(Address {
        scheme: Scheme::Bare,
        style: Style::Bare,
        usage: None,
        dual_stack: false,
        bucket,
        key,
        region: DEFAULT_REGION.to_owned(),
        version_id,
        url,
    })
}

fn resolve_endpoint(url: Url, scheme: Scheme, path: &str) -> Result<Address, ParseError> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(ParseError::MissingHost)?;

    let captures = ENDPOINT_PATTERN
        .captures(host)
        .ok_or_else(|| ParseError::InvalidEndpoint(host.to_owned()))?;
    let prefix = captures.get(1).map(|m| m.as_str());
    let usage_token = captures.get(2).map(|m| m.as_str());
    let region_token = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

    let (style, bucket, key) = match prefix {
        None => {
            let (bucket, key) = split_path_style(path).ok_or(ParseError::MissingBucket)?;
            (Style::Path, bucket, key)
        }
        Some(prefix) => {
            let bucket = prefix.trim_end_matches('.').to_owned();
            (Style::Host, bucket, key_from_path(path))
        }
    };

    let usage = match usage_token {
        Some(token) if token.starts_with("accelerate") => Some(Usage::Accelerated),
        Some("website") => Some(Usage::Website),
        _ => None,
    };
    let dual_stack = usage_token == Some(DUAL_STACK) || region_token == DUAL_STACK;

    // Accelerated hosts never carry a region, even when the token after the
    // usage segment is "dualstack".
    let region = if usage == Some(Usage::Accelerated) || region_token == PROVIDER_DOMAIN {
        DEFAULT_REGION.to_owned()
    } else {
        region_token.to_owned()
    };

    let version_id = version_id(&url);

    Ok(Address {
        scheme,
        style,
        usage,
        dual_stack,
        bucket,
        key,
        region,
        version_id,
        url,
    })
}

/// `/key/with/parts` → `key/with/parts`; empty and `/` mean no key.
fn key_from_path(path: &str) -> Option<String> {
    if path.is_empty() || path == "/" {
        return None;
    }
    Some(path.strip_prefix('/').unwrap_or(path).to_owned())
}

/// `/bucket/key/parts` → (`bucket`, `key/parts`). `None` if there is no bucket segment.
fn split_path_style(path: &str) -> Option<(String, Option<String>)> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        return None;
    }
    match rest.split_once('/') {
        None => Some((rest.to_owned(), None)),
        Some((bucket, "")) => Some((bucket.to_owned(), None)),
        Some((bucket, key)) => Some((bucket.to_owned(), Some(key.to_owned()))),
    }
}

/// The path of `scheme://authority/path?query#fragment` as written, before
/// any dot-segment removal. `None` when the text has no authority.
fn raw_path(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("://")?;
    let rest = &rest[..rest.find(['?', '#']).unwrap_or(rest.len())];
    Some(rest.find('/').map_or("", |start| &rest[start..]))
}

fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_owned())
}

fn version_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(name, value)| name == VERSION_ID_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
