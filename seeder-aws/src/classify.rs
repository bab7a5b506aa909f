//! Mapping SDK failures and timestamps into `seeder-sync` terms.

use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};

use seeder_sync::FetchError;

const NOT_FOUND: &[&str] = &[
    "ParameterNotFound",
    "ParameterVersionNotFound",
    "ResourceNotFoundException",
    "NoSuchKey",
    "NoSuchBucket",
    "NoSuchVersion",
    "NotFound",
];

const ACCESS_DENIED: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "ExpiredTokenException",
];

const TRANSIENT: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "SlowDown",
    "RequestTimeout",
    "RequestTimeoutException",
    "InternalError",
    "InternalServerError",
    "InternalServiceError",
    "InternalFailure",
    "ServiceUnavailable",
];

/// Classify a service error code. `None` (no code in the response) is `Other`.
pub fn classify_code(code: Option<&str>, message: String) -> FetchError {
    match code {
        Some(c) if NOT_FOUND.contains(&c) => FetchError::NotFound(message),
        Some(c) if ACCESS_DENIED.contains(&c) => FetchError::AccessDenied(message),
        Some(c) if TRANSIENT.contains(&c) => FetchError::Transient(message),
        _ => FetchError::Other(message),
    }
}

/// Classify any SDK operation failure. Timeouts and dispatch failures never
/// reached the service and are always transient.
pub fn classify<E, R>(what: &str, err: SdkError<E, R>) -> FetchError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{what}: {}", DisplayErrorContext(&err));
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => FetchError::Transient(message),
        _ => classify_code(err.code(), message),
    }
}

/// Convert an SDK timestamp. A missing or out-of-range value is treated as
/// "now", which always counts as newer than any cached snapshot.
pub fn to_utc(ts: Option<&SmithyDateTime>) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}
