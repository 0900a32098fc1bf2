//! Store error taxonomy.
//!
//! Every variant collapses into the same client-facing failure; the tag only
//! exists so operators can tell causes apart in the logs.

use thiserror::Error;

/// Failure reported by (or on the way to) the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store rejected credentials: {0}")]
    AuthFailure(String),

    #[error("upload or object not found: {0}")]
    NotFound(String),

    #[error("store is throttling requests: {0}")]
    RateLimited(String),

    #[error("network fault talking to store: {0}")]
    NetworkFault(String),

    #[error("manifest does not match committed parts: {0}")]
    ManifestMismatch(String),

    #[error("store is not configured: missing {0}")]
    Misconfigured(String),

    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::AuthFailure(_) => "auth_failure",
            StoreError::NotFound(_) => "not_found",
            StoreError::RateLimited(_) => "rate_limited",
            StoreError::NetworkFault(_) => "network_fault",
            StoreError::ManifestMismatch(_) => "manifest_mismatch",
            StoreError::Misconfigured(_) => "misconfigured",
            StoreError::Other(_) => "other",
        }
    }

    /// Classify an S3 error from its error code and HTTP status.
    ///
    /// Codes take precedence; the status is only consulted when the code is
    /// absent or unknown.
    pub fn classify(code: Option<&str>, status: Option<u16>, detail: String) -> Self {
        match code {
            Some(
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"
                | "ExpiredToken" | "InvalidToken",
            ) => return StoreError::AuthFailure(detail),
            Some("NoSuchUpload" | "NoSuchKey" | "NoSuchBucket") => {
                return StoreError::NotFound(detail);
            }
            Some("SlowDown" | "TooManyRequests" | "RequestLimitExceeded") => {
                return StoreError::RateLimited(detail);
            }
            Some("InvalidPart" | "InvalidPartOrder" | "EntityTooSmall" | "MalformedXML") => {
                return StoreError::ManifestMismatch(detail);
            }
            _ => {}
        }

        match status {
            Some(401 | 403) => StoreError::AuthFailure(detail),
            Some(404) => StoreError::NotFound(detail),
            Some(429 | 503) => StoreError::RateLimited(detail),
            _ => StoreError::Other(detail),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
