//! Registry client error types.

/// Errors from registry verification operations.
///
/// A conditional field mismatch is NOT an error: it is a successful call
/// with `verified == false` (see [`crate::registry::RegistryClient`]).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The login exchange against the registry failed.
    #[error("registry authentication failed (HTTP {status}): {body}")]
    Authentication {
        /// HTTP status of the login response.
        status: u16,
        /// Response body excerpt for diagnostics. Never contains the
        /// submitted credentials.
        body: String,
    },

    /// The registry is unreachable, timed out, returned a 5xx status, or
    /// rejected a freshly issued credential.
    #[error("registry service unavailable: {reason}")]
    ServiceUnavailable {
        /// Human-readable description of the outage.
        reason: String,
    },

    /// The registry rejected the verification request for a reason other
    /// than a field mismatch.
    #[error("registry rejected verification (HTTP {status}): {body}")]
    VerificationFailed {
        /// HTTP status of the verification response.
        status: u16,
        /// Response body excerpt for diagnostics.
        body: String,
    },
}

/// Errors from photo inlining.
///
/// Always non-fatal to the verification call: the client logs the
/// failure and keeps the original photo reference.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The value is not an http(s) URL with a recognized image extension.
    /// Rejected before any network call.
    #[error("invalid asset URL: {reason}")]
    InvalidUrl {
        /// Description of the validation failure.
        reason: String,
    },

    /// The asset fetch failed in transit or returned a non-2xx status.
    #[error("asset fetch failed: {reason}")]
    Fetch {
        /// Description of the fetch failure.
        reason: String,
    },

    /// The asset fetch exceeded the configured bound.
    #[error("asset fetch timed out after {elapsed_ms}ms")]
    Timeout {
        /// Elapsed time in milliseconds before the timeout triggered.
        elapsed_ms: u64,
    },

    /// The response arrived but its content is unusable.
    #[error("asset response unusable: {reason}")]
    InvalidContent {
        /// Description of the content problem.
        reason: String,
    },
}
