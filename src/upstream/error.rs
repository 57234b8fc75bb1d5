//! Upstream error taxonomy.

/// Error produced by an upstream call.
///
/// The request queue branches on [`UpstreamError::is_rate_limit`]; every
/// other variant is surfaced unchanged to the inbound handler, which owns
/// the user-facing translation.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with an error status (429 or 5xx).
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// The adapter-level request timeout elapsed.
    #[error("upstream request timed out")]
    Timeout,

    /// The upstream could not be reached at all.
    #[error("cannot reach upstream: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("upstream transport error: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the upstream's rate-limit signal.
    pub fn is_rate_limit(&self) -> bool {
        self.status() == Some(429)
    }
}
