//! Error Types
//!
//! One enum covers every failure between a surface and the upstream backend.
//! The proxy logs these and answers with a generic body; the exchange driver
//! renders their `Display` text into the transcript.

use std::time::Duration;

use thiserror::Error;

/// Failures on the path surface → proxy → backend
#[derive(Debug, Error)]
pub enum RelayError {
    /// The next hop could not be reached at the network level
    #[error("could not reach {url}: {reason}")]
    BackendUnreachable {
        /// Address that was attempted
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The next hop answered with a non-success status, or did not answer in time
    #[error("{}", describe_backend_error(.status, .waited))]
    BackendError {
        /// HTTP status, `None` when no headers arrived before the timeout
        status: Option<u16>,
        /// How long we waited when the request timed out
        waited: Option<Duration>,
    },

    /// Stream consumption was attempted on a response without a body
    #[error("No response body")]
    NoBody,

    /// A chunk read failed after streaming had started
    #[error("response stream interrupted: {0}")]
    Stream(String),

    /// A PDF upload failed or produced nothing usable
    #[error("upload failed: {0}")]
    Upload(String),

    /// A JSON body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    ClientSetup(String),
}

impl RelayError {
    /// Non-success status from the next hop
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::BackendError {
            status: Some(status),
            waited: None,
        }
    }

    /// No response headers within `waited`
    #[must_use]
    pub fn timed_out(waited: Duration) -> Self {
        Self::BackendError {
            status: None,
            waited: Some(waited),
        }
    }

    /// Classify a `reqwest` send failure
    #[must_use]
    pub fn from_send(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::BackendError {
                status: None,
                waited: None,
            };
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16());
        }
        Self::BackendUnreachable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    /// Upstream status code, if this error carries one
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::BackendError { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this is a bounded-wait expiry
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::BackendError { status: None, .. })
    }
}

fn describe_backend_error(status: &Option<u16>, waited: &Option<Duration>) -> String {
    match (status, waited) {
        (Some(code), _) => format!("HTTP error! status: {code}"),
        (None, Some(waited)) => format!("no response within {}s", waited.as_secs()),
        (None, None) => "request timed out".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_text() {
        let err = RelayError::status(503);
        assert_eq!(err.to_string(), "HTTP error! status: 503");
        assert_eq!(err.upstream_status(), Some(503));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_is_backend_error() {
        let err = RelayError::timed_out(Duration::from_secs(120));
        assert!(matches!(err, RelayError::BackendError { status: None, .. }));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "no response within 120s");
    }

    #[test]
    fn test_no_body_text() {
        assert_eq!(RelayError::NoBody.to_string(), "No response body");
    }
}
