//! Error type for the backend boundary.

use courier_core::types::Capability;

/// Errors from a hosted backend call.
///
/// `Unsupported` is special: the dispatcher checks `supports` before
/// invoking a capability, so reaching it at runtime indicates a caller bug
/// rather than a backend condition.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("quota exceeded")]
    QuotaExceeded,
    #[error("request timed out")]
    Timeout,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{backend} does not support {capability}")]
    Unsupported {
        backend: &'static str,
        capability: Capability,
    },
}

impl BackendError {
    /// Classify a non-success HTTP status. 429 means quota, everything else
    /// is surfaced with the response body.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            BackendError::QuotaExceeded
        } else {
            BackendError::Http { status, body }
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_quota() {
        let err = BackendError::from_status(429, "slow down".to_string());
        assert!(matches!(err, BackendError::QuotaExceeded));
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_from_status_other() {
        let err = BackendError::from_status(500, "boom".to_string());
        match &err {
            BackendError::Http { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected Http variant, got {:?}", other),
        }
        assert_eq!(err.to_string(), "backend returned HTTP 500: boom");
    }

    #[test]
    fn test_unsupported_display() {
        let err = BackendError::Unsupported {
            backend: "text-a",
            capability: Capability::DescribeImage,
        };
        assert_eq!(err.to_string(), "text-a does not support describe_image");
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(BackendError::Timeout.to_string(), "request timed out");
    }

    #[test]
    fn test_unreachable_display() {
        let err = BackendError::Unreachable("dns failure".to_string());
        assert_eq!(err.to_string(), "backend unreachable: dns failure");
    }
}
