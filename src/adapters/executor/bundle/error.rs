//! Bundle submission errors.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BundleError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Block engine error: {message} (code: {code})")]
    Api { code: i32, message: String },

    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("No terminal status within deadline")]
    ConfirmDeadline,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Status check failed: {0}")]
    StatusCheckFailed(String),
}

impl BundleError {
    /// Transient failures worth polling through
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BundleError::Http(_)
                | BundleError::Timeout
                | BundleError::RateLimited
                | BundleError::StatusCheckFailed(_)
        )
    }
}

impl From<reqwest::Error> for BundleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BundleError::Timeout
        } else {
            BundleError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(BundleError::Timeout.is_retryable());
        assert!(BundleError::RateLimited.is_retryable());
        assert!(BundleError::StatusCheckFailed("test".into()).is_retryable());

        assert!(!BundleError::InvalidBundle("test".into()).is_retryable());
        assert!(!BundleError::ConfirmDeadline.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = BundleError::Api {
            code: -32000,
            message: "simulation failed".to_string(),
        };
        assert!(err.to_string().contains("-32000"));
        assert!(err.to_string().contains("simulation failed"));
    }
}
