//! Error types for the backend client.

use thiserror::Error;

use crate::retry::Transient;

/// Errors that can occur when calling the backend services.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Rate limited by the backend (HTTP 429).
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Credentials were rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Failed to parse a response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Transient for BackendError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::RateLimited(_) | Self::InvalidCredentials | Self::Parse(_) => false,
        }
    }
}

/// Error body returned by the backend.
///
/// Auth endpoints use `error_description` or `msg`; storage and functions
/// use `message` or `error`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub message: Option<String>,
    pub msg: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// The most specific message present.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.message)
            .or(self.msg)
            .or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = BackendError::Api {
            status: 404,
            message: "Bucket not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): Bucket not found");
    }

    #[test]
    fn test_only_server_errors_are_transient() {
        let server = BackendError::Api {
            status: 503,
            message: String::new(),
        };
        let client = BackendError::Api {
            status: 400,
            message: String::new(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!BackendError::RateLimited(1).is_transient());
    }

    #[test]
    fn test_error_body_prefers_description() {
        let body: ApiErrorResponse = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .expect("deserialize");
        assert_eq!(
            body.into_message().as_deref(),
            Some("Invalid login credentials")
        );
    }
}
