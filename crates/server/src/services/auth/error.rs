//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur while signing a builder user in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email is not shaped like an address.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password field left empty.
    #[error("password is required")]
    MissingPassword,

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The auth service is throttling this client.
    #[error("too many attempts, retry in {0} seconds")]
    RateLimited(u64),

    /// Auth service call failed.
    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCredentials => Self::InvalidCredentials,
            BackendError::RateLimited(seconds) => Self::RateLimited(seconds),
            other => Self::Backend(other),
        }
    }
}
