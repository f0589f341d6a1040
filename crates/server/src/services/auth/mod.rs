//! Builder sign-in and password recovery.
//!
//! Credentials are checked by the hosted auth service; this server only keeps
//! the resulting identity in the session.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use storecraft_core::UserId;

use crate::backend::BackendClient;
use crate::models::CurrentUser;

/// Login form as posted by the dashboard.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Password recovery request.
#[derive(Debug, Deserialize)]
pub struct RecoverForm {
    pub email: String,
}

/// Sign-in and recovery against the auth service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Check credentials and return the session identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::MissingPassword`
    /// before calling out, `AuthError::InvalidCredentials` for a rejected
    /// login and `AuthError::RateLimited` when the service answers 429.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn login(&self, form: LoginForm) -> Result<CurrentUser, AuthError> {
        let email = normalize_email(&form.email)?;
        let password = SecretString::from(form.password);
        if password.expose_secret().is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let session = self.backend.sign_in(&email, &password).await.map_err(|e| {
            warn!(error = %e, "Sign-in rejected");
            AuthError::from(e)
        })?;

        info!(user_id = %session.user.id, "User signed in");
        Ok(CurrentUser {
            id: UserId::new(session.user.id),
            email: session.user.email.unwrap_or(email),
        })
    }

    /// Ask the auth service to email a recovery link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::RateLimited` when recovery emails are throttled.
    #[instrument(skip(self, form))]
    pub async fn recover(&self, form: RecoverForm, redirect_to: &str) -> Result<(), AuthError> {
        let email = normalize_email(&form.email)?;
        self.backend.recover_password(&email, redirect_to).await?;
        Ok(())
    }
}

/// Trim and lowercase an email, rejecting anything without `local@domain.tld`.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail`.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@')
    });
    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::BackendError;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Owner@Shop.Example ").unwrap(),
            "owner@shop.example"
        );
        assert!(normalize_email("owner").is_err());
        assert!(normalize_email("@shop.example").is_err());
        assert!(normalize_email("owner@localhost").is_err());
        assert!(normalize_email("a b@shop.example").is_err());
        assert!(normalize_email("a@b@shop.example").is_err());
    }

    #[test]
    fn test_backend_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(BackendError::InvalidCredentials),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(BackendError::RateLimited(42)),
            AuthError::RateLimited(42)
        ));
        assert!(matches!(
            AuthError::from(BackendError::Parse("bad".to_string())),
            AuthError::Backend(_)
        ));
    }
}
