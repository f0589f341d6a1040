//! Builder authentication extractors.
//!
//! The signed-in builder user is kept in the session under
//! [`keys::CURRENT_USER`]. Public storefront routes never use these.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::CurrentUser;
use crate::models::session::keys;

/// Requires a signed-in builder user; rejects with 401 otherwise.
pub struct RequireUser(pub CurrentUser);

/// Rejection for requests without a signed-in user.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()
    }
}

async fn session_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;
        let user = session_user(session).await.ok_or(AuthRejection)?;
        set_sentry_user(&user.id, None);
        Ok(Self(user))
    }
}

/// The signed-in builder user, if any.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session_user(session).await,
            None => None,
        };
        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Sign the user out, dropping the selected storefront with them.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    session
        .remove::<storecraft_core::StorefrontId>(keys::SELECTED_STOREFRONT)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_401() {
        let response = AuthRejection.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
