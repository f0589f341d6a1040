//! The storefront the builder is currently working on.
//!
//! Kept server-side in the session. Dashboard routes still take the
//! storefront id from their path; this is only the dashboard's default.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use storecraft_core::StorefrontId;

use crate::error::AppError;
use crate::models::session::keys;

/// The selected storefront id, if one is selected.
#[derive(Debug, Clone, Copy)]
pub struct SelectedStorefront(pub Option<StorefrontId>);

impl<S> FromRequestParts<S> for SelectedStorefront
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;
        let selected = session
            .get::<StorefrontId>(keys::SELECTED_STOREFRONT)
            .await
            .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;
        Ok(Self(selected))
    }
}

/// Remember `storefront_id` as the selected storefront.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn select(
    session: &Session,
    storefront_id: StorefrontId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::SELECTED_STOREFRONT, storefront_id).await
}

/// Forget the selected storefront.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<StorefrontId>(keys::SELECTED_STOREFRONT)
        .await
        .map(drop)
}
