//! Dashboard storefront selection.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use storecraft_core::{MemberRole, StorefrontId};

use crate::context::{self, SelectedStorefront};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Storefront;
use crate::services::access::{Need, require_storefront};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Selection {
    pub storefront: Option<Storefront>,
    pub role: Option<MemberRole>,
}

impl Selection {
    const fn none() -> Self {
        Self {
            storefront: None,
            role: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub storefront_id: StorefrontId,
}

/// The selected storefront. A selection the user can no longer see is
/// dropped.
#[instrument(skip(state, user, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    SelectedStorefront(selected): SelectedStorefront,
) -> Result<Json<Selection>> {
    let Some(id) = selected else {
        return Ok(Json(Selection::none()));
    };

    match require_storefront(state.pool(), &user, id, Need::View).await {
        Ok((storefront, role)) => Ok(Json(Selection {
            storefront: Some(storefront),
            role: Some(role),
        })),
        Err(AppError::NotFound(_) | AppError::Forbidden(_)) => {
            info!(storefront_id = %id, "Dropping stale storefront selection");
            context::clear(&session).await?;
            Ok(Json(Selection::none()))
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, user, session))]
pub async fn select(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Json(request): Json<SelectRequest>,
) -> Result<Json<Selection>> {
    let (storefront, role) =
        require_storefront(state.pool(), &user, request.storefront_id, Need::View).await?;
    context::select(&session, storefront.id).await?;
    Ok(Json(Selection {
        storefront: Some(storefront),
        role: Some(role),
    }))
}

pub async fn clear(RequireUser(_user): RequireUser, session: Session) -> Result<StatusCode> {
    context::clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
