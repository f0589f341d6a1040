//! Builder authentication route handlers.
//!
//! The dashboard posts JSON; responses are JSON.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, LoginForm, RecoverForm};
use crate::state::AppState;

/// Dashboard page the recovery email links back to.
const RECOVERY_REDIRECT_PATH: &str = "/auth/reset";

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub user: Option<CurrentUser>,
}

/// Sign a builder user in.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionUser>> {
    let user = AuthService::new(state.backend()).login(form).await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    add_breadcrumb("auth", "User signed in", None);

    Ok(Json(SessionUser { user: Some(user) }))
}

/// Sign the current user out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Who is signed in.
pub async fn me(OptionalUser(user): OptionalUser) -> Json<SessionUser> {
    Json(SessionUser { user })
}

/// Request a password recovery email.
#[instrument(skip(state, form))]
pub async fn recover(
    State(state): State<AppState>,
    Json(form): Json<RecoverForm>,
) -> Result<impl IntoResponse> {
    let redirect_to = format!(
        "{}{RECOVERY_REDIRECT_PATH}",
        state.config().base_url.trim_end_matches('/')
    );
    AuthService::new(state.backend())
        .recover(form, &redirect_to)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
