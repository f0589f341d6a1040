//! Storefront settings, theme, publishing and live preview handlers.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use storecraft_core::StorefrontId;

use crate::backend::storage;
use crate::db::{StorefrontRepository, storefronts::StoredPassword};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::forms::{
    InstructionsForm, PasswordChange, StorefrontForm, StorefrontInput, ThemeForm, VerificationForm,
};
use crate::middleware::RequireUser;
use crate::models::{Storefront, ThemeConfig};
use crate::services::access::{Need, require_storefront};
use crate::services::catalog::CatalogQuery;
use crate::services::gate::{self, Gate, GateState};
use crate::services::palette::{self, Palette};
use crate::services::preview::{PreviewPage, ViewOptions};
use crate::state::AppState;

use super::multipart;

/// Storefront settings.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Json<Storefront>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::View).await?;
    Ok(Json(storefront))
}

/// Update name, slug, description and branding URLs.
#[instrument(skip(state, user, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<StorefrontForm>,
) -> Result<Json<Storefront>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let input = form.validate()?;
    let storefront = StorefrontRepository::new(state.pool())
        .update_details(id, &input)
        .await?;
    Ok(Json(storefront))
}

/// Update the verification gate.
///
/// A new password is hashed before it reaches the database.
#[instrument(skip(state, user, form))]
pub async fn update_verification(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<VerificationForm>,
) -> Result<Json<Storefront>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let input = form.validate(storefront.verification.has_password)?;

    let password = match &input.password {
        PasswordChange::Keep => StoredPassword::Keep,
        PasswordChange::Clear => StoredPassword::Clear,
        PasswordChange::Set(secret) => StoredPassword::Set(hash_gate_password(secret).await?),
    };

    let storefront = StorefrontRepository::new(state.pool())
        .update_verification(id, &input, &password)
        .await?;
    info!(verification_type = ?storefront.verification.verification_type, "Gate updated");
    Ok(Json(storefront))
}

async fn hash_gate_password(secret: &SecretString) -> Result<SecretString> {
    let plain = secret.expose_secret().to_owned();
    let hash = tokio::task::spawn_blocking(move || gate::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(SecretString::from(hash))
}

/// Update the post-gate instructions.
#[instrument(skip(state, user, form))]
pub async fn update_instructions(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<InstructionsForm>,
) -> Result<Json<Storefront>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let instructions = form.validate()?;
    let storefront = StorefrontRepository::new(state.pool())
        .update_instructions(id, &instructions)
        .await?;
    Ok(Json(storefront))
}

/// Replace the theme colors.
#[instrument(skip(state, user, form))]
pub async fn update_theme(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<ThemeForm>,
) -> Result<Json<Storefront>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let theme = form.validate()?;
    let storefront = StorefrontRepository::new(state.pool())
        .update_theme(id, &theme)
        .await?;
    Ok(Json(storefront))
}

/// Palette extraction request. The logo URL defaults to the storefront's.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractRequest {
    pub logo_url: Option<String>,
    #[serde(default)]
    pub apply: bool,
}

/// Extracted palette, and the storefront when it was applied.
#[derive(Debug, Serialize)]
pub struct Extracted {
    pub palette: Palette,
    pub theme: ThemeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storefront: Option<Storefront>,
}

async fn finish_extraction(
    state: &AppState,
    id: StorefrontId,
    palette: Palette,
    apply: bool,
) -> Result<Extracted> {
    let storefront = if apply {
        let repo = StorefrontRepository::new(state.pool());
        Some(palette::apply(&repo, id, &palette).await?)
    } else {
        None
    };
    Ok(Extracted {
        theme: ThemeConfig::from_palette(&palette),
        palette,
        storefront,
    })
}

/// Derive a palette from a logo URL, optionally applying it.
#[instrument(skip(state, user, request))]
pub async fn extract_theme(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<Extracted>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let logo_url = request
        .logo_url
        .or(storefront.logo_url)
        .ok_or_else(|| AppError::BadRequest("storefront has no logo".to_string()))?;

    let palette = state.palettes().from_url(&logo_url).await?;
    Ok(Json(finish_extraction(&state, id, palette, request.apply).await?))
}

/// Query of the logo upload.
#[derive(Debug, Default, Deserialize)]
pub struct LogoQuery {
    #[serde(default)]
    pub apply_theme: bool,
}

/// Upload a new logo, store its URL and return its palette.
#[instrument(skip(state, user, body))]
pub async fn upload_logo(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Query(query): Query<LogoQuery>,
    body: Multipart,
) -> Result<Json<Extracted>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let file = multipart::read_one(body).await?;

    let palette = Palette::decode(file.bytes.clone()).await?;
    let url = state
        .backend()
        .upload(
            &storage::logo(id, &file.file_name),
            &file.content_type,
            file.bytes,
        )
        .await?;

    let input = StorefrontInput {
        logo_url: Some(url),
        ..StorefrontInput::from(&storefront)
    };
    StorefrontRepository::new(state.pool())
        .update_details(id, &input)
        .await?;
    add_breadcrumb("storefront", "Logo uploaded", None);

    Ok(Json(
        finish_extraction(&state, id, palette, query.apply_theme).await?,
    ))
}

/// Publication result.
#[derive(Debug, Serialize)]
pub struct Published {
    pub storefront: Storefront,
    /// Static HTML shell, when it was regenerated.
    pub site_url: Option<String>,
}

/// Publish the storefront and regenerate its static HTML shell.
///
/// A failed regeneration is logged and does not undo the publication.
#[instrument(skip(state, user))]
pub async fn publish(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Json<Published>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let storefront = StorefrontRepository::new(state.pool())
        .set_published(id, true)
        .await?;
    state.products().invalidate(id).await;

    let site_url = match state.backend().generate_storefront_html(id).await {
        Ok(site) => Some(
            site.url
                .unwrap_or_else(|| state.backend().public_url(&storage::site_index(id))),
        ),
        Err(e) => {
            warn!(error = %e, "Static site generation failed");
            None
        }
    };

    info!(slug = %storefront.slug, "Storefront published");
    Ok(Json(Published {
        storefront,
        site_url,
    }))
}

/// Take the storefront offline.
#[instrument(skip(state, user))]
pub async fn unpublish(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Json<Storefront>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let storefront = StorefrontRepository::new(state.pool())
        .set_published(id, false)
        .await?;
    info!(slug = %storefront.slug, "Storefront unpublished");
    Ok(Json(storefront))
}

/// Gate state the builder wants to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedState {
    Locked,
    Instructions,
    Unlocked,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewParams {
    pub state: Option<ForcedState>,
}

/// State shown by the preview. Without a forced state a fresh visitor's view
/// is shown. A storefront without a gate cannot be shown locked.
#[must_use]
pub fn preview_state(storefront: &Storefront, forced: Option<ForcedState>) -> GateState {
    let gate = Gate::new(
        storefront.verification.verification_type,
        storefront.instructions.enabled,
    );
    match forced {
        None | Some(ForcedState::Locked) => gate.state(),
        Some(ForcedState::Instructions) => GateState::ShowingInstructions,
        Some(ForcedState::Unlocked) => GateState::Unlocked,
    }
}

/// Live preview as JSON.
#[instrument(skip(state, user))]
pub async fn preview(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Query(params): Query<PreviewParams>,
    Query(query): Query<CatalogQuery>,
    Query(view): Query<ViewOptions>,
) -> Result<Response> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::View).await?;
    let gate_state = preview_state(&storefront, params.state);

    let products = if gate_state == GateState::Unlocked {
        state.products().active(state.pool(), id).await?
    } else {
        std::sync::Arc::default()
    };
    let page = PreviewPage::derive(&storefront, gate_state, &products, &query, view);
    Ok(Json(page).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use storecraft_core::{BusinessId, Slug, VerificationType};

    use super::*;
    use crate::models::{Instructions, VerificationConfig};

    fn storefront(kind: VerificationType) -> Storefront {
        Storefront {
            id: StorefrontId::new(3),
            business_id: BusinessId::new(1),
            slug: Slug::parse("corner-shop").unwrap(),
            name: "Corner Shop".to_owned(),
            description: None,
            logo_url: None,
            favicon_url: None,
            is_published: false,
            theme: ThemeConfig::default(),
            verification: VerificationConfig {
                verification_type: kind,
                ..VerificationConfig::default()
            },
            instructions: Instructions {
                enabled: true,
                text: Some("Bring ID".to_owned()),
            },
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_preview_defaults_to_fresh_visitor() {
        let storefront = storefront(VerificationType::Age);
        assert_eq!(
            preview_state(&storefront, None),
            GateState::Locked(VerificationType::Age)
        );
    }

    #[test]
    fn test_forced_states() {
        let storefront = storefront(VerificationType::Both);
        assert_eq!(
            preview_state(&storefront, Some(ForcedState::Instructions)),
            GateState::ShowingInstructions
        );
        assert_eq!(
            preview_state(&storefront, Some(ForcedState::Unlocked)),
            GateState::Unlocked
        );
    }

    #[test]
    fn test_ungated_storefront_cannot_be_locked() {
        let storefront = storefront(VerificationType::None);
        assert_eq!(
            preview_state(&storefront, Some(ForcedState::Locked)),
            GateState::Unlocked
        );
    }

    #[test]
    fn test_extract_request_defaults() {
        let request: ExtractRequest = serde_json::from_str("{}").unwrap();
        assert!(request.logo_url.is_none());
        assert!(!request.apply);
    }
}
