//! Web app manifest settings and serving.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use storecraft_core::StorefrontId;

use crate::backend::storage;
use crate::db::{PwaSettingsRepository, StorefrontRepository};
use crate::error::{AppError, Result};
use crate::forms::{PwaForm, PwaInput};
use crate::middleware::RequireUser;
use crate::models::{IconSet, PwaSettings, Storefront};
use crate::services::access::{Need, require_storefront};
use crate::services::manifest::{self, MANIFEST_CONTENT_TYPE, Manifest, ManifestError};
use crate::state::AppState;

use super::multipart;

/// Settings plus what publishing still needs.
#[derive(Debug, Serialize)]
pub struct PwaView {
    pub settings: PwaSettings,
    pub missing: Vec<&'static str>,
    pub publishable: bool,
}

impl From<PwaSettings> for PwaView {
    fn from(settings: PwaSettings) -> Self {
        let missing = manifest::missing_fields(&settings);
        Self {
            publishable: missing.is_empty(),
            missing,
            settings,
        }
    }
}

/// Current settings; blank ones when never saved.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Json<PwaView>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::View).await?;
    let settings = manifest::settings_or_default(state.pool(), &storefront).await?;
    Ok(Json(settings.into()))
}

/// Save settings. Incomplete settings may be saved; publishing checks them.
#[instrument(skip(state, user, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    Json(form): Json<PwaForm>,
) -> Result<Json<PwaView>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let input = form.validate()?;
    let settings = PwaSettingsRepository::new(state.pool())
        .upsert(id, &input)
        .await?;
    Ok(Json(settings.into()))
}

/// Upload a source icon and store every resized size.
#[instrument(skip(state, user, body))]
pub async fn upload_icon(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
    body: Multipart,
) -> Result<Json<IconSet>> {
    require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let file = multipart::read_one(body).await?;
    let icons = manifest::replace_icons(
        state.pool(),
        state.backend(),
        id,
        &file.file_name,
        &file.content_type,
        file.bytes,
    )
    .await?;
    Ok(Json(icons))
}

/// Which screenshot slot an upload fills.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    Wide,
    Narrow,
}

/// Upload a wide or narrow install screenshot.
#[instrument(skip(state, user, body))]
pub async fn upload_screenshot(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((id, form_factor)): Path<(StorefrontId, FormFactor)>,
    body: Multipart,
) -> Result<Json<PwaView>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let file = multipart::read_one(body).await?;
    let url = state
        .backend()
        .upload(
            &storage::pwa_screenshot(id, &file.file_name),
            &file.content_type,
            file.bytes,
        )
        .await?;

    let current = manifest::settings_or_default(state.pool(), &storefront).await?;
    let mut input = PwaInput::from(&current);
    match form_factor {
        FormFactor::Wide => input.screenshot_wide = Some(url),
        FormFactor::Narrow => input.screenshot_narrow = Some(url),
    }
    let settings = PwaSettingsRepository::new(state.pool())
        .upsert(id, &input)
        .await?;
    Ok(Json(settings.into()))
}

#[derive(Debug, Serialize)]
pub struct ManifestPublished {
    pub manifest_url: String,
}

/// Upload the manifest to storage. Refused while required fields are missing.
#[instrument(skip(state, user))]
pub async fn publish(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<StorefrontId>,
) -> Result<Json<ManifestPublished>> {
    let (storefront, _) = require_storefront(state.pool(), &user, id, Need::Edit).await?;
    let manifest_url = manifest::publish(state.pool(), state.backend(), &storefront).await?;
    Ok(Json(ManifestPublished { manifest_url }))
}

/// Manifest response for a published storefront.
pub(crate) async fn manifest_response(
    state: &AppState,
    storefront: &Storefront,
) -> Result<Response> {
    let settings = manifest::settings_or_default(state.pool(), storefront).await?;
    let manifest = Manifest::build(storefront, &settings);
    let body = serde_json::to_string(&manifest).map_err(ManifestError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        body,
    )
        .into_response())
}

/// Public manifest by storefront id.
#[instrument(skip(state))]
pub async fn manifest_by_id(
    State(state): State<AppState>,
    Path(id): Path<StorefrontId>,
) -> Result<Response> {
    let repo = StorefrontRepository::new(state.pool());
    let storefront = state
        .retry()
        .run("get_storefront", || repo.get(id))
        .await?
        .filter(|s| s.is_published)
        .ok_or_else(|| AppError::NotFound(format!("storefront {id}")))?;
    manifest_response(&state, &storefront).await
}

#[cfg(test)]
mod tests {
    use storecraft_core::Rgb;

    use super::*;

    #[test]
    fn test_view_lists_missing_fields() {
        let view = PwaView::from(PwaSettings::empty(StorefrontId::new(1), Rgb::WHITE.to_hex()));
        assert!(!view.publishable);
        assert_eq!(
            view.missing,
            vec!["name", "short_name", "192x192 icon", "512x512 icon"]
        );
    }
}
