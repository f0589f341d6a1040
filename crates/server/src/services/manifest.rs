//! PWA manifest assembly and publishing.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use storecraft_core::{DisplayMode, HexColor, Orientation, StorefrontId};

use crate::backend::{BackendClient, BackendError, storage};
use crate::db::{PwaSettingsRepository, RepositoryError};
use crate::models::{IconSet, PwaSettings, Storefront};

const ICON_TYPE: &str = "image/png";
const WIDE_SCREENSHOT_SIZE: &str = "1280x720";
const NARROW_SCREENSHOT_SIZE: &str = "720x1280";
pub const MANIFEST_CONTENT_TYPE: &str = "application/manifest+json";

/// Errors that can occur while publishing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestScreenshot {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub form_factor: String,
}

/// A web app manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_url: String,
    pub display: DisplayMode,
    pub orientation: Orientation,
    pub theme_color: HexColor,
    pub background_color: HexColor,
    pub icons: Vec<ManifestIcon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<ManifestScreenshot>,
}

impl Manifest {
    /// Build the manifest for a storefront.
    ///
    /// Name and short name fall back to the storefront name; unset icons and
    /// screenshots are left out.
    #[must_use]
    pub fn build(storefront: &Storefront, settings: &PwaSettings) -> Self {
        let icons = settings
            .icons
            .present()
            .map(|(size, url)| ManifestIcon {
                src: url.to_owned(),
                sizes: format!("{size}x{size}"),
                mime_type: ICON_TYPE.to_owned(),
            })
            .collect();

        let screenshots = [
            (&settings.screenshot_wide, WIDE_SCREENSHOT_SIZE, "wide"),
            (&settings.screenshot_narrow, NARROW_SCREENSHOT_SIZE, "narrow"),
        ]
        .into_iter()
        .filter_map(|(url, sizes, form_factor)| {
            non_blank(url.as_deref()).map(|src| ManifestScreenshot {
                src: src.to_owned(),
                sizes: sizes.to_owned(),
                mime_type: ICON_TYPE.to_owned(),
                form_factor: form_factor.to_owned(),
            })
        })
        .collect();

        let name = non_blank(settings.name.as_deref()).unwrap_or(storefront.name.as_str());

        Self {
            name: name.to_owned(),
            short_name: non_blank(settings.short_name.as_deref())
                .unwrap_or(name)
                .to_owned(),
            description: non_blank(settings.description.as_deref())
                .or(storefront.description.as_deref())
                .map(str::to_owned),
            start_url: storefront.public_path(),
            display: settings.display,
            orientation: settings.orientation,
            theme_color: settings.theme_color.clone(),
            background_color: settings.background_color.clone(),
            icons,
            screenshots,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fields a publishable manifest still lacks, in display order.
#[must_use]
pub fn missing_fields(settings: &PwaSettings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if non_blank(settings.name.as_deref()).is_none() {
        missing.push("name");
    }
    if non_blank(settings.short_name.as_deref()).is_none() {
        missing.push("short_name");
    }
    if settings.icons.get(192).is_none() {
        missing.push("192x192 icon");
    }
    if settings.icons.get(512).is_none() {
        missing.push("512x512 icon");
    }
    missing
}

/// Whether the settings can be published.
#[must_use]
pub fn has_required_fields(settings: &PwaSettings) -> bool {
    missing_fields(settings).is_empty()
}

/// Saved settings, or blank ones seeded from the storefront theme.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn settings_or_default(
    pool: &PgPool,
    storefront: &Storefront,
) -> Result<PwaSettings, RepositoryError> {
    Ok(PwaSettingsRepository::new(pool)
        .get(storefront.id)
        .await?
        .unwrap_or_else(|| {
            PwaSettings::empty(storefront.id, storefront.theme.background_primary.clone())
        }))
}

/// Upload the manifest to storage and record its public URL.
///
/// # Errors
///
/// Returns `ManifestError::Incomplete` naming the missing fields before
/// anything is uploaded.
#[instrument(skip(pool, backend, storefront), fields(storefront_id = %storefront.id))]
pub async fn publish(
    pool: &PgPool,
    backend: &BackendClient,
    storefront: &Storefront,
) -> Result<String, ManifestError> {
    let settings = settings_or_default(pool, storefront).await?;
    let missing = missing_fields(&settings);
    if !missing.is_empty() {
        return Err(ManifestError::Incomplete(missing));
    }

    let body = serde_json::to_vec_pretty(&Manifest::build(storefront, &settings))?;
    let url = backend
        .upload(
            &storage::manifest(storefront.id),
            MANIFEST_CONTENT_TYPE,
            body,
        )
        .await?;

    PwaSettingsRepository::new(pool)
        .set_manifest_url(storefront.id, &url)
        .await?;

    info!(url = %url, "Published manifest");
    Ok(url)
}

/// Upload a source icon, resize it into every size and store the URLs.
///
/// # Errors
///
/// Returns `ManifestError::Backend` if the upload or resize fails; the stored
/// icons are left unchanged then.
#[instrument(skip(pool, backend, bytes), fields(size = bytes.len()))]
pub async fn replace_icons(
    pool: &PgPool,
    backend: &BackendClient,
    storefront_id: StorefrontId,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<IconSet, ManifestError> {
    let source_url = backend
        .upload(&storage::pwa_icon(storefront_id, file_name), content_type, bytes)
        .await?;
    let icons = backend.resize_icon(storefront_id, &source_url).await?;
    let settings = PwaSettingsRepository::new(pool)
        .set_icons(storefront_id, &icons)
        .await?;
    Ok(settings.icons)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use storecraft_core::{BusinessId, Rgb, Slug};

    use super::*;
    use crate::models::{Instructions, ThemeConfig, VerificationConfig};

    fn storefront() -> Storefront {
        Storefront {
            id: StorefrontId::new(9),
            business_id: BusinessId::new(1),
            slug: Slug::parse("night-owl").unwrap(),
            name: "Night Owl".to_owned(),
            description: Some("Late-night snacks".to_owned()),
            logo_url: None,
            favicon_url: None,
            is_published: true,
            theme: ThemeConfig::default(),
            verification: VerificationConfig::default(),
            instructions: Instructions::default(),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn complete_settings() -> PwaSettings {
        let mut settings = PwaSettings::empty(StorefrontId::new(9), Rgb::BLACK.to_hex());
        settings.name = Some("Night Owl Shop".to_owned());
        settings.short_name = Some("Night Owl".to_owned());
        settings.icons.set(192, Some("https://cdn.test/192.png".to_owned()));
        settings.icons.set(512, Some("https://cdn.test/512.png".to_owned()));
        settings
    }

    #[test]
    fn test_complete_settings_are_publishable() {
        assert!(has_required_fields(&complete_settings()));
    }

    #[test]
    fn test_missing_512_icon_blocks_publish() {
        let mut settings = complete_settings();
        settings.icons.set(512, None);
        assert!(!has_required_fields(&settings));
        assert_eq!(missing_fields(&settings), vec!["512x512 icon"]);
    }

    #[test]
    fn test_blank_names_are_missing() {
        let mut settings = complete_settings();
        settings.name = Some("  ".to_owned());
        settings.short_name = None;
        assert_eq!(missing_fields(&settings), vec!["name", "short_name"]);
    }

    #[test]
    fn test_manifest_json_shape() {
        let mut settings = complete_settings();
        settings.screenshot_wide = Some("https://cdn.test/wide.png".to_owned());
        let manifest = Manifest::build(&storefront(), &settings);
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["start_url"], "/s/night-owl");
        assert_eq!(json["display"], "standalone");
        assert_eq!(json["theme_color"], "#000000");
        assert_eq!(json["icons"].as_array().unwrap().len(), 2);
        assert_eq!(json["icons"][0]["sizes"], "192x192");
        assert_eq!(json["icons"][0]["type"], "image/png");
        assert_eq!(json["screenshots"].as_array().unwrap().len(), 1);
        assert_eq!(json["screenshots"][0]["form_factor"], "wide");
        assert_eq!(json["description"], "Late-night snacks");
    }

    #[test]
    fn test_manifest_falls_back_to_storefront_name() {
        let settings = PwaSettings::empty(StorefrontId::new(9), Rgb::WHITE.to_hex());
        let manifest = Manifest::build(&storefront(), &settings);
        assert_eq!(manifest.name, "Night Owl");
        assert_eq!(manifest.short_name, "Night Owl");
        assert!(manifest.icons.is_empty());
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("screenshots").is_none());
    }
}
