//! PWA settings repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storecraft_core::{DisplayMode, HexColor, Orientation, StorefrontId};

use super::RepositoryError;
use crate::forms::PwaInput;
use crate::models::{IconSet, PwaSettings};

const PWA_COLUMNS: &str = r"
    storefront_id, name, short_name, description, display, orientation,
    theme_color, background_color, icon_72_url, icon_96_url, icon_128_url,
    icon_144_url, icon_152_url, icon_192_url, icon_384_url, icon_512_url,
    screenshot_wide_url, screenshot_narrow_url, manifest_url, updated_at
";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct PwaSettingsRow {
    storefront_id: StorefrontId,
    name: Option<String>,
    short_name: Option<String>,
    description: Option<String>,
    display: DisplayMode,
    orientation: Orientation,
    theme_color: String,
    background_color: String,
    icon_72_url: Option<String>,
    icon_96_url: Option<String>,
    icon_128_url: Option<String>,
    icon_144_url: Option<String>,
    icon_152_url: Option<String>,
    icon_192_url: Option<String>,
    icon_384_url: Option<String>,
    icon_512_url: Option<String>,
    screenshot_wide_url: Option<String>,
    screenshot_narrow_url: Option<String>,
    manifest_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PwaSettingsRow> for PwaSettings {
    type Error = RepositoryError;

    fn try_from(row: PwaSettingsRow) -> Result<Self, Self::Error> {
        let color = |value: &str| {
            HexColor::parse(value).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid color in database: {e}"))
            })
        };

        Ok(Self {
            storefront_id: row.storefront_id,
            name: row.name,
            short_name: row.short_name,
            description: row.description,
            display: row.display,
            orientation: row.orientation,
            theme_color: color(&row.theme_color)?,
            background_color: color(&row.background_color)?,
            icons: IconSet {
                icon_72: row.icon_72_url,
                icon_96: row.icon_96_url,
                icon_128: row.icon_128_url,
                icon_144: row.icon_144_url,
                icon_152: row.icon_152_url,
                icon_192: row.icon_192_url,
                icon_384: row.icon_384_url,
                icon_512: row.icon_512_url,
            },
            screenshot_wide: row.screenshot_wide_url,
            screenshot_narrow: row.screenshot_narrow_url,
            manifest_url: row.manifest_url,
            updated_at: Some(row.updated_at),
        })
    }
}

/// Repository for PWA settings.
pub struct PwaSettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PwaSettingsRepository<'a> {
    /// Create a new PWA settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the settings of a storefront, if any were saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        storefront_id: StorefrontId,
    ) -> Result<Option<PwaSettings>, RepositoryError> {
        let sql = format!("SELECT {PWA_COLUMNS} FROM pwa_settings WHERE storefront_id = $1");
        let row = sqlx::query_as::<_, PwaSettingsRow>(&sql)
            .bind(storefront_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or replace the editable settings, keeping `manifest_url`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, input))]
    pub async fn upsert(
        &self,
        storefront_id: StorefrontId,
        input: &PwaInput,
    ) -> Result<PwaSettings, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO pwa_settings (
                storefront_id, name, short_name, description, display, orientation,
                theme_color, background_color, icon_72_url, icon_96_url, icon_128_url,
                icon_144_url, icon_152_url, icon_192_url, icon_384_url, icon_512_url,
                screenshot_wide_url, screenshot_narrow_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (storefront_id) DO UPDATE SET
                name = EXCLUDED.name,
                short_name = EXCLUDED.short_name,
                description = EXCLUDED.description,
                display = EXCLUDED.display,
                orientation = EXCLUDED.orientation,
                theme_color = EXCLUDED.theme_color,
                background_color = EXCLUDED.background_color,
                icon_72_url = EXCLUDED.icon_72_url,
                icon_96_url = EXCLUDED.icon_96_url,
                icon_128_url = EXCLUDED.icon_128_url,
                icon_144_url = EXCLUDED.icon_144_url,
                icon_152_url = EXCLUDED.icon_152_url,
                icon_192_url = EXCLUDED.icon_192_url,
                icon_384_url = EXCLUDED.icon_384_url,
                icon_512_url = EXCLUDED.icon_512_url,
                screenshot_wide_url = EXCLUDED.screenshot_wide_url,
                screenshot_narrow_url = EXCLUDED.screenshot_narrow_url,
                updated_at = NOW()
            RETURNING {PWA_COLUMNS}
            "
        );
        let icons = &input.icons;
        let row = sqlx::query_as::<_, PwaSettingsRow>(&sql)
            .bind(storefront_id)
            .bind(&input.name)
            .bind(&input.short_name)
            .bind(&input.description)
            .bind(input.display)
            .bind(input.orientation)
            .bind(input.theme_color.as_str())
            .bind(input.background_color.as_str())
            .bind(&icons.icon_72)
            .bind(&icons.icon_96)
            .bind(&icons.icon_128)
            .bind(&icons.icon_144)
            .bind(&icons.icon_152)
            .bind(&icons.icon_192)
            .bind(&icons.icon_384)
            .bind(&icons.icon_512)
            .bind(&input.screenshot_wide)
            .bind(&input.screenshot_narrow)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Replace all icon URLs, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, icons))]
    pub async fn set_icons(
        &self,
        storefront_id: StorefrontId,
        icons: &IconSet,
    ) -> Result<PwaSettings, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO pwa_settings (
                storefront_id, icon_72_url, icon_96_url, icon_128_url, icon_144_url,
                icon_152_url, icon_192_url, icon_384_url, icon_512_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (storefront_id) DO UPDATE SET
                icon_72_url = EXCLUDED.icon_72_url,
                icon_96_url = EXCLUDED.icon_96_url,
                icon_128_url = EXCLUDED.icon_128_url,
                icon_144_url = EXCLUDED.icon_144_url,
                icon_152_url = EXCLUDED.icon_152_url,
                icon_192_url = EXCLUDED.icon_192_url,
                icon_384_url = EXCLUDED.icon_384_url,
                icon_512_url = EXCLUDED.icon_512_url,
                updated_at = NOW()
            RETURNING {PWA_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, PwaSettingsRow>(&sql)
            .bind(storefront_id)
            .bind(&icons.icon_72)
            .bind(&icons.icon_96)
            .bind(&icons.icon_128)
            .bind(&icons.icon_144)
            .bind(&icons.icon_152)
            .bind(&icons.icon_192)
            .bind(&icons.icon_384)
            .bind(&icons.icon_512)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Record the public URL of the published manifest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no settings row exists.
    #[instrument(skip(self))]
    pub async fn set_manifest_url(
        &self,
        storefront_id: StorefrontId,
        manifest_url: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE pwa_settings
            SET manifest_url = $2, updated_at = NOW()
            WHERE storefront_id = $1
            ",
        )
        .bind(storefront_id)
        .bind(manifest_url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
