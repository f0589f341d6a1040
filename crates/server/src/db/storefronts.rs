//! Storefront repository for database operations.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use storecraft_core::{BusinessId, Slug, StorefrontId, VerificationType};

use super::RepositoryError;
use crate::forms::{StorefrontInput, VerificationInput};
use crate::models::{Instructions, Storefront, ThemeConfig, VerificationConfig};

/// Hashed form of a [`crate::forms::PasswordChange`], ready to store.
#[derive(Debug, Clone)]
pub enum StoredPassword {
    Keep,
    Set(secrecy::SecretString),
    Clear,
}

const STOREFRONT_COLUMNS: &str = r"
    id, business_id, slug, name, description, logo_url, favicon_url,
    is_published, theme, verification_type, age_threshold, age_text,
    legal_text, gate_password_hash, instructions_enabled, instructions_text,
    created_at, updated_at
";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct StorefrontRow {
    id: StorefrontId,
    business_id: BusinessId,
    slug: String,
    name: String,
    description: Option<String>,
    logo_url: Option<String>,
    favicon_url: Option<String>,
    is_published: bool,
    theme: Json<ThemeConfig>,
    verification_type: VerificationType,
    age_threshold: i16,
    age_text: Option<String>,
    legal_text: Option<String>,
    gate_password_hash: Option<String>,
    instructions_enabled: bool,
    instructions_text: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StorefrontRow> for Storefront {
    type Error = RepositoryError;

    fn try_from(row: StorefrontRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;
        let age_threshold = u8::try_from(row.age_threshold).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "age threshold out of range: {}",
                row.age_threshold
            ))
        })?;

        Ok(Self {
            id: row.id,
            business_id: row.business_id,
            slug,
            name: row.name,
            description: row.description,
            logo_url: row.logo_url,
            favicon_url: row.favicon_url,
            is_published: row.is_published,
            theme: row.theme.0,
            verification: VerificationConfig {
                verification_type: row.verification_type,
                age_threshold,
                age_text: row.age_text,
                legal_text: row.legal_text,
                has_password: row.gate_password_hash.is_some(),
            },
            instructions: Instructions {
                enabled: row.instructions_enabled,
                text: row.instructions_text,
            },
            password_hash: row.gate_password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for storefront database operations.
pub struct StorefrontRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StorefrontRepository<'a> {
    /// Create a new storefront repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a storefront by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    #[instrument(skip(self))]
    pub async fn get(&self, id: StorefrontId) -> Result<Option<Storefront>, RepositoryError> {
        let sql = format!("SELECT {STOREFRONT_COLUMNS} FROM storefronts WHERE id = $1");
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a storefront by its public slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Storefront>, RepositoryError> {
        let sql = format!("SELECT {STOREFRONT_COLUMNS} FROM storefronts WHERE slug = $1");
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a business's storefronts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_business(
        &self,
        business_id: BusinessId,
    ) -> Result<Vec<Storefront>, RepositoryError> {
        let sql = format!(
            "SELECT {STOREFRONT_COLUMNS} FROM storefronts WHERE business_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(business_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create an unpublished storefront with the default theme.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(
        &self,
        business_id: BusinessId,
        input: &StorefrontInput,
    ) -> Result<Storefront, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefronts (business_id, slug, name, description, logo_url, favicon_url, theme)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(business_id)
            .bind(input.slug.as_str())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.logo_url)
            .bind(&input.favicon_url)
            .bind(Json(ThemeConfig::default()))
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "slug is already in use"))?;

        row.try_into()
    }

    /// Update display fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    #[instrument(skip(self, input))]
    pub async fn update_details(
        &self,
        id: StorefrontId,
        input: &StorefrontInput,
    ) -> Result<Storefront, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefronts
            SET slug = $2, name = $3, description = $4, logo_url = $5,
                favicon_url = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .bind(input.slug.as_str())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.logo_url)
            .bind(&input.favicon_url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "slug is already in use"))?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Update gate settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
    #[instrument(skip(self, input, password))]
    pub async fn update_verification(
        &self,
        id: StorefrontId,
        input: &VerificationInput,
        password: &StoredPassword,
    ) -> Result<Storefront, RepositoryError> {
        // $6 selects the password action: 0 keep, 1 set to $7, 2 clear.
        let (action, hash): (i16, Option<&str>) = match password {
            StoredPassword::Keep => (0, None),
            StoredPassword::Set(hash) => (1, Some(hash.expose_secret())),
            StoredPassword::Clear => (2, None),
        };
        let sql = format!(
            r"
            UPDATE storefronts
            SET verification_type = $2, age_threshold = $3, age_text = $4,
                legal_text = $5,
                gate_password_hash = CASE $6::smallint
                    WHEN 1 THEN $7
                    WHEN 2 THEN NULL
                    ELSE gate_password_hash
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .bind(input.verification_type)
            .bind(i16::from(input.age_threshold))
            .bind(&input.age_text)
            .bind(&input.legal_text)
            .bind(action)
            .bind(hash)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Update the post-gate instructions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
    #[instrument(skip(self, instructions))]
    pub async fn update_instructions(
        &self,
        id: StorefrontId,
        instructions: &Instructions,
    ) -> Result<Storefront, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefronts
            SET instructions_enabled = $2, instructions_text = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .bind(instructions.enabled)
            .bind(&instructions.text)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace the theme.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
    #[instrument(skip(self, theme))]
    pub async fn update_theme(
        &self,
        id: StorefrontId,
        theme: &ThemeConfig,
    ) -> Result<Storefront, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefronts
            SET theme = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .bind(Json(theme))
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Set the publication flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
    #[instrument(skip(self))]
    pub async fn set_published(
        &self,
        id: StorefrontId,
        published: bool,
    ) -> Result<Storefront, RepositoryError> {
        let sql = format!(
            r"
            UPDATE storefronts
            SET is_published = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {STOREFRONT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, StorefrontRow>(&sql)
            .bind(id)
            .bind(published)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
