//! Command implementations.
//!
//! # Environment Variables
//!
//! - `STORECRAFT_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)

pub mod csv;
pub mod manifest;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use storecraft_server::db::{self, RepositoryError, StorefrontRepository};
use storecraft_server::forms::ValidationErrors;
use storecraft_server::models::Storefront;
use storecraft_server::services::manifest::ManifestError;
use storecraft_server::services::product_csv::CsvImportError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("No storefront with slug: {0}")]
    UnknownStorefront(String),

    #[error("Invalid {context}: {}", errors.messages().join("; "))]
    Invalid {
        context: String,
        errors: ValidationErrors,
    },

    #[error(transparent)]
    Csv(#[from] CsvImportError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CommandError {
    fn invalid(context: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Invalid {
            context: context.into(),
            errors,
        }
    }
}

/// Connect using `STORECRAFT_DATABASE_URL` or `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    let _ = dotenvy::dotenv();

    let database_url = std::env::var("STORECRAFT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STORECRAFT_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

async fn storefront_by_slug(pool: &PgPool, slug: &str) -> Result<Storefront, CommandError> {
    StorefrontRepository::new(pool)
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| CommandError::UnknownStorefront(slug.to_owned()))
}
