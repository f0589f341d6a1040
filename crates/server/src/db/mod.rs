//! Database operations for the storefront builder `PostgreSQL`.
//!
//! ## Tables
//!
//! - `businesses` - Tenants that own storefronts
//! - `business_members` - `(business, user, role)` membership
//! - `storefronts` - Public storefront configuration (theme as JSONB)
//! - `products` - Catalog rows per storefront
//! - `pwa_settings` - One-to-one web app manifest settings
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Users live in the hosted auth service; only their UUIDs are stored here.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p storecraft-cli -- migrate
//! ```

pub mod businesses;
pub mod members;
pub mod products;
pub mod pwa_settings;
pub mod storefronts;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::retry::Transient;

pub use businesses::BusinessRepository;
pub use members::MemberRepository;
pub use products::ProductRepository;
pub use pwa_settings::PwaSettingsRepository;
pub use storefronts::StorefrontRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(err)
    }
}

impl Transient for RepositoryError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::DataCorruption(_) | Self::NotFound | Self::Conflict(_) => false,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(RepositoryError::Database(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_logical_errors_are_not_transient() {
        assert!(!RepositoryError::NotFound.is_transient());
        assert!(!RepositoryError::Conflict("slug".to_string()).is_transient());
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
    }
}
