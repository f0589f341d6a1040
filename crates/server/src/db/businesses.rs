//! Business repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storecraft_core::{BusinessId, MemberRole, UserId};

use super::RepositoryError;
use crate::forms::BusinessInput;
use crate::models::Business;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct BusinessRow {
    id: BusinessId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for business database operations.
pub struct BusinessRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BusinessRepository<'a> {
    /// Create a new business repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a business by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: BusinessId) -> Result<Option<Business>, RepositoryError> {
        let row = sqlx::query_as::<_, BusinessRow>(
            r"
            SELECT id, name, description, created_at, updated_at
            FROM businesses
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List the businesses a user belongs to, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Business>, RepositoryError> {
        let rows = sqlx::query_as::<_, BusinessRow>(
            r"
            SELECT b.id, b.name, b.description, b.created_at, b.updated_at
            FROM businesses b
            JOIN business_members m ON m.business_id = b.id
            WHERE m.user_id = $1
            ORDER BY b.created_at ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a business and make `owner` its first owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either insert fails; nothing is
    /// written in that case.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_with_owner(
        &self,
        input: &BusinessInput,
        owner: UserId,
    ) -> Result<Business, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BusinessRow>(
            r"
            INSERT INTO businesses (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO business_members (business_id, user_id, role)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(row.id)
        .bind(owner)
        .bind(MemberRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }
}
