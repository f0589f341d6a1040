//! Business membership repository.
//!
//! Membership is the single source of authorization: a user may act on a
//! storefront only through a role in the business that owns it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storecraft_core::{BusinessId, MemberRole, StorefrontId, UserId};

use super::RepositoryError;
use crate::models::Member;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    business_id: BusinessId,
    user_id: UserId,
    role: MemberRole,
    created_at: DateTime<Utc>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            business_id: row.business_id,
            user_id: row.user_id,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

/// Repository for business membership operations.
pub struct MemberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's role in a business, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn role_in_business(
        &self,
        business_id: BusinessId,
        user_id: UserId,
    ) -> Result<Option<MemberRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, MemberRole>(
            r"
            SELECT role FROM business_members
            WHERE business_id = $1 AND user_id = $2
            ",
        )
        .bind(business_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(role)
    }

    /// The user's role in the business owning a storefront, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn role_for_storefront(
        &self,
        storefront_id: StorefrontId,
        user_id: UserId,
    ) -> Result<Option<MemberRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, MemberRole>(
            r"
            SELECT m.role
            FROM storefronts s
            JOIN business_members m ON m.business_id = s.business_id
            WHERE s.id = $1 AND m.user_id = $2
            ",
        )
        .bind(storefront_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(role)
    }

    /// List members of a business, owners first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, business_id: BusinessId) -> Result<Vec<Member>, RepositoryError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r"
            SELECT business_id, user_id, role, created_at
            FROM business_members
            WHERE business_id = $1
            ORDER BY role ASC, created_at ASC
            ",
        )
        .bind(business_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a member or change an existing member's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn upsert(
        &self,
        business_id: BusinessId,
        user_id: UserId,
        role: MemberRole,
    ) -> Result<Member, RepositoryError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r"
            INSERT INTO business_members (business_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (business_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING business_id, user_id, role, created_at
            ",
        )
        .bind(business_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Remove a member.
    ///
    /// The last owner of a business cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not a member.
    /// Returns `RepositoryError::Conflict` if the user is the last owner.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        business_id: BusinessId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_scalar::<_, MemberRole>(
            r"
            SELECT role FROM business_members
            WHERE business_id = $1 AND user_id = $2
            FOR UPDATE
            ",
        )
        .bind(business_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if role == MemberRole::Owner {
            let owners = sqlx::query_scalar::<_, i64>(
                r"
                SELECT COUNT(*) FROM business_members
                WHERE business_id = $1 AND role = 'owner'
                ",
            )
            .bind(business_id)
            .fetch_one(&mut *tx)
            .await?;

            if owners <= 1 {
                return Err(RepositoryError::Conflict(
                    "cannot remove the last owner".to_owned(),
                ));
            }
        }

        sqlx::query("DELETE FROM business_members WHERE business_id = $1 AND user_id = $2")
            .bind(business_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
