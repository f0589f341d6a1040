//! Membership checks for dashboard routes.
//!
//! A storefront the user has no role on answers 404, so ids of other tenants
//! cannot be probed. A role that is too weak answers 403.

use sqlx::PgPool;
use tracing::instrument;

use storecraft_core::{BusinessId, MemberRole, StorefrontId};

use crate::db::{BusinessRepository, MemberRepository, StorefrontRepository};
use crate::error::AppError;
use crate::models::{Business, CurrentUser, Storefront};

/// What the caller is about to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    View,
    Edit,
    ManageMembers,
}

impl Need {
    const fn allows(self, role: MemberRole) -> bool {
        match self {
            Self::View => true,
            Self::Edit => role.can_edit(),
            Self::ManageMembers => role.can_manage_members(),
        }
    }
}

fn check(need: Need, role: MemberRole) -> Result<MemberRole, AppError> {
    if need.allows(role) {
        Ok(role)
    } else {
        Err(AppError::Forbidden(format!("role {role} cannot perform this action")))
    }
}

/// Load a storefront the user is a member of.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown storefronts and non-members,
/// `AppError::Forbidden` when the role is insufficient.
#[instrument(skip(pool, user), fields(user_id = %user.id))]
pub async fn require_storefront(
    pool: &PgPool,
    user: &CurrentUser,
    storefront_id: StorefrontId,
    need: Need,
) -> Result<(Storefront, MemberRole), AppError> {
    let role = MemberRepository::new(pool)
        .role_for_storefront(storefront_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("storefront {storefront_id}")))?;
    let role = check(need, role)?;

    let storefront = StorefrontRepository::new(pool)
        .get(storefront_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("storefront {storefront_id}")))?;

    Ok((storefront, role))
}

/// Load a business the user is a member of.
///
/// # Errors
///
/// Same as [`require_storefront`].
#[instrument(skip(pool, user), fields(user_id = %user.id))]
pub async fn require_business(
    pool: &PgPool,
    user: &CurrentUser,
    business_id: BusinessId,
    need: Need,
) -> Result<(Business, MemberRole), AppError> {
    let role = MemberRepository::new(pool)
        .role_in_business(business_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("business {business_id}")))?;
    let role = check(need, role)?;

    let business = BusinessRepository::new(pool)
        .get(business_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("business {business_id}")))?;

    Ok((business, role))
}
