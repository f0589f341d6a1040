//! Business, membership and storefront-creation handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use storecraft_core::{BusinessId, UserId};

use crate::db::{BusinessRepository, MemberRepository, StorefrontRepository};
use crate::error::Result;
use crate::forms::{BusinessForm, MemberForm, StorefrontForm};
use crate::middleware::RequireUser;
use crate::models::{Business, Member, Storefront};
use crate::services::access::{Need, require_business};
use crate::state::AppState;

/// Businesses the user belongs to.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Business>>> {
    let repo = BusinessRepository::new(state.pool());
    let businesses = state
        .retry()
        .run("list_businesses", || repo.list_for_user(user.id))
        .await?;
    Ok(Json(businesses))
}

/// Create a business owned by the user.
#[instrument(skip(state, user, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(form): Json<BusinessForm>,
) -> Result<(StatusCode, Json<Business>)> {
    let input = form.validate()?;
    let business = BusinessRepository::new(state.pool())
        .create_with_owner(&input, user.id)
        .await?;
    info!(business_id = %business.id, "Business created");
    Ok((StatusCode::CREATED, Json(business)))
}

/// Members of a business.
#[instrument(skip(state, user))]
pub async fn members(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<BusinessId>,
) -> Result<Json<Vec<Member>>> {
    require_business(state.pool(), &user, id, Need::View).await?;
    let repo = MemberRepository::new(state.pool());
    let members = state.retry().run("list_members", || repo.list(id)).await?;
    Ok(Json(members))
}

/// Add a member or change their role. Owners only.
#[instrument(skip(state, user, form))]
pub async fn add_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<BusinessId>,
    Json(form): Json<MemberForm>,
) -> Result<Json<Member>> {
    require_business(state.pool(), &user, id, Need::ManageMembers).await?;
    let (member_id, role) = form.validate()?;
    let member = MemberRepository::new(state.pool())
        .upsert(id, member_id, role)
        .await?;
    info!(member = %member_id, role = %role, "Member saved");
    Ok(Json(member))
}

/// Remove a member. The last owner stays.
#[instrument(skip(state, user))]
pub async fn remove_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((id, member_id)): Path<(BusinessId, UserId)>,
) -> Result<StatusCode> {
    require_business(state.pool(), &user, id, Need::ManageMembers).await?;
    MemberRepository::new(state.pool())
        .remove(id, member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Storefronts of a business.
#[instrument(skip(state, user))]
pub async fn storefronts(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<BusinessId>,
) -> Result<Json<Vec<Storefront>>> {
    require_business(state.pool(), &user, id, Need::View).await?;
    let repo = StorefrontRepository::new(state.pool());
    let storefronts = state
        .retry()
        .run("list_storefronts", || repo.list_for_business(id))
        .await?;
    Ok(Json(storefronts))
}

/// Create an unpublished storefront.
#[instrument(skip(state, user, form))]
pub async fn create_storefront(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<BusinessId>,
    Json(form): Json<StorefrontForm>,
) -> Result<(StatusCode, Json<Storefront>)> {
    require_business(state.pool(), &user, id, Need::Edit).await?;
    let input = form.validate()?;
    let storefront = StorefrontRepository::new(state.pool())
        .create(id, &input)
        .await?;
    info!(storefront_id = %storefront.id, slug = %storefront.slug, "Storefront created");
    Ok((StatusCode::CREATED, Json(storefront)))
}
