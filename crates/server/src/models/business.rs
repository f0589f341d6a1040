//! Business (tenant) and membership models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storecraft_core::{BusinessId, MemberRole, UserId};

/// A tenant that owns one or more storefronts.
#[derive(Debug, Clone, Serialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's role within a business.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub business_id: BusinessId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}
