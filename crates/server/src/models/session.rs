//! Session-related types.
//!
//! Types stored in the session for authentication state, the selected
//! storefront and per-storefront gate progress.

use serde::{Deserialize, Serialize};

use storecraft_core::{StorefrontId, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in builder user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth service user ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
}

/// Session keys.
pub mod keys {
    use super::StorefrontId;

    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the storefront the builder is currently working on.
    pub const SELECTED_STOREFRONT: &str = "selected_storefront";

    /// Key for a visitor's gate progress on one storefront.
    #[must_use]
    pub fn gate(storefront_id: StorefrontId) -> String {
        format!("gate:{storefront_id}")
    }
}
