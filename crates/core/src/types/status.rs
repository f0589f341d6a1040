//! Status and mode enums for various entities.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing one of the enums in this module fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Product visibility status.
///
/// Exactly two values are ever stored; "all" only exists as a
/// [`StatusFilter`] wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(ParseEnumError::new("product status", s)),
        }
    }
}

/// Status filter for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Wildcard: matches every status.
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Whether a product with `status` passes this filter.
    #[must_use]
    pub const fn matches(&self, status: ProductStatus) -> bool {
        matches!(
            (self, status),
            (Self::All, _)
                | (Self::Active, ProductStatus::Active)
                | (Self::Inactive, ProductStatus::Inactive)
        )
    }
}

/// Which checks guard a storefront before its content is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "verification_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum VerificationType {
    #[default]
    None,
    Age,
    Password,
    Both,
}

impl VerificationType {
    /// Whether visitors must tick the age confirmation.
    #[must_use]
    pub const fn requires_age(&self) -> bool {
        matches!(self, Self::Age | Self::Both)
    }

    /// Whether visitors must enter the storefront password.
    #[must_use]
    pub const fn requires_password(&self) -> bool {
        matches!(self, Self::Password | Self::Both)
    }

    /// Whether any gate is shown at all.
    #[must_use]
    pub const fn is_gated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for VerificationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "age" => Ok(Self::Age),
            "password" => Ok(Self::Password),
            "both" => Ok(Self::Both),
            _ => Err(ParseEnumError::new("verification type", s)),
        }
    }
}

/// Role of a user within a business.
///
/// Membership is tracked per business; storefront access is derived from the
/// owning business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "member_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Read-only access to the business's storefronts.
    Member,
    /// Can edit storefronts, products and PWA settings.
    Editor,
    /// Full access including membership management.
    Owner,
}

impl MemberRole {
    /// Whether this role may modify storefront content.
    #[must_use]
    pub const fn can_edit(&self) -> bool {
        matches!(self, Self::Editor | Self::Owner)
    }

    /// Whether this role may add or remove members.
    #[must_use]
    pub const fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Editor => write!(f, "editor"),
            Self::Member => write!(f, "member"),
        }
    }
}

impl FromStr for MemberRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "member" => Ok(Self::Member),
            _ => Err(ParseEnumError::new("member role", s)),
        }
    }
}

/// Web app manifest display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "display_mode", rename_all = "kebab-case")
)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Fullscreen,
    #[default]
    Standalone,
    MinimalUi,
    Browser,
}

/// Web app manifest orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "orientation", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Any,
    Natural,
    Landscape,
    Portrait,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_all_is_wildcard() {
        assert!(StatusFilter::All.matches(ProductStatus::Active));
        assert!(StatusFilter::All.matches(ProductStatus::Inactive));
        assert!(StatusFilter::Active.matches(ProductStatus::Active));
        assert!(!StatusFilter::Active.matches(ProductStatus::Inactive));
        assert!(!StatusFilter::Inactive.matches(ProductStatus::Active));
    }

    #[test]
    fn test_product_status_rejects_all() {
        assert!("all".parse::<ProductStatus>().is_err());
        assert_eq!(
            " Inactive ".parse::<ProductStatus>().unwrap(),
            ProductStatus::Inactive
        );
    }

    #[test]
    fn test_verification_requirements() {
        assert!(!VerificationType::None.is_gated());
        assert!(VerificationType::Age.requires_age());
        assert!(!VerificationType::Age.requires_password());
        assert!(VerificationType::Both.requires_age());
        assert!(VerificationType::Both.requires_password());
        assert!(VerificationType::Password.requires_password());
    }

    #[test]
    fn test_member_role_permissions() {
        assert!(MemberRole::Owner.can_manage_members());
        assert!(!MemberRole::Editor.can_manage_members());
        assert!(MemberRole::Editor.can_edit());
        assert!(!MemberRole::Member.can_edit());
        assert!(MemberRole::Owner > MemberRole::Member);
    }

    #[test]
    fn test_member_role_roundtrip() {
        for role in [MemberRole::Owner, MemberRole::Editor, MemberRole::Member] {
            assert_eq!(role.to_string().parse::<MemberRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_display_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&DisplayMode::MinimalUi).unwrap();
        assert_eq!(json, "\"minimal-ui\"");
    }
}
