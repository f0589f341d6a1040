//! Storefront model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storecraft_core::{BusinessId, HexColor, Rgb, Slug, StorefrontId, VerificationType};

/// Default minimum visitor age shown on the age gate.
pub const DEFAULT_AGE_THRESHOLD: u8 = 21;

/// A customer-facing storefront owned by a business.
///
/// Storefronts are never hard-deleted; `is_published` is the only visibility
/// switch. The gate password hash stays on the server and is skipped when
/// serializing.
#[derive(Debug, Clone, Serialize)]
pub struct Storefront {
    pub id: StorefrontId,
    pub business_id: BusinessId,
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub is_published: bool,
    pub theme: ThemeConfig,
    pub verification: VerificationConfig,
    pub instructions: Instructions,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront colors, stored as a single JSONB column.
///
/// Missing keys fall back to the default theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background_primary: HexColor,
    pub background_secondary: HexColor,
    pub background_accent: HexColor,
    pub font_primary: HexColor,
    pub font_secondary: HexColor,
    pub font_highlight: HexColor,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background_primary: Rgb::WHITE.to_hex(),
            background_secondary: Rgb::new(0xf4, 0xf4, 0xf5).to_hex(),
            background_accent: Rgb::new(0x18, 0x18, 0x1b).to_hex(),
            font_primary: Rgb::new(0x1a, 0x1a, 0x1a).to_hex(),
            font_secondary: Rgb::new(0x1a, 0x1a, 0x1a).to_hex(),
            font_highlight: Rgb::new(0xf5, 0x9e, 0x0b).to_hex(),
        }
    }
}

/// Gate configuration as visible to the builder and the public renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationConfig {
    pub verification_type: VerificationType,
    pub age_threshold: u8,
    pub age_text: Option<String>,
    pub legal_text: Option<String>,
    /// Whether a gate password hash is stored.
    pub has_password: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            verification_type: VerificationType::None,
            age_threshold: DEFAULT_AGE_THRESHOLD,
            age_text: None,
            legal_text: None,
            has_password: false,
        }
    }
}

impl VerificationConfig {
    /// Checkbox label on the age gate.
    #[must_use]
    pub fn age_prompt(&self) -> String {
        self.age_text
            .clone()
            .unwrap_or_else(|| format!("I confirm that I am {} or older", self.age_threshold))
    }
}

/// Optional interstitial shown once the gate is passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions {
    pub enabled: bool,
    pub text: Option<String>,
}

impl Storefront {
    /// Public path of the storefront.
    #[must_use]
    pub fn public_path(&self) -> String {
        format!("/s/{}", self.slug)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_roundtrips_through_json() {
        let theme = ThemeConfig::default();
        let json = serde_json::to_value(&theme).unwrap();
        assert_eq!(json["background_primary"], "#ffffff");
        let back: ThemeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, theme);
    }

    #[test]
    fn test_empty_theme_object_uses_defaults() {
        let theme: ThemeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(theme, ThemeConfig::default());
    }

    #[test]
    fn test_age_prompt_falls_back_to_threshold() {
        let config = VerificationConfig {
            verification_type: VerificationType::Age,
            age_threshold: 18,
            ..VerificationConfig::default()
        };
        assert_eq!(config.age_prompt(), "I confirm that I am 18 or older");

        let custom = VerificationConfig {
            age_text: Some("Adults only".to_string()),
            ..config
        };
        assert_eq!(custom.age_prompt(), "Adults only");
    }
}
