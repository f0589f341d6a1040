//! Form inputs and their validation.
//!
//! Each `*Form` is deserialized straight from a request body and turned into
//! the matching `*Input` by `validate()`. Repositories only accept inputs, so
//! nothing reaches the database without passing through here.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storecraft_core::{
    Categories, DisplayMode, HexColor, MemberRole, Orientation, Price, ProductStatus, Rgb,
    Slug, UserId, VerificationType,
};

use crate::models::storefront::DEFAULT_AGE_THRESHOLD;
use crate::models::{IconSet, Instructions, NewProduct, PwaSettings, Storefront, ThemeConfig};

const MAX_NAME_LENGTH: usize = 200;
const MAX_SHORT_NAME_LENGTH: usize = 12;
const MIN_GATE_PASSWORD_LENGTH: usize = 4;

// =============================================================================
// Errors
// =============================================================================

/// A validation message attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors found in one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Record an error for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Whether no error has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `field` has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages in recording order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }

    fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn required_text(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "is required");
    } else if trimmed.chars().count() > MAX_NAME_LENGTH {
        errors.add(field, format!("must be at most {MAX_NAME_LENGTH} characters"));
    }
    trimmed.to_owned()
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn optional_url(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    let value = optional_text(value)?;
    match url::Url::parse(&value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(value),
        _ => {
            errors.add(field, "must be an http(s) URL");
            None
        }
    }
}

fn price(errors: &mut ValidationErrors, field: &str, value: &PriceField) -> Price {
    Price::parse(&value.as_text()).unwrap_or_else(|e| {
        errors.add(field, e.to_string());
        Price::ZERO
    })
}

fn color(errors: &mut ValidationErrors, field: &str, value: &str) -> HexColor {
    HexColor::parse(value).unwrap_or_else(|e| {
        errors.add(field, e.to_string());
        Rgb::BLACK.to_hex()
    })
}

/// A price as typed into a form (`"12.50"`) or sent as a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Number(serde_json::Number),
}

impl PriceField {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for PriceField {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// =============================================================================
// Business
// =============================================================================

/// Form data for creating a business.
#[derive(Debug, Deserialize)]
pub struct BusinessForm {
    pub name: String,
    pub description: Option<String>,
}

/// Validated business input.
#[derive(Debug, Clone)]
pub struct BusinessInput {
    pub name: String,
    pub description: Option<String>,
}

impl BusinessForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` if the name is blank or too long.
    pub fn validate(self) -> Result<BusinessInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = required_text(&mut errors, "name", &self.name);
        errors.finish(BusinessInput {
            name,
            description: optional_text(self.description),
        })
    }
}

/// Form data for adding a member to a business.
#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub user_id: String,
    pub role: String,
}

impl MemberForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for a malformed user id or unknown role.
    pub fn validate(self) -> Result<(UserId, MemberRole), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let user_id = self.user_id.trim().parse::<UserId>().map_err(|_| {
            errors.add("user_id", "must be a user id");
        });
        let role = self.role.trim().parse::<MemberRole>().map_err(|e| {
            errors.add("role", e.to_string());
        });
        match (user_id, role) {
            (Ok(user_id), Ok(role)) => Ok((user_id, role)),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Storefront
// =============================================================================

/// Form data for creating or editing storefront details.
#[derive(Debug, Deserialize)]
pub struct StorefrontForm {
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
}

/// Validated storefront details.
#[derive(Debug, Clone)]
pub struct StorefrontInput {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
}

impl StorefrontForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for a blank name, malformed slug or
    /// non-http URLs.
    pub fn validate(self) -> Result<StorefrontInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = required_text(&mut errors, "name", &self.name);
        let slug = match optional_text(self.slug) {
            Some(raw) => Slug::parse(&raw).unwrap_or_else(|e| {
                errors.add("slug", e.to_string());
                Slug::slugify(&name)
            }),
            None => Slug::slugify(&name),
        };
        let logo_url = optional_url(&mut errors, "logo_url", self.logo_url);
        let favicon_url = optional_url(&mut errors, "favicon_url", self.favicon_url);

        errors.finish(StorefrontInput {
            name,
            slug,
            description: optional_text(self.description),
            logo_url,
            favicon_url,
        })
    }
}

impl From<&Storefront> for StorefrontInput {
    fn from(storefront: &Storefront) -> Self {
        Self {
            name: storefront.name.clone(),
            slug: storefront.slug.clone(),
            description: storefront.description.clone(),
            logo_url: storefront.logo_url.clone(),
            favicon_url: storefront.favicon_url.clone(),
        }
    }
}

/// Form data for the verification gate settings.
#[derive(Debug, Deserialize)]
pub struct VerificationForm {
    pub verification_type: VerificationType,
    pub age_threshold: Option<u8>,
    pub age_text: Option<String>,
    pub legal_text: Option<String>,
    /// New gate password; blank keeps the stored one.
    pub password: Option<String>,
}

/// What to do with the stored gate password.
#[derive(Debug, Clone)]
pub enum PasswordChange {
    Keep,
    Set(SecretString),
    Clear,
}

/// Validated gate settings.
#[derive(Debug, Clone)]
pub struct VerificationInput {
    pub verification_type: VerificationType,
    pub age_threshold: u8,
    pub age_text: Option<String>,
    pub legal_text: Option<String>,
    pub password: PasswordChange,
}

impl VerificationForm {
    /// Validate the form against whether a password is already stored.
    ///
    /// Sub-fields are cleared when the type is `none`; the password is
    /// cleared whenever the type no longer asks for one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` when a password is required but missing or
    /// too short.
    pub fn validate(self, has_stored_password: bool) -> Result<VerificationInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let kind = self.verification_type;

        if !kind.is_gated() {
            return Ok(VerificationInput {
                verification_type: kind,
                age_threshold: DEFAULT_AGE_THRESHOLD,
                age_text: None,
                legal_text: None,
                password: PasswordChange::Clear,
            });
        }

        let password = if kind.requires_password() {
            match self.password.filter(|p| !p.trim().is_empty()) {
                Some(p) if p.chars().count() < MIN_GATE_PASSWORD_LENGTH => {
                    errors.add(
                        "password",
                        format!("must be at least {MIN_GATE_PASSWORD_LENGTH} characters"),
                    );
                    PasswordChange::Keep
                }
                Some(p) => PasswordChange::Set(SecretString::from(p)),
                None if has_stored_password => PasswordChange::Keep,
                None => {
                    errors.add("password", "is required for this verification type");
                    PasswordChange::Keep
                }
            }
        } else {
            PasswordChange::Clear
        };

        let age_threshold = self.age_threshold.unwrap_or(DEFAULT_AGE_THRESHOLD);
        if kind.requires_age() && !(1..=150).contains(&age_threshold) {
            errors.add("age_threshold", "must be between 1 and 150");
        }

        errors.finish(VerificationInput {
            verification_type: kind,
            age_threshold,
            age_text: if kind.requires_age() {
                optional_text(self.age_text)
            } else {
                None
            },
            legal_text: optional_text(self.legal_text),
            password,
        })
    }
}

/// Form data for the post-gate instructions.
#[derive(Debug, Deserialize)]
pub struct InstructionsForm {
    pub enabled: bool,
    pub text: Option<String>,
}

impl InstructionsForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` when instructions are enabled without text.
    pub fn validate(self) -> Result<Instructions, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let text = optional_text(self.text);
        if self.enabled && text.is_none() {
            errors.add("text", "is required when instructions are enabled");
        }
        errors.finish(Instructions {
            enabled: self.enabled,
            text,
        })
    }
}

/// Form data for the storefront colors.
#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub background_primary: String,
    pub background_secondary: String,
    pub background_accent: String,
    pub font_primary: String,
    pub font_secondary: String,
    pub font_highlight: String,
}

impl ThemeForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` naming every malformed color.
    pub fn validate(self) -> Result<ThemeConfig, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let theme = ThemeConfig {
            background_primary: color(&mut errors, "background_primary", &self.background_primary),
            background_secondary: color(
                &mut errors,
                "background_secondary",
                &self.background_secondary,
            ),
            background_accent: color(&mut errors, "background_accent", &self.background_accent),
            font_primary: color(&mut errors, "font_primary", &self.font_primary),
            font_secondary: color(&mut errors, "font_secondary", &self.font_secondary),
            font_highlight: color(&mut errors, "font_highlight", &self.font_highlight),
        };
        errors.finish(theme)
    }
}

// =============================================================================
// Product
// =============================================================================

/// Form data for a product, shared by the editor and CSV import.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub in_town_price: PriceField,
    pub shipping_price: PriceField,
    #[serde(alias = "category", default)]
    pub categories: Categories,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub stock_number: Option<String>,
}

impl ProductForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for blank required text, malformed or
    /// negative prices, a missing category or an unknown status.
    pub fn validate(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = required_text(&mut errors, "name", &self.name);
        let description = self.description.trim().to_owned();
        if description.is_empty() {
            errors.add("description", "is required");
        }
        let in_town_price = price(&mut errors, "in_town_price", &self.in_town_price);
        let shipping_price = price(&mut errors, "shipping_price", &self.shipping_price);
        if self.categories.is_empty() {
            errors.add("category", "at least one category is required");
        }
        let status = match optional_text(self.status) {
            Some(raw) => raw.parse::<ProductStatus>().unwrap_or_else(|e| {
                errors.add("status", e.to_string());
                ProductStatus::Active
            }),
            None => ProductStatus::Active,
        };
        let media_urls = self
            .media_urls
            .into_iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();

        errors.finish(NewProduct {
            name,
            description,
            in_town_price,
            shipping_price,
            categories: self.categories,
            media_urls,
            status,
            sort_order: self.sort_order,
            stock_number: optional_text(self.stock_number),
        })
    }
}

// =============================================================================
// PWA
// =============================================================================

/// Form data for PWA settings.
#[derive(Debug, Deserialize)]
pub struct PwaForm {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub display: DisplayMode,
    #[serde(default)]
    pub orientation: Orientation,
    pub theme_color: String,
    pub background_color: String,
    #[serde(default)]
    pub icons: IconSet,
    pub screenshot_wide: Option<String>,
    pub screenshot_narrow: Option<String>,
}

/// Validated PWA settings.
#[derive(Debug, Clone)]
pub struct PwaInput {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub display: DisplayMode,
    pub orientation: Orientation,
    pub theme_color: HexColor,
    pub background_color: HexColor,
    pub icons: IconSet,
    pub screenshot_wide: Option<String>,
    pub screenshot_narrow: Option<String>,
}

impl From<&PwaSettings> for PwaInput {
    fn from(settings: &PwaSettings) -> Self {
        Self {
            name: settings.name.clone(),
            short_name: settings.short_name.clone(),
            description: settings.description.clone(),
            display: settings.display,
            orientation: settings.orientation,
            theme_color: settings.theme_color.clone(),
            background_color: settings.background_color.clone(),
            icons: settings.icons.clone(),
            screenshot_wide: settings.screenshot_wide.clone(),
            screenshot_narrow: settings.screenshot_narrow.clone(),
        }
    }
}

impl PwaForm {
    /// Validate the form.
    ///
    /// Completeness for publishing is checked separately; any subset of
    /// fields may be saved.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` for malformed colors, URLs or an overlong
    /// short name.
    pub fn validate(self) -> Result<PwaInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let short_name = optional_text(self.short_name);
        if short_name
            .as_ref()
            .is_some_and(|s| s.chars().count() > MAX_SHORT_NAME_LENGTH)
        {
            errors.add(
                "short_name",
                format!("must be at most {MAX_SHORT_NAME_LENGTH} characters"),
            );
        }
        let theme_color = color(&mut errors, "theme_color", &self.theme_color);
        let background_color = color(&mut errors, "background_color", &self.background_color);

        let mut icons = IconSet::default();
        for size in crate::models::ICON_SIZES {
            let field = format!("icons.icon_{size}");
            let url = optional_url(&mut errors, &field, self.icons.get(size).map(str::to_owned));
            icons.set(size, url);
        }
        let screenshot_wide = optional_url(&mut errors, "screenshot_wide", self.screenshot_wide);
        let screenshot_narrow =
            optional_url(&mut errors, "screenshot_narrow", self.screenshot_narrow);

        errors.finish(PwaInput {
            name: optional_text(self.name),
            short_name,
            description: optional_text(self.description),
            display: self.display,
            orientation: self.orientation,
            theme_color,
            background_color,
            icons,
            screenshot_wide,
            screenshot_narrow,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: " Lemon Haze ".to_string(),
            description: "Citrus".to_string(),
            in_town_price: "25".into(),
            shipping_price: "$30.5".into(),
            categories: Categories::parse_joined("Flower,Sativa"),
            media_urls: vec![" ".to_string()],
            status: None,
            sort_order: 0,
            stock_number: Some(" ".to_string()),
        }
    }

    #[test]
    fn test_product_form_defaults_and_trims() {
        let product = product_form().validate().unwrap();
        assert_eq!(product.name, "Lemon Haze");
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.shipping_price.to_string(), "30.50");
        assert!(product.media_urls.is_empty());
        assert_eq!(product.stock_number, None);
    }

    #[test]
    fn test_product_form_collects_every_error() {
        let form = ProductForm {
            name: String::new(),
            in_town_price: "-1".into(),
            shipping_price: "abc".into(),
            categories: Categories::default(),
            status: Some("archived".to_string()),
            ..product_form()
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "in_town_price", "shipping_price", "category", "status"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_product_form_accepts_json_numbers() {
        let form: ProductForm = serde_json::from_value(serde_json::json!({
            "name": "Gummies",
            "description": "10 pack",
            "in_town_price": 12.5,
            "shipping_price": "15",
            "category": "Edibles, Sweets",
        }))
        .unwrap();
        let product = form.validate().unwrap();
        assert_eq!(product.in_town_price.to_string(), "12.50");
        assert_eq!(product.categories.len(), 2);
    }

    #[test]
    fn test_verification_none_clears_sub_fields() {
        let form = VerificationForm {
            verification_type: VerificationType::None,
            age_threshold: Some(18),
            age_text: Some("Adults".to_string()),
            legal_text: Some("Legal".to_string()),
            password: Some("hunter22".to_string()),
        };
        let input = form.validate(true).unwrap();
        assert_eq!(input.age_text, None);
        assert_eq!(input.legal_text, None);
        assert!(matches!(input.password, PasswordChange::Clear));
    }

    #[test]
    fn test_verification_password_required_when_none_stored() {
        let form = VerificationForm {
            verification_type: VerificationType::Both,
            age_threshold: None,
            age_text: None,
            legal_text: None,
            password: None,
        };
        let errors = form.validate(false).unwrap_err();
        assert!(errors.has("password"));
    }

    #[test]
    fn test_verification_blank_password_keeps_stored() {
        let form = VerificationForm {
            verification_type: VerificationType::Password,
            age_threshold: None,
            age_text: None,
            legal_text: None,
            password: Some("  ".to_string()),
        };
        let input = form.validate(true).unwrap();
        assert!(matches!(input.password, PasswordChange::Keep));
    }

    #[test]
    fn test_verification_new_password_is_set() {
        let form = VerificationForm {
            verification_type: VerificationType::Password,
            age_threshold: None,
            age_text: None,
            legal_text: None,
            password: Some("open-sesame".to_string()),
        };
        match form.validate(false).unwrap().password {
            PasswordChange::Set(secret) => assert_eq!(secret.expose_secret(), "open-sesame"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_verification_password_keeps_surrounding_spaces() {
        use crate::services::gate::{Argon2Check, PasswordCheck, hash_password};

        let form = VerificationForm {
            verification_type: VerificationType::Password,
            age_threshold: None,
            age_text: None,
            legal_text: None,
            password: Some(" open sesame ".to_string()),
        };
        let PasswordChange::Set(secret) = form.validate(false).unwrap().password else {
            panic!("expected a new password");
        };
        assert_eq!(secret.expose_secret(), " open sesame ");

        let hash = hash_password(secret.expose_secret()).unwrap();
        let check = Argon2Check::new(Some(&hash));
        assert!(check.matches(" open sesame "));
        assert!(!check.matches("open sesame"));
    }

    #[test]
    fn test_verification_blank_password_three_spaces_keeps_stored() {
        let form = VerificationForm {
            verification_type: VerificationType::Password,
            age_threshold: None,
            age_text: None,
            legal_text: None,
            password: Some("   ".to_string()),
        };
        assert!(matches!(form.validate(true).unwrap().password, PasswordChange::Keep));
    }

    #[test]
    fn test_instructions_require_text_when_enabled() {
        let errors = InstructionsForm {
            enabled: true,
            text: None,
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("text"));

        let disabled = InstructionsForm {
            enabled: false,
            text: None,
        }
        .validate()
        .unwrap();
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_theme_form_reports_each_bad_color() {
        let form = ThemeForm {
            background_primary: "#FFF".to_string(),
            background_secondary: "blue".to_string(),
            background_accent: "#123456".to_string(),
            font_primary: "#12345".to_string(),
            font_secondary: "#000000".to_string(),
            font_highlight: "#f59e0b".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("background_secondary"));
        assert!(errors.has("font_primary"));
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn test_storefront_slug_derived_from_name() {
        let input = StorefrontForm {
            name: "Green Room".to_string(),
            slug: None,
            description: None,
            logo_url: Some("ftp://nope".to_string()),
            favicon_url: None,
        }
        .validate()
        .unwrap_err();
        assert!(input.has("logo_url"));

        let input = StorefrontForm {
            name: "Green Room".to_string(),
            slug: None,
            description: None,
            logo_url: None,
            favicon_url: None,
        }
        .validate()
        .unwrap();
        assert_eq!(input.slug.as_str(), "green-room");
    }

    #[test]
    fn test_pwa_short_name_length() {
        let form = PwaForm {
            name: Some("The Green Room".to_string()),
            short_name: Some("The Green Room".to_string()),
            description: None,
            display: DisplayMode::Standalone,
            orientation: Orientation::Any,
            theme_color: "#123456".to_string(),
            background_color: "#fff".to_string(),
            icons: IconSet::default(),
            screenshot_wide: None,
            screenshot_narrow: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("short_name"));
        assert!(!errors.has("background_color"));
    }

    #[test]
    fn test_member_form() {
        let (user, role) = MemberForm {
            user_id: "6f1c2a58-3b7e-4d8c-9a51-0b7e1f2d3c4a".to_string(),
            role: "editor".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(role, MemberRole::Editor);
        assert_eq!(user.to_string(), "6f1c2a58-3b7e-4d8c-9a51-0b7e1f2d3c4a");

        let errors = MemberForm {
            user_id: "x".to_string(),
            role: "admin".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("user_id"));
        assert!(errors.has("role"));
    }
}
