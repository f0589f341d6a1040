//! Storefront page derivation.
//!
//! A storefront page is a pure function of the storefront, the visitor's gate
//! state, the product list and the filter/view selection. The same
//! [`PreviewPage`] backs the public HTML renderer and the builder's JSON live
//! preview.

use serde::{Deserialize, Serialize};

use storecraft_core::{HexColor, VerificationType};

use super::catalog::{self, CatalogPage, CatalogQuery, SortOrder};
use super::gate::{Gate, GateState};
use crate::models::{Product, Storefront, ThemeConfig};

/// Grid density of the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridDensity {
    Small,
    #[default]
    Medium,
    Large,
    List,
}

impl GridDensity {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::List];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::List => "list",
        }
    }
}

/// Where product text sits relative to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPlacement {
    Overlay,
    #[default]
    Below,
}

impl TextPlacement {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Below => "below",
        }
    }
}

/// Presentational options. They never affect which products are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub density: GridDensity,
    pub text: TextPlacement,
}

/// Colors and branding shared by every page state.
#[derive(Debug, Clone, Serialize)]
pub struct Branding {
    pub name: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub theme: ThemeConfig,
}

impl Branding {
    fn from_storefront(storefront: &Storefront) -> Self {
        Self {
            name: storefront.name.clone(),
            logo_url: storefront.logo_url.clone(),
            favicon_url: storefront.favicon_url.clone(),
            theme: storefront.theme.clone(),
        }
    }

    /// CSS custom properties for the theme.
    #[must_use]
    pub fn css_variables(&self) -> String {
        let theme = &self.theme;
        let vars: [(&str, &HexColor); 6] = [
            ("--bg-primary", &theme.background_primary),
            ("--bg-secondary", &theme.background_secondary),
            ("--bg-accent", &theme.background_accent),
            ("--font-primary", &theme.font_primary),
            ("--font-secondary", &theme.font_secondary),
            ("--font-highlight", &theme.font_highlight),
        ];
        vars.iter()
            .map(|(name, color)| format!("{name}: {color};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The verification prompt.
#[derive(Debug, Clone, Serialize)]
pub struct LockedView {
    pub verification_type: VerificationType,
    /// Checkbox label, present when age must be confirmed.
    pub age_prompt: Option<String>,
    pub requires_password: bool,
    pub legal_text: Option<String>,
    pub submit_label: &'static str,
    /// Message from the last failed submission.
    pub error: Option<String>,
}

/// Header controls of the content view.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub search: String,
    pub category: Option<String>,
    pub categories: Vec<String>,
    pub sort: SortOrder,
}

/// What the visitor sees.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageBody<'a> {
    Locked(LockedView),
    /// Instructions over the locked styling.
    Instructions { text: String },
    Content {
        header: Header,
        grid: CatalogPage<'a>,
        options: ViewOptions,
        legal_text: Option<String>,
    },
}

/// A fully derived storefront page.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewPage<'a> {
    pub branding: Branding,
    pub state: GateState,
    pub body: PageBody<'a>,
}

impl<'a> PreviewPage<'a> {
    /// Derive the page for a gate state.
    ///
    /// Products are only consulted once the gate is unlocked.
    #[must_use]
    pub fn derive(
        storefront: &Storefront,
        state: GateState,
        products: &'a [Product],
        query: &CatalogQuery,
        view: ViewOptions,
    ) -> Self {
        let verification = &storefront.verification;
        let body = match state {
            GateState::Locked(kind) => PageBody::Locked(LockedView {
                verification_type: kind,
                age_prompt: kind.requires_age().then(|| verification.age_prompt()),
                requires_password: kind.requires_password(),
                legal_text: verification.legal_text.clone(),
                submit_label: Gate::new(kind, storefront.instructions.enabled).submit_label(),
                error: None,
            }),
            GateState::ShowingInstructions => PageBody::Instructions {
                text: storefront.instructions.text.clone().unwrap_or_default(),
            },
            GateState::Unlocked => PageBody::Content {
                header: Header {
                    search: query.search.clone().unwrap_or_default(),
                    category: query.category.clone(),
                    categories: catalog::distinct_categories(products),
                    sort: query.sort,
                },
                grid: catalog::paginate(products, query),
                options: view,
                legal_text: verification.legal_text.clone(),
            },
        };

        Self {
            branding: Branding::from_storefront(storefront),
            state,
            body,
        }
    }

    /// Attach a gate error to the locked view.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        if let PageBody::Locked(locked) = &mut self.body {
            locked.error = Some(message.into());
        }
        self
    }
}
