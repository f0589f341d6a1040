//! PWA settings model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storecraft_core::{DisplayMode, HexColor, Orientation, StorefrontId};

/// Square icon sizes a complete manifest provides, smallest first.
pub const ICON_SIZES: [u16; 8] = [72, 96, 128, 144, 152, 192, 384, 512];

/// Icon URLs keyed by edge length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSet {
    pub icon_72: Option<String>,
    pub icon_96: Option<String>,
    pub icon_128: Option<String>,
    pub icon_144: Option<String>,
    pub icon_152: Option<String>,
    pub icon_192: Option<String>,
    pub icon_384: Option<String>,
    pub icon_512: Option<String>,
}

impl IconSet {
    /// URL for `size`, if set. Unknown sizes return `None`.
    #[must_use]
    pub fn get(&self, size: u16) -> Option<&str> {
        let slot = match size {
            72 => &self.icon_72,
            96 => &self.icon_96,
            128 => &self.icon_128,
            144 => &self.icon_144,
            152 => &self.icon_152,
            192 => &self.icon_192,
            384 => &self.icon_384,
            512 => &self.icon_512,
            _ => return None,
        };
        slot.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Set the URL for `size`. Returns `false` for sizes outside [`ICON_SIZES`].
    pub fn set(&mut self, size: u16, url: Option<String>) -> bool {
        let slot = match size {
            72 => &mut self.icon_72,
            96 => &mut self.icon_96,
            128 => &mut self.icon_128,
            144 => &mut self.icon_144,
            152 => &mut self.icon_152,
            192 => &mut self.icon_192,
            384 => &mut self.icon_384,
            512 => &mut self.icon_512,
            _ => return false,
        };
        *slot = url;
        true
    }

    /// `(size, url)` pairs for every set icon, smallest first.
    pub fn present(&self) -> impl Iterator<Item = (u16, &str)> {
        ICON_SIZES
            .iter()
            .filter_map(|&size| self.get(size).map(|url| (size, url)))
    }
}

/// Web app manifest settings for one storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PwaSettings {
    pub storefront_id: StorefrontId,
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
    pub manifest_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PwaSettings {
    /// Blank settings for a storefront that has never saved any.
    #[must_use]
    pub fn empty(storefront_id: StorefrontId, theme_color: HexColor) -> Self {
        Self {
            storefront_id,
            name: None,
            short_name: None,
            description: None,
            display: DisplayMode::default(),
            orientation: Orientation::default(),
            background_color: theme_color.clone(),
            theme_color,
            icons: IconSet::default(),
            screenshot_wide: None,
            screenshot_narrow: None,
            manifest_url: None,
            updated_at: None,
        }
    }
}
