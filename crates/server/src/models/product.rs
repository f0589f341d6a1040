//! Product model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storecraft_core::{Categories, Price, ProductId, ProductStatus, StorefrontId};

/// Suffix appended to the name of duplicated products.
pub const COPY_SUFFIX: &str = " (Copy)";

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv"];

/// A catalog entry belonging to one storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub storefront_id: StorefrontId,
    pub name: String,
    pub description: String,
    pub in_town_price: Price,
    pub shipping_price: Price,
    pub categories: Categories,
    pub media_urls: Vec<String>,
    pub status: ProductStatus,
    pub sort_order: i32,
    pub stock_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields without identity or timestamps, as inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub in_town_price: Price,
    pub shipping_price: Price,
    pub categories: Categories,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub sort_order: i32,
    pub stock_number: Option<String>,
}

impl Product {
    /// Copy of this product with identity stripped and the name suffixed.
    #[must_use]
    pub fn to_duplicate(&self) -> NewProduct {
        NewProduct {
            name: format!("{}{COPY_SUFFIX}", self.name),
            ..NewProduct::from(self.clone())
        }
    }

    /// Media entries in display order.
    #[must_use]
    pub fn media(&self) -> Vec<MediaItem> {
        self.media_urls.iter().map(|url| MediaItem::new(url)).collect()
    }

    /// Grid thumbnail: the first image, or the first video when there is
    /// no image.
    #[must_use]
    pub fn cover(&self) -> Option<MediaItem> {
        let media = self.media();
        let first_image = media.iter().position(|m| m.kind == MediaKind::Image);
        media.into_iter().nth(first_image.unwrap_or(0))
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            description: product.description,
            in_town_price: product.in_town_price,
            shipping_price: product.shipping_price,
            categories: product.categories,
            media_urls: product.media_urls,
            status: product.status,
            sort_order: product.sort_order,
            stock_number: product.stock_number,
        }
    }
}

/// Whether a media URL points at an image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by file extension, ignoring query string and fragment.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Self::Video
        } else {
            Self::Image
        }
    }
}

/// A classified media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaItem {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            kind: MediaKind::from_url(url),
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: ProductId::new(9),
            storefront_id: StorefrontId::new(1),
            name: "Blue Dream".to_string(),
            description: "Hybrid".to_string(),
            in_town_price: Price::parse("30").unwrap(),
            shipping_price: Price::parse("35").unwrap(),
            categories: Categories::parse_joined("Flower"),
            media_urls: vec![
                "https://cdn.test/1/products/clip.MP4?v=2".to_string(),
                "https://cdn.test/1/products/photo.webp".to_string(),
            ],
            status: ProductStatus::Active,
            sort_order: 3,
            stock_number: Some("BD-01".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_media_classification() {
        let product = sample();
        let media = product.media();
        assert_eq!(media[0].kind, MediaKind::Video);
        assert_eq!(media[1].kind, MediaKind::Image);
        assert_eq!(
            product.cover().unwrap().url,
            "https://cdn.test/1/products/photo.webp"
        );
    }

    #[test]
    fn test_cover_falls_back_to_video() {
        let mut product = sample();
        product.media_urls.truncate(1);
        let cover = product.cover().unwrap();
        assert!(cover.is_video());

        product.media_urls.clear();
        assert!(product.cover().is_none());
    }

    #[test]
    fn test_duplicate_appends_suffix_and_keeps_fields() {
        let product = sample();
        let copy = product.to_duplicate();
        assert_eq!(copy.name, "Blue Dream (Copy)");
        assert_eq!(copy.in_town_price, product.in_town_price);
        assert_eq!(copy.categories, product.categories);
        assert_eq!(copy.stock_number.as_deref(), Some("BD-01"));
    }
}
