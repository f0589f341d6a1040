//! Color palette extraction from logo images.
//!
//! The dominant color is found by bucketing opaque pixels at 5 bits per
//! channel and averaging the most populated bucket. Everything else is
//! derived from it:
//!
//! - `secondary` background: primary brightened by [`SECONDARY_BRIGHTEN_PERCENT`]
//! - `accent` background: channel-wise complement of the primary
//! - font colors: [`DARK_FONT`] on light backgrounds (`L > 0.5`), else
//!   [`LIGHT_FONT`]
//! - highlight font: the constant [`HIGHLIGHT_FONT`]
//!
//! Palettes fetched by URL are cached for 10 minutes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, GenericImageView};
use moka::future::Cache;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use storecraft_core::{HexColor, Rgb, StorefrontId};

use crate::db::{RepositoryError, StorefrontRepository};
use crate::models::{Storefront, ThemeConfig};
use crate::retry::{RetryPolicy, Transient};

/// Font color on light backgrounds.
pub const DARK_FONT: Rgb = Rgb::new(0x1a, 0x1a, 0x1a);
/// Font color on dark backgrounds.
pub const LIGHT_FONT: Rgb = Rgb::new(0xff, 0xff, 0xff);
/// Fixed highlight font color.
pub const HIGHLIGHT_FONT: Rgb = Rgb::new(0xf5, 0x9e, 0x0b);
/// Brightness increase applied to the secondary background.
pub const SECONDARY_BRIGHTEN_PERCENT: u8 = 20;

/// Longest edge sampled; larger images are downscaled first.
const SAMPLE_EDGE: u32 = 128;
/// Pixels below this alpha are ignored.
const MIN_ALPHA: u8 = 128;
/// Largest logo accepted for extraction.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur while extracting a palette.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// The image could not be fetched.
    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The image host answered with a non-success status.
    #[error("image request failed with status {0}")]
    Status(u16),

    /// The image exceeds the size limit.
    #[error("image is larger than {} MB", MAX_IMAGE_BYTES / 1024 / 1024)]
    TooLarge,

    /// The bytes are not a supported image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Every pixel is (mostly) transparent.
    #[error("image has no opaque pixels")]
    NoOpaquePixels,

    /// The decoding task panicked or was cancelled.
    #[error("palette extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Transient for PaletteError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_timeout() || err.is_connect(),
            Self::Status(status) => *status >= 500,
            Self::TooLarge | Self::Decode(_) | Self::NoOpaquePixels | Self::Task(_) => false,
        }
    }
}

/// Background colors of a palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackgroundColors {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub accent: HexColor,
}

/// Font colors of a palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontColors {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub highlight: HexColor,
}

/// Six colors derived from one dominant color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: BackgroundColors,
    pub font: FontColors,
}

impl Palette {
    /// Derive the full palette from a primary background color.
    #[must_use]
    pub fn from_primary(primary: Rgb) -> Self {
        let secondary = primary.brighten(SECONDARY_BRIGHTEN_PERCENT);
        let accent = primary.complement();

        Self {
            background: BackgroundColors {
                primary: primary.to_hex(),
                secondary: secondary.to_hex(),
                accent: accent.to_hex(),
            },
            font: FontColors {
                primary: font_for(primary).to_hex(),
                secondary: font_for(secondary).to_hex(),
                highlight: HIGHLIGHT_FONT.to_hex(),
            },
        }
    }

    /// Decode image bytes and derive a palette.
    ///
    /// # Errors
    ///
    /// Returns `PaletteError::Decode` for unsupported data and
    /// `PaletteError::NoOpaquePixels` for fully transparent images.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(PaletteError::TooLarge);
        }
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_primary(dominant_color(&image)?))
    }

    /// [`Palette::from_image_bytes`] on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Palette::from_image_bytes`], plus `PaletteError::Task` if the
    /// blocking task fails.
    pub async fn decode(bytes: Vec<u8>) -> Result<Self, PaletteError> {
        tokio::task::spawn_blocking(move || Self::from_image_bytes(&bytes)).await?
    }
}

/// Append a downloaded chunk, refusing to grow past [`MAX_IMAGE_BYTES`].
fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8]) -> Result<(), PaletteError> {
    if buffer.len() + chunk.len() > MAX_IMAGE_BYTES {
        return Err(PaletteError::TooLarge);
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

/// Readable font color for a background.
#[must_use]
pub fn font_for(background: Rgb) -> Rgb {
    if background.is_light() {
        DARK_FONT
    } else {
        LIGHT_FONT
    }
}

/// Most common color of an image, ignoring transparent pixels.
///
/// # Errors
///
/// Returns `PaletteError::NoOpaquePixels` if no pixel is opaque enough.
pub fn dominant_color(image: &DynamicImage) -> Result<Rgb, PaletteError> {
    let (width, height) = image.dimensions();
    let sampled = if width > SAMPLE_EDGE || height > SAMPLE_EDGE {
        image.thumbnail(SAMPLE_EDGE, SAMPLE_EDGE)
    } else {
        image.clone()
    };

    // bucket key -> (count, sum r, sum g, sum b); ordered so ties pick the
    // smallest key.
    let mut buckets: BTreeMap<u16, (u64, u64, u64, u64)> = BTreeMap::new();
    for pixel in sampled.to_rgba8().pixels() {
        let [r, g, b, a] = pixel.0;
        if a < MIN_ALPHA {
            continue;
        }
        let key = (u16::from(r >> 3) << 10) | (u16::from(g >> 3) << 5) | u16::from(b >> 3);
        let entry = buckets.entry(key).or_insert((0, 0, 0, 0));
        entry.0 += 1;
        entry.1 += u64::from(r);
        entry.2 += u64::from(g);
        entry.3 += u64::from(b);
    }

    let mut best: Option<(u64, u64, u64, u64)> = None;
    for bucket in buckets.into_values() {
        if best.is_none_or(|current| bucket.0 > current.0) {
            best = Some(bucket);
        }
    }
    let (count, r, g, b) = best.ok_or(PaletteError::NoOpaquePixels)?;

    let average = |sum: u64| u8::try_from(sum / count).unwrap_or(u8::MAX);
    Ok(Rgb::new(average(r), average(g), average(b)))
}

impl ThemeConfig {
    /// Map a palette onto the storefront theme fields.
    #[must_use]
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            background_primary: palette.background.primary.clone(),
            background_secondary: palette.background.secondary.clone(),
            background_accent: palette.background.accent.clone(),
            font_primary: palette.font.primary.clone(),
            font_secondary: palette.font.secondary.clone(),
            font_highlight: palette.font.highlight.clone(),
        }
    }
}

/// Write a palette into a storefront's theme.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the storefront doesn't exist.
pub async fn apply(
    storefronts: &StorefrontRepository<'_>,
    storefront_id: StorefrontId,
    palette: &Palette,
) -> Result<Storefront, RepositoryError> {
    storefronts
        .update_theme(storefront_id, &ThemeConfig::from_palette(palette))
        .await
}

/// Fetches logos over HTTP and caches their palettes by URL.
#[derive(Clone)]
pub struct PaletteService {
    inner: Arc<PaletteServiceInner>,
}

struct PaletteServiceInner {
    client: reqwest::Client,
    cache: Cache<String, Palette>,
    retry: RetryPolicy,
}

impl PaletteService {
    /// Create a palette service.
    #[must_use]
    pub fn new(client: reqwest::Client, retry: RetryPolicy) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(600)) // 10 minutes
            .build();

        Self {
            inner: Arc::new(PaletteServiceInner {
                client,
                cache,
                retry,
            }),
        }
    }

    /// Palette of the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns a `PaletteError` if the image cannot be fetched or decoded.
    #[instrument(skip(self))]
    pub async fn from_url(&self, url: &str) -> Result<Palette, PaletteError> {
        if let Some(palette) = self.inner.cache.get(url).await {
            debug!("Cache hit for palette");
            return Ok(palette);
        }

        let bytes = self
            .inner
            .retry
            .run("fetch_logo", || self.fetch(url))
            .await?;
        let palette = Palette::decode(bytes).await?;

        self.inner
            .cache
            .insert(url.to_owned(), palette.clone())
            .await;

        Ok(palette)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PaletteError> {
        let mut response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PaletteError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > MAX_IMAGE_BYTES as u64)
        {
            return Err(PaletteError::TooLarge);
        }
        // Content-Length may be missing or wrong; the cap holds either way.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut bytes, &chunk)?;
        }
        Ok(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png(image: RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_white_logo_gets_dark_font() {
        let bytes = png(RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255])));
        let palette = Palette::from_image_bytes(&bytes).unwrap();

        assert_eq!(palette.background.primary.as_str(), "#ffffff");
        assert!(palette.background.primary.rgb().luminance() > 0.5);
        assert_eq!(palette.font.primary, DARK_FONT.to_hex());
        assert_ne!(palette.font.primary, LIGHT_FONT.to_hex());
        assert_eq!(palette.background.accent.as_str(), "#000000");
    }

    #[test]
    fn test_download_stops_at_size_cap() {
        let mut buffer = vec![0_u8; MAX_IMAGE_BYTES - 4];
        append_capped(&mut buffer, &[1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.len(), MAX_IMAGE_BYTES);

        let err = append_capped(&mut buffer, &[5]).unwrap_err();
        assert!(matches!(err, PaletteError::TooLarge));
        assert_eq!(buffer.len(), MAX_IMAGE_BYTES);
    }

    #[tokio::test]
    async fn test_decode_runs_off_the_runtime() {
        let bytes = png(RgbaImage::from_pixel(8, 8, Rgba([0x18, 0x24, 0x48, 255])));
        let palette = Palette::decode(bytes).await.unwrap();
        assert_eq!(palette.background.primary.as_str(), "#182448");

        let err = Palette::decode(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, PaletteError::Decode(_)));
    }

    #[test]
    fn test_dark_logo_gets_light_font() {
        let palette = Palette::from_primary(Rgb::new(20, 30, 60));
        assert_eq!(palette.font.primary, LIGHT_FONT.to_hex());
        assert_eq!(palette.background.secondary.as_str(), "#182448");
        assert_eq!(palette.font.highlight, HIGHLIGHT_FONT.to_hex());
    }

    #[test]
    fn test_secondary_font_follows_secondary_background() {
        // L(120,120,120) ~ 0.47 but brightened to 144 -> ~0.56
        let palette = Palette::from_primary(Rgb::new(120, 120, 120));
        assert_eq!(palette.font.primary, LIGHT_FONT.to_hex());
        assert_eq!(palette.font.secondary, DARK_FONT.to_hex());
    }

    #[test]
    fn test_transparent_pixels_are_ignored() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        image.put_pixel(0, 0, Rgba([200, 10, 10, 255]));
        let color = dominant_color(&DynamicImage::ImageRgba8(image)).unwrap();
        assert_eq!(color, Rgb::new(200, 10, 10));
    }

    #[test]
    fn test_fully_transparent_image_fails() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 10]));
        assert!(matches!(
            dominant_color(&DynamicImage::ImageRgba8(image)),
            Err(PaletteError::NoOpaquePixels)
        ));
    }

    #[test]
    fn test_majority_color_wins() {
        let mut image = RgbaImage::from_pixel(300, 200, Rgba([10, 120, 200, 255]));
        for x in 0..100 {
            for y in 0..200 {
                image.put_pixel(x, y, Rgba([250, 250, 0, 255]));
            }
        }
        let color = dominant_color(&DynamicImage::ImageRgba8(image)).unwrap();
        let [r, g, b] = [color.r, color.g, color.b];
        assert!(r < 40 && (100..=140).contains(&g) && b > 180, "got {color:?}");
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(
            Palette::from_image_bytes(b"not an image"),
            Err(PaletteError::Decode(_))
        ));
    }

    #[test]
    fn test_theme_from_palette() {
        let palette = Palette::from_primary(Rgb::WHITE);
        let theme = ThemeConfig::from_palette(&palette);
        assert_eq!(theme.background_primary, palette.background.primary);
        assert_eq!(theme.font_highlight, palette.font.highlight);
    }
}
