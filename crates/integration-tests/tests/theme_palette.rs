//! Theme extraction from logo images.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use storecraft_core::Rgb;
use storecraft_server::models::ThemeConfig;
use storecraft_server::services::palette::{DARK_FONT, LIGHT_FONT, Palette, PaletteError};

fn png(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| Rgba(pixel(x, y)));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[test]
fn test_white_logo_gets_dark_fonts() {
    let palette = Palette::from_image_bytes(&png(16, 16, |_, _| [255, 255, 255, 255])).unwrap();

    let primary = palette.background.primary.rgb();
    assert!(primary.luminance() > 0.5);
    assert_eq!(palette.font.primary, DARK_FONT.to_hex());
    assert_ne!(palette.font.primary, LIGHT_FONT.to_hex());
}

#[test]
fn test_navy_logo_gets_light_fonts() {
    let palette = Palette::from_image_bytes(&png(16, 16, |_, _| [0x18, 0x24, 0x48, 255])).unwrap();
    assert_eq!(palette.background.primary.as_str(), "#182448");
    assert_eq!(palette.font.primary, LIGHT_FONT.to_hex());
}

#[test]
fn test_transparent_pixels_are_ignored() {
    // Left half transparent red, right half opaque navy
    let bytes = png(16, 16, |x, _| {
        if x < 8 {
            [255, 0, 0, 0]
        } else {
            [0x18, 0x24, 0x48, 255]
        }
    });
    let palette = Palette::from_image_bytes(&bytes).unwrap();
    assert_eq!(palette.background.primary.as_str(), "#182448");
}

#[test]
fn test_fully_transparent_logo_is_rejected() {
    let err = Palette::from_image_bytes(&png(4, 4, |_, _| [0, 0, 0, 0])).unwrap_err();
    assert!(matches!(err, PaletteError::NoOpaquePixels));
}

#[test]
fn test_palette_maps_onto_theme() {
    let palette = Palette::from_primary(Rgb::new(255, 255, 255));
    let theme = ThemeConfig::from_palette(&palette);
    assert_eq!(theme.background_primary, palette.background.primary);
    assert_eq!(theme.font_primary, DARK_FONT.to_hex());
}
