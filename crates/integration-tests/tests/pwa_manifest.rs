//! Manifest completeness and shape.

#![allow(clippy::unwrap_used)]

use storecraft_core::{Rgb, StorefrontId, VerificationType};
use storecraft_integration_tests::storefront;
use storecraft_server::models::{ICON_SIZES, PwaSettings};
use storecraft_server::services::manifest::{Manifest, has_required_fields, missing_fields};

fn settings_with_every_icon() -> PwaSettings {
    let mut settings = PwaSettings::empty(StorefrontId::new(1), Rgb::WHITE.to_hex());
    settings.name = Some("Green Leaf Dispensary".to_owned());
    settings.short_name = Some("Green Leaf".to_owned());
    settings.description = Some("Order ahead".to_owned());
    settings.screenshot_wide = Some("https://cdn.test/wide.png".to_owned());
    settings.screenshot_narrow = Some("https://cdn.test/narrow.png".to_owned());
    for size in ICON_SIZES {
        settings
            .icons
            .set(size, Some(format!("https://cdn.test/icon-{size}.png")));
    }
    settings
}

#[test]
fn test_missing_512_icon_is_never_publishable() {
    let mut settings = settings_with_every_icon();
    assert!(has_required_fields(&settings));

    settings.icons.set(512, None);
    assert!(!has_required_fields(&settings));
    assert_eq!(missing_fields(&settings), vec!["512x512 icon"]);
}

#[test]
fn test_required_fields_are_reported_in_order() {
    let settings = PwaSettings::empty(StorefrontId::new(1), Rgb::WHITE.to_hex());
    assert_eq!(
        missing_fields(&settings),
        vec!["name", "short_name", "192x192 icon", "512x512 icon"]
    );
}

#[test]
fn test_manifest_lists_every_set_icon() {
    let sf = storefront(VerificationType::None, false);
    let manifest = Manifest::build(&sf, &settings_with_every_icon());

    assert_eq!(manifest.icons.len(), ICON_SIZES.len());
    assert_eq!(manifest.start_url, "/s/green-leaf");
    assert_eq!(manifest.screenshots.len(), 2);

    let json = serde_json::to_value(&manifest).unwrap();
    assert_eq!(json["name"], "Green Leaf Dispensary");
    assert_eq!(json["short_name"], "Green Leaf");
    assert_eq!(json["icons"][ICON_SIZES.len() - 1]["sizes"], "512x512");
}
