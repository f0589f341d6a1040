//! Object storage paths.
//!
//! Every object lives under its storefront's id:
//!
//! ```text
//! {storefront_id}/products/{file}
//! {storefront_id}/logo/{file}
//! {storefront_id}/pwa/icons/{file}
//! {storefront_id}/pwa/screenshots/{file}
//! {storefront_id}/pwa/manifest.json
//! {storefront_id}/site/index.html
//! ```

use chrono::Utc;

use storecraft_core::StorefrontId;

/// Product media.
#[must_use]
pub fn product_media(storefront_id: StorefrontId, file_name: &str) -> String {
    format!("{storefront_id}/products/{}", unique_name(file_name))
}

/// Storefront logo.
#[must_use]
pub fn logo(storefront_id: StorefrontId, file_name: &str) -> String {
    format!("{storefront_id}/logo/{}", unique_name(file_name))
}

/// Source image for icon resizing.
#[must_use]
pub fn pwa_icon(storefront_id: StorefrontId, file_name: &str) -> String {
    format!("{storefront_id}/pwa/icons/{}", unique_name(file_name))
}

#[must_use]
pub fn pwa_screenshot(storefront_id: StorefrontId, file_name: &str) -> String {
    format!("{storefront_id}/pwa/screenshots/{}", unique_name(file_name))
}

/// Published manifest. Overwritten on every publish.
#[must_use]
pub fn manifest(storefront_id: StorefrontId) -> String {
    format!("{storefront_id}/pwa/manifest.json")
}

/// Generated static HTML shell.
#[must_use]
pub fn site_index(storefront_id: StorefrontId) -> String {
    format!("{storefront_id}/site/index.html")
}

/// Timestamp-prefixed, sanitized file name.
fn unique_name(file_name: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `-`.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(['-', '.']);
    if trimmed.is_empty() {
        "file".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_paths() {
        let id = StorefrontId::new(42);
        assert_eq!(manifest(id), "42/pwa/manifest.json");
        assert_eq!(site_index(id), "42/site/index.html");
    }

    #[test]
    fn test_media_paths_are_scoped() {
        let id = StorefrontId::new(7);
        assert!(product_media(id, "a.png").starts_with("7/products/"));
        assert!(product_media(id, "a.png").ends_with("-a.png"));
        assert!(logo(id, "Logo.PNG").ends_with("-logo.png"));
        assert!(pwa_icon(id, "i.png").starts_with("7/pwa/icons/"));
        assert!(pwa_screenshot(id, "s.png").starts_with("7/pwa/screenshots/"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("My Photo (1).JPG"), "my-photo--1-.jpg");
        assert_eq!(sanitize_file_name("???"), "file");
    }
}
