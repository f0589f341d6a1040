//! Storefront URL slug.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// A character outside `a-z`, `0-9` and `-` was found.
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
    /// Leading or trailing hyphen.
    #[error("slug cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// The public path segment of a storefront (`/s/{slug}`).
///
/// ## Constraints
///
/// - Length: 1-63 characters (fits a DNS label, so slugs can become subdomains)
/// - Only lowercase ASCII letters, digits and `-`
/// - No leading or trailing `-`
///
/// ## Examples
///
/// ```
/// use storecraft_core::Slug;
///
/// assert!(Slug::parse("green-leaf-2").is_ok());
/// assert!(Slug::parse("Green Leaf").is_err());
/// assert!(Slug::parse("-leaf").is_err());
/// assert_eq!(Slug::slugify("Green Leaf Co.").as_str(), "green-leaf-co");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 63;

    /// Parse a `Slug` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains characters
    /// other than lowercase letters, digits and hyphens, or starts/ends with a
    /// hyphen.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidCharacter);
        }

        if s.starts_with('-') || s.ends_with('-') {
            return Err(SlugError::EdgeHyphen);
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Non-alphanumeric runs collapse to one hyphen. Returns `store` when the
    /// name has no usable characters.
    #[must_use]
    pub fn slugify(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
        }
        let mut trimmed: String = out.trim_end_matches('-').to_owned();
        trimmed.truncate(Self::MAX_LENGTH);
        let trimmed = trimmed.trim_end_matches('-');
        if trimmed.is_empty() {
            Self("store".to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_uppercase() {
        assert_eq!(Slug::parse("Shop"), Err(SlugError::InvalidCharacter));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = "a".repeat(64);
        assert_eq!(
            Slug::parse(&long),
            Err(SlugError::TooLong {
                max: Slug::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_parse_rejects_edge_hyphens() {
        assert_eq!(Slug::parse("shop-"), Err(SlugError::EdgeHyphen));
        assert_eq!(Slug::parse("-shop"), Err(SlugError::EdgeHyphen));
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(Slug::slugify("  The  Green -- Room!").as_str(), "the-green-room");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(Slug::slugify("!!!").as_str(), "store");
    }

    #[test]
    fn test_slugify_result_is_valid() {
        let slug = Slug::slugify(&"Long Name ".repeat(20));
        assert!(Slug::parse(slug.as_str()).is_ok());
    }
}
