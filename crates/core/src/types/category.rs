//! Product categories.
//!
//! Historically the category column was read both as a single string and as a
//! list of strings. [`Categories`] is the one normalized representation; it
//! accepts either shape at the boundary and always serializes as a list.

use serde::{Deserialize, Serialize};

/// Separator used when categories are flattened into a single string.
pub const CATEGORY_SEPARATOR: char = ',';

/// An ordered, de-duplicated list of trimmed, non-empty category names.
///
/// ```
/// use storecraft_core::Categories;
///
/// let from_scalar: Categories = serde_json::from_str("\"Flower, Edibles\"").unwrap();
/// let from_list: Categories = serde_json::from_str("[\"Flower\", \"Edibles\"]").unwrap();
/// assert_eq!(from_scalar, from_list);
/// assert_eq!(from_scalar.joined(), "Flower,Edibles");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "CategoryInput", into = "Vec<String>")]
pub struct Categories(Vec<String>);

/// Wire shapes accepted for categories.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryInput {
    Joined(String),
    List(Vec<String>),
    Missing(Option<()>),
}

impl From<CategoryInput> for Categories {
    fn from(input: CategoryInput) -> Self {
        match input {
            CategoryInput::Joined(s) => Self::parse_joined(&s),
            CategoryInput::List(list) => Self::from_list(list),
            CategoryInput::Missing(_) => Self::default(),
        }
    }
}

impl From<Categories> for Vec<String> {
    fn from(categories: Categories) -> Self {
        categories.0
    }
}

impl Categories {
    /// Build from a list, trimming entries and dropping blanks and duplicates.
    #[must_use]
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
                continue;
            }
            out.push(trimmed.to_owned());
        }
        Self(out)
    }

    /// Split a comma-joined string such as a CSV cell.
    #[must_use]
    pub fn parse_joined(s: &str) -> Self {
        Self::from_list(s.split(CATEGORY_SEPARATOR))
    }

    /// Join into the comma-separated form used by CSV export.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    /// Whether the exact category name is present.
    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    /// Iterate over category names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrow as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether no category is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Consume into the underlying list.
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_joined_trims_and_dedups() {
        let categories = Categories::parse_joined(" Flower ,, Edibles,Flower ");
        assert_eq!(categories.as_slice(), ["Flower", "Edibles"]);
    }

    #[test]
    fn test_joined_roundtrip_preserves_membership() {
        let original = Categories::from_list(["Vapes", "Pre-rolls"]);
        let back = Categories::parse_joined(&original.joined());
        assert_eq!(original, back);
    }

    #[test]
    fn test_deserialize_null_is_empty() {
        let categories: Categories = serde_json::from_str("null").unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let json = serde_json::to_string(&Categories::parse_joined("A,B")).unwrap();
        assert_eq!(json, "[\"A\",\"B\"]");
    }

    #[test]
    fn test_contains_is_exact() {
        let categories = Categories::parse_joined("Flower");
        assert!(categories.contains("Flower"));
        assert!(!categories.contains("flower"));
    }
}
