//! Product grid pipeline.
//!
//! The grid is re-derived from the full product list on every request:
//! status filter, name search, category filter, sort, then paginate. Product
//! counts per storefront are small enough that nothing is incremental.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storecraft_core::StatusFilter;

use crate::models::Product;

/// Products per grid page.
pub const PAGE_SIZE: usize = 25;

/// Category filter value that matches every product.
pub const ALL_CATEGORIES: &str = "all";

/// Grid sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// All orders, in selector order.
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::PriceAsc, Self::PriceDesc];

    /// Query string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    /// Selector label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::PriceAsc => a.in_town_price.cmp(&b.in_town_price),
            Self::PriceDesc => b.in_town_price.cmp(&a.in_town_price),
        }
    }
}

/// Filter, sort and page selection, as bound to the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub status: StatusFilter,
    #[serde(rename = "q")]
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: SortOrder,
    pub page: Option<usize>,
}

impl CatalogQuery {
    /// Search term, trimmed; `None` when blank.
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Category to match exactly; `None` for the wildcard.
    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    fn matches(&self, product: &Product, search: Option<&str>) -> bool {
        if !self.status.matches(product.status) {
            return false;
        }
        if let Some(term) = search
            && !product.name.to_lowercase().contains(term)
        {
            return false;
        }
        self.category_filter()
            .is_none_or(|category| product.categories.contains(category))
    }
}

/// One page of the filtered, sorted grid.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage<'a> {
    pub products: Vec<&'a Product>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    /// Products matching the filters, across all pages.
    pub total_items: usize,
}

impl CatalogPage<'_> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Run the grid pipeline over `products`.
#[must_use]
pub fn paginate<'a>(products: &'a [Product], query: &CatalogQuery) -> CatalogPage<'a> {
    let search = query.search_term();
    let mut matching: Vec<&Product> = products
        .iter()
        .filter(|p| query.matches(p, search.as_deref()))
        .collect();

    // Stable: equal keys keep the incoming order.
    matching.sort_by(|a, b| query.sort.compare(a, b));

    let total_items = matching.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    let products = matching
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    CatalogPage {
        products,
        page,
        total_pages,
        total_items,
    }
}

/// Categories present in `products`, sorted, for the filter control.
#[must_use]
pub fn distinct_categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .flat_map(|p| p.categories.iter())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use storecraft_core::{Categories, Price, ProductId, ProductStatus, StorefrontId};

    use super::*;

    fn product(id: i32, name: &str, price: &str, category: &str) -> Product {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(id.into());
        Product {
            id: ProductId::new(id),
            storefront_id: StorefrontId::new(1),
            name: name.to_owned(),
            description: String::new(),
            in_town_price: Price::parse(price).unwrap(),
            shipping_price: Price::ZERO,
            categories: Categories::parse_joined(category),
            media_urls: Vec::new(),
            status: ProductStatus::Active,
            sort_order: 0,
            stock_number: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn ids(page: &CatalogPage<'_>) -> Vec<i32> {
        page.products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_default_is_newest_first() {
        let products = vec![product(1, "A", "1", ""), product(2, "B", "1", "")];
        let page = paginate(&products, &CatalogQuery::default());
        assert_eq!(ids(&page), vec![2, 1]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let products = vec![
            product(1, "Blue Dream", "1", ""),
            product(2, "Sour Diesel", "1", ""),
        ];
        let query = CatalogQuery {
            search: Some("  dREAM ".to_owned()),
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&paginate(&products, &query)), vec![1]);
    }

    #[test]
    fn test_category_is_exact_and_all_is_wildcard() {
        let products = vec![
            product(1, "A", "1", "Flower"),
            product(2, "B", "1", "Flowers,Edibles"),
        ];
        let mut query = CatalogQuery {
            category: Some("Flower".to_owned()),
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&paginate(&products, &query)), vec![1]);

        query.category = Some("all".to_owned());
        assert_eq!(paginate(&products, &query).total_items, 2);
    }

    #[test]
    fn test_status_filter() {
        let mut inactive = product(2, "B", "1", "");
        inactive.status = ProductStatus::Inactive;
        let products = vec![product(1, "A", "1", ""), inactive];

        let query = CatalogQuery {
            status: StatusFilter::Inactive,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&paginate(&products, &query)), vec![2]);
        assert_eq!(paginate(&products, &CatalogQuery::default()).total_items, 2);
    }

    #[test]
    fn test_price_sort_is_stable() {
        let products = vec![
            product(1, "A", "5", ""),
            product(2, "B", "3", ""),
            product(3, "C", "5", ""),
        ];
        let query = CatalogQuery {
            sort: SortOrder::PriceAsc,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&paginate(&products, &query)), vec![2, 1, 3]);

        let query = CatalogQuery {
            sort: SortOrder::PriceDesc,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&paginate(&products, &query)), vec![1, 3, 2]);
    }

    #[test]
    fn test_thirty_products_span_two_pages() {
        let products: Vec<Product> = (1..=30)
            .map(|i| product(i, "P", &format!("{}", 31 - i), ""))
            .collect();
        let mut query = CatalogQuery {
            sort: SortOrder::PriceAsc,
            ..CatalogQuery::default()
        };

        let first = paginate(&products, &query);
        assert_eq!(first.products.len(), PAGE_SIZE);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());
        assert!(
            first
                .products
                .windows(2)
                .all(|w| w[0].in_town_price <= w[1].in_town_price)
        );

        query.page = Some(2);
        let second = paginate(&products, &query);
        assert_eq!(second.products.len(), 5);
        assert!(!second.has_next());
        assert!(second.has_previous());
    }

    #[test]
    fn test_page_is_clamped() {
        let products = vec![product(1, "A", "1", "")];
        let query = CatalogQuery {
            page: Some(9),
            ..CatalogQuery::default()
        };
        assert_eq!(paginate(&products, &query).page, 1);

        let empty = paginate(&[], &CatalogQuery {
            page: Some(0),
            ..CatalogQuery::default()
        });
        assert_eq!((empty.page, empty.total_pages), (1, 1));
    }

    #[test]
    fn test_distinct_categories_sorted() {
        let products = vec![
            product(1, "A", "1", "Vapes,Flower"),
            product(2, "B", "1", "Flower"),
        ];
        assert_eq!(distinct_categories(&products), vec!["Flower", "Vapes"]);
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: CatalogQuery = serde_json::from_str(
            r#"{"q":"kush","sort":"price-desc","page":2,"category":"Flower"}"#,
        )
        .unwrap();
        assert_eq!(query.sort, SortOrder::PriceDesc);
        assert_eq!(query.page, Some(2));
        assert_eq!(query.search.as_deref(), Some("kush"));
        assert_eq!(query.status, StatusFilter::All);
    }
}
