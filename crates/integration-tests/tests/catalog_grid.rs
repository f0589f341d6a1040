//! Product grid pagination, filtering and sorting as the storefront shows it.

#![allow(clippy::unwrap_used)]

use storecraft_core::{ProductStatus, StatusFilter, VerificationType};
use storecraft_integration_tests::{product, storefront};
use storecraft_server::models::Product;
use storecraft_server::services::catalog::{self, CatalogQuery, PAGE_SIZE, SortOrder};
use storecraft_server::services::gate::GateState;
use storecraft_server::services::preview::{PageBody, PreviewPage, ViewOptions};

/// 30 active products with shuffled prices plus a few inactive ones.
fn catalog() -> Vec<Product> {
    let mut products: Vec<Product> = (1..=30)
        .map(|i| product(i, i64::from((i * 7) % 31), ProductStatus::Active))
        .collect();
    products.extend((31..=34).map(|i| product(i, 1, ProductStatus::Inactive)));
    products
}

fn query(page: usize) -> CatalogQuery {
    CatalogQuery {
        status: StatusFilter::Active,
        sort: SortOrder::PriceAsc,
        page: Some(page),
        ..CatalogQuery::default()
    }
}

#[test]
fn test_thirty_products_fill_two_pages_in_price_order() {
    let products = catalog();

    let first = catalog::paginate(&products, &query(1));
    assert_eq!(first.total_items, 30);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.products.len(), PAGE_SIZE);
    assert!(first.has_next());
    assert!(!first.has_previous());

    let second = catalog::paginate(&products, &query(2));
    assert_eq!(second.products.len(), 5);
    assert!(!second.has_next());

    let prices: Vec<_> = first
        .products
        .iter()
        .chain(&second.products)
        .map(|p| p.in_town_price)
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    // Page 1 holds the 25 cheapest
    let cheapest_on_two = second.products.iter().map(|p| p.in_town_price).min().unwrap();
    assert!(first.products.iter().all(|p| p.in_town_price <= cheapest_on_two));

    assert!(
        first
            .products
            .iter()
            .chain(&second.products)
            .all(|p| p.status == ProductStatus::Active)
    );
}

#[test]
fn test_page_past_the_end_is_clamped() {
    let products = catalog();
    let page = catalog::paginate(&products, &query(9));
    assert_eq!(page.page, 2);
    assert_eq!(page.products.len(), 5);
}

#[test]
fn test_all_is_a_wildcard_for_status_and_category() {
    let products = catalog();
    let everything = CatalogQuery {
        category: Some("all".to_owned()),
        ..CatalogQuery::default()
    };
    assert_eq!(catalog::paginate(&products, &everything).total_items, 34);

    let inactive = CatalogQuery {
        status: StatusFilter::Inactive,
        ..CatalogQuery::default()
    };
    assert_eq!(catalog::paginate(&products, &inactive).total_items, 4);
}

#[test]
fn test_search_and_category_narrow_the_grid() {
    let mut products = catalog();
    products[0].name = "Blue Dream".to_owned();
    products[1].name = "Blueberry Kush".to_owned();
    products[1].categories = storecraft_core::Categories::from_list(["Edibles"]);

    let blue = CatalogQuery {
        search: Some("  BLUE ".to_owned()),
        ..CatalogQuery::default()
    };
    assert_eq!(catalog::paginate(&products, &blue).total_items, 2);

    let blue_flower = CatalogQuery {
        category: Some("Flower".to_owned()),
        ..blue
    };
    let page = catalog::paginate(&products, &blue_flower);
    assert_eq!(page.total_items, 1);
    assert_eq!(page.products[0].name, "Blue Dream");
}

#[test]
fn test_unlocked_page_lists_categories_of_products() {
    let mut products = catalog();
    products[3].categories = storecraft_core::Categories::from_list(["Edibles", "Flower"]);
    let sf = storefront(VerificationType::None, false);

    let page = PreviewPage::derive(
        &sf,
        GateState::Unlocked,
        &products,
        &query(1),
        ViewOptions::default(),
    );
    let PageBody::Content { header, grid, .. } = page.body else {
        panic!("expected content");
    };
    assert_eq!(header.categories, vec!["Edibles", "Flower"]);
    assert_eq!(grid.total_pages, 2);
}
