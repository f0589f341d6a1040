//! Product CSV export and import.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use storecraft_core::{Categories, ProductStatus};
use storecraft_integration_tests::product;
use storecraft_server::services::product_csv::{self, COLUMNS, CsvImportError};

fn category_set(categories: &Categories) -> BTreeSet<String> {
    categories.iter().map(str::to_owned).collect()
}

#[test]
fn test_export_then_import_keeps_products() {
    let mut originals = vec![
        product(1, 12, ProductStatus::Active),
        product(2, 30, ProductStatus::Inactive),
        product(3, 7, ProductStatus::Active),
    ];
    originals[0].categories = Categories::from_list(["Flower", "Pre-Rolls"]);
    originals[1].name = "Quoted, \"special\" name".to_owned();
    originals[2].categories = Categories::from_list(["Edibles"]);

    let csv = product_csv::export(&originals).unwrap();
    assert!(csv.starts_with(&COLUMNS.join(",")));

    let parsed = product_csv::parse(csv.as_bytes()).unwrap();
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.products.len(), originals.len());

    for (imported, original) in parsed.products.iter().zip(&originals) {
        assert_eq!(imported.name, original.name);
        assert_eq!(imported.in_town_price, original.in_town_price);
        assert_eq!(imported.shipping_price, original.shipping_price);
        assert_eq!(imported.status, original.status);
        assert_eq!(
            category_set(&imported.categories),
            category_set(&original.categories)
        );
    }
}

#[test]
fn test_missing_shipping_price_column_rejects_file() {
    let data = "name,description,in_town_price,category\n\
                Blue Dream,Sativa,12.00,Flower\n";
    let err = product_csv::parse(data.as_bytes()).unwrap_err();
    match err {
        CsvImportError::MissingColumns(columns) => {
            assert_eq!(columns, vec!["shipping_price".to_owned()]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn test_bad_rows_are_skipped_not_fatal() {
    let data = "name,description,in_town_price,shipping_price,category\n\
                Blue Dream,Sativa,12.00,15.00,Flower\n\
                ,No name,1.00,2.00,Flower\n\
                Gummies,Fruit,-3,4.00,Edibles\n\
                Tincture,Drops,25,30,\"Wellness, Oils\"\n";
    let parsed = product_csv::parse(data.as_bytes()).unwrap();

    let names: Vec<&str> = parsed.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Blue Dream", "Tincture"]);
    assert_eq!(parsed.products[1].categories.joined(), "Wellness,Oils");
    // Status defaults to active
    assert!(parsed.products.iter().all(|p| p.status == ProductStatus::Active));

    let lines: Vec<u64> = parsed.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![3, 4]);
}
