//! Bulk duplicate and delete.
//!
//! The database-backed test needs `STORECRAFT_TEST_DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use uuid::Uuid;

use storecraft_core::{ProductStatus, StorefrontId, UserId};
use storecraft_integration_tests::{product, test_pool};
use storecraft_server::db::{
    BusinessRepository, ProductRepository, RepositoryError, StorefrontRepository,
};
use storecraft_server::forms::{BusinessForm, StorefrontForm};
use storecraft_server::models::product::COPY_SUFFIX;
use storecraft_server::models::{NewProduct, Product};

#[test]
fn test_duplicate_strips_identity_and_suffixes_name() {
    let original = product(7, 12, ProductStatus::Inactive);
    let copy = original.to_duplicate();

    assert_eq!(copy.name, "Product 7 (Copy)");
    assert_eq!(copy.in_town_price, original.in_town_price);
    assert_eq!(copy.status, ProductStatus::Inactive);
    assert_eq!(copy.categories, original.categories);
}

async fn seed_storefront(pool: &sqlx::PgPool) -> StorefrontId {
    let business = BusinessForm {
        name: "Bulk Test Co".to_owned(),
        description: None,
    }
    .validate()
    .unwrap();
    let business = BusinessRepository::new(pool)
        .create_with_owner(&business, UserId::new(Uuid::new_v4()))
        .await
        .unwrap();

    let slug = format!("bulk-{}", &Uuid::new_v4().simple().to_string()[..12]);
    let details = StorefrontForm {
        name: "Bulk Test".to_owned(),
        slug: Some(slug),
        description: None,
        logo_url: None,
        favicon_url: None,
    }
    .validate()
    .unwrap();
    StorefrontRepository::new(pool)
        .create(business.id, &details)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_duplicate_then_delete_originals_leaves_copies() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let storefront_id = seed_storefront(&pool).await;
    let repo = ProductRepository::new(&pool);

    let new: Vec<NewProduct> = (1..=3)
        .map(|i| NewProduct::from(product(i, i64::from(i) * 10, ProductStatus::Active)))
        .collect();
    let originals: Vec<Product> = repo.create_many(storefront_id, &new).await.unwrap();
    let original_ids: Vec<_> = originals.iter().map(|p| p.id).collect();

    let copies = repo
        .duplicate_many(storefront_id, &original_ids)
        .await
        .unwrap();
    assert_eq!(copies.len(), 3);

    let deleted = repo
        .delete_many(storefront_id, &original_ids)
        .await
        .unwrap();
    assert_eq!(deleted, 3);

    let remaining = repo.list(storefront_id).await.unwrap();
    assert_eq!(remaining.len(), 3);

    let old: HashSet<_> = original_ids.iter().copied().collect();
    assert!(remaining.iter().all(|p| !old.contains(&p.id)));
    assert!(remaining.iter().all(|p| p.name.ends_with(COPY_SUFFIX)));
}

#[tokio::test]
async fn test_foreign_id_aborts_whole_selection() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let storefront_id = seed_storefront(&pool).await;
    let other_storefront = seed_storefront(&pool).await;
    let repo = ProductRepository::new(&pool);

    let mine = repo
        .create_many(
            storefront_id,
            &[NewProduct::from(product(1, 10, ProductStatus::Active))],
        )
        .await
        .unwrap();
    let theirs = repo
        .create_many(
            other_storefront,
            &[NewProduct::from(product(2, 10, ProductStatus::Active))],
        )
        .await
        .unwrap();
    let selection = [mine[0].id, theirs[0].id];

    let err = repo
        .delete_many(storefront_id, &selection)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    let err = repo
        .duplicate_many(storefront_id, &selection)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    assert_eq!(repo.list(storefront_id).await.unwrap().len(), 1);
    assert_eq!(repo.list(other_storefront).await.unwrap().len(), 1);
}
