//! Product repository for database operations.
//!
//! Bulk operations run in a single transaction and are all-or-nothing: if any
//! requested id is missing from the storefront, nothing is changed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use storecraft_core::{Categories, Price, ProductId, ProductStatus, StorefrontId};

use super::RepositoryError;
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = r"
    id, storefront_id, name, description, in_town_price, shipping_price,
    categories, media_urls, status, sort_order, stock_number, created_at, updated_at
";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    storefront_id: StorefrontId,
    name: String,
    description: String,
    in_town_price: Decimal,
    shipping_price: Decimal,
    categories: Vec<String>,
    media_urls: Vec<String>,
    status: ProductStatus,
    sort_order: i32,
    stock_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = |amount: Decimal| {
            Price::new(amount).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })
        };

        Ok(Self {
            id: row.id,
            storefront_id: row.storefront_id,
            name: row.name,
            description: row.description,
            in_town_price: price(row.in_town_price)?,
            shipping_price: price(row.shipping_price)?,
            categories: Categories::from_list(row.categories),
            media_urls: row.media_urls,
            status: row.status,
            sort_order: row.sort_order,
            stock_number: row.stock_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Check that a bulk statement touched every requested row.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when fewer rows were affected than
/// requested.
pub fn ensure_complete(requested: usize, affected: u64) -> Result<(), RepositoryError> {
    if u64::try_from(requested).is_ok_and(|requested| requested == affected) {
        Ok(())
    } else {
        Err(RepositoryError::NotFound)
    }
}

/// Deduplicated ids in ascending order.
fn unique_ids(ids: &[ProductId]) -> Vec<ProductId> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every product of a storefront, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, storefront_id: StorefrontId) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE storefront_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(storefront_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List the active products of a storefront, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(
        &self,
        storefront_id: StorefrontId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE storefront_id = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(storefront_id)
            .bind(ProductStatus::Active)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get one product of a storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        storefront_id: StorefrontId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE storefront_id = $1 AND id = $2"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(storefront_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(
        &self,
        storefront_id: StorefrontId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let created = insert(&mut tx, storefront_id, product).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Insert a batch of products in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn create_many(
        &self,
        storefront_id: StorefrontId,
        products: &[NewProduct],
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(products.len());
        for product in products {
            created.push(insert(&mut tx, storefront_id, product).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Replace the editable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't in the storefront.
    #[instrument(skip(self, product))]
    pub async fn update(
        &self,
        storefront_id: StorefrontId,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            UPDATE products
            SET name = $3, description = $4, in_town_price = $5, shipping_price = $6,
                categories = $7, media_urls = $8, status = $9, sort_order = $10,
                stock_number = $11, updated_at = NOW()
            WHERE storefront_id = $1 AND id = $2
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(storefront_id)
            .bind(id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.in_town_price)
            .bind(product.shipping_price)
            .bind(product.categories.as_slice())
            .bind(&product.media_urls)
            .bind(product.status)
            .bind(product.sort_order)
            .bind(&product.stock_number)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't in the storefront.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        storefront_id: StorefrontId,
        id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE storefront_id = $1 AND id = $2")
            .bind(storefront_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        ensure_complete(1, result.rows_affected())
    }

    /// Delete a set of products atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any id is not a product of the
    /// storefront; no row is deleted in that case.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(
        &self,
        storefront_id: StorefrontId,
        ids: &[ProductId],
    ) -> Result<u64, RepositoryError> {
        let ids = unique_ids(ids);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM products WHERE storefront_id = $1 AND id = ANY($2)")
            .bind(storefront_id)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        // Dropping `tx` on error rolls the delete back.
        ensure_complete(ids.len(), result.rows_affected())?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Duplicate a set of products atomically.
    ///
    /// Each copy keeps every field except identity and timestamps, and gets
    /// `" (Copy)"` appended to its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any id is not a product of the
    /// storefront; nothing is inserted in that case.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn duplicate_many(
        &self,
        storefront_id: StorefrontId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids = unique_ids(ids);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE storefront_id = $1 AND id = ANY($2)
            ORDER BY id ASC
            FOR SHARE
            "
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(storefront_id)
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await?;

        ensure_complete(ids.len(), u64::try_from(rows.len()).unwrap_or(u64::MAX))?;

        let originals = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut copies = Vec::with_capacity(originals.len());
        for original in &originals {
            copies.push(insert(&mut tx, storefront_id, &original.to_duplicate()).await?);
        }
        tx.commit().await?;

        Ok(copies)
    }
}

async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    storefront_id: StorefrontId,
    product: &NewProduct,
) -> Result<Product, RepositoryError> {
    let sql = format!(
        r"
        INSERT INTO products (storefront_id, name, description, in_town_price, shipping_price,
                              categories, media_urls, status, sort_order, stock_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {PRODUCT_COLUMNS}
        "
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(storefront_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.in_town_price)
        .bind(product.shipping_price)
        .bind(product.categories.as_slice())
        .bind(&product.media_urls)
        .bind(product.status)
        .bind(product.sort_order)
        .bind(&product.stock_number)
        .fetch_one(&mut **tx)
        .await?;

    row.try_into()
}
