//! Bulk product actions.
//!
//! Both actions are all-or-nothing: if any selected id is not a product of
//! the storefront, nothing changes. The storefront's cached product list is
//! dropped after every successful action.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument};

use storecraft_core::{ProductId, StorefrontId};

use super::product_cache::ProductCache;
use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;

/// Product ids selected in the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub ids: Vec<ProductId>,
}

impl Selection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}

pub struct BulkService<'a> {
    products: ProductRepository<'a>,
    cache: &'a ProductCache,
}

impl<'a> BulkService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a ProductCache) -> Self {
        Self {
            products: ProductRepository::new(pool),
            cache,
        }
    }

    /// Delete the selected products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any id is not in the
    /// storefront; nothing is deleted then.
    #[instrument(skip(self, selection), fields(count = selection.ids.len()))]
    pub async fn delete(
        &self,
        storefront_id: StorefrontId,
        selection: &Selection,
    ) -> Result<Deleted, RepositoryError> {
        if selection.is_empty() {
            return Ok(Deleted { deleted: 0 });
        }

        let deleted = self
            .products
            .delete_many(storefront_id, &selection.ids)
            .await?;
        self.cache.invalidate(storefront_id).await;

        info!(deleted, "Bulk deleted products");
        Ok(Deleted { deleted })
    }

    /// Duplicate the selected products, returning the copies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any id is not in the
    /// storefront; nothing is inserted then.
    #[instrument(skip(self, selection), fields(count = selection.ids.len()))]
    pub async fn duplicate(
        &self,
        storefront_id: StorefrontId,
        selection: &Selection,
    ) -> Result<Vec<Product>, RepositoryError> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let copies = self
            .products
            .duplicate_many(storefront_id, &selection.ids)
            .await?;
        self.cache.invalidate(storefront_id).await;

        info!(copies = copies.len(), "Bulk duplicated products");
        Ok(copies)
    }
}
