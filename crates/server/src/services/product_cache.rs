//! Cached active-product lists for the public storefront.
//!
//! Every mutation of a storefront's products must call
//! [`ProductCache::invalidate`] after it commits.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use storecraft_core::StorefrontId;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;
use crate::retry::RetryPolicy;

#[derive(Clone)]
pub struct ProductCache {
    inner: Arc<ProductCacheInner>,
}

struct ProductCacheInner {
    cache: Cache<StorefrontId, Arc<Vec<Product>>>,
    retry: RetryPolicy,
}

impl ProductCache {
    #[must_use]
    pub fn new(retry: RetryPolicy) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ProductCacheInner { cache, retry }),
        }
    }

    /// Active products of a storefront, newest first.
    ///
    /// # Errors
    ///
    /// Returns the last `RepositoryError` once retries are exhausted.
    #[instrument(skip(self, pool))]
    pub async fn active(
        &self,
        pool: &PgPool,
        storefront_id: StorefrontId,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(products) = self.inner.cache.get(&storefront_id).await {
            debug!("Cache hit for active products");
            return Ok(products);
        }

        let repo = ProductRepository::new(pool);
        let products = Arc::new(
            self.inner
                .retry
                .run("list_active_products", || repo.list_active(storefront_id))
                .await?,
        );

        self.inner
            .cache
            .insert(storefront_id, Arc::clone(&products))
            .await;

        Ok(products)
    }

    /// Drop the cached list of a storefront.
    pub async fn invalidate(&self, storefront_id: StorefrontId) {
        self.inner.cache.invalidate(&storefront_id).await;
    }
}
