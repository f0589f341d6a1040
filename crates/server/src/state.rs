//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::{BackendClient, BackendError};
use crate::config::ServerConfig;
use crate::retry::RetryPolicy;
use crate::services::palette::PaletteService;
use crate::services::product_cache::ProductCache;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    backend: BackendClient,
    products: ProductCache,
    palettes: PaletteService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let products = ProductCache::new(config.retry);
        let palettes = PaletteService::new(backend.http(), config.retry);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                products,
                palettes,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the active-product cache.
    #[must_use]
    pub fn products(&self) -> &ProductCache {
        &self.inner.products
    }

    #[must_use]
    pub fn palettes(&self) -> &PaletteService {
        &self.inner.palettes
    }

    /// Retry policy for read paths.
    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.inner.config.retry
    }
}
