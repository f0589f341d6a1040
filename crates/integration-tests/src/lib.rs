//! Integration tests for Storecraft.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storecraft-integration-tests
//!
//! # Include the database-backed tests
//! STORECRAFT_TEST_DATABASE_URL=postgres://localhost/storecraft_test \
//!     cargo test -p storecraft-integration-tests
//! ```
//!
//! Tests that need `PostgreSQL` return early when
//! `STORECRAFT_TEST_DATABASE_URL` is unset.
//!
//! This library holds shared fixtures.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use storecraft_core::{
    BusinessId, Categories, Price, ProductId, ProductStatus, Slug, StorefrontId, VerificationType,
};
use storecraft_server::config::{BackendConfig, ServerConfig};
use storecraft_server::models::{
    Instructions, Product, Storefront, ThemeConfig, VerificationConfig,
};
use storecraft_server::retry::RetryPolicy;
use storecraft_server::state::AppState;

/// Environment variable naming the test database.
pub const TEST_DATABASE_URL: &str = "STORECRAFT_TEST_DATABASE_URL";

/// A fixed point in time, offset by `minutes`.
#[must_use]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// A product with a whole-unit price, created `id` minutes after [`at`].
#[must_use]
pub fn product(id: i32, price: i64, status: ProductStatus) -> Product {
    Product {
        id: ProductId::new(id),
        storefront_id: StorefrontId::new(1),
        name: format!("Product {id}"),
        description: format!("Description {id}"),
        in_town_price: Price::new(Decimal::new(price, 0)).unwrap(),
        shipping_price: Price::new(Decimal::new(price + 5, 0)).unwrap(),
        categories: Categories::from_list(["Flower"]),
        media_urls: Vec::new(),
        status,
        sort_order: 0,
        stock_number: None,
        created_at: at(i64::from(id)),
        updated_at: at(i64::from(id)),
    }
}

/// A published storefront with the given gate settings.
#[must_use]
pub fn storefront(kind: VerificationType, instructions: bool) -> Storefront {
    Storefront {
        id: StorefrontId::new(1),
        business_id: BusinessId::new(1),
        slug: Slug::parse("green-leaf").unwrap(),
        name: "Green Leaf".to_owned(),
        description: None,
        logo_url: None,
        favicon_url: None,
        is_published: true,
        theme: ThemeConfig::default(),
        verification: VerificationConfig {
            verification_type: kind,
            has_password: kind.requires_password(),
            ..VerificationConfig::default()
        },
        instructions: Instructions {
            enabled: instructions,
            text: instructions.then(|| "Pickup only".to_owned()),
        },
        password_hash: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

/// Server configuration pointing at nothing real.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/storecraft_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("kQ9v#2mZ!x7Lp4Rt@8sWn3Yb6Hc1Jd5FgT0&eU4^aV8*cX2%hN6$jM1(oP5)iS9+"),
        backend: BackendConfig {
            url: "http://localhost:54321".to_owned(),
            anon_key: "anon".to_owned(),
            service_key: SecretString::from("service"),
            storage_bucket: "storefront-assets".to_owned(),
        },
        retry: RetryPolicy::new(0, Duration::from_millis(1), Duration::from_millis(1)),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state over a pool that never connects.
#[must_use]
pub fn lazy_state() -> AppState {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/storecraft_test")
        .unwrap();
    AppState::new(config, pool).unwrap()
}

/// Pool for database-backed tests, migrated; `None` when not configured.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var(TEST_DATABASE_URL).ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("../server/migrations").run(&pool).await.unwrap();
    Some(pool)
}
