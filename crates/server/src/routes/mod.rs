//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth (rate limited)
//! POST /auth/login             - Sign in through the backend
//! POST /auth/logout            - Drop the session
//! POST /auth/recover           - Send a password recovery email
//! GET  /auth/me                - Current user, if any
//!
//! # Dashboard API (requires auth)
//! GET|POST   /api/businesses
//! GET|POST   /api/businesses/{id}/members
//! DELETE     /api/businesses/{id}/members/{user_id}
//! GET|POST   /api/businesses/{id}/storefronts
//! GET|PUT    /api/storefronts/{id}
//! PUT        /api/storefronts/{id}/verification
//! PUT        /api/storefronts/{id}/instructions
//! PUT        /api/storefronts/{id}/theme
//! POST       /api/storefronts/{id}/theme/extract   - Palette from the logo
//! POST       /api/storefronts/{id}/logo            - Upload logo (multipart)
//! POST       /api/storefronts/{id}/publish
//! POST       /api/storefronts/{id}/unpublish
//! GET        /api/storefronts/{id}/preview         - Live preview (JSON)
//! GET|POST   /api/storefronts/{id}/products
//! PUT|DELETE /api/storefronts/{id}/products/{product_id}
//! POST       /api/storefronts/{id}/products/bulk-delete
//! POST       /api/storefronts/{id}/products/bulk-duplicate
//! GET        /api/storefronts/{id}/products/export.csv
//! POST       /api/storefronts/{id}/products/import (multipart)
//! POST       /api/storefronts/{id}/media           (multipart)
//! GET|PUT    /api/storefronts/{id}/pwa
//! POST       /api/storefronts/{id}/pwa/icon        (multipart)
//! POST       /api/storefronts/{id}/pwa/screenshots/{form_factor} (multipart)
//! POST       /api/storefronts/{id}/pwa/publish
//! GET|PUT|DELETE /api/session/storefront           - Selected storefront
//!
//! # Public
//! GET  /api/manifests/{id}
//! GET  /s/{slug}
//! GET  /s/{slug}/manifest.webmanifest
//! POST /s/{slug}/verify        - Gate submission (rate limited)
//! POST /s/{slug}/continue      - Dismiss instructions
//! POST /s/{slug}/restart       - Start verification over
//!
//! Errors on the `/s/{slug}` pages render as an HTML panel, not JSON.
//! ```

pub mod auth;
pub mod businesses;
pub mod health;
pub mod multipart;
pub mod products;
pub mod public;
pub mod pwa;
pub mod session;
pub mod storefronts;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::middleware::{RateLimitConfigError, auth_rate_limiter, gate_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is invalid.
pub fn auth_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/recover", post(auth::recover))
        .layer(auth_rate_limiter()?)
        // Polled by the dashboard; not limited
        .route("/me", get(auth::me)))
}

/// Create the business routes router.
pub fn business_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(businesses::index).post(businesses::create))
        .route(
            "/{id}/members",
            get(businesses::members).post(businesses::add_member),
        )
        .route("/{id}/members/{user_id}", delete(businesses::remove_member))
        .route(
            "/{id}/storefronts",
            get(businesses::storefronts).post(businesses::create_storefront),
        )
}

/// Create the storefront routes router.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(storefronts::show).put(storefronts::update))
        .route("/{id}/verification", put(storefronts::update_verification))
        .route("/{id}/instructions", put(storefronts::update_instructions))
        .route("/{id}/theme", put(storefronts::update_theme))
        .route("/{id}/theme/extract", post(storefronts::extract_theme))
        .route("/{id}/logo", post(storefronts::upload_logo))
        .route("/{id}/publish", post(storefronts::publish))
        .route("/{id}/unpublish", post(storefronts::unpublish))
        .route("/{id}/preview", get(storefronts::preview))
        // Products
        .route("/{id}/products", get(products::index).post(products::create))
        .route(
            "/{id}/products/{product_id}",
            put(products::update).delete(products::delete),
        )
        .route("/{id}/products/bulk-delete", post(products::bulk_delete))
        .route(
            "/{id}/products/bulk-duplicate",
            post(products::bulk_duplicate),
        )
        .route("/{id}/products/export.csv", get(products::export_csv))
        .route("/{id}/products/import", post(products::import_csv))
        .route("/{id}/media", post(products::upload_media))
        // PWA
        .route("/{id}/pwa", get(pwa::show).put(pwa::update))
        .route("/{id}/pwa/icon", post(pwa::upload_icon))
        .route(
            "/{id}/pwa/screenshots/{form_factor}",
            post(pwa::upload_screenshot),
        )
        .route("/{id}/pwa/publish", post(pwa::publish))
        .layer(DefaultBodyLimit::max(multipart::MAX_UPLOAD_BYTES))
}

/// Create the dashboard API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/businesses", business_routes())
        .nest("/storefronts", storefront_routes())
        .route(
            "/session/storefront",
            get(session::show).put(session::select).delete(session::clear),
        )
        .route("/manifests/{id}", get(pwa::manifest_by_id))
}

/// Create the public storefront router.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is invalid.
pub fn public_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/{slug}/verify", post(public::verify))
        .layer(gate_rate_limiter()?)
        .route("/{slug}", get(public::show))
        .route("/{slug}/continue", post(public::continue_to_content))
        .route("/{slug}/restart", post(public::restart))
        .route_layer(axum::middleware::from_fn(public::html_errors))
        .route("/{slug}/manifest.webmanifest", get(public::manifest)))
}

/// Create all routes.
///
/// # Errors
///
/// Returns an error if a rate limiter configuration is invalid.
pub fn routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes()?)
        .nest("/api", api_routes())
        .nest("/s", public_routes()?)
        .fallback(fallback))
}

async fn fallback() -> axum::response::Response {
    public::not_found()
}
