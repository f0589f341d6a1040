//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. Sessions carry
//! the signed-in builder user, the selected storefront and each visitor's
//! gate progress. The session cookie is signed with
//! `STORECRAFT_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions::cookie::{Key, KeyError};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sc_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Cookie signing key built from the configured secret.
///
/// # Errors
///
/// Returns `KeyError` if the secret is shorter than 64 bytes.
pub fn signing_key(secret: &SecretString) -> Result<Key, KeyError> {
    Key::try_from(secret.expose_secret().as_bytes())
}

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `sc-cli migrate`.
///
/// # Errors
///
/// Returns `KeyError` if the session secret cannot be used as a signing key.
pub fn create_session_layer(
    pool: &PgPool,
    config: &ServerConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, KeyError> {
    let store = PostgresStore::new(pool.clone());
    let key = signing_key(&config.session_secret)?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
