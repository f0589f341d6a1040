//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORECRAFT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STORECRAFT_BASE_URL` - Public URL of this server
//! - `STORECRAFT_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//! - `BAAS_URL` - Base URL of the backend-as-a-service project
//! - `BAAS_ANON_KEY` - Public (anon) API key for the auth endpoints
//! - `BAAS_SERVICE_KEY` - Service-role key for storage and edge functions
//!
//! ## Optional
//! - `STORECRAFT_HOST` - Bind address (default: 127.0.0.1)
//! - `STORECRAFT_PORT` - Listen port (default: 3000)
//! - `BAAS_STORAGE_BUCKET` - Object storage bucket (default: storefront-assets)
//! - `RETRY_MAX_RETRIES` - Read retries before giving up (default: 3)
//! - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
//! - `RETRY_MAX_DELAY_MS` - Backoff ceiling (default: 30000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Minimum strength a configured secret must show.
#[derive(Debug, Clone, Copy)]
struct SecretRules {
    min_len: usize,
    min_entropy: f64,
}

const SERVICE_KEY_RULES: SecretRules = SecretRules {
    min_len: 16,
    min_entropy: 3.3,
};

// A cookie signing key needs 64 bytes.
const SESSION_SECRET_RULES: SecretRules = SecretRules {
    min_len: 64,
    min_entropy: 3.3,
};

/// Fragments that give away a copied `.env.example` value.
const PLACEHOLDERS: &[&str] = &[
    "changeme",
    "placeholder",
    "your-",
    "example",
    "replace",
    "secret",
    "password",
    "xxx",
    "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this server
    pub base_url: String,
    /// Key material for signing the session cookie
    pub session_secret: SecretString,
    /// Backend-as-a-service endpoints and keys
    pub backend: BackendConfig,
    /// Retry policy for read queries
    pub retry: RetryPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend-as-a-service configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abc.backend.example`
    pub url: String,
    /// Public anon key (used for end-user auth calls)
    pub anon_key: String,
    /// Service-role key (server-side only)
    pub service_key: SecretString,
    /// Object storage bucket holding media, icons and generated files
    pub storage_bucket: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key)
            .field("service_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STORECRAFT_DATABASE_URL")?;
        let host = get_parsed_or_default::<IpAddr>("STORECRAFT_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("STORECRAFT_PORT", "3000")?;
        let base_url = get_required_env("STORECRAFT_BASE_URL")?;
        let session_secret = required_secret("STORECRAFT_SESSION_SECRET", SESSION_SECRET_RULES)?;

        let backend = BackendConfig::from_env()?;
        let retry = retry_policy_from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            backend,
            retry,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("BAAS_URL")?;
        url::Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("BAAS_URL".to_string(), e.to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: get_required_env("BAAS_ANON_KEY")?,
            service_key: required_secret("BAAS_SERVICE_KEY", SERVICE_KEY_RULES)?,
            storage_bucket: get_env_or_default("BAAS_STORAGE_BUCKET", "storefront-assets"),
        })
    }
}

fn retry_policy_from_env() -> Result<RetryPolicy, ConfigError> {
    let max_retries = get_parsed_or_default::<u32>("RETRY_MAX_RETRIES", "3")?;
    let base_delay_ms = get_parsed_or_default::<u64>("RETRY_BASE_DELAY_MS", "1000")?;
    let max_delay_ms = get_parsed_or_default::<u64>("RETRY_MAX_DELAY_MS", "30000")?;

    if base_delay_ms > max_delay_ms {
        return Err(ConfigError::InvalidEnvVar(
            "RETRY_BASE_DELAY_MS".to_string(),
            format!("must not exceed RETRY_MAX_DELAY_MS ({max_delay_ms})"),
        ));
    }

    Ok(RetryPolicy::new(
        max_retries,
        Duration::from_millis(base_delay_ms),
        Duration::from_millis(max_delay_ms),
    ))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Bits of entropy per character, over the character distribution.
fn entropy_per_char(value: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

impl SecretRules {
    fn check(self, key: &str, value: &str) -> Result<(), ConfigError> {
        let insecure = |reason: String| ConfigError::InsecureSecret(key.to_string(), reason);

        let length = value.chars().count();
        if length < self.min_len {
            return Err(insecure(format!(
                "must be at least {} characters (got {length})",
                self.min_len
            )));
        }

        let lower = value.to_lowercase();
        if let Some(fragment) = PLACEHOLDERS.iter().find(|p| lower.contains(*p)) {
            return Err(insecure(format!("looks like a placeholder ('{fragment}')")));
        }

        let entropy = entropy_per_char(value);
        if entropy < self.min_entropy {
            return Err(insecure(format!(
                "entropy {entropy:.2} bits/char is below {:.1}; generate it randomly",
                self.min_entropy
            )));
        }

        Ok(())
    }
}

fn required_secret(key: &str, rules: SecretRules) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    rules.check(key, &value)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_backend() -> BackendConfig {
        BackendConfig {
            url: "https://project.backend.test".to_string(),
            anon_key: "anon_key_value".to_string(),
            service_key: SecretString::from("super_secret_service_key"),
            storage_bucket: "storefront-assets".to_string(),
        }
    }

    #[test]
    fn test_entropy_per_char() {
        assert!(entropy_per_char("").abs() < f64::EPSILON);
        assert!((entropy_per_char("abab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_secret_rejected() {
        let result = SERVICE_KEY_RULES.check("BAAS_SERVICE_KEY", "your-service-role-key-goes-here");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(key, _)) if key == "BAAS_SERVICE_KEY"));
    }

    #[test]
    fn test_repetitive_secret_rejected() {
        let result = SESSION_SECRET_RULES.check("S", &"ab".repeat(20));
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, reason)) if reason.contains("entropy")));
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let result = SESSION_SECRET_RULES.check("S", "Vq8%Lm3^Zt6&Hn1*Rb4!Wc9@Jd2#Kf5$");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, reason)) if reason.contains("at least 64")));
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(
            SESSION_SECRET_RULES
                .check("S", "Vq8%Lm3^Zt6&Hn1*Rb4!Wc9@Jd2#Kf5$Gp7)Ns0(Ux3+Ae8=Yh2?Ko6<Ri1>Bw5~")
                .is_ok()
        );
    }

    #[test]
    fn test_socket_addr_and_https() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://builder.test".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            backend: test_backend(),
            retry: RetryPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_https());
    }

    #[test]
    fn test_backend_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_backend());

        assert!(debug_output.contains("project.backend.test"));
        assert!(debug_output.contains("anon_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_service_key"));
    }
}
