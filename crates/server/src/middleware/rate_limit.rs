//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: login and password recovery (~10/min per IP)
//! - `gate_rate_limiter`: public gate submissions, which carry password
//!   guesses (~30/min per IP)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use thiserror::Error;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers consulted for the client address, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// A limiter was configured with a zero period or burst.
#[derive(Debug, Error)]
#[error("invalid rate limiter configuration: {0}")]
pub struct RateLimitConfigError(&'static str);

/// Keys requests by client IP.
///
/// Proxy headers win over the socket address; for `x-forwarded-for` the first
/// hop is used.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        let forwarded = CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        });
        if let Some(ip) = forwarded {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(
    replenish_seconds: u64,
    burst: u32,
    name: &'static str,
) -> Result<RateLimiterLayer, RateLimitConfigError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_seconds)
        .burst_size(burst)
        .finish()
        .ok_or(RateLimitConfigError(name))?;
    Ok(GovernorLayer::new(Arc::new(config)))
}

/// Limiter for `/auth/*`: one token every 6 seconds, burst of 5.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if governor rejects the quota.
pub fn auth_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    limiter(6, 5, "auth")
}

/// Limiter for `POST /s/{slug}/verify`: one token every 2 seconds, burst of 10.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if governor rejects the quota.
pub fn gate_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    limiter(2, 10, "gate")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_limiters_build() {
        assert!(auth_rate_limiter().is_ok());
        assert!(gate_rate_limiter().is_ok());
    }

    #[test]
    fn test_first_forwarded_hop_wins() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_socket_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "192.0.2.1");
    }

    #[test]
    fn test_no_address_is_an_error() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
