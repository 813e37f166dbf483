use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

use crate::ratelimit::RateLimitConfig;

/// Identity used for rate limiting: the peer address, or the first
/// `X-Forwarded-For` hop when the deployment sits behind a trusted proxy.
pub fn client_identity(config: &RateLimitConfig, headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    if config.trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        if let Some(ip) = forwarded {
            return ip;
        }
    }

    peer.ip()
}
