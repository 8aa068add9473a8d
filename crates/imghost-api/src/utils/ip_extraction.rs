//! Client IP extraction
//!
//! The address recorded for an upload is taken from `X-Forwarded-For` when the
//! server sits behind trusted proxies, otherwise from the socket peer.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::state::AppState;

/// Recorded when no address can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Resolve the client address.
///
/// Each proxy appends the address it received the request from, so with
/// `trusted_proxy_count` = N the client is the Nth entry from the right of
/// `X-Forwarded-For`. Entries left of that are client-controlled and ignored.
/// With N = 0 the header is not trusted at all, and a chain shorter than N
/// falls back to the socket peer.
pub fn client_ip(
    headers: &HeaderMap,
    socket_addr: Option<SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<IpAddr> {
    if trusted_proxy_count > 0 {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| forwarded_client(v, trusted_proxy_count));
        if forwarded.is_some() {
            return forwarded;
        }
    }
    socket_addr.map(|addr| addr.ip())
}

fn forwarded_client(header_value: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let index = hops.len().checked_sub(trusted_proxy_count)?;
    hops.get(index).and_then(|hop| hop.parse().ok())
}

/// Extractor for the requesting client's IP, rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let ip = client_ip(
            &parts.headers,
            socket_addr,
            state.config.trusted_proxy_count(),
        )
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string());
        Ok(ClientIp(ip))
    }
}
