use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address handed to the geo-IP lookup: first `X-Forwarded-For` hop, else the
/// peer address. Loopback comes out as an empty string.
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientIp(resolve_client_ip(forwarded, peer.as_deref())))
    }
}

pub fn resolve_client_ip(forwarded: Option<&str>, peer: Option<&str>) -> String {
    let raw = forwarded
        .filter(|value| !value.is_empty())
        .or(peer)
        .unwrap_or_default();
    let ip = raw.split(',').next().unwrap_or_default().trim();

    if is_loopback_literal(ip) {
        String::new()
    } else {
        ip.to_string()
    }
}

/// Literal checks only; private ranges are passed through untouched.
pub fn is_loopback_literal(ip: &str) -> bool {
    ip == "::1" || ip.starts_with("127.") || ip.starts_with("::ffff:127")
}
