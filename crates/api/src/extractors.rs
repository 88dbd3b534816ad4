//! Request extractors.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::net::{IpAddr, SocketAddr};

/// Client address candidates for a request.
///
/// `peer` is the TCP peer, present when the server runs with connect info.
/// `forwarded` is the first hop of `X-Forwarded-For`, then `X-Real-IP`.
/// Clients can set those headers to anything, so they only identify the
/// client behind a trusted proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIp {
    pub peer: Option<IpAddr>,
    pub forwarded: Option<String>,
}

impl ClientIp {
    /// The address to identify the client by.
    pub fn resolve(&self, trust_forwarded_headers: bool) -> Option<String> {
        if trust_forwarded_headers {
            if let Some(ip) = &self.forwarded {
                return Some(ip.clone());
            }
        }
        self.peer.map(|ip| ip.to_string())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(client_ip(parts))
    }
}

fn client_ip(parts: &Parts) -> ClientIp {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    ClientIp {
        peer,
        forwarded: forwarded_ip(parts),
    }
}

fn forwarded_ip(parts: &Parts) -> Option<String> {
    // Take the first IP in the proxy chain
    let forwarded = parts
        .headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    parts
        .headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
