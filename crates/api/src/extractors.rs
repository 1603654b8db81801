//! Request extractors.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use evote_core::Organizer;

/// Authenticated organizer extractor.
#[derive(Debug, Clone)]
pub struct AuthOrganizer(pub Organizer);

impl<S> FromRequestParts<S> for AuthOrganizer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Organizer>()
            .cloned()
            .map(AuthOrganizer)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Network address of the caller.
///
/// The first `X-Forwarded-For` entry wins when present (the service runs
/// behind a proxy); otherwise the peer socket address. `None` when neither
/// is available.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        };

        Ok(Self(forwarded.or_else(peer)))
    }
}
