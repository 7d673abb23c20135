use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

use crate::server::AppState;
use crate::server::response::ApiError;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// The address a request is attributed to for throttling and rate limiting.
///
/// The peer address comes from `ConnectInfo`, so the server must be started
/// with `into_make_service_with_connect_info`. When forwarded headers are
/// trusted the first `X-Forwarded-For` entry wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

fn forwarded_for(parts: &Parts) -> Option<IpAddr> {
    parts
        .headers
        .get(FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if state.limiter.config().trust_forwarded_for {
            if let Some(ip) = forwarded_for(parts) {
                return Ok(ClientIp(ip));
            }
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| ClientIp(addr.ip()))
            .ok_or_else(|| {
                tracing::error!("Missing ConnectInfo; cannot attribute request to a client");
                ApiError::internal("Error interno del servidor")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(FORWARDED_FOR, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let parts = parts_with_header("203.0.113.7, 10.0.0.1");
        assert_eq!(
            forwarded_for(&parts),
            Some(IpAddr::from([203, 0, 113, 7]))
        );
    }

    #[test]
    fn test_forwarded_for_ignores_garbage() {
        let parts = parts_with_header("not-an-ip");
        assert_eq!(forwarded_for(&parts), None);
    }
}
