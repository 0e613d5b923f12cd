use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Error;
use crate::rate_limiter::{RateLimitDecision, RateLimiter};

/// Bucket shared by every request whose origin cannot be determined
pub const DEFAULT_CLIENT_KEY: &str = "default";

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_key(&request);
    let request_id = Uuid::new_v4();

    info!(
        target: "pageviews::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let status = response.status();
    info!(
        target: "pageviews::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        status = %status,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }

    response
}

/// Rejects requests once a client exhausts its window, otherwise runs the
/// wrapped handler.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = limiter.check(&key);

    if !decision.allowed {
        warn!(
            target: "pageviews::middleware",
            client = %key,
            limit = decision.limit,
            uri = %request.uri(),
            "Rate limit exceeded"
        );

        let mut response = Error::RateLimitExceeded(limiter.message().to_string()).into_response();
        apply_rate_limit_headers(response.headers_mut(), &decision);
        let retry_after = decision.reset_after.as_secs().max(1);
        response
            .headers_mut()
            .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(decision.limit));
    headers.insert(
        X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(decision.remaining),
    );
}

/// Derive the rate limit key for a request.
///
/// Forwarded headers are trusted as-is. Headers that are not valid text are
/// ignored rather than failing the request.
pub fn client_key(request: &Request) -> String {
    if let Some(ip) = forwarded_ip(request.headers()) {
        return ip;
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    DEFAULT_CLIENT_KEY.to_string()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let from_forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = from_forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key_with_forwarded_header() {
        let mut request = Request::new(axum::body::Body::empty());
        request.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        assert_eq!(client_key(&request), "192.168.1.1");
    }

    #[test]
    fn test_client_key_with_real_ip_header() {
        let mut request = Request::new(axum::body::Body::empty());
        request
            .headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("203.0.113.1"));

        assert_eq!(client_key(&request), "203.0.113.1");
    }

    #[test]
    fn test_client_key_from_connect_info() {
        let mut request = Request::new(axum::body::Body::empty());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 7], 41000))));

        assert_eq!(client_key(&request), "198.51.100.7");
    }

    #[test]
    fn test_client_key_fallback() {
        let request = Request::new(axum::body::Body::empty());
        assert_eq!(client_key(&request), DEFAULT_CLIENT_KEY);
    }

    #[test]
    fn test_malformed_header_falls_back() {
        let mut request = Request::new(axum::body::Body::empty());
        request.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
        );

        assert_eq!(client_key(&request), DEFAULT_CLIENT_KEY);
    }

    #[test]
    fn test_empty_forwarded_header_uses_real_ip() {
        let mut request = Request::new(axum::body::Body::empty());
        request
            .headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static(" "));
        request
            .headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("203.0.113.5"));

        assert_eq!(client_key(&request), "203.0.113.5");
    }
}
