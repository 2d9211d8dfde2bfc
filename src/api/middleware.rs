//! Request throttling middleware and client identification.

use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::ApiState;
use crate::ratelimit::{RateDecision, RateQuota, unix_now};

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Client key when no proxy header identifies the caller.
const UNKNOWN_CLIENT: &str = "unknown";

/// Extract a client IP for rate limiting from common proxy headers.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn quota_headers(quota: RateQuota) -> [(&'static str, HeaderValue); 3] {
    [
        (HEADER_LIMIT, HeaderValue::from(quota.limit)),
        (HEADER_REMAINING, HeaderValue::from(quota.remaining)),
        (HEADER_RESET, HeaderValue::from(quota.reset)),
    ]
}

/// Per-(client, path) fixed-window throttle applied to every route.
///
/// Allowed requests carry `X-RateLimit-*` quota headers; over-limit requests
/// are answered here with 429 and a `Retry-After` hint, and never reach a
/// handler.
pub async fn rate_limit(
    Extension(state): Extension<Arc<ApiState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client =
        extract_client_ip(request.headers()).unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    let path = request.uri().path().to_string();

    match state.limiter.check(&client, &path).await {
        RateDecision::Allowed(quota) => {
            let mut response = next.run(request).await;
            for (name, value) in quota_headers(quota) {
                response.headers_mut().insert(name, value);
            }
            response
        }
        RateDecision::Limited(quota) => {
            debug!(client, path, "rate limit exceeded");
            let retry_after = quota.reset.saturating_sub(unix_now());
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
            for (name, value) in quota_headers(quota) {
                response.headers_mut().insert(name, value);
            }
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }

    #[test]
    fn quota_headers_render_numeric_values() {
        let headers = quota_headers(RateQuota {
            limit: 60,
            remaining: 12,
            reset: 1_700_000_000,
        });
        assert_eq!(headers[0].1, HeaderValue::from_static("60"));
        assert_eq!(headers[1].1, HeaderValue::from_static("12"));
        assert_eq!(headers[2].1, HeaderValue::from_static("1700000000"));
    }
}
