use std::time::Instant;

use axum::{http::HeaderMap, middleware::Next, response::Response};

use crate::context::{API_KEY_HEADER, PresentedApiKey};

/// Attach the caller's `X-API-Key` to the request.
///
/// A missing key is not rejected here: the registry must first tell an
/// unknown project (404) apart from a bad key (401).
pub async fn api_key_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let key = extract_api_key(req.headers());
    req.extensions_mut().insert(key);
    next.run(req).await
}

fn extract_api_key(headers: &HeaderMap) -> PresentedApiKey {
    // Issued keys are bare hex, so surrounding whitespace is never part of one.
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    PresentedApiKey::new(key)
}

/// Log method, path, status and latency of every request.
pub async fn log_requests(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = res.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    res
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_and_trims_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("  abc123 "));
        assert_eq!(extract_api_key(&headers).as_str(), "abc123");
    }

    #[test]
    fn missing_or_non_utf8_header_is_empty() {
        assert!(extract_api_key(&HeaderMap::new()).is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert!(extract_api_key(&headers).is_empty());
    }
}
