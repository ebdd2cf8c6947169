//! Request/response logging middleware with sensitive data redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};

/// Logs each request on the way in and out, with the signature header redacted.
/// `TraceLayer` owns the request span, so no span is opened here.
/// Kubernetes probes are only logged at debug level.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let request_id = extract_request_id(&request);
    let probe = is_probe_path(&path);

    if probe {
        debug!(method = %method, path = %path, request_id = %request_id, "Incoming probe");
    } else {
        info!(
            method = %method,
            path = %path,
            request_id = %request_id,
            headers = %redact_headers(&request),
            "Incoming request"
        );
    }

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();

    if probe {
        debug!(path = %path, status, duration_ms, "Probe completed");
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            duration_ms,
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}

fn is_probe_path(path: &str) -> bool {
    matches!(path, "/health" | "/ready" | "/live")
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Redact sensitive headers for logging
fn redact_headers(request: &Request<Body>) -> String {
    let mut parts = Vec::new();

    for (name, value) in request.headers() {
        let name_str = name.as_str().to_lowercase();
        let value_str = if is_sensitive_header(&name_str) {
            "[REDACTED]".to_string()
        } else {
            value.to_str().unwrap_or("[invalid]").to_string()
        };

        // Only log relevant headers
        if should_log_header(&name_str) {
            parts.push(format!("{}={}", name_str, value_str));
        }
    }

    parts.join(", ")
}

/// Check if a header contains sensitive information
fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "x-signature" | "authorization" | "cookie" | "set-cookie" | "proxy-authorization"
    )
}

/// Check if a header should be logged
fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "x-signature"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_probe_path() {
        assert!(is_probe_path("/ready"));
        assert!(!is_probe_path("/internal/api/v1/provision"));
    }

    #[test]
    fn test_is_sensitive_header() {
        assert!(is_sensitive_header("x-signature"));
        assert!(is_sensitive_header("authorization"));
        assert!(is_sensitive_header("cookie"));
        assert!(!is_sensitive_header("content-type"));
        assert!(!is_sensitive_header("accept"));
    }

    #[test]
    fn test_should_log_header() {
        assert!(should_log_header("content-type"));
        assert!(should_log_header("x-signature"));
        assert!(!should_log_header("authorization"));
        assert!(should_log_header("user-agent"));
        assert!(!should_log_header("cache-control"));
        assert!(!should_log_header("etag"));
    }

    #[test]
    fn test_signature_is_redacted() {
        let request = Request::post("/internal/api/v1/provision")
            .header("x-signature", "deadbeef")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();

        let logged = redact_headers(&request);
        assert!(logged.contains("x-signature=[REDACTED]"));
        assert!(logged.contains("content-type=application/json"));
        assert!(!logged.contains("deadbeef"));
    }
}
