//! Access key middleware
//!
//! Accepts the key as a Bearer token, an `x-functions-key` header, or a
//! `code` query parameter. Comparison is constant-time.

use super::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::debug;

/// List of paths that don't require authentication
const PUBLIC_PATHS: &[&str] = &["/", "/version"];

const KEY_HEADER: &str = "x-functions-key";

pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Skip auth if no secret configured
    if state.secret.is_empty() {
        return Ok(next.run(req).await);
    }

    let path = req.uri().path();
    if PUBLIC_PATHS.iter().any(|p| *p == path) {
        return Ok(next.run(req).await);
    }

    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some(code) = pair.strip_prefix("code=") {
                let code = urlencoding::decode(code).unwrap_or_default();
                if constant_time_eq(code.as_bytes(), state.secret.as_bytes()) {
                    debug!("Auth successful via code query param");
                    return Ok(next.run(req).await);
                }
            }
        }
    }

    if let Some(key) = req.headers().get(KEY_HEADER).and_then(|v| v.to_str().ok()) {
        if constant_time_eq(key.as_bytes(), state.secret.as_bytes()) {
            debug!("Auth successful via {} header", KEY_HEADER);
            return Ok(next.run(req).await);
        }
    }

    if let Some(auth_header) = req.headers().get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if constant_time_eq(token.as_bytes(), state.secret.as_bytes()) {
                    debug!("Auth successful via Bearer token");
                    return Ok(next.run(req).await);
                }
            }
        }
    }

    debug!("Auth failed - missing or invalid key");
    Err(StatusCode::UNAUTHORIZED)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
