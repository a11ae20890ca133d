//! Admin API middleware

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::common::auth;

use super::error::AdminServiceError;
use super::service::StoreCreditService;

/// Admin API shared state
#[derive(Clone)]
pub struct AdminState {
    /// Admin API key
    pub admin_api_key: String,
    /// Store credit service
    pub service: Arc<StoreCreditService>,
}

impl AdminState {
    pub fn new(admin_api_key: impl Into<String>, service: StoreCreditService) -> Self {
        Self {
            admin_api_key: admin_api_key.into(),
            service: Arc::new(service),
        }
    }
}

/// Admin API authentication middleware
///
/// Rejects the request before any handler runs unless it carries the admin key.
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = auth::extract_api_key(request.headers())
        .is_some_and(|key| auth::constant_time_eq(key, &state.admin_api_key));
    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected admin request without valid credentials"
    );
    AdminServiceError::Unauthorized.into_response()
}

/// Split a comma-separated origin list, dropping blanks and invalid entries
///
/// Only exact origins are accepted. A wildcard cannot be combined with
/// credentials, so `*` is dropped, and so are `/pattern/` entries.
pub fn parse_cors_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            if *origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin, use explicit origins");
                return false;
            }
            if origin.len() > 1 && origin.starts_with('/') && origin.ends_with('/') {
                tracing::warn!("Ignoring pattern CORS origin {}, use explicit origins", origin);
                return false;
            }
            true
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect()
}

/// CORS layer for the admin API
///
/// Only the configured admin origins are allowed, with credentials enabled.
/// Preflight requests are answered here, before authentication.
pub fn admin_cors_layer(admin_cors: &str) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_cors_origins(admin_cors)))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-api-key"),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cors_origins() {
        let origins = parse_cors_origins(" http://localhost:7000 , ,https://admin.example.com,");
        assert_eq!(
            origins,
            vec![
                HeaderValue::from_static("http://localhost:7000"),
                HeaderValue::from_static("https://admin.example.com"),
            ]
        );
    }

    #[test]
    fn test_parse_cors_origins_skips_invalid() {
        let origins = parse_cors_origins("http://ok.test,bad\u{7f}origin");
        assert_eq!(origins, vec![HeaderValue::from_static("http://ok.test")]);
    }

    #[test]
    fn test_parse_cors_origins_drops_wildcard() {
        let origins = parse_cors_origins("*,http://ok.test");
        assert_eq!(origins, vec![HeaderValue::from_static("http://ok.test")]);
    }

    #[test]
    fn test_parse_cors_origins_drops_patterns() {
        let origins = parse_cors_origins(r"/https?:\/\/.*\.example\.com/,http://ok.test");
        assert_eq!(origins, vec![HeaderValue::from_static("http://ok.test")]);
    }

    #[test]
    fn test_parse_empty_allow_list() {
        assert!(parse_cors_origins("").is_empty());
    }
}
