use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Shared secret the `Authorization` header must equal.
#[derive(Clone)]
pub struct AuthSecret(Arc<str>);

impl AuthSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }

    /// Compares in time independent of where the first differing byte is.
    pub fn matches(&self, provided: &str) -> bool {
        constant_time_eq(provided.as_bytes(), self.0.as_bytes())
    }
}

pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Lets the request through only if the raw `Authorization` header
    /// equals the configured secret; otherwise answers `401` without
    /// touching the inner handler.
    pub async fn require_secret(
        State(secret): State<AuthSecret>,
        request: Request,
        next: Next,
    ) -> Response {
        let authorized = extract_authorization(request.headers())
            .map(|value| secret.matches(value))
            .unwrap_or(false);

        if !authorized {
            tracing::warn!(path = %request.uri().path(), "unauthorized access");
            return create_unauthorized_response();
        }

        next.run(request).await
    }
}

pub fn extract_authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn create_unauthorized_response() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
