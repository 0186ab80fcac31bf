//! Request interceptors wrapped around the route table.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod recovery;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;

pub use auth::{AuthMiddleware, AuthSecret};

/// Wraps `router` in the interceptor chain. Layers are listed outermost
/// first:
///
/// 1. trace: sees every request, including ones rejected further in
/// 2. CORS: answers preflight `OPTIONS` before auth runs
/// 3. recovery: catches panics from auth and the handlers
/// 4. auth: guards the handlers only
pub fn apply<S>(router: Router<S>, secret: AuthSecret) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(logging::layer())
            .layer(from_fn(cors::cors))
            .layer(recovery::layer())
            .layer(from_fn_with_state(secret, AuthMiddleware::require_secret)),
    )
}
