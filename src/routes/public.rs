use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints no classification rule protects.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer check. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // GET /login?callbackUrl=...
        // Where the gate sends callers without a primary session.
        .route("/login", get(handlers::login_shell))
}
