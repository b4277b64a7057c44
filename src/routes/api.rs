use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// API Router Module
///
/// Everything here sits under `/api`, which the request gate skips. Each
/// handler authorizes itself:
/// - `/api/follows/check` is lenient (anonymous callers get `following: false`).
/// - `/api/admin/session` establishes, reports and clears the elevated session.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/follows/check?userId=...
        .route("/follows/check", get(handlers::check_follow))
        // GET/POST/DELETE /api/admin/session
        .route(
            "/admin/session",
            get(handlers::get_admin_session)
                .post(handlers::create_admin_session)
                .delete(handlers::delete_admin_session),
        )
}
