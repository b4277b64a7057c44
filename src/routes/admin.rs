use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// The admin namespace. The request gate passes these paths through
/// untouched; `admin_shell` consults the elevated session guard before
/// rendering. `/admin/login` is the one page reachable without it.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            handlers::ADMIN_LOGIN_PATH,
            get(handlers::page_shell),
        )
        .route("/admin", get(handlers::admin_shell))
        .route("/admin/{*rest}", get(handlers::admin_shell))
}
