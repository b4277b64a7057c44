use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authorization core.
pub mod auth;
pub mod classifier;
pub mod elevated;
pub mod gate;

// Service plumbing.
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing split by who authorizes (public, API, admin).
pub mod routes;
use routes::{admin, api, public};

// --- Public Re-exports ---

pub use auth::{JwtSessionResolver, SessionResolverState};
pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::check_follow, handlers::get_admin_session, handlers::create_admin_session,
        handlers::delete_admin_session, handlers::login_shell
    ),
    components(
        schemas(
            models::FollowStatus, models::ErrorBody, models::LoginShell, models::PageShell,
            models::AdminSessionStatus, models::User,
        )
    ),
    tags(
        (name = "stack-gate", description = "Authorization gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, cloneable container for everything handlers and middleware share.
/// Nothing in it is mutated per request.
#[derive(Clone)]
pub struct AppState {
    /// User and relationship lookups.
    pub repo: RepositoryState,
    /// Seam to the external authentication subsystem.
    pub sessions: SessionResolverState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the default JWT resolver over the given repository.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let sessions: SessionResolverState =
            std::sync::Arc::new(JwtSessionResolver::new(repo.clone(), config.clone()));
        Self {
            repo,
            sessions,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionResolverState {
    fn from_ref(app_state: &AppState) -> SessionResolverState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, puts the request gate in front of all of them
/// (fallback included), and adds the observability layers outermost.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/api", api::api_routes())
        .merge(admin::admin_routes())
        // Pages rendered by the UI shell.
        .fallback(handlers::page_shell)
        // The gate sees every request; it skips excluded paths itself.
        .layer(middleware::from_fn_with_state(state.clone(), gate::intercept))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Puts the `x-request-id` into the per-request span so every log line for one
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
