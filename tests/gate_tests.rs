mod common;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    middleware,
};
use common::*;
use stack_gate::{
    AppConfig, AppState, InMemoryRepository, SessionResolverState,
    auth::{PrimarySession, SessionResolver},
    config::Env,
    error::SessionError,
    gate,
    repository::RepositoryState,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tower::util::ServiceExt;

const PROTECTED_PREFIXES: [&str; 9] = [
    "/discover", "/stack-card", "/home", "/lists", "/projects", "/logs", "/profile", "/settings",
    "/onboarding",
];

// --- Test Resolvers ---

type Outcome = fn() -> Result<Option<PrimarySession>, SessionError>;

/// Counts calls and answers with a fixed outcome.
struct CountingResolver {
    calls: AtomicUsize,
    outcome: Outcome,
}

impl CountingResolver {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionResolver for CountingResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<Option<PrimarySession>, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

struct SlowResolver;

#[async_trait]
impl SessionResolver for SlowResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<Option<PrimarySession>, SessionError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Some(member_session()))
    }
}

fn member_session() -> PrimarySession {
    PrimarySession {
        user_id: MEMBER_ID,
        role: "member".to_string(),
        token: "tok".to_string(),
    }
}

fn absent() -> Result<Option<PrimarySession>, SessionError> {
    Ok(None)
}

fn present() -> Result<Option<PrimarySession>, SessionError> {
    Ok(Some(member_session()))
}

fn failing() -> Result<Option<PrimarySession>, SessionError> {
    Err(SessionError::Backend("auth subsystem down".to_string()))
}

// --- Helpers ---

/// The gate in front of a handler that always answers 200, so only the gate's
/// own decision is observed.
fn gated(sessions: SessionResolverState, config: AppConfig) -> Router {
    let state = AppState {
        repo: Arc::new(InMemoryRepository::new()) as RepositoryState,
        sessions,
        config,
    };
    Router::new()
        .fallback(|| async { "handler reached" })
        .layer(middleware::from_fn_with_state(state.clone(), gate::intercept))
        .with_state(state)
}

async fn send(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// --- Tests ---

#[tokio::test]
async fn test_settings_without_session_redirects_with_encoded_callback() {
    let app = gated(CountingResolver::new(absent), test_config(Env::Production));
    let response = send(app, "/settings/profile").await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?callbackUrl=%2Fsettings%2Fprofile");
}

#[tokio::test]
async fn test_every_protected_prefix_redirects_without_session() {
    for prefix in PROTECTED_PREFIXES {
        for path in [prefix.to_string(), format!("{prefix}/deep/page")] {
            let app = gated(CountingResolver::new(absent), test_config(Env::Production));
            let response = send(app, &path).await;

            assert!(response.status().is_redirection(), "{path}");
            assert_eq!(
                location(&response),
                format!("/login?callbackUrl={}", urlencoding::encode(&path)),
            );
        }
    }
}

#[tokio::test]
async fn test_protected_path_with_session_passes_through() {
    let resolver = CountingResolver::new(present);
    let app = gated(resolver.clone(), test_config(Env::Production));
    let response = send(app, "/home").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_admin_paths_pass_without_consulting_session() {
    let outcomes: [Outcome; 3] = [absent, present, failing];
    for outcome in outcomes {
        let resolver = CountingResolver::new(outcome);
        let app = gated(resolver.clone(), test_config(Env::Production));
        let response = send(app, "/admin/tools").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert_eq!(resolver.calls(), 0);
    }
}

#[tokio::test]
async fn test_public_paths_pass_and_never_resolve_a_session() {
    for path in ["/", "/login", "/about", "/tools/rust"] {
        let resolver = CountingResolver::new(absent);
        let app = gated(resolver.clone(), test_config(Env::Production));
        let response = send(app, path).await;

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(resolver.calls(), 0, "{path}");
    }
}

#[tokio::test]
async fn test_excluded_paths_skip_the_gate() {
    for path in ["/api/follows/check", "/_next/static/app.js", "/favicon.ico"] {
        let resolver = CountingResolver::new(absent);
        let app = gated(resolver.clone(), test_config(Env::Production));
        let response = send(app, path).await;

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(resolver.calls(), 0, "{path}");
    }
}

#[tokio::test]
async fn test_resolution_failure_fails_closed() {
    let app = gated(CountingResolver::new(failing), test_config(Env::Production));
    let response = send(app, "/lists/favourites").await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?callbackUrl=%2Flists%2Ffavourites");
}

#[tokio::test]
async fn test_resolution_timeout_fails_closed() {
    let mut config = test_config(Env::Production);
    config.session_timeout = Duration::from_millis(20);
    let app = gated(Arc::new(SlowResolver), config);

    let response = send(app, "/projects").await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?callbackUrl=%2Fprojects");
}

#[tokio::test]
async fn test_full_router_with_jwt_resolver() {
    let config = test_config(Env::Production);
    let app = stack_gate::create_router(app_state(seeded_repo(), config));

    // No token: denied.
    let response = send(app.clone(), "/discover").await;
    assert!(response.status().is_redirection());

    // Valid token: the page shell renders.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/discover")
                .header(header::AUTHORIZATION, bearer(MEMBER_ID))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["path"], "/discover");

    // Expired token: denied.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/discover")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", create_token(MEMBER_ID, -3600)),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn test_custom_login_path_is_honoured() {
    let mut config = test_config(Env::Production);
    config.login_path = "/signin".to_string();
    let app = gated(CountingResolver::new(absent), config);

    let response = send(app, "/onboarding").await;
    assert_eq!(location(&response), "/signin?callbackUrl=%2Fonboarding");
}
