use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{SessionResolver, SessionResolverState, resolve_session},
    classifier::{self, ProtectionClass},
    config::AppConfig,
};

/// Outcome of running the gate over one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    /// Redirect to this target (login path plus `callbackUrl`).
    Redirect(String),
}

/// `<login_path>?callbackUrl=<original path, percent-encoded>`
pub fn login_redirect_target(login_path: &str, original_path: &str) -> String {
    format!(
        "{login_path}?callbackUrl={}",
        urlencoding::encode(original_path)
    )
}

/// decide
///
/// Classification runs first and is free; the session is only resolved when
/// the path is primary-protected. Resolution failure denies, same as absence.
/// Admin-namespace paths always pass: their guard runs inside the handler.
pub async fn decide(
    path: &str,
    headers: &HeaderMap,
    resolver: &dyn SessionResolver,
    config: &AppConfig,
) -> GateDecision {
    if !classifier::is_gated(path) {
        return GateDecision::PassThrough;
    }

    let classes = classifier::classify(path);
    if classes.contains(ProtectionClass::AdminNamespace) {
        tracing::debug!(path, "admin namespace; deferring to elevated session guard");
        return GateDecision::PassThrough;
    }
    if !classes.requires_primary_session() {
        return GateDecision::PassThrough;
    }

    match resolve_session(resolver, headers, config.session_timeout).await {
        Ok(Some(_)) => GateDecision::PassThrough,
        Ok(None) => {
            tracing::info!(path, "no primary session; redirecting to login");
            GateDecision::Redirect(login_redirect_target(&config.login_path, path))
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "session resolution failed; denying");
            GateDecision::Redirect(login_redirect_target(&config.login_path, path))
        }
    }
}

/// intercept
///
/// Router-wide middleware. Never touches session state and never alters a
/// request it lets through.
pub async fn intercept(
    State(resolver): State<SessionResolverState>,
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let decision = decide(&path, request.headers(), resolver.as_ref(), &config).await;

    match decision {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
