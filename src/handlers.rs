use crate::{
    auth::{MaybeSession, PrimarySession, SessionResolverState, resolve_session},
    config::{AdminGuardMode, AppConfig},
    elevated::{self, CookieStore, ElevatedSessionGuard},
    error::ApiError,
    models::{AdminSessionStatus, FollowStatus, LoginShell, PageShell},
    repository::RepositoryState,
};
use axum::{
    Json,
    extract::{OriginalUri, Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

/// Private to the caller, fresh for 30s, then served stale for up to 60s
/// more while a revalidation runs.
pub const FOLLOW_CACHE_CONTROL: &str = "private, max-age=30, stale-while-revalidate=60";

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

// --- Query Structs ---

/// FollowQuery
///
/// `userId` is kept as a raw string so a malformed identifier can be told apart
/// from a missing one.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct FollowQuery {
    /// The subject whose follower relationship is checked.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct LoginQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// --- Relationship Query Endpoint ---

/// check_follow
///
/// [API Route] Does the caller follow `userId`?
///
/// *Leniency*: anonymous callers get `following: false`, not 401. Lookup
/// failures (store down, malformed id) are logged and also answered with
/// `false`. Only a missing `userId` or an undecodable query string is
/// reported, as a 400 with an `error` body.
#[utoipa::path(
    get,
    path = "/api/follows/check",
    params(FollowQuery),
    responses(
        (status = 200, description = "Relationship status", body = FollowStatus),
        (status = 400, description = "Missing userId or undecodable query string", body = crate::models::ErrorBody)
    )
)]
pub async fn check_follow(
    MaybeSession(session): MaybeSession,
    State(repo): State<RepositoryState>,
    query: Result<Query<FollowQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let subject = query
        .user_id
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(ApiError::MissingParameter("userId"))?;

    let following = match session {
        None => false,
        Some(session) => lookup_follow(&repo, session.user_id, &subject).await,
    };

    let mut response = Json(FollowStatus { following }).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(FOLLOW_CACHE_CONTROL),
    );
    Ok(response)
}

// Fail soft: every failure path reads as "not following".
async fn lookup_follow(repo: &RepositoryState, follower: Uuid, subject: &str) -> bool {
    let subject_id = match Uuid::parse_str(subject.trim()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(subject, error = %e, "malformed follow subject");
            return false;
        }
    };

    match repo.is_following(follower, subject_id).await {
        Ok(following) => following,
        Err(e) => {
            tracing::error!(%follower, subject = %subject_id, error = %e, "follow lookup failed");
            false
        }
    }
}

// --- Elevated Session Lifecycle ---

/// get_admin_session
///
/// [API Route] Reports whether the caller's elevated session is valid. An
/// expired session is cleared on the way out.
#[utoipa::path(
    get,
    path = "/api/admin/session",
    responses((status = 200, description = "Elevated session status", body = AdminSessionStatus))
)]
pub async fn get_admin_session(headers: HeaderMap) -> Response {
    let mut guard = ElevatedSessionGuard::new(CookieStore::from_headers(&headers));
    let remaining = guard.remaining_millis();

    let mut response = Json(AdminSessionStatus {
        valid: remaining.is_some(),
        expires_in_ms: remaining,
    })
    .into_response();
    guard.store().apply(&mut response);
    response
}

/// create_admin_session
///
/// [API Route] Establishes an elevated session. Requires a primary session
/// whose stored role is `admin`; the role is checked server-side here even
/// though the resulting session is only a caller-held hint.
#[utoipa::path(
    post,
    path = "/api/admin/session",
    responses(
        (status = 200, description = "Elevated session established", body = AdminSessionStatus),
        (status = 401, description = "No primary session"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_admin_session(
    session: PrimarySession,
    State(config): State<AppConfig>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    if !session.is_admin() {
        tracing::info!(user_id = %session.user_id, "elevated session refused; role is not admin");
        return Err(StatusCode::FORBIDDEN);
    }

    let mut guard = ElevatedSessionGuard::new(CookieStore::from_headers(&headers));
    guard.establish(&elevated::new_token(), config.admin_session_ttl);
    let remaining = guard.remaining_millis();
    tracing::info!(user_id = %session.user_id, "elevated session established");

    let mut response = Json(AdminSessionStatus {
        valid: remaining.is_some(),
        expires_in_ms: remaining,
    })
    .into_response();
    guard.store().apply(&mut response);
    Ok(response)
}

/// delete_admin_session
///
/// [API Route] Logout. Clearing an absent session is a no-op, still 204.
#[utoipa::path(
    delete,
    path = "/api/admin/session",
    responses((status = 204, description = "Elevated session cleared"))
)]
pub async fn delete_admin_session(headers: HeaderMap) -> Response {
    let mut guard = ElevatedSessionGuard::new(CookieStore::from_headers(&headers));
    guard.clear();

    let mut response = StatusCode::NO_CONTENT.into_response();
    guard.store().apply(&mut response);
    response
}

// --- Shells ---

/// login_shell
///
/// [Public Route] Hands the login page the path to return to. The credential
/// exchange itself belongs to the external authentication subsystem.
#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login shell", body = LoginShell),
        (status = 400, description = "Undecodable query string", body = crate::models::ErrorBody)
    )
)]
pub async fn login_shell(
    query: Result<Query<LoginQuery>, QueryRejection>,
) -> Result<Json<LoginShell>, ApiError> {
    let Query(query) = query?;
    Ok(Json(LoginShell {
        callback_url: query.callback_url,
    }))
}

/// page_shell
///
/// Fallback for every path rendered by the UI. Reaching it means the gate let
/// the request through.
pub async fn page_shell(OriginalUri(uri): OriginalUri) -> Json<PageShell> {
    Json(PageShell {
        path: uri.path().to_string(),
    })
}

/// admin_shell
///
/// Admin pages consult the elevated session guard at render time. In
/// `EdgeRole` mode the primary session must also carry the admin role.
/// Denials go to the admin login page, carrying any cookie clears.
pub async fn admin_shell(
    State(resolver): State<SessionResolverState>,
    State(config): State<AppConfig>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let mut guard = ElevatedSessionGuard::new(CookieStore::from_headers(&headers));
    let mut allowed = guard.is_valid();

    if allowed && config.admin_guard_mode == AdminGuardMode::EdgeRole {
        allowed = match resolve_session(resolver.as_ref(), &headers, config.session_timeout).await
        {
            Ok(Some(session)) => session.is_admin(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "admin role check failed; denying");
                false
            }
        };
    }

    let mut response = if allowed {
        Json(PageShell {
            path: uri.path().to_string(),
        })
        .into_response()
    } else {
        tracing::debug!(path = uri.path(), "elevated session missing; sending to admin login");
        Redirect::temporary(ADMIN_LOGIN_PATH).into_response()
    };
    guard.store().apply(&mut response);
    response
}
