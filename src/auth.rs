use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    cookies,
    error::SessionError,
    repository::RepositoryState,
};

/// Claims
///
/// Payload expected inside a primary-session JWT. Issued by the external
/// authentication subsystem; the gateway only verifies and reads it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, confirmed against the `profiles` table.
    pub sub: Uuid,
    /// Expiration Time (exp): the token is rejected once this passes.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// PrimarySession
///
/// The caller's resolved identity for the duration of one request. Read-only;
/// never cached between requests or persisted by the gateway.
#[derive(Debug, Clone)]
pub struct PrimarySession {
    pub user_id: Uuid,
    /// Role as currently stored for the user, not as remembered by the token.
    pub role: String,
    pub token: String,
}

impl PrimarySession {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// SessionResolver
///
/// Seam to the external authentication subsystem. `Ok(None)` means "no valid
/// session"; `Err` means the subsystem could not answer.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<PrimarySession>, SessionError>;
}

/// SessionResolverState
///
/// Shared handle to the resolver held in the application state.
pub type SessionResolverState = Arc<dyn SessionResolver>;

/// resolve_session
///
/// Runs a resolver under a deadline. An elapsed deadline is reported as
/// `SessionError::Timeout`, which every caller handles like any other failure.
/// Dropping the returned future abandons the resolution with nothing retained.
pub async fn resolve_session(
    resolver: &dyn SessionResolver,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<Option<PrimarySession>, SessionError> {
    match tokio::time::timeout(timeout, resolver.resolve(headers)).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Timeout),
    }
}

/// JwtSessionResolver
///
/// Default resolver. The process:
/// 1. Local bypass: in `Env::Local`, an `x-user-id` header naming a stored user.
/// 2. Token extraction: `Authorization: Bearer <jwt>`, else the session cookie.
/// 3. JWT decoding with mandatory `exp` validation.
/// 4. User lookup, so deleted users lose access before their token expires.
pub struct JwtSessionResolver {
    repo: RepositoryState,
    config: AppConfig,
}

impl JwtSessionResolver {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }

    fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        bearer.or_else(|| cookies::value(headers, &self.config.session_cookie))
    }

    async fn local_bypass(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<PrimarySession>, SessionError> {
        let Some(user_id) = headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
        else {
            return Ok(None);
        };

        Ok(self.repo.get_user(user_id).await?.map(|user| PrimarySession {
            user_id: user.id,
            role: user.role,
            token: format!("local-bypass:{}", user.id),
        }))
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<PrimarySession>, SessionError> {
        if self.config.env == Env::Local {
            if let Some(session) = self.local_bypass(headers).await? {
                return Ok(Some(session));
            }
        }

        let Some(token) = self.extract_token(headers) else {
            return Ok(None);
        };

        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let claims = match decode::<Claims>(&token, &decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("primary session token expired"),
                    kind => tracing::debug!(?kind, "primary session token rejected"),
                }
                return Ok(None);
            }
        };

        let session = self
            .repo
            .get_user(claims.sub)
            .await?
            .map(|user| PrimarySession {
                user_id: user.id,
                role: user.role,
                token,
            });

        if session.is_none() {
            tracing::debug!(user_id = %claims.sub, "token subject has no profile");
        }
        Ok(session)
    }
}

/// MaybeSession
///
/// Lenient extractor: resolves the primary session if there is one and never
/// rejects. Resolution failures are logged and reported as `None`.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<PrimarySession>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SessionResolverState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolver = SessionResolverState::from_ref(state);
        let config = AppConfig::from_ref(state);

        match resolve_session(resolver.as_ref(), &parts.headers, config.session_timeout).await {
            Ok(session) => Ok(MaybeSession(session)),
            Err(e) => {
                tracing::warn!(error = %e, "session resolution failed; treating caller as anonymous");
                Ok(MaybeSession(None))
            }
        }
    }
}

/// Strict extractor: rejects with 401 when no session can be resolved,
/// including when resolution fails.
impl<S> FromRequestParts<S> for PrimarySession
where
    S: Send + Sync,
    SessionResolverState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state)
            .await
            .unwrap_or(MaybeSession(None));
        session.ok_or(StatusCode::UNAUTHORIZED)
    }
}
