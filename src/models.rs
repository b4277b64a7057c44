use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// User
///
/// The canonical identity record stored in the `profiles` table. The gateway only
/// needs to know the user exists and which role they carry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // 'member' or 'admin'. Only consulted by the hardened admin guard.
    pub role: String,
}

// --- Response Payloads ---

/// FollowStatus
///
/// Body of `GET /api/follows/check`. Anonymous callers and failed lookups both
/// come back as `following: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FollowStatus {
    pub following: bool,
}

/// ErrorBody
///
/// Machine-readable reason attached to 400-class responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

/// LoginShell
///
/// What `GET /login` hands back to the external login page: the path the
/// caller should return to once authenticated.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginShell {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// PageShell
///
/// Placeholder body for paths rendered by the external UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageShell {
    pub path: String,
}

/// AdminSessionStatus
///
/// Result of consulting the elevated session guard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminSessionStatus {
    pub valid: bool,
    // Milliseconds until the elevated session lapses, when valid.
    pub expires_in_ms: Option<i64>,
}
