#![allow(dead_code)]

use jsonwebtoken::{EncodingKey, Header, encode};
use stack_gate::{
    AppConfig, AppState, InMemoryRepository,
    auth::Claims,
    config::Env,
    models::User,
    repository::RepositoryState,
};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const MEMBER_ID: Uuid = Uuid::from_u128(1);
pub const ADMIN_ID: Uuid = Uuid::from_u128(2);
pub const SUBJECT_ID: Uuid = Uuid::from_u128(3);

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Signs a token for `user_id` whose expiry is `exp_offset` seconds from now
/// (negative for an already expired token).
pub fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    let now = now_secs() as i64;
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

pub fn bearer(user_id: Uuid) -> String {
    format!("Bearer {}", create_token(user_id, 3600))
}

pub fn user(id: Uuid, role: &str) -> User {
    User {
        id,
        email: format!("{}@example.com", id.simple()),
        role: role.to_string(),
    }
}

/// Member and admin users, with the member following `SUBJECT_ID`.
pub fn seeded_repo() -> Arc<InMemoryRepository> {
    Arc::new(
        InMemoryRepository::new()
            .with_user(user(MEMBER_ID, "member"))
            .with_user(user(ADMIN_ID, "admin"))
            .with_user(user(SUBJECT_ID, "member"))
            .with_follow(MEMBER_ID, SUBJECT_ID),
    )
}

pub fn test_config(env: Env) -> AppConfig {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config
}

pub fn app_state(repo: Arc<InMemoryRepository>, config: AppConfig) -> AppState {
    AppState::new(repo as RepositoryState, config)
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
