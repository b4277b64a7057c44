//! Elevated (admin) session guard.
//!
//! A self-contained, caller-local session with an absolute expiry, independent
//! of the primary session. Lifecycle:
//!
//! ```text
//! NoSession --establish--> ValidSession --(expiry observed | clear)--> NoSession
//! ```
//!
//! There is no refresh. Expired records are evicted lazily by whichever
//! `is_valid` call first observes the expiry; nothing sweeps them on a timer.

use axum::{
    http::{HeaderMap, HeaderValue, header},
    response::Response,
};
use std::{collections::HashMap, time::Duration};
use uuid::Uuid;

use crate::cookies;

pub const AUTHENTICATED_KEY: &str = "admin_authenticated";
pub const TOKEN_KEY: &str = "admin_token";
pub const EXPIRY_KEY: &str = "admin_session_expiry";

const KEYS: [&str; 3] = [AUTHENTICATED_KEY, TOKEN_KEY, EXPIRY_KEY];

/// Caller-local string storage the elevated session lives in.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// Wall clock in epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// MemoryStore
///
/// Plain in-process map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// CookieStore
///
/// The caller's cookie jar as seen by one request. Reads come from the
/// `Cookie` header snapshot (plus any writes made since); writes and removals
/// are queued and emitted as `Set-Cookie` headers by [`CookieStore::apply`].
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    current: HashMap<String, String>,
    // None marks a removal.
    pending: Vec<(String, Option<String>)>,
}

impl CookieStore {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        // First occurrence wins, matching `cookies::value`.
        let mut current = HashMap::new();
        for (name, value) in cookies::parse(headers) {
            if KEYS.contains(&name.as_str()) {
                current.entry(name).or_insert(value);
            }
        }
        Self {
            current,
            pending: Vec::new(),
        }
    }

    /// Rendered `Set-Cookie` values for every queued change, in order.
    pub fn set_cookie_values(&self) -> Vec<HeaderValue> {
        self.pending
            .iter()
            .filter_map(|(name, value)| {
                let raw = match value {
                    Some(value) => format!("{name}={value}; Path=/; SameSite=Lax"),
                    None => format!("{name}=; Path=/; Max-Age=0; SameSite=Lax"),
                };
                HeaderValue::from_str(&raw).ok()
            })
            .collect()
    }

    /// Appends the queued changes to an outgoing response.
    pub fn apply(&self, response: &mut Response) {
        for value in self.set_cookie_values() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

impl SessionStore for CookieStore {
    fn get(&self, key: &str) -> Option<String> {
        self.current.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.current.insert(key.to_string(), value.clone());
        self.pending.push((key.to_string(), Some(value)));
    }

    fn remove(&mut self, key: &str) {
        if self.current.remove(key).is_some() {
            self.pending.push((key.to_string(), None));
        }
    }
}

/// ElevatedSessionGuard
///
/// Synchronous checks over a [`SessionStore`]. Advisory only: the store is
/// under the caller's control, so this gates UI, not data.
pub struct ElevatedSessionGuard<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SessionStore> ElevatedSessionGuard<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: SessionStore, C: Clock> ElevatedSessionGuard<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// is_valid
    ///
    /// True iff the flag is `"true"`, a non-empty token is present, and the
    /// stored expiry lies strictly in the future. An expired or unreadable
    /// expiry clears the record before returning false; a record with missing
    /// fields is left as found.
    pub fn is_valid(&mut self) -> bool {
        self.remaining_millis().is_some()
    }

    /// Milliseconds left on a valid session, with the same eviction side
    /// effect as [`is_valid`](Self::is_valid).
    pub fn remaining_millis(&mut self) -> Option<i64> {
        let authenticated = self.store.get(AUTHENTICATED_KEY);
        let token = self.store.get(TOKEN_KEY).filter(|token| !token.is_empty());
        let expiry = self.store.get(EXPIRY_KEY);

        let (Some(flag), Some(_), Some(expiry)) = (authenticated, token, expiry) else {
            return None;
        };
        if flag != "true" {
            return None;
        }

        let Ok(expires_at) = expiry.trim().parse::<i64>() else {
            tracing::warn!("elevated session expiry unreadable; clearing");
            self.clear();
            return None;
        };

        let now = self.clock.now_millis();
        if now >= expires_at {
            tracing::debug!(expires_at, now, "elevated session expired; clearing");
            self.clear();
            return None;
        }
        Some(expires_at - now)
    }

    /// Removes all three fields. Idempotent.
    pub fn clear(&mut self) {
        for key in KEYS {
            self.store.remove(key);
        }
    }

    /// establish
    ///
    /// Login hook: writes flag, token and expiry together and returns the
    /// absolute expiry. Any previous elevated session is replaced.
    pub fn establish(&mut self, token: &str, ttl: Duration) -> i64 {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = self.clock.now_millis().saturating_add(ttl_ms);
        self.store.set(AUTHENTICATED_KEY, "true".to_string());
        self.store.set(TOKEN_KEY, token.to_string());
        self.store.set(EXPIRY_KEY, expires_at.to_string());
        expires_at
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// Fresh opaque token for a newly established elevated session.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}
