use crate::{error::RepoError, models::User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};
use uuid::Uuid;

/// Repository Trait
///
/// The read-only contract the gateway needs from persistence: "does this user
/// exist" for session resolution and "does A follow B" for the relationship
/// endpoint. The store owns the truth; the gateway never writes to it.
///
/// **Send + Sync + async_trait** are required so `Arc<dyn Repository>` can be
/// shared across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Existence of the `(follower, subject)` relationship fact. Ordered pair:
    /// `is_following(a, b)` says nothing about `is_following(b, a)`.
    async fn is_following(&self, follower: Uuid, subject: Uuid) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// Backed by the `profiles` and `follows (follower_id, following_id)` tables.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// is_following
    ///
    /// Existence check only; the row itself is never read.
    async fn is_following(&self, follower: Uuid, subject: Uuid) -> Result<bool, RepoError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower)
        .bind(subject)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

/// InMemoryRepository
///
/// In-process store for tests and database-less local runs. Flip `set_failing`
/// to make every lookup return `RepoError::Unavailable`.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    follows: RwLock<HashSet<(Uuid, Uuid)>>,
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.insert_user(user);
        self
    }

    pub fn with_follow(self, follower: Uuid, subject: Uuid) -> Self {
        self.insert_follow(follower, subject);
        self
    }

    pub fn insert_user(&self, user: User) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id, user);
        }
    }

    pub fn insert_follow(&self, follower: Uuid, subject: Uuid) {
        if let Ok(mut follows) = self.follows.write() {
            follows.insert((follower, subject));
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("in-memory store set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        self.check_available()?;
        let users = self
            .users
            .read()
            .map_err(|e| RepoError::Unavailable(e.to_string()))?;
        Ok(users.get(&id).cloned())
    }

    async fn is_following(&self, follower: Uuid, subject: Uuid) -> Result<bool, RepoError> {
        self.check_available()?;
        let follows = self
            .follows
            .read()
            .map_err(|e| RepoError::Unavailable(e.to_string()))?;
        Ok(follows.contains(&(follower, subject)))
    }
}
