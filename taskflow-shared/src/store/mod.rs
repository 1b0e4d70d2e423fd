/// Persistence contracts for users, tasks and sessions
///
/// Each store is an `async_trait` with two implementations:
///
/// - `postgres`: sqlx-backed, used in production
/// - `memory`: `RwLock<HashMap>`-backed, used by tests and `STORAGE_BACKEND=memory`
///
/// [`Storage`] bundles one of each and is handed to the request layer at
/// startup, so every test can build its own isolated instance.
///
/// # Ownership
///
/// Every task operation that addresses a single row takes the caller's
/// `user_id`. A task owned by someone else is reported exactly like a missing
/// one (`None` / `false`).
///
/// # Example
///
/// ```
/// use taskflow_shared::store::Storage;
///
/// let storage = Storage::in_memory();
/// assert_eq!(storage.backend_name(), "memory");
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::session::SessionToken;
use crate::models::task::{CreateTask, Task, TaskPatch};
use crate::models::user::{CreateUser, User};

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other persistence fault; never retried by this crate
    #[error("Storage failure: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                StoreError::Conflict(format!("Constraint violation: {}", constraint))
            }
            other => StoreError::Unavailable(format!("Database error: {}", other)),
        }
    }
}

/// Expiry instant for a session created now
///
/// A lifetime that overflows the representable date range is a storage fault,
/// not a panic.
pub(crate) fn session_expiry(ttl: Duration) -> StoreResult<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| StoreError::Unavailable(format!("Session lifetime out of range: {}", ttl)))
}

/// User lookup and creation
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Conflict`] if the username is taken
    async fn create(&self, data: CreateUser) -> StoreResult<User>;
}

/// Owner-scoped task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `user_id`, unordered
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// The task if it exists and is owned by `user_id`
    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Task>>;

    /// Persists a new task with `completed = false`
    async fn create(&self, data: CreateTask) -> StoreResult<Task>;

    /// Merges `patch` onto the owned task; `None` if no such task
    async fn update(&self, id: Uuid, user_id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>>;

    /// Removes the owned task; false if none matched
    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

/// Server-side session bindings
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a session for `user_id` valid for `ttl`
    async fn create(&self, user_id: Uuid, ttl: Duration) -> StoreResult<SessionToken>;

    /// The user bound to an unexpired session, if any
    async fn resolve(&self, token: &str) -> StoreResult<Option<Uuid>>;

    /// Ends a session; false if it did not exist
    async fn destroy(&self, token: &str) -> StoreResult<bool>;

    /// Drops expired sessions, returning how many were removed
    async fn purge_expired(&self) -> StoreResult<u64>;
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory,
    Custom,
}

/// The set of stores injected into the request layer
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sessions: Arc<dyn SessionStore>,
    backend: Backend,
}

impl Storage {
    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserStore::new(pool.clone())),
            tasks: Arc::new(postgres::PgTaskStore::new(pool.clone())),
            sessions: Arc::new(postgres::PgSessionStore::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserStore::default()),
            tasks: Arc::new(memory::MemoryTaskStore::default()),
            sessions: Arc::new(memory::MemorySessionStore::default()),
            backend: Backend::Memory,
        }
    }

    /// Arbitrary store implementations (e.g. test doubles)
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            users,
            tasks,
            sessions,
            backend: Backend::Custom,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
            Backend::Custom => "custom",
        }
    }

    /// Verifies the backend is reachable
    pub async fn health_check(&self) -> StoreResult<()> {
        match self.backend {
            Backend::Postgres(ref pool) => crate::db::pool::health_check(pool)
                .await
                .map_err(StoreError::from),
            Backend::Memory | Backend::Custom => Ok(()),
        }
    }
}
