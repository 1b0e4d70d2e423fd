/// PostgreSQL store implementations
///
/// Thin wrappers over the model methods in [`crate::models`] that translate
/// `sqlx::Error` into [`StoreError`] and log each operation: `debug` for reads,
/// `info` for mutations, `error` for failures.

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use super::{session_expiry, SessionStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::auth::session::{hash_session_token, SessionToken};
use crate::models::session::Session;
use crate::models::task::{CreateTask, Task, TaskPatch};
use crate::models::user::{CreateUser, User};

fn log_failure(operation: &'static str, err: sqlx::Error) -> StoreError {
    let err = StoreError::from(err);
    match &err {
        StoreError::Conflict(_) => tracing::info!(operation, error = %err, "Store conflict"),
        StoreError::Unavailable(_) => tracing::error!(operation, error = %err, "Store operation failed"),
    }
    err
}

/// Users table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        tracing::debug!(user_id = %id, "Fetching user by id");
        User::find_by_id(&self.pool, id)
            .await
            .map_err(|e| log_failure("user.find_by_id", e))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        tracing::debug!(username = %username, "Fetching user by username");
        User::find_by_username(&self.pool, username)
            .await
            .map_err(|e| log_failure("user.find_by_username", e))
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let user = User::create(&self.pool, data)
            .await
            .map_err(|e| log_failure("user.create", e))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }
}

/// Tasks table
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = Task::list_by_user(&self.pool, user_id)
            .await
            .map_err(|e| log_failure("task.list", e))?;

        tracing::debug!(user_id = %user_id, count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Task>> {
        tracing::debug!(task_id = %id, user_id = %user_id, "Fetching task");
        Task::find_by_id_and_user(&self.pool, id, user_id)
            .await
            .map_err(|e| log_failure("task.get", e))
    }

    async fn create(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::create(&self.pool, data)
            .await
            .map_err(|e| log_failure("task.create", e))?;

        tracing::info!(task_id = %task.id, user_id = %task.user_id, "Task created");
        Ok(task)
    }

    async fn update(&self, id: Uuid, user_id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let task = Task::update_with_patch(&self.pool, id, user_id, patch)
            .await
            .map_err(|e| log_failure("task.update", e))?;

        if task.is_some() {
            tracing::info!(task_id = %id, user_id = %user_id, "Task updated");
        }
        Ok(task)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let deleted = Task::delete_with_user(&self.pool, id, user_id)
            .await
            .map_err(|e| log_failure("task.delete", e))?;

        if deleted {
            tracing::info!(task_id = %id, user_id = %user_id, "Task deleted");
        }
        Ok(deleted)
    }
}

/// Sessions table
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> StoreResult<SessionToken> {
        let expires_at = session_expiry(ttl).map_err(|e| {
            tracing::error!(operation = "session.create", error = %e, "Store operation failed");
            e
        })?;
        let token = SessionToken::generate();

        Session::create(&self.pool, &token.digest(), user_id, expires_at)
            .await
            .map_err(|e| log_failure("session.create", e))?;

        tracing::debug!(user_id = %user_id, %expires_at, "Session stored");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> StoreResult<Option<Uuid>> {
        let session = Session::find_active(&self.pool, &hash_session_token(token))
            .await
            .map_err(|e| log_failure("session.resolve", e))?;

        Ok(session.map(|s| s.user_id))
    }

    async fn destroy(&self, token: &str) -> StoreResult<bool> {
        Session::delete(&self.pool, &hash_session_token(token))
            .await
            .map_err(|e| log_failure("session.destroy", e))
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let removed = Session::delete_expired(&self.pool)
            .await
            .map_err(|e| log_failure("session.purge_expired", e))?;

        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}
