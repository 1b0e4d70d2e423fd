/// In-memory store implementations
///
/// Process-local maps behind `tokio::sync::RwLock`. Used by the test suites and
/// by `STORAGE_BACKEND=memory`; contents are lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{session_expiry, SessionStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::auth::session::{hash_session_token, SessionToken};
use crate::models::task::{CreateTask, Task, TaskPatch};
use crate::models::user::{CreateUser, User};

/// Users keyed by id
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        // Uniqueness check and insert under one write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict(format!(
                "Constraint violation: users_username_key ({})",
                data.username
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }
}

/// Tasks keyed by id
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // HashMap order is arbitrary; give callers insertion order
        owned.sort_by_key(|t| t.created_at);

        tracing::debug!(user_id = %user_id, count = owned.len(), "Fetched tasks");
        Ok(owned)
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| t.user_id == user_id).cloned())
    }

    async fn create(&self, data: CreateTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            due_date: data.due_date,
            reminder_date: data.reminder_date,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(task.id, task.clone());

        tracing::info!(task_id = %task.id, user_id = %task.user_id, "Task created");
        Ok(task)
    }

    async fn update(&self, id: Uuid, user_id: Uuid, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(current) = tasks.get_mut(&id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };

        let outcome = patch.apply_to(current, Utc::now());
        if outcome.changed {
            *current = outcome.task;
            tracing::info!(task_id = %id, user_id = %user_id, "Task updated");
        }

        Ok(Some(current.clone()))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).is_some_and(|t| t.user_id == user_id);
        if owned {
            tasks.remove(&id);
            tracing::info!(task_id = %id, user_id = %user_id, "Task deleted");
        }
        Ok(owned)
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Sessions keyed by token digest
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> StoreResult<SessionToken> {
        let expires_at = session_expiry(ttl)?;
        let token = SessionToken::generate();
        let entry = SessionEntry {
            user_id,
            expires_at,
        };
        self.sessions.write().await.insert(token.digest(), entry);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> StoreResult<Option<Uuid>> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        Ok(sessions
            .get(&hash_session_token(token))
            .filter(|s| s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn destroy(&self, token: &str) -> StoreResult<bool> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&hash_session_token(token));
        Ok(removed.is_some())
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
