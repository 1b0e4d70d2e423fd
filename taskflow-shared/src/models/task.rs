/// Task model and database operations
///
/// This module provides the Task model representing a single to-do item owned
/// by exactly one user. Every query that reads or mutates a task by ID is
/// scoped by `user_id`, so a non-owner sees the same result as for a task that
/// does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     reminder_date TIMESTAMPTZ,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::task::{Task, CreateTask, Priority};
/// use taskflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     user_id: Uuid::new_v4(),
///     title: "Buy milk".to_string(),
///     description: None,
///     priority: Priority::Medium,
///     due_date: None,
///     reminder_date: None,
/// }).await?;
///
/// let found = Task::find_by_id_and_user(&pool, task.id, task.user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,

    /// Used when a quick-add omits the priority
    #[default]
    Medium,

    High,
}

impl Priority {
    /// All priorities, lowest first
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Converts priority to its wire/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Ordinal used for sorting: high=3, medium=2, low=1
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority '{}', expected one of: low, medium, high",
                other
            )),
        }
    }
}

/// Task model representing a single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user, immutable after creation
    pub user_id: Uuid,

    /// Non-empty, trimmed title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    pub priority: Priority,

    /// When the task is due
    pub due_date: Option<DateTime<Utc>>,

    /// When a reminder should fire (date and time-of-day already merged)
    pub reminder_date: Option<DateTime<Utc>>,

    /// Completion flag; may be toggled in both directions
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Validated task payload without an owner
///
/// Produced by [`crate::validation::validate_create`]; the request layer binds it
/// to the authenticated user with [`CreateTask::from_draft`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_date: Option<DateTime<Utc>>,
}

/// Input for creating a new task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owner, taken from the authenticated session
    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    pub due_date: Option<DateTime<Utc>>,

    pub reminder_date: Option<DateTime<Utc>>,
}

impl CreateTask {
    /// Binds a validated draft to its owner
    pub fn from_draft(user_id: Uuid, draft: TaskDraft) -> Self {
        Self {
            user_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            reminder_date: draft.reminder_date,
        }
    }
}

/// Partial update of a task's mutable fields
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub reminder_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

/// Result of merging a patch onto a task
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    /// The merged record
    pub task: Task,

    /// Whether the record must be written (and `updated_at` refreshed)
    pub changed: bool,
}

impl TaskPatch {
    /// Returns true if the patch names no field at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.reminder_date.is_none()
            && self.completed.is_none()
    }

    /// Merges the patch onto `task`
    ///
    /// `updated_at` is set to `now` when at least one value differs from the
    /// current record, or when the patch is empty (an explicit touch). A patch
    /// that only repeats current values leaves the record untouched, so
    /// re-applying the same patch is a no-op.
    pub fn apply_to(&self, task: &Task, now: DateTime<Utc>) -> PatchOutcome {
        let mut merged = task.clone();

        if let Some(ref title) = self.title {
            merged.title = title.clone();
        }
        if let Some(ref description) = self.description {
            merged.description = description.clone();
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = due_date;
        }
        if let Some(reminder_date) = self.reminder_date {
            merged.reminder_date = reminder_date;
        }
        if let Some(completed) = self.completed {
            merged.completed = completed;
        }

        let changed = self.is_empty() || merged != *task;
        if changed {
            merged.updated_at = now;
        }

        PatchOutcome {
            task: merged,
            changed,
        }
    }
}

const TASK_COLUMNS: &str = "id, user_id, title, description, priority, due_date, reminder_date, \
                            completed, created_at, updated_at";

impl Task {
    /// Creates a new task
    ///
    /// The database assigns `id`, `created_at`, `updated_at` and
    /// `completed = false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the database operation fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, due_date, reminder_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.reminder_date)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID with owner isolation
    ///
    /// Returns `None` both when the task does not exist and when it belongs to
    /// another user.
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists every task owned by a user, in no particular order
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Applies a patch to a task owned by `user_id`
    ///
    /// The row is locked with `SELECT ... FOR UPDATE`, merged with
    /// [`TaskPatch::apply_to`], and written back inside one transaction. When
    /// the patch changes nothing the stored row is returned as-is.
    pub async fn update_with_patch(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2 FOR UPDATE",
            TASK_COLUMNS
        );
        let current = sqlx::query_as::<_, Task>(&select)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let outcome = patch.apply_to(&current, Utc::now());
        if !outcome.changed {
            tx.commit().await?;
            return Ok(Some(current));
        }

        let merged = outcome.task;
        let update = format!(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                priority = $5,
                due_date = $6,
                reminder_date = $7,
                completed = $8,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&update)
            .bind(id)
            .bind(user_id)
            .bind(merged.title)
            .bind(merged.description)
            .bind(merged.priority)
            .bind(merged.due_date)
            .bind(merged.reminder_date)
            .bind(merged.completed)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Deletes a task owned by `user_id`
    ///
    /// Returns true if a row was removed.
    pub async fn delete_with_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
