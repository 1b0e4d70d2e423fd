/// Task view engine: filtering, free-text search and sorting
///
/// [`apply`] is a pure, synchronous transform from a task collection and a
/// [`TaskView`] to the ordered list a caller sees. The input slice is never
/// mutated.
///
/// # Pipeline
///
/// ```text
/// tasks ─> filter (all | pending | completed | high-priority)
///       ─> search (case-insensitive substring of title or description)
///       ─> stable sort (dueDate | priority | createdAt | title, asc | desc)
/// ```
///
/// # Example
///
/// ```
/// use taskflow_shared::query::{apply, TaskView, TaskFilter};
///
/// let view = TaskView {
///     filter: TaskFilter::Pending,
///     search: Some("report".to_string()),
///     ..Default::default()
/// };
/// let visible = apply(&[], &view);
/// assert!(visible.is_empty());
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::task::{Priority, Task};
use crate::validation::{FieldError, ValidationFailure};

/// Which subset of tasks to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
    /// High priority and not yet completed
    HighPriority,
}

impl TaskFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Pending => "pending",
            TaskFilter::Completed => "completed",
            TaskFilter::HighPriority => "high-priority",
        }
    }

    /// Returns true if `task` belongs to this subset
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
            TaskFilter::HighPriority => task.priority == Priority::High && !task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" => Ok(TaskFilter::Completed),
            "high-priority" => Ok(TaskFilter::HighPriority),
            other => Err(format!(
                "Invalid filter '{}', expected one of: all, pending, completed, high-priority",
                other
            )),
        }
    }
}

/// Sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    DueDate,
    Priority,
    #[default]
    CreatedAt,
    Title,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DueDate => "dueDate",
            SortKey::Priority => "priority",
            SortKey::CreatedAt => "createdAt",
            SortKey::Title => "title",
        }
    }

    /// Ascending comparison of two tasks under this key
    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::DueDate => due_date_key(a).cmp(&due_date_key(b)),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dueDate" => Ok(SortKey::DueDate),
            "priority" => Ok(SortKey::Priority),
            "createdAt" => Ok(SortKey::CreatedAt),
            "title" => Ok(SortKey::Title),
            other => Err(format!(
                "Invalid sort key '{}', expected one of: dueDate, priority, createdAt, title",
                other
            )),
        }
    }
}

/// Missing due dates sort as the epoch, i.e. first in ascending order
fn due_date_key(task: &Task) -> i64 {
    task.due_date.map(|d| d.timestamp_millis()).unwrap_or(0)
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!(
                "Invalid sort direction '{}', expected asc or desc",
                other
            )),
        }
    }
}

/// Filter, search and sort choices for one listing
///
/// The default view shows all tasks, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub filter: TaskFilter,
    pub search: Option<String>,
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
}

impl fmt::Display for TaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filter={} sortBy={} sortDirection={}",
            self.filter.as_str(),
            self.sort_by.as_str(),
            self.sort_direction.as_str()
        )?;
        if let Some(ref search) = self.search {
            write!(f, " search={:?}", search)?;
        }
        Ok(())
    }
}

/// Raw view parameters as received in a query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl TaskView {
    /// Parses raw parameters, reporting every invalid one
    pub fn parse(params: &ViewParams) -> Result<Self, ValidationFailure> {
        let mut errors = Vec::new();
        let mut view = TaskView {
            search: params.search.clone(),
            ..Default::default()
        };

        if let Some(ref raw) = params.filter {
            match raw.parse() {
                Ok(filter) => view.filter = filter,
                Err(message) => errors.push(FieldError::new("filter", message)),
            }
        }
        if let Some(ref raw) = params.sort_by {
            match raw.parse() {
                Ok(key) => view.sort_by = key,
                Err(message) => errors.push(FieldError::new("sortBy", message)),
            }
        }
        if let Some(ref raw) = params.sort_direction {
            match raw.parse() {
                Ok(direction) => view.sort_direction = direction,
                Err(message) => errors.push(FieldError::new("sortDirection", message)),
            }
        }

        if !errors.is_empty() {
            return Err(ValidationFailure { errors });
        }
        Ok(view)
    }

    /// Normalized search needle, or `None` when search is empty/whitespace
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Returns true if `task` matches a lowercase needle
fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Applies a view to a task collection
///
/// Returns a new vector; equal sort keys keep their input order in both
/// directions.
pub fn apply(tasks: &[Task], view: &TaskView) -> Vec<Task> {
    let needle = view.needle();

    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| view.filter.matches(task))
        .filter(|task| needle.as_deref().map_or(true, |n| matches_search(task, n)))
        .cloned()
        .collect();

    // slice::sort_by is stable; reversing the comparator keeps ties in place
    let key = view.sort_by;
    match view.sort_direction {
        SortDirection::Asc => visible.sort_by(|a, b| key.compare(a, b)),
        SortDirection::Desc => visible.sort_by(|a, b| key.compare(a, b).reverse()),
    }

    visible
}

/// Per-filter task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub high_priority: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |filter: TaskFilter| tasks.iter().filter(|t| filter.matches(t)).count();

        Self {
            all: tasks.len(),
            pending: count(TaskFilter::Pending),
            completed: count(TaskFilter::Completed),
            high_priority: count(TaskFilter::HighPriority),
        }
    }
}

/// Due date has passed and the task is still open
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < now)
}

/// Reminder time has been reached and the task is still open
pub fn reminder_due(task: &Task, now: DateTime<Utc>) -> bool {
    !task.completed && task.reminder_date.is_some_and(|at| at <= now)
}

/// Open tasks whose reminder has fired, earliest reminder first
pub fn due_reminders(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut due: Vec<Task> = tasks
        .iter()
        .filter(|task| reminder_due(task, now))
        .cloned()
        .collect();
    due.sort_by_key(|task| task.reminder_date);
    due
}
