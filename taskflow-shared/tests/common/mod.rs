//! Store contract checks shared by the memory and PostgreSQL suites
//!
//! Every backend must behave identically for these sequences.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use taskflow_shared::auth::session::{SessionGate, SessionPolicy};
use taskflow_shared::models::task::{CreateTask, Priority, TaskPatch};
use taskflow_shared::models::user::CreateUser;
use taskflow_shared::query::{self, TaskView};
use taskflow_shared::store::{Storage, StoreError};
use taskflow_shared::validation::{validate_create, validate_update};
use uuid::Uuid;

/// Unique username so PostgreSQL runs do not collide
pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn create_user(storage: &Storage, prefix: &str) -> Uuid {
    storage
        .users
        .create(CreateUser {
            username: unique_username(prefix),
            password_hash: "$argon2id$placeholder".to_string(),
        })
        .await
        .expect("user should be created")
        .id
}

pub async fn user_uniqueness(storage: &Storage) {
    let username = unique_username("dup");
    let data = CreateUser {
        username: username.clone(),
        password_hash: "$argon2id$placeholder".to_string(),
    };

    let user = storage.users.create(data.clone()).await.unwrap();
    assert!(matches!(
        storage.users.create(data).await,
        Err(StoreError::Conflict(_))
    ));

    let by_name = storage.users.find_by_username(&username).await.unwrap();
    assert_eq!(by_name.map(|u| u.id), Some(user.id));
    let by_id = storage.users.find_by_id(user.id).await.unwrap();
    assert_eq!(by_id.map(|u| u.username), Some(username));
}

pub async fn task_lifecycle(storage: &Storage) {
    let owner = create_user(storage, "owner").await;
    let other = create_user(storage, "other").await;

    let draft = validate_create(&json!({
        "title": "  Write report ",
        "priority": "high",
        "dueDate": "2030-01-15",
        "reminderDate": "2030-01-14",
        "reminderTime": "09:30"
    }))
    .unwrap();
    let task = storage
        .tasks
        .create(CreateTask::from_draft(owner, draft))
        .await
        .unwrap();

    assert_eq!(task.title, "Write report");
    assert_eq!(task.priority, Priority::High);
    assert!(!task.completed);
    assert_eq!(
        task.reminder_date,
        Some(Utc.with_ymd_and_hms(2030, 1, 14, 9, 30, 0).unwrap())
    );

    // Ownership isolation
    assert!(storage.tasks.get(task.id, other).await.unwrap().is_none());
    assert!(storage.tasks.list(other).await.unwrap().is_empty());
    assert!(!storage.tasks.delete(task.id, other).await.unwrap());

    let patch = validate_update(&json!({ "completed": true, "description": "Q1" })).unwrap();
    let updated = storage
        .tasks
        .update(task.id, owner, &patch)
        .await
        .unwrap()
        .expect("owned task should update");
    assert!(updated.completed);
    assert_eq!(updated.description.as_deref(), Some("Q1"));
    assert_eq!(updated.created_at, task.created_at);
    assert!(updated.updated_at >= task.updated_at);

    // Re-applying the same patch is a no-op
    let again = storage
        .tasks
        .update(task.id, owner, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.updated_at, updated.updated_at);

    let clear = validate_update(&json!({ "dueDate": null })).unwrap();
    let cleared = storage
        .tasks
        .update(task.id, owner, &clear)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.due_date, None);

    assert!(storage.tasks.delete(task.id, owner).await.unwrap());
    assert!(storage.tasks.get(task.id, owner).await.unwrap().is_none());
    assert!(storage
        .tasks
        .update(task.id, owner, &TaskPatch::default())
        .await
        .unwrap()
        .is_none());
}

pub async fn listing_through_query_engine(storage: &Storage) {
    let owner = create_user(storage, "lister").await;

    for (title, priority) in [
        ("Buy milk", "low"),
        ("Call plumber", "high"),
        ("File taxes", "medium"),
    ] {
        let draft = validate_create(&json!({ "title": title, "priority": priority })).unwrap();
        storage
            .tasks
            .create(CreateTask::from_draft(owner, draft))
            .await
            .unwrap();
    }

    let tasks = storage.tasks.list(owner).await.unwrap();
    assert_eq!(tasks.len(), 3);

    let view: TaskView = TaskView {
        sort_by: query::SortKey::Priority,
        sort_direction: query::SortDirection::Desc,
        ..Default::default()
    };
    let titles: Vec<String> = query::apply(&tasks, &view)
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Call plumber", "File taxes", "Buy milk"]);

    let counts = query::TaskCounts::from_tasks(&tasks);
    assert_eq!(counts.all, 3);
    assert_eq!(counts.high_priority, 1);
}

pub async fn session_round_trip(storage: &Storage) {
    let gate = SessionGate::new(
        storage,
        SessionPolicy {
            ttl: Duration::hours(1),
            auto_provision: true,
        },
    );
    let username = unique_username("session");

    let outcome = gate.login(&username, "pw").await.unwrap();
    assert!(outcome.provisioned);

    let me = gate
        .current_user(Some(outcome.token.as_str()))
        .await
        .unwrap()
        .expect("fresh session should resolve");
    assert_eq!(me.username, username);

    assert!(gate.login(&username, "wrong").await.is_err());

    gate.logout(Some(outcome.token.as_str())).await.unwrap();
    assert!(gate
        .current_user(Some(outcome.token.as_str()))
        .await
        .unwrap()
        .is_none());

    let user_id = me.id;
    let expired = storage
        .sessions
        .create(user_id, Duration::seconds(-5))
        .await
        .unwrap();
    assert_eq!(storage.sessions.resolve(expired.as_str()).await.unwrap(), None);
    assert!(storage.sessions.purge_expired().await.unwrap() >= 1);
}
