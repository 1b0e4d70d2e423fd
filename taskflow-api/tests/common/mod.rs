//! Shared helpers for the API integration tests
//!
//! Each [`TestContext`] owns a router over fresh in-memory stores, so tests
//! never share state.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskflow_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskflow_shared::models::task::{CreateTask, Task, TaskPatch};
use taskflow_shared::store::{Storage, StoreError, StoreResult, TaskStore};
use tower::ServiceExt;
use uuid::Uuid;

/// Response status, headers and parsed JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` of the first `Set-Cookie` header
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub fn set_cookie_header(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Field names listed under `details`
    pub fn detail_fields(&self) -> Vec<String> {
        self.body["details"]
            .as_array()
            .map(|details| {
                details
                    .iter()
                    .filter_map(|d| d["field"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct TestContext {
    pub app: Router,
    pub storage: Storage,
}

pub fn test_config(vars: &[(&str, &str)]) -> Config {
    let mut all: Vec<(String, String)> = vec![("STORAGE_BACKEND".into(), "memory".into())];
    all.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    Config::from_lookup(|key| {
        all.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test configuration should parse")
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_storage(Storage::in_memory(), config)
    }

    pub fn with_storage(storage: Storage, config: Config) -> Self {
        let app = build_router(AppState::new(storage.clone(), config));
        Self { app, storage }
    }

    /// Sends a request, optionally with a cookie and a JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Logs in and returns the session cookie (`name=value`)
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.session_cookie().expect("login should set a cookie")
    }

    /// Creates a task and returns its JSON
    pub async fn create_task(&self, cookie: &str, body: Value) -> Value {
        let response = self.send("POST", "/tasks", Some(cookie), Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "create failed: {}", response.body);
        response.body
    }
}

/// Storage whose task store fails every call
pub fn storage_with_failing_tasks() -> Storage {
    let base = Storage::in_memory();
    Storage::new(
        base.users.clone(),
        Arc::new(FailingTaskStore),
        base.sessions.clone(),
    )
}

pub struct FailingTaskStore;

#[async_trait::async_trait]
impl TaskStore for FailingTaskStore {
    async fn list(&self, _user_id: Uuid) -> StoreResult<Vec<Task>> {
        Err(unavailable())
    }

    async fn get(&self, _id: Uuid, _user_id: Uuid) -> StoreResult<Option<Task>> {
        Err(unavailable())
    }

    async fn create(&self, _data: CreateTask) -> StoreResult<Task> {
        Err(unavailable())
    }

    async fn update(&self, _id: Uuid, _user_id: Uuid, _patch: &TaskPatch) -> StoreResult<Option<Task>> {
        Err(unavailable())
    }

    async fn delete(&self, _id: Uuid, _user_id: Uuid) -> StoreResult<bool> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused (secret-dsn)".to_string())
}
