/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskflow_api::{app::{build_router, AppState}, config::Config};
/// use taskflow_shared::store::Storage;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Storage::in_memory(), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::require_session},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use taskflow_shared::{
    auth::{SessionGate, SessionPolicy},
    store::Storage,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through axum's `State` extractor; all fields are
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// User, task and session stores
    pub storage: Storage,

    /// Login, logout and session resolution
    pub gate: SessionGate,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: Storage, config: Config) -> Self {
        let policy = SessionPolicy {
            ttl: Duration::hours(config.session.ttl_hours),
            auto_provision: config.session.auto_provision,
        };

        Self {
            gate: SessionGate::new(&storage, policy),
            storage,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /health
/// ├── /auth
/// │   ├── POST /login
/// │   ├── POST /register
/// │   ├── POST /logout
/// │   └── GET  /user
/// └── /tasks                  (session required)
///     ├── GET    /
///     ├── POST   /
///     ├── GET    /summary
///     ├── GET    /:id
///     ├── PATCH  /:id
///     └── DELETE /:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/register", post(routes::auth::register))
        .route("/logout", post(routes::auth::logout))
        .route("/user", get(routes::auth::current_user));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/summary", get(routes::tasks::task_summary))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Cookies require credentials, which rules out a wildcard origin
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
