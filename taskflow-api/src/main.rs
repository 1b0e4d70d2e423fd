//! # TaskFlow API Server
//!
//! Serves the authenticated task API over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskflow cargo run -p taskflow-api
//! STORAGE_BACKEND=memory cargo run -p taskflow-api
//! ```

use anyhow::Context;
use taskflow_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use taskflow_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::Storage,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged
const SESSION_PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskflow_api=debug,taskflow_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "TaskFlow API server starting"
    );

    let (storage, pool) = match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .context("DATABASE_URL is required for the postgres backend")?;

            ensure_database_exists(&url).await?;
            let pool = create_pool(DatabaseConfig {
                max_connections: config.storage.max_connections,
                ..DatabaseConfig::new(url)
            })
            .await
            .context("Failed to connect to PostgreSQL")?;
            run_migrations(&pool).await?;

            (Storage::postgres(pool.clone()), Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            (Storage::in_memory(), None)
        }
    };

    let sessions = storage.sessions.clone();
    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sessions.purge_expired().await {
                tracing::warn!(error = %e, "Expired session purge failed");
            }
        }
    });

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(storage, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
