//! # Knowledge Hub API Server
//!
//! Serves the tenant-scoped knowledge base over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/kbhub JWT_SECRET=... cargo run -p kbhub-api
//! STORAGE_BACKEND=memory JWT_SECRET=... cargo run -p kbhub-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use kbhub_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StorageBackend},
};
use kbhub_shared::{
    auth::password::Argon2Hasher,
    db::{migrations::run_migrations, pool},
    repository::Repositories,
    usecase::{UseCases, UuidGenerator},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kbhub_api=debug,kbhub_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Repositories::in_memory())
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .context("DATABASE_URL is required for the postgres backend")?;

            let mut db_config = pool::DatabaseConfig::new(url);
            db_config.max_connections = config.database.max_connections;

            let pool = pool::create_pool(db_config)
                .await
                .context("Failed to connect to the database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok(Repositories::postgres(pool))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Knowledge Hub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let repos = open_repositories(&config).await?;
    let use_cases = UseCases::with_dependencies(
        repos,
        Arc::new(Argon2Hasher::new(config.password)),
        Arc::new(UuidGenerator),
    );

    let address = config.bind_address();
    let storage = config.storage;
    let app = build_router(AppState::new(use_cases, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    tracing::info!(storage = storage.as_str(), "Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}
