//! # assetcycled — asset lifecycle daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Close runs left open by a previous process
//! - Start the periodic lifecycle run
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use assetcycle_adapter_http_axum::state::AppState;
use assetcycle_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteAssetStore, SqliteAuditLog, SqliteConfigRepository,
    SqliteRunRepository,
};
use assetcycle_app::lifecycle::LifecycleScheduler;
use assetcycle_app::services::config_service::LifecycleConfigService;
use assetcycle_app::services::history_service::LifecycleHistoryService;
use assetcycle_app::services::stats_service::LifecycleStatsService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let assets = Arc::new(SqliteAssetStore::new(pool.clone()));
    let audit = Arc::new(SqliteAuditLog::new(pool.clone()));
    let runs = Arc::new(SqliteRunRepository::new(pool.clone()));
    let config_repo = SqliteConfigRepository::new(pool);

    // Services
    let config_service = Arc::new(LifecycleConfigService::load(config_repo).await?);
    let scheduler = Arc::new(LifecycleScheduler::new(
        Arc::clone(&assets),
        Arc::clone(&audit),
        Arc::clone(&runs),
        Arc::clone(&config_service),
        config.scheduler.settings(),
    ));
    let stats_service = Arc::new(
        LifecycleStatsService::new(Arc::clone(&assets), Arc::clone(&config_service))
            .with_lookahead_days(config.scheduler.stats_lookahead_days),
    );
    let history_service = Arc::new(LifecycleHistoryService::new(assets, audit, runs));

    let abandoned = scheduler.recover().await?;
    if abandoned > 0 {
        tracing::warn!(abandoned, "closed lifecycle runs left open by a previous process");
    }

    // Background runs
    let periodic = if config.scheduler.enabled {
        Some(scheduler.spawn_periodic(config.scheduler.interval()))
    } else {
        tracing::info!("periodic lifecycle runs disabled");
        None
    };

    // HTTP
    let state = AppState::from_arcs(
        config_service,
        Arc::clone(&scheduler),
        stats_service,
        history_service,
    );
    let app = assetcycle_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "assetcycled listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = periodic {
        handle.abort();
    }
    scheduler.shutdown(config.scheduler.shutdown_grace()).await;
    tracing::info!("assetcycled stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining");
}
