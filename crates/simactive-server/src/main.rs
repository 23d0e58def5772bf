//! # simactive-server
//!
//! JSON-over-HTTP façade for the simactive record store.
//!
//! This binary provides:
//! - **REST API** (axum) for SIM cards, services, providers and usage links
//! - **Write-through repositories** kept in memory and in SQLite
//! - **Startup warm-up** that loads every table into its mirror before serving

mod api;
mod config;
mod error;
mod validate;

use std::sync::Arc;

use simactive_core::{DomainServices, Repositories};
use simactive_shared::constants::APP_NAME;
use simactive_shared::Context;
use simactive_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,simactive_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs migrations) and build the repositories
    // -----------------------------------------------------------------------
    let db_path = config.database_path.clone();
    let db = tokio::task::spawn_blocking(move || match db_path {
        Some(path) => Database::open_at(&path),
        None => Database::new(),
    })
    .await??;
    let db = Arc::new(db);
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let repos = Repositories::new(db);

    // -----------------------------------------------------------------------
    // 4. Warm the mirrors
    // -----------------------------------------------------------------------
    if config.warm_on_start {
        let warming = repos.clone();
        let report = tokio::task::spawn_blocking(move || warming.warm_all(&Context::background()))
            .await?
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to warm mirrors");
                e
            })?;
        info!(?report, "Mirrors warmed");
    } else {
        info!("Startup warm-up disabled, mirrors start cold");
    }

    let app_state = AppState {
        services: DomainServices::new(&repos),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
