//! Big Board server - Main entry point
//!
//! Serves the household board over HTTP and pushes every change to the
//! connected displays over Server-Sent Events.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bigboard_common::clock::{DisplayClock, LocalClock};
use bigboard_common::config::{
    database_path, default_config_path, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV,
};
use bigboard_common::db::SqliteStore;
use bigboard_server::board::BoardService;
use bigboard_server::hub::BroadcastHub;
use bigboard_server::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_LOG_FILTER: &str = "bigboard_server=info,bigboard_common=info,tower_http=info";

/// Command-line arguments for bigboard-server
#[derive(Parser, Debug)]
#[command(name = "bigboard-server")]
#[command(about = "Household schedule board with live display sync")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 8000]
    #[arg(short, long, env = "BIGBOARD_PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(short, long, env = "BIGBOARD_BIND")]
    bind: Option<String>,

    /// Folder holding big_board.db (also read from BIGBOARD_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The config file may set the log level, so read it before tracing is up
    // and report how it went afterwards
    let config_path = args.config.clone().or_else(default_config_path);
    let loaded = config_path.as_deref().map(TomlConfig::load);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    let default_filter = config.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Big Board server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match (&config_path, loaded) {
        (Some(path), Some(Ok(_))) => info!("Loaded config file: {}", path.display()),
        (Some(path), Some(Err(e))) => warn!("Ignoring config file {}: {}", path.display(), e),
        _ => info!("No config file found, using defaults"),
    }

    let rollover_hour = config
        .rollover_hour()
        .context("Invalid configuration")?;
    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let bind = args
        .bind
        .or_else(|| config.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database ready");

    let hub = Arc::new(BroadcastHub::new());
    let board = Arc::new(BoardService::new(
        Arc::new(store),
        Arc::clone(&hub),
        Arc::new(LocalClock),
        DisplayClock::new(rollover_hour),
    ));
    info!(
        "Board rolls over to tomorrow at {:02}:00; display date is {}",
        rollover_hour,
        board.display_date().0
    );

    let app = build_router(AppState::new(board));

    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", bind, port))?;
    info!("Big Board listening on http://{}:{}", bind, port);
    info!("Health check: http://{}:{}/health", bind, port);

    // Open SSE streams never finish on their own; closing the hub ends them
    // so graceful shutdown can complete
    let shutdown_hub = Arc::clone(&hub);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_hub.shutdown();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
