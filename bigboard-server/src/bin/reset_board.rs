//! Empty the board database
//!
//! Deletes every item, family member and category, then re-seeds the
//! default categories. The server does not need to be stopped, but open
//! displays keep their last snapshot until the next change or refresh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bigboard_common::config::{database_path, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use bigboard_common::db::{BoardStore, SqliteStore};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reset-board")]
#[command(about = "Clear all Big Board items, family members and categories")]
#[command(version)]
struct Args {
    /// Folder holding big_board.db (also read from BIGBOARD_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    let db_path = database_path(&root_folder);
    info!("Resetting {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    store.clear_all().await.context("Failed to clear database")?;

    let categories = store.list_categories().await?;
    info!(
        "Database cleared; categories reset to {}",
        categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
