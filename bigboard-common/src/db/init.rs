//! Database initialization
//!
//! Opens (or creates) the board database, creates the schema idempotently,
//! brings older databases up to date and seeds the default categories.

use crate::model::DEFAULT_CATEGORIES;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // busy_timeout and journal mode apply to every pooled connection
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe on every startup
    create_items_table(&pool).await?;
    create_family_members_table(&pool).await?;
    create_categories_table(&pool).await?;

    add_missing_item_columns(&pool).await?;

    seed_default_categories(&mut *pool.acquire().await?).await?;

    Ok(pool)
}

async fn create_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            family_member TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT,
            category TEXT NOT NULL,
            recurrence TEXT,
            recurrence_day INTEGER,
            handled INTEGER NOT NULL DEFAULT 0,
            handled_date TEXT,
            stay_until_done INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_family_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS family_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            color TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Databases created before stay-until-done existed lack the column
async fn add_missing_item_columns(pool: &SqlitePool) -> Result<()> {
    let columns: Vec<String> = sqlx::query("PRAGMA table_info(items)")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    if !columns.iter().any(|c| c == "stay_until_done") {
        sqlx::query("ALTER TABLE items ADD COLUMN stay_until_done INTEGER NOT NULL DEFAULT 0")
            .execute(pool)
            .await?;
        info!("Added items.stay_until_done column");
    }

    Ok(())
}

/// Insert the default categories when the category table is empty
pub async fn seed_default_categories(conn: &mut SqliteConnection) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *conn)
        .await?;

    if count > 0 {
        return Ok(());
    }

    for name in DEFAULT_CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
    }
    info!("Seeded {} default categories", DEFAULT_CATEGORIES.len());

    Ok(())
}
