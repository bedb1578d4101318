use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Creates and returns a SQLite connection pool, creating the database file
/// if it does not exist yet.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates the `runs` and `prompt_results` tables if they don't exist.
/// Safe to call on every startup.
pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            run_id TEXT PRIMARY KEY,
            ticker TEXT NOT NULL,
            context_json TEXT,
            started_at TEXT,
            finished_at TEXT,
            average_score REAL,
            final_rating TEXT,
            final_target_price REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompt_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            prompt_id TEXT NOT NULL,
            prompt_version INTEGER,
            prompt_name TEXT,
            score INTEGER,
            rating TEXT,
            target_buy_price REAL,
            rationale TEXT,
            raw_response TEXT,
            created_at TEXT,
            FOREIGN KEY (run_id) REFERENCES runs(run_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
