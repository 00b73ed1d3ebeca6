// SQLite connection pool and schema initialization

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use tracing::info;
use crate::db::INIT_SCHEMA;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    // Create database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePool::connect(database_url).await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    init_schema(&pool).await?;
    info!("Database ready at {}", database_url);

    Ok(pool)
}

/// Single-connection in-memory database. Every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn in_memory() -> Result<Pool<Sqlite>, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(INIT_SCHEMA).execute(pool).await?;
    Ok(())
}
