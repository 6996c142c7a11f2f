//! Data-access layer for Noteally: connection pool, embedded migrations,
//! row models, and repositories over PostgreSQL.
//!
//! Repositories are zero-sized structs whose async methods take `&PgPool`
//! as the first argument and return `sqlx::Error`. Owner scoping: listing
//! and search queries filter by `user_id` in SQL; single-record lookups
//! return the stored row and the consumer compares the stored owner with
//! the caller (so owner mismatch can surface as Forbidden rather than
//! NotFound).

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database connection is alive.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
