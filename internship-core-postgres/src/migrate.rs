//! Schema management.
//!
//! Migrations are embedded at compile time from `migrations/` and applied in
//! version order. The cleanup scripts under `cleanup/` tear the schema down again
//! and are only meant for test databases.

use internship_core_db::error::{StoreError, StoreResult};
use sqlx::PgPool;
use std::fs;
use std::path::Path;

/// Apply every pending migration.
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use internship_core_postgres::migrate::run_migrations;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// run_migrations(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Internal(format!("migration failed: {e}")))
}

/// Drop the schema by executing the cleanup files in descending order.
pub async fn cleanup_database(pool: &PgPool) -> StoreResult<()> {
    let cleanup_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("cleanup");
    let mut entries: Vec<_> = fs::read_dir(&cleanup_dir)
        .map_err(|e| StoreError::Internal(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();
    entries.sort_by_key(|entry| std::cmp::Reverse(entry.file_name()));

    for entry in entries {
        let sql = fs::read_to_string(entry.path()).map_err(|e| StoreError::Internal(e.to_string()))?;
        sqlx::raw_sql(&sql).execute(pool).await?;
    }
    Ok(())
}
