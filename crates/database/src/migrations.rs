//! Database migrations

use crate::connection::store_error;
use crate::DbPool;
use syncwatch_core::Result;

/// Migration 001: Audit log table
const MIGRATION_001: &str = include_str!("../migrations/001_audit_log.sql");

/// Migration 002: Audit log indexes
const MIGRATION_002: &str = include_str!("../migrations/002_audit_log_indexes.sql");

/// Migration 003: Client cursors
const MIGRATION_003: &str = include_str!("../migrations/003_sync_cursors.sql");

const MIGRATIONS: [(i64, &str); 3] = [(1, MIGRATION_001), (2, MIGRATION_002), (3, MIGRATION_003)];

/// Current database schema version
pub const CURRENT_VERSION: i64 = 3;

/// Returns the current migration version
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| store_error("Failed to create migrations table", e))?;

    for (version, sql) in MIGRATIONS {
        run_migration(pool, version, sql).await?;
    }

    Ok(())
}

/// Runs a single migration if not already applied
async fn run_migration(pool: &DbPool, version: i64, sql: &str) -> Result<()> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await
            .map_err(|e| store_error("Failed to check migration status", e))?;

    if applied.is_some() {
        return Ok(());
    }

    let operation = format!("Failed to run migration {}", version);
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| store_error(&operation, e))?;

    sqlx::raw_sql(sql)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error(&operation, e))?;

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error(&operation, e))?;

    tx.commit().await.map_err(|e| store_error(&operation, e))?;

    log::info!("Applied database migration {}", version);
    Ok(())
}
