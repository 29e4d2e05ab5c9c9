//! Client cursor database operations

use crate::connection::store_error;
use crate::DbPool;
use chrono::Utc;
use syncwatch_core::{Principal, Result, Watermark};

/// Loads the stored cursor of a principal
pub async fn load_cursor(pool: &DbPool, principal: &Principal) -> Result<Option<Watermark>> {
    sqlx::query_scalar(
        "SELECT watermark FROM sync_cursors WHERE principal_name = ? AND repository_id = ?",
    )
    .bind(principal.name())
    .bind(principal.repository())
    .fetch_optional(pool)
    .await
    .map_err(|e| store_error("Failed to load cursor", e))
}

/// Stores the cursor of a principal, replacing any previous one
pub async fn save_cursor(pool: &DbPool, principal: &Principal, watermark: Watermark) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_cursors (principal_name, repository_id, watermark, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (principal_name, repository_id)
        DO UPDATE SET watermark = excluded.watermark, updated_at = excluded.updated_at
        "#,
    )
    .bind(principal.name())
    .bind(principal.repository())
    .bind(watermark)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .map_err(|e| store_error("Failed to save cursor", e))?;

    Ok(())
}
