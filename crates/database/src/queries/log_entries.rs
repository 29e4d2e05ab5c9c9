//! Audit log database operations

use crate::connection::store_error;
use crate::sql::build_select;
use crate::DbPool;
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use std::collections::BTreeMap;
use syncwatch_core::{ExtendedInfo, LogEntry, LogQuery, Result, SyncWatchError};

/// Appends an entry, letting the database assign the next id
pub async fn append_entry(pool: &DbPool, entry: &LogEntry) -> Result<i64> {
    let extended_info = encode_extended_info(entry)?;

    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (repository_id, event_date, category, event_id, doc_path,
                               doc_uuid, doc_life_cycle, principal_name, extended_info)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.repository_id)
    .bind(entry.event_date.timestamp_millis())
    .bind(&entry.category)
    .bind(&entry.event_id)
    .bind(&entry.doc_path)
    .bind(&entry.doc_uuid)
    .bind(&entry.doc_life_cycle)
    .bind(&entry.principal_name)
    .bind(extended_info)
    .execute(pool)
    .await
    .map_err(|e| store_error("Failed to append log entry", e))?;

    Ok(result.last_insert_rowid())
}

/// Inserts an entry keeping its id, which must be unused
pub async fn insert_entry(pool: &DbPool, entry: &LogEntry) -> Result<()> {
    if entry.id <= 0 {
        return Err(SyncWatchError::invalid_argument(
            "id",
            "explicit log ids must be positive",
        ));
    }
    let extended_info = encode_extended_info(entry)?;

    sqlx::query(
        r#"
        INSERT INTO audit_log (id, repository_id, event_date, category, event_id, doc_path,
                               doc_uuid, doc_life_cycle, principal_name, extended_info)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id)
    .bind(&entry.repository_id)
    .bind(entry.event_date.timestamp_millis())
    .bind(&entry.category)
    .bind(&entry.event_id)
    .bind(&entry.doc_path)
    .bind(&entry.doc_uuid)
    .bind(&entry.doc_life_cycle)
    .bind(&entry.principal_name)
    .bind(extended_info)
    .execute(pool)
    .await
    .map_err(|e| store_error("Failed to insert log entry", e))?;

    Ok(())
}

/// Runs a structured query
pub async fn query_entries(pool: &DbPool, query: &LogQuery) -> Result<Vec<LogEntry>> {
    let mut builder = build_select(query);
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .map_err(|e| store_error("Failed to query log entries", e))?;

    rows.into_iter().map(row_to_entry).collect()
}

/// Returns true if the log holds any entry
pub async fn has_entries(pool: &DbPool) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM audit_log)")
        .fetch_one(pool)
        .await
        .map_err(|e| store_error("Failed to check for log entries", e))?;

    Ok(exists)
}

fn encode_extended_info(entry: &LogEntry) -> Result<String> {
    serde_json::to_string(&entry.extended_info).map_err(|e| SyncWatchError::InvalidArgument {
        argument: "extended_info".to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn row_to_entry(row: SqliteRow) -> Result<LogEntry> {
    use sqlx::Row;

    let id: i64 = row.try_get("id").map_err(|e| corrupted(0, e))?;

    let event_date_ms: i64 = row.try_get("event_date").map_err(|e| corrupted(id, e))?;
    let event_date = DateTime::from_timestamp_millis(event_date_ms).ok_or_else(|| {
        SyncWatchError::CorruptedEntry {
            id,
            reason: format!("event date {} out of range", event_date_ms),
        }
    })?;

    let extended_info_json: String = row.try_get("extended_info").map_err(|e| corrupted(id, e))?;
    let extended_info: BTreeMap<String, ExtendedInfo> = serde_json::from_str(&extended_info_json)
        .map_err(|e| SyncWatchError::CorruptedEntry {
            id,
            reason: format!("extended info: {}", e),
        })?;

    Ok(LogEntry {
        id,
        repository_id: row.try_get("repository_id").map_err(|e| corrupted(id, e))?,
        event_date,
        category: row.try_get("category").map_err(|e| corrupted(id, e))?,
        event_id: row.try_get("event_id").map_err(|e| corrupted(id, e))?,
        doc_path: row.try_get("doc_path").map_err(|e| corrupted(id, e))?,
        doc_uuid: row.try_get("doc_uuid").map_err(|e| corrupted(id, e))?,
        doc_life_cycle: row.try_get("doc_life_cycle").map_err(|e| corrupted(id, e))?,
        principal_name: row.try_get("principal_name").map_err(|e| corrupted(id, e))?,
        extended_info,
    })
}

fn corrupted(id: i64, error: sqlx::Error) -> SyncWatchError {
    SyncWatchError::CorruptedEntry {
        id,
        reason: error.to_string(),
    }
}
