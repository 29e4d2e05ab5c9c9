//! SQLite implementations of the store traits

use crate::connection::{connect, SqliteSettings};
use crate::migrations::run_migrations;
use crate::queries::{cursors, log_entries};
use crate::DbPool;
use async_trait::async_trait;
use syncwatch_core::{
    LogEntry, LogQuery, LogStore, Principal, Result, Watermark, WatermarkStore,
};

/// Audit log backed by the `audit_log` table
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    pool: DbPool,
}

impl SqliteLogStore {
    /// Wraps an already migrated pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connects and brings the schema up to date
    pub async fn open(settings: &SqliteSettings) -> Result<Self> {
        let pool = connect(settings).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Underlying pool, shared with [`SqliteWatermarkStore`]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Appends an entry and returns its id
    pub async fn append(&self, entry: &LogEntry) -> Result<i64> {
        let id = log_entries::append_entry(&self.pool, entry).await?;
        log::debug!("appended log entry {}", id);
        Ok(id)
    }

    /// Stores an entry under its own id, which may be lower than ids already written
    pub async fn insert(&self, entry: &LogEntry) -> Result<()> {
        log_entries::insert_entry(&self.pool, entry).await?;
        log::debug!("inserted log entry {}", entry.id);
        Ok(())
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn query(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        log_entries::query_entries(&self.pool, query).await
    }

    async fn has_entries(&self) -> Result<bool> {
        log_entries::has_entries(&self.pool).await
    }
}

/// Cursors backed by the `sync_cursors` table
#[derive(Debug, Clone)]
pub struct SqliteWatermarkStore {
    pool: DbPool,
}

impl SqliteWatermarkStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatermarkStore for SqliteWatermarkStore {
    async fn load(&self, principal: &Principal) -> Result<Option<Watermark>> {
        cursors::load_cursor(&self.pool, principal).await
    }

    async fn save(&self, principal: &Principal, watermark: Watermark) -> Result<()> {
        cursors::save_cursor(&self.pool, principal, watermark).await
    }
}
