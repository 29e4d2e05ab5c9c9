//! SQLite pool setup for the log store

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use syncwatch_core::{Result, SyncWatchError};

pub type DbPool = Pool<Sqlite>;

/// How long a query waits for a pooled connection before failing
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the log database lives and how the pool is sized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteSettings {
    pub path: PathBuf,
    pub pool_size: u32,
    /// Write-ahead journal, so appends do not block finders
    pub wal: bool,
    /// Refuse to create the file when it is absent
    pub must_exist: bool,
}

impl SqliteSettings {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: 10,
            wal: true,
            must_exist: false,
        }
    }

    pub fn pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    pub fn must_exist(mut self) -> Self {
        self.must_exist = true;
        self
    }
}

/// Maps a sqlx failure to the store error a caller can act on
pub(crate) fn store_error(operation: &str, error: sqlx::Error) -> SyncWatchError {
    match error {
        sqlx::Error::PoolTimedOut => SyncWatchError::StoreTimeout {
            operation: operation.to_string(),
            millis: ACQUIRE_TIMEOUT.as_millis() as u64,
        },
        other => SyncWatchError::store(operation, other),
    }
}

/// Opens a pool on the log database file
pub async fn connect(settings: &SqliteSettings) -> Result<DbPool> {
    let mut options = SqliteConnectOptions::new()
        .filename(&settings.path)
        .create_if_missing(!settings.must_exist);
    if settings.wal {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.pool_size)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| {
            store_error(
                &format!("Failed to open log database {}", settings.path.display()),
                e,
            )
        })?;

    log::info!(
        "Opened SQLite log store at {} (pool of {}, wal: {})",
        settings.path.display(),
        settings.pool_size,
        settings.wal
    );
    Ok(pool)
}

/// Private in-memory log database
pub async fn connect_in_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .journal_mode(SqliteJournalMode::Memory);

    // A second connection would open a second, empty database
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| store_error("Failed to open in-memory log database", e))
}
