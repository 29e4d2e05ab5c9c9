//! Storage seams consumed by the change finder
//!
//! Each storage engine provides its own implementation; which one a process
//! uses is decided by configuration and handed around as `Arc<dyn LogStore>`.

mod memory;

pub use memory::{MemoryLogStore, MemoryWatermarkStore};

use crate::error::Result;
use crate::query::LogQuery;
use crate::types::{LogEntry, Principal, Watermark};
use async_trait::async_trait;

/// Read access to the append-only audit log
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Short backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Returns the entries matching the query's predicate, in the query's
    /// order, capped to its limit
    async fn query(&self, query: &LogQuery) -> Result<Vec<LogEntry>>;

    /// Returns true if the log holds at least one entry, whatever its
    /// repository or date
    async fn has_entries(&self) -> Result<bool>;
}

/// Persistence for the per-principal cursor
///
/// Written by callers only after they have consumed a change summary.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Loads the last consumed upper bound, if any
    async fn load(&self, principal: &Principal) -> Result<Option<Watermark>>;

    /// Records a consumed upper bound
    async fn save(&self, principal: &Principal, watermark: Watermark) -> Result<()>;
}
