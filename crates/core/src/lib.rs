//! syncwatch core
//!
//! Shared model for the audit-log change finder: log entries, synchronization
//! roots, the structured query tree, and the storage, clock and repository
//! seams the finder is built on.

pub mod clock;
pub mod error;
pub mod query;
pub mod settings;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorSeverity, RecoveryAction, Result, SyncWatchError};
pub use query::{CompareOp, Direction, Field, LogQuery, Predicate, SortKey, Value};
pub use settings::{RepositorySettings, StaticRepositories};
pub use store::{LogStore, MemoryLogStore, MemoryWatermarkStore, WatermarkStore};
pub use types::{
    is_under_root, normalize_root, root_bounds, ChangeSummary, CollectionMembership, ExtendedInfo,
    LogEntry, Principal, SynchronizationRoots, Watermark, EMPTY_LOG, FROM_BEGINNING,
    IMPACTED_USER_NAME, SEPARATOR,
};
