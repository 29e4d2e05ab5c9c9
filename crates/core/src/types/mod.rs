//! Domain types for the change finder

mod common;
mod entry;
mod roots;
mod summary;

pub use common::{Principal, Watermark, EMPTY_LOG, FROM_BEGINNING};
pub use entry::{ExtendedInfo, LogEntry, IMPACTED_USER_NAME};
pub use roots::{
    is_under_root, normalize_root, root_bounds, CollectionMembership, SynchronizationRoots,
    SEPARATOR,
};
pub use summary::ChangeSummary;
