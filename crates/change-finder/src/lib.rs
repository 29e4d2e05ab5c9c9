// crates/change-finder/src/lib.rs
//! Incremental change detection over the audit log
//!
//! A synchronization client keeps a cursor (the last upper bound it was
//! given) and periodically asks which log entries under its roots or in its
//! collections appeared since. This crate provides:
//! - Upper bound calculation that holds back entries a cluster may still be
//!   committing out of order
//! - The root and collection filter
//! - The windowed, ordered change scan
//! - Per-user visibility of impacted-user events
//! - A polling helper persisting the cursor after consumption
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use syncwatch_change_finder::{ChangeFinder, FinderSettings};
//! use syncwatch_core::{
//!     CollectionMembership, LogEntry, MemoryLogStore, Principal, StaticRepositories,
//!     SynchronizationRoots, SystemClock,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryLogStore::new());
//! store
//!     .append(
//!         LogEntry::new("default", "eventDocumentCategory", "documentModified", chrono::Utc::now())
//!             .with_doc("/workspaces/doc", "uuid-1"),
//!     )
//!     .unwrap();
//!
//! let finder = ChangeFinder::new(
//!     store,
//!     Arc::new(StaticRepositories::new().with_repository("default")),
//!     Arc::new(SystemClock),
//!     FinderSettings::default(),
//! );
//!
//! let summary = finder
//!     .find_changes(
//!         &Principal::new("alice", "default"),
//!         &SynchronizationRoots::new(["/workspaces"]).unwrap(),
//!         &CollectionMembership::empty(),
//!         -1,
//!         100,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(summary.upper_bound, 1);
//! assert_eq!(summary.ids(), vec![1]);
//! # }
//! ```

mod executor;
mod filter;
mod finder;
mod session;
mod settings;
mod visibility;
mod watermark;

pub use executor::{ChangeQuery, ChangeQueryExecutor};
pub use filter::FilterBuilder;
pub use finder::ChangeFinder;
pub use session::PollSession;
pub use settings::{DocumentEvents, FinderSettings, LifecycleTransitions};
pub use visibility::{filter_by_key, filter_for_principal, is_visible_to};
pub use watermark::WatermarkCalculator;
