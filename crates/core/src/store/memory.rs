//! In-memory store backends

use crate::error::{Result, SyncWatchError};
use crate::query::LogQuery;
use crate::store::{LogStore, WatermarkStore};
use crate::types::{LogEntry, Principal, Watermark};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

fn poisoned() -> SyncWatchError {
    SyncWatchError::StoreUnavailable {
        message: "Lock poisoned".to_string(),
        source: None,
    }
}

/// Audit log held in a `RwLock<Vec>`, ordered by id
///
/// Useful for tests and for single-process deployments. Requests can be made
/// to fail with [`SyncWatchError::StoreUnavailable`] to exercise outage paths.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: RwLock<Vec<LogEntry>>,
    unavailable: AtomicBool,
}

impl MemoryLogStore {
    /// Creates an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, assigning the next id; returns that id
    pub fn append(&self, mut entry: LogEntry) -> Result<i64> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let id = entries.last().map_or(1, |last| last.id + 1);
        entry.id = id;
        log::trace!("appending log entry {}", entry);
        entries.push(entry);
        Ok(id)
    }

    /// Stores an entry under its own id
    ///
    /// Ids may skip values and may arrive out of order: a lower id becoming
    /// readable after a higher one is how a late commit from another cluster
    /// node looks to a reader. A duplicate or non-positive id is rejected.
    pub fn insert(&self, entry: LogEntry) -> Result<()> {
        if entry.id <= 0 {
            return Err(SyncWatchError::invalid_argument(
                "id",
                format!("{} is not positive", entry.id),
            ));
        }
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        match entries.binary_search_by_key(&entry.id, |e| e.id) {
            Ok(_) => Err(SyncWatchError::invalid_argument(
                "id",
                format!("{} is already stored", entry.id),
            )),
            Err(position) => {
                log::trace!("inserting log entry {}", entry);
                entries.insert(position, entry);
                Ok(())
            }
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if no entry is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every subsequent read fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncWatchError::StoreUnavailable {
                message: "memory log store is offline".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn query(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(query.apply(entries.iter()))
    }

    async fn has_entries(&self) -> Result<bool> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(!entries.is_empty())
    }
}

/// Cursors kept in a `RwLock<HashMap>` keyed by user and repository
#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    cursors: RwLock<HashMap<(String, String), Watermark>>,
}

impl MemoryWatermarkStore {
    /// Creates an empty cursor table
    pub fn new() -> Self {
        Self::default()
    }
}

fn cursor_key(principal: &Principal) -> (String, String) {
    (
        principal.name().to_string(),
        principal.repository().to_string(),
    )
}

#[async_trait]
impl WatermarkStore for MemoryWatermarkStore {
    async fn load(&self, principal: &Principal) -> Result<Option<Watermark>> {
        let cursors = self.cursors.read().map_err(|_| poisoned())?;
        Ok(cursors.get(&cursor_key(principal)).copied())
    }

    async fn save(&self, principal: &Principal, watermark: Watermark) -> Result<()> {
        let mut cursors = self.cursors.write().map_err(|_| poisoned())?;
        cursors.insert(cursor_key(principal), watermark);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Field, Predicate, SortKey};
    use chrono::Utc;

    fn entry() -> LogEntry {
        LogEntry::new("default", "eventDocumentCategory", "documentCreated", Utc::now())
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let store = MemoryLogStore::new();
        assert_eq!(store.append(entry()).unwrap(), 1);
        assert_eq!(store.append(entry().with_id(99)).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_accepts_late_lower_id() {
        let store = MemoryLogStore::new();
        store.insert(entry().with_id(6)).unwrap();
        store.insert(entry().with_id(5)).unwrap();
        assert!(store.insert(entry().with_id(6)).is_err());
        assert!(store.insert(entry().with_id(0)).is_err());
        assert_eq!(store.append(entry()).unwrap(), 7);

        let all = store.query(&LogQuery::new(Predicate::Always)).await.unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_limits() {
        let store = MemoryLogStore::new();
        for _ in 0..5 {
            store.append(entry()).unwrap();
        }

        let query = LogQuery::new(Predicate::gt(Field::Id, 1))
            .order_by(SortKey::desc(Field::Id))
            .limit(2);
        let ids: Vec<i64> = store
            .query(&query)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();

        assert_eq!(ids, vec![5, 4]);
    }

    #[tokio::test]
    async fn test_has_entries() {
        let store = MemoryLogStore::new();
        assert!(!store.has_entries().await.unwrap());
        store.append(entry()).unwrap();
        assert!(store.has_entries().await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_transiently() {
        let store = MemoryLogStore::new();
        store.set_unavailable(true);

        let err = store.has_entries().await.unwrap_err();
        assert!(err.is_transient());

        store.set_unavailable(false);
        assert!(store.has_entries().await.is_ok());
    }

    #[tokio::test]
    async fn test_watermark_store_per_principal() {
        let cursors = MemoryWatermarkStore::new();
        let alice = Principal::new("alice", "default");
        let bob = Principal::new("bob", "default");

        assert_eq!(cursors.load(&alice).await.unwrap(), None);
        cursors.save(&alice, 7).await.unwrap();
        assert_eq!(cursors.load(&alice).await.unwrap(), Some(7));
        assert_eq!(cursors.load(&bob).await.unwrap(), None);
    }
}
