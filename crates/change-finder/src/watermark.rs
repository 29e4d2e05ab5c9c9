//! Upper bound calculation
//!
//! In a cluster, a writer node may commit an entry with a lower id after
//! another node's entry with a higher id is already readable. Reporting that
//! higher id as the new cursor would make the next incremental call skip the
//! late entry forever. When clustering is enabled, only entries logged before
//! `now - 2 * delay` are treated as settled; the delay is doubled to absorb
//! overlap between the nodes' own invalidation windows.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use syncwatch_core::{
    Clock, Field, LogQuery, LogStore, Predicate, RepositorySettings, Result, SortKey,
    SyncWatchError, Watermark, EMPTY_LOG,
};

/// Computes the highest log id that is safe to scan up to
pub struct WatermarkCalculator {
    store: Arc<dyn LogStore>,
    repositories: Arc<dyn RepositorySettings>,
    clock: Arc<dyn Clock>,
}

impl WatermarkCalculator {
    /// Creates a calculator over a log store
    pub fn new(
        store: Arc<dyn LogStore>,
        repositories: Arc<dyn RepositorySettings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            repositories,
            clock,
        }
    }

    /// Largest clustering delay among the given repositories, `None` when
    /// none of them is clustered
    pub fn clustering_delay(&self, repository_names: &BTreeSet<String>) -> Option<Duration> {
        repository_names
            .iter()
            .filter_map(|name| self.repositories.clustering_delay(name))
            .max()
    }

    /// Computes the upper bound as of now
    pub async fn compute_upper_bound(
        &self,
        repository_names: &BTreeSet<String>,
    ) -> Result<Watermark> {
        self.compute_upper_bound_at(repository_names, self.clock.now())
            .await
    }

    /// Computes the upper bound as of `now`
    ///
    /// Returns `-1` for an empty log, and `0` when entries exist but none is
    /// settled yet, so the next lower bound is never negative once the log
    /// has started.
    pub async fn compute_upper_bound_at(
        &self,
        repository_names: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<Watermark> {
        if repository_names.is_empty() {
            return Err(SyncWatchError::EmptyRepositoryScope);
        }

        let delay = self.clustering_delay(repository_names);
        let mut predicate =
            Predicate::is_in(Field::RepositoryId, repository_names.iter().map(String::as_str));
        if let Some(delay) = delay {
            let safe_before = safe_before(now, delay)?;
            log::debug!(
                "clustering delay {:?} applies, only entries before {} are settled",
                delay,
                safe_before.to_rfc3339()
            );
            predicate = predicate.and(Predicate::lt(Field::EventDate, safe_before));
        }

        let query = LogQuery::new(predicate)
            .order_by(SortKey::desc(Field::Id))
            .limit(1);
        let latest = self.store.query(&query).await?;

        if let Some(entry) = latest.first() {
            log::debug!("upper bound is log entry {}", entry.id);
            return Ok(entry.id);
        }

        if delay.is_some() && self.store.has_entries().await? {
            log::debug!("no settled log entry yet but the log is not empty, returning 0");
            return Ok(0);
        }

        log::debug!("no log entry found, returning {}", EMPTY_LOG);
        Ok(EMPTY_LOG)
    }
}

fn safe_before(now: DateTime<Utc>, delay: Duration) -> Result<DateTime<Utc>> {
    let margin = TimeDelta::from_std(delay)
        .ok()
        .and_then(|d| d.checked_mul(2))
        .ok_or_else(|| SyncWatchError::InvalidConfiguration {
            setting: "clustering_delay".to_string(),
            value: format!("{:?}", delay),
            reason: "too large".to_string(),
        })?;
    Ok(now
        .checked_sub_signed(margin)
        .unwrap_or(DateTime::<Utc>::MIN_UTC))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncwatch_core::{LogEntry, ManualClock, MemoryLogStore, StaticRepositories};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn calculator(
        store: Arc<MemoryLogStore>,
        repos: StaticRepositories,
        now: i64,
    ) -> WatermarkCalculator {
        WatermarkCalculator::new(store, Arc::new(repos), Arc::new(ManualClock::new(at(now))))
    }

    fn entry(repo: &str, millis: i64) -> LogEntry {
        LogEntry::new(repo, "eventDocumentCategory", "documentModified", at(millis))
    }

    #[tokio::test]
    async fn test_empty_log_is_minus_one() {
        let store = Arc::new(MemoryLogStore::new());
        let calc = calculator(
            store,
            StaticRepositories::new().with_repository("default"),
            0,
        );
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_empty_log_with_clustering_is_minus_one() {
        let store = Arc::new(MemoryLogStore::new());
        let calc = calculator(
            store,
            StaticRepositories::new().with_clustered_repository("default", Duration::from_secs(1)),
            100_000,
        );
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_without_clustering_returns_latest_id() {
        let store = Arc::new(MemoryLogStore::new());
        for i in 0..4 {
            store.append(entry("default", i)).unwrap();
        }
        let calc = calculator(
            store,
            StaticRepositories::new().with_repository("default"),
            0,
        );
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_only_given_repositories_count() {
        let store = Arc::new(MemoryLogStore::new());
        store.append(entry("default", 0)).unwrap();
        store.append(entry("other", 0)).unwrap();
        let calc = calculator(
            store,
            StaticRepositories::new()
                .with_repository("default")
                .with_repository("other"),
            0,
        );
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), 1);
        assert_eq!(calc.compute_upper_bound(&names(&["missing"])).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_clustering_excludes_recent_entries() {
        let store = Arc::new(MemoryLogStore::new());
        store.append(entry("default", 1_000)).unwrap();
        store.append(entry("default", 9_500)).unwrap();
        let calc = calculator(
            store,
            StaticRepositories::new().with_clustered_repository("default", Duration::from_secs(1)),
            10_000,
        );
        // settled before 8_000
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clustering_with_nothing_settled_returns_zero() {
        let store = Arc::new(MemoryLogStore::new());
        store.append(entry("default", 9_500)).unwrap();
        let calc = calculator(
            store,
            StaticRepositories::new().with_clustered_repository("default", Duration::from_secs(1)),
            10_000,
        );
        assert_eq!(calc.compute_upper_bound(&names(&["default"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_largest_delay_wins() {
        let store = Arc::new(MemoryLogStore::new());
        let calc = calculator(
            store,
            StaticRepositories::new()
                .with_clustered_repository("a", Duration::from_millis(200))
                .with_clustered_repository("b", Duration::from_millis(800))
                .with_repository("c"),
            0,
        );
        assert_eq!(
            calc.clustering_delay(&names(&["a", "b", "c"])),
            Some(Duration::from_millis(800))
        );
        assert_eq!(calc.clustering_delay(&names(&["c"])), None);
    }

    #[tokio::test]
    async fn test_empty_scope_is_a_configuration_error() {
        let store = Arc::new(MemoryLogStore::new());
        let calc = calculator(store, StaticRepositories::new(), 0);
        let err = calc.compute_upper_bound(&BTreeSet::new()).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryLogStore::new());
        store.append(entry("default", 0)).unwrap();
        store.set_unavailable(true);
        let calc = calculator(
            store,
            StaticRepositories::new().with_repository("default"),
            0,
        );
        let err = calc.compute_upper_bound(&names(&["default"])).await.unwrap_err();
        assert!(err.is_transient());
    }
}
