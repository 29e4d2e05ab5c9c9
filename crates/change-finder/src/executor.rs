//! Windowed change scan

use crate::filter::FilterBuilder;
use crate::settings::FinderSettings;
use std::sync::Arc;
use syncwatch_core::{
    CollectionMembership, Field, LogEntry, LogQuery, LogStore, Predicate, Principal, Result,
    SortKey, SyncWatchError, SynchronizationRoots, Watermark,
};

/// One scan of the log over `(lower_bound, upper_bound]`
#[derive(Debug, Clone, Copy)]
pub struct ChangeQuery<'a> {
    pub principal: &'a Principal,
    pub roots: &'a SynchronizationRoots,
    pub collections: &'a CollectionMembership,
    pub lower_bound: Watermark,
    pub upper_bound: Watermark,
    pub limit: usize,
}

/// Runs change scans against a log store
pub struct ChangeQueryExecutor {
    store: Arc<dyn LogStore>,
    settings: Arc<FinderSettings>,
}

impl ChangeQueryExecutor {
    pub fn new(store: Arc<dyn LogStore>, settings: Arc<FinderSettings>) -> Self {
        Self { store, settings }
    }

    /// Translates a scan into a store query
    ///
    /// Results are ordered by repository ascending, then event date and id
    /// descending, so that the most recent event of each repository comes
    /// first and equal dates keep a stable order.
    pub fn to_log_query(&self, query: &ChangeQuery<'_>) -> Result<LogQuery> {
        if query.limit == 0 {
            return Err(SyncWatchError::invalid_argument(
                "limit",
                "must be greater than zero",
            ));
        }

        let filter = FilterBuilder::new(&self.settings).build_filter(query.roots, query.collections);
        let predicate = Predicate::eq(Field::RepositoryId, query.principal.repository())
            .and(Predicate::gt(Field::Id, query.lower_bound))
            .and(Predicate::le(Field::Id, query.upper_bound))
            .and(filter);

        Ok(LogQuery::new(predicate)
            .order_by(SortKey::asc(Field::RepositoryId))
            .order_by(SortKey::desc(Field::EventDate))
            .order_by(SortKey::desc(Field::Id))
            .limit(query.limit))
    }

    /// Runs the scan
    pub async fn execute(&self, query: &ChangeQuery<'_>) -> Result<Vec<LogEntry>> {
        let log_query = self.to_log_query(query)?;
        let entries = self.store.query(&log_query).await?;
        log::debug!(
            "{} scan of ({}, {}] for {} returned {} entries",
            self.store.name(),
            query.lower_bound,
            query.upper_bound,
            query.principal,
            entries.len()
        );
        Ok(entries)
    }

    /// Runs a scan from its parts
    pub async fn query_changes(
        &self,
        principal: &Principal,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
        lower_bound: Watermark,
        upper_bound: Watermark,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        self.execute(&ChangeQuery {
            principal,
            roots,
            collections,
            lower_bound,
            upper_bound,
            limit,
        })
        .await
    }
}
