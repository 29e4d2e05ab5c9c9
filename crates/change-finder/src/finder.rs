// crates/change-finder/src/finder.rs
//! Change finder orchestration

use crate::executor::{ChangeQuery, ChangeQueryExecutor};
use crate::settings::FinderSettings;
use crate::visibility::filter_by_key;
use crate::watermark::WatermarkCalculator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use syncwatch_core::{
    ChangeSummary, Clock, CollectionMembership, LogEntry, LogStore, Principal,
    RepositorySettings, Result, SynchronizationRoots, Watermark,
};

/// Finds the log entries a synchronization client has not seen yet
///
/// Stateless between calls: the caller owns the cursor and passes the
/// previous upper bound back as the next lower bound.
pub struct ChangeFinder {
    calculator: WatermarkCalculator,
    executor: ChangeQueryExecutor,
    repositories: Arc<dyn RepositorySettings>,
    clock: Arc<dyn Clock>,
    settings: Arc<FinderSettings>,
}

impl ChangeFinder {
    /// Creates a change finder
    pub fn new(
        store: Arc<dyn LogStore>,
        repositories: Arc<dyn RepositorySettings>,
        clock: Arc<dyn Clock>,
        settings: FinderSettings,
    ) -> Self {
        let settings = Arc::new(settings);
        Self {
            calculator: WatermarkCalculator::new(
                Arc::clone(&store),
                Arc::clone(&repositories),
                Arc::clone(&clock),
            ),
            executor: ChangeQueryExecutor::new(store, Arc::clone(&settings)),
            repositories,
            clock,
            settings,
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &FinderSettings {
        &self.settings
    }

    /// Result cap used when the caller has none
    pub fn default_limit(&self) -> usize {
        self.settings.default_limit
    }

    /// Upper bound over the repositories the principal can access
    pub async fn upper_bound_for(&self, principal: &Principal) -> Result<Watermark> {
        self.upper_bound_at(principal, self.clock.now()).await
    }

    async fn upper_bound_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<Watermark> {
        let repositories = self.repositories.accessible_repositories(principal);
        self.calculator
            .compute_upper_bound_at(&repositories, now)
            .await
    }

    /// Returns the changes logged after `lower_bound`
    ///
    /// The returned upper bound never goes below `lower_bound`, so a client
    /// persisting it can never move backwards and rescan old entries.
    pub async fn find_changes(
        &self,
        principal: &Principal,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
        lower_bound: Watermark,
        limit: usize,
    ) -> Result<ChangeSummary> {
        let now = self.clock.now();
        let upper_bound = self.upper_bound_at(principal, now).await?;

        if upper_bound < lower_bound {
            log::debug!(
                "upper bound {} is behind cursor {} for {}, nothing to report",
                upper_bound,
                lower_bound,
                principal
            );
            return Ok(ChangeSummary::unchanged(lower_bound, now));
        }

        self.scan(principal, roots, collections, lower_bound, upper_bound, limit, now)
            .await
    }

    /// Returns the changes in the pinned window `(lower_bound, upper_bound]`
    ///
    /// Replaying the same window yields the same entries, which lets a client
    /// retry a poll whose result it failed to apply.
    pub async fn find_changes_in_range(
        &self,
        principal: &Principal,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
        lower_bound: Watermark,
        upper_bound: Watermark,
        limit: usize,
    ) -> Result<ChangeSummary> {
        let now = self.clock.now();
        if upper_bound <= lower_bound {
            return Ok(ChangeSummary::unchanged(lower_bound, now));
        }
        self.scan(principal, roots, collections, lower_bound, upper_bound, limit, now)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn scan(
        &self,
        principal: &Principal,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
        lower_bound: Watermark,
        upper_bound: Watermark,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<ChangeSummary> {
        let raw = self
            .executor
            .execute(&ChangeQuery {
                principal,
                roots,
                collections,
                lower_bound,
                upper_bound,
                limit,
            })
            .await?;

        let has_too_many_changes = raw.len() >= limit;
        if has_too_many_changes {
            log::warn!(
                "change scan for {} hit the limit of {}, client should resynchronize",
                principal,
                limit
            );
        }

        let entries = filter_by_key(raw, &self.settings.impacted_user_key, principal.name());
        for entry in &entries {
            log_change(entry);
        }

        Ok(ChangeSummary::new(
            upper_bound,
            entries,
            has_too_many_changes,
            now,
        ))
    }
}

fn log_change(entry: &LogEntry) {
    log::debug!(
        "change {} {}/{} on {}",
        entry.id,
        entry.category,
        entry.event_id,
        entry.doc_path.as_deref().unwrap_or("-")
    );
}
