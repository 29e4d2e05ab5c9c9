//! Polling with a persisted cursor

use crate::finder::ChangeFinder;
use std::sync::Arc;
use syncwatch_core::{
    ChangeSummary, CollectionMembership, Principal, Result, SynchronizationRoots, Watermark,
    WatermarkStore, FROM_BEGINNING,
};

/// Drives [`ChangeFinder::find_changes`] from a stored cursor
///
/// `poll` never writes the cursor. The caller applies the returned changes
/// and then calls `acknowledge`; a poll whose result is dropped is simply
/// repeated from the same cursor.
pub struct PollSession {
    finder: Arc<ChangeFinder>,
    cursors: Arc<dyn WatermarkStore>,
}

impl PollSession {
    pub fn new(finder: Arc<ChangeFinder>, cursors: Arc<dyn WatermarkStore>) -> Self {
        Self { finder, cursors }
    }

    /// Stored cursor, or the start of the log for a new client
    pub async fn cursor(&self, principal: &Principal) -> Result<Watermark> {
        Ok(self
            .cursors
            .load(principal)
            .await?
            .unwrap_or(FROM_BEGINNING))
    }

    /// Finds the changes after the stored cursor
    pub async fn poll(
        &self,
        principal: &Principal,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
        limit: usize,
    ) -> Result<ChangeSummary> {
        let lower_bound = self.cursor(principal).await?;
        self.finder
            .find_changes(principal, roots, collections, lower_bound, limit)
            .await
    }

    /// Records that `summary` was consumed; a bound behind the stored cursor
    /// is ignored
    pub async fn acknowledge(&self, principal: &Principal, summary: &ChangeSummary) -> Result<()> {
        let current = self.cursor(principal).await?;
        if summary.upper_bound <= current {
            log::debug!(
                "cursor for {} stays at {} (acknowledged {})",
                principal,
                current,
                summary.upper_bound
            );
            return Ok(());
        }
        self.cursors.save(principal, summary.upper_bound).await?;
        log::debug!("cursor for {} moved to {}", principal, summary.upper_bound);
        Ok(())
    }
}
