//! Result of one change-finder call

use crate::types::{LogEntry, Watermark};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New watermark plus the ordered changes visible to one principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Cursor to persist and pass as the next lower bound
    pub upper_bound: Watermark,
    /// Visible changes, repository asc, event date desc, id desc
    pub entries: Vec<LogEntry>,
    /// The scan hit its result cap, so the window may be incomplete and the
    /// client should fall back to a full resynchronization
    pub has_too_many_changes: bool,
    /// Instant the upper bound was computed at
    pub computed_at: DateTime<Utc>,
}

impl ChangeSummary {
    /// Creates a summary
    pub fn new(
        upper_bound: Watermark,
        entries: Vec<LogEntry>,
        has_too_many_changes: bool,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            upper_bound,
            entries,
            has_too_many_changes,
            computed_at,
        }
    }

    /// A summary that keeps the cursor where it was
    pub fn unchanged(lower_bound: Watermark, computed_at: DateTime<Utc>) -> Self {
        Self::new(lower_bound, Vec::new(), false, computed_at)
    }

    /// Ids of the returned entries, in result order
    pub fn ids(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Number of returned entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing changed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
