//! Per-user visibility of log entries
//!
//! Some events only concern one user (for example a permission granted on a
//! root). They carry the user's name under the `impactedUserName` extended
//! info key and must not reach anyone else.

use syncwatch_core::{LogEntry, IMPACTED_USER_NAME};

/// Keeps the entries visible to `principal_name`, in order
pub fn filter_for_principal(entries: Vec<LogEntry>, principal_name: &str) -> Vec<LogEntry> {
    filter_by_key(entries, IMPACTED_USER_NAME, principal_name)
}

/// Keeps the entries whose `key` metadata is absent or equals `principal_name`
pub fn filter_by_key(entries: Vec<LogEntry>, key: &str, principal_name: &str) -> Vec<LogEntry> {
    entries
        .into_iter()
        .filter(|entry| is_visible_to(entry, key, principal_name))
        .collect()
}

/// A non-text value never names a user, so the entry is hidden
pub fn is_visible_to(entry: &LogEntry, key: &str, principal_name: &str) -> bool {
    match entry.info(key) {
        None => true,
        Some(value) => value.as_text() == Some(principal_name),
    }
}
