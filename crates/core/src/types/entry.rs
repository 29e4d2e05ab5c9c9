//! Audit log entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Extended info key naming the only user an event concerns
pub const IMPACTED_USER_NAME: &str = "impactedUserName";

/// A typed value attached to a log entry under a string key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ExtendedInfo {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl ExtendedInfo {
    /// Returns the value as text, if it holds text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for ExtendedInfo {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExtendedInfo {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ExtendedInfo {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ExtendedInfo {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for ExtendedInfo {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// One immutable record of the audit log
///
/// Entries are produced by the write path. The change finder only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique, strictly increasing log id (assigned by the store)
    pub id: i64,
    /// Repository the event happened in
    pub repository_id: String,
    /// When the event was logged
    pub event_date: DateTime<Utc>,
    /// Event category (document events, lifecycle, root registration, ...)
    pub category: String,
    /// Event name within its category
    pub event_id: String,
    /// Path of the document the event is about
    pub doc_path: Option<String>,
    /// Id of the document the event is about
    pub doc_uuid: Option<String>,
    /// Lifecycle state of the document after the event
    pub doc_life_cycle: Option<String>,
    /// User who triggered the event
    pub principal_name: Option<String>,
    /// Structured metadata
    #[serde(default)]
    pub extended_info: BTreeMap<String, ExtendedInfo>,
}

impl LogEntry {
    /// Creates an entry with no document attached; the id is assigned on append
    pub fn new(
        repository_id: impl Into<String>,
        category: impl Into<String>,
        event_id: impl Into<String>,
        event_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            repository_id: repository_id.into(),
            event_date,
            category: category.into(),
            event_id: event_id.into(),
            doc_path: None,
            doc_uuid: None,
            doc_life_cycle: None,
            principal_name: None,
            extended_info: BTreeMap::new(),
        }
    }

    /// Sets an explicit id
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Attaches the document path and id
    pub fn with_doc(mut self, path: impl Into<String>, uuid: impl Into<String>) -> Self {
        self.doc_path = Some(path.into());
        self.doc_uuid = Some(uuid.into());
        self
    }

    /// Sets the document lifecycle state
    pub fn with_life_cycle(mut self, state: impl Into<String>) -> Self {
        self.doc_life_cycle = Some(state.into());
        self
    }

    /// Sets the user who triggered the event
    pub fn with_principal(mut self, name: impl Into<String>) -> Self {
        self.principal_name = Some(name.into());
        self
    }

    /// Adds an extended info value
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<ExtendedInfo>) -> Self {
        self.extended_info.insert(key.into(), value.into());
        self
    }

    /// Scopes the event to a single user
    pub fn impacting(self, user: impl Into<String>) -> Self {
        self.with_info(IMPACTED_USER_NAME, user.into())
    }

    /// Looks up an extended info value
    pub fn info(&self, key: &str) -> Option<&ExtendedInfo> {
        self.extended_info.get(key)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}/{} {} at {}",
            self.id,
            self.category,
            self.event_id,
            self.doc_path.as_deref().unwrap_or("-"),
            self.event_date.to_rfc3339()
        )
    }
}
