//! Change finder configuration section

use crate::validation::{ConfigSection, ValidationReport};
use serde::{Deserialize, Serialize};
use syncwatch_core::IMPACTED_USER_NAME;

/// Event names and limits used by the change finder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinderConfig {
    /// Category of root (un)registration events
    pub root_event_category: String,

    /// Event logged when a root is registered
    pub root_registered_event: String,

    /// Event logged when a root is unregistered
    pub root_unregistered_event: String,

    /// Extended info key restricting an event to one user
    pub impacted_user_key: String,

    /// Document events that count as changes; unset means every event
    pub document_events: Option<Vec<String>>,

    /// Also count lifecycle transitions, except to the deleted state, when
    /// `document_events` is set
    pub track_lifecycle_transitions: bool,

    /// Result cap used when a request gives none
    pub default_limit: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            root_event_category: "synchronizationRoot".to_string(),
            root_registered_event: "rootRegistered".to_string(),
            root_unregistered_event: "rootUnregistered".to_string(),
            impacted_user_key: IMPACTED_USER_NAME.to_string(),
            document_events: None,
            track_lifecycle_transitions: true,
            default_limit: 1000,
        }
    }
}

impl ConfigSection for FinderConfig {
    fn check(&self, report: &mut ValidationReport) {
        report.require_text("finder.root_event_category", &self.root_event_category);
        report.require_text("finder.root_registered_event", &self.root_registered_event);
        report.require_text("finder.root_unregistered_event", &self.root_unregistered_event);
        report.require_text("finder.impacted_user_key", &self.impacted_user_key);
        report.require_within("finder.default_limit", self.default_limit, 1..=100_000);

        match &self.document_events {
            Some(events) if events.is_empty() => report.reject(
                "finder.document_events",
                "leave the key out instead of listing no event",
            ),
            Some(events) => events
                .iter()
                .for_each(|event| report.require_text("finder.document_events", event)),
            None => {}
        }
    }
}
