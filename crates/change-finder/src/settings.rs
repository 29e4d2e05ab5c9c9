//! Immutable settings injected into the change finder

use serde::{Deserialize, Serialize};
use syncwatch_core::{Field, Predicate, IMPACTED_USER_NAME};

/// Event names the filter relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderSettings {
    /// Category of root (un)registration events
    pub root_event_category: String,
    /// Event logged when a user registers a synchronization root
    pub root_registered_event: String,
    /// Event logged when a user unregisters a synchronization root
    pub root_unregistered_event: String,
    /// Extended info key scoping an event to a single user
    pub impacted_user_key: String,
    /// When set, only these events count as document changes
    pub document_events: Option<DocumentEvents>,
    /// Result cap used when the caller does not give one
    pub default_limit: usize,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            root_event_category: "synchronizationRoot".to_string(),
            root_registered_event: "rootRegistered".to_string(),
            root_unregistered_event: "rootUnregistered".to_string(),
            impacted_user_key: IMPACTED_USER_NAME.to_string(),
            document_events: None,
            default_limit: 1000,
        }
    }
}

impl FinderSettings {
    /// Restricts document matches to the given events
    pub fn with_document_events(mut self, events: DocumentEvents) -> Self {
        self.document_events = Some(events);
        self
    }
}

/// Which log entries count as a change to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvents {
    pub category: String,
    pub event_ids: Vec<String>,
    pub lifecycle: Option<LifecycleTransitions>,
}

/// Lifecycle transitions that count as document changes, except the ones
/// landing in the deleted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleTransitions {
    pub category: String,
    pub event_id: String,
    pub deleted_state: String,
}

impl Default for DocumentEvents {
    fn default() -> Self {
        Self {
            category: "eventDocumentCategory".to_string(),
            event_ids: [
                "documentCreated",
                "documentCreatedByCopy",
                "documentModified",
                "documentMoved",
                "documentRemoved",
                "documentRestored",
                "documentLocked",
                "documentUnlocked",
                "documentUntrashed",
                "addedToCollection",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            lifecycle: Some(LifecycleTransitions::default()),
        }
    }
}

impl Default for LifecycleTransitions {
    fn default() -> Self {
        Self {
            category: "eventLifeCycleCategory".to_string(),
            event_id: "lifecycle_transition_event".to_string(),
            deleted_state: "deleted".to_string(),
        }
    }
}

impl DocumentEvents {
    /// Predicate selecting tracked document events
    pub fn predicate(&self) -> Predicate {
        let documents = Predicate::eq(Field::Category, self.category.as_str()).and(
            Predicate::is_in(Field::EventId, self.event_ids.iter().map(String::as_str)),
        );

        match &self.lifecycle {
            Some(lifecycle) => {
                let transitions = Predicate::eq(Field::Category, lifecycle.category.as_str())
                    .and(Predicate::eq(Field::EventId, lifecycle.event_id.as_str()))
                    .and(Predicate::ne(
                        Field::DocLifeCycle,
                        lifecycle.deleted_state.as_str(),
                    ));
                documents.or(transitions)
            }
            None => documents,
        }
    }
}
