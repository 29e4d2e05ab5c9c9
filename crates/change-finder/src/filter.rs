//! Root and collection filter

use crate::settings::FinderSettings;
use syncwatch_core::{CollectionMembership, Field, Predicate, SynchronizationRoots};

/// Builds the predicate selecting entries relevant to a principal's roots
/// and collections
#[derive(Debug, Clone, Copy)]
pub struct FilterBuilder<'a> {
    settings: &'a FinderSettings,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(settings: &'a FinderSettings) -> Self {
        Self { settings }
    }

    /// Root registration events, unregistration excluded
    pub fn root_lifecycle(&self) -> Predicate {
        Predicate::eq(Field::Category, self.settings.root_event_category.as_str()).and(
            Predicate::ne(
                Field::EventId,
                self.settings.root_unregistered_event.as_str(),
            ),
        )
    }

    /// Builds the inclusion predicate
    ///
    /// Documents match when their path equals or lies below a root, or when
    /// their uuid is one of the collection ids. Root registration events
    /// always match so clients keep learning about new roots.
    pub fn build_filter(
        &self,
        roots: &SynchronizationRoots,
        collections: &CollectionMembership,
    ) -> Predicate {
        let mut scope: Option<Predicate> = None;

        if !roots.is_empty() {
            scope = Some(Predicate::PathUnder(
                roots.paths().map(str::to_string).collect(),
            ));
        }

        if !collections.is_empty() {
            let members = Predicate::is_in(Field::DocUuid, collections.ids());
            scope = Some(match scope {
                Some(paths) => paths.or(members),
                None => members,
            });
        }

        match scope {
            Some(scope) => {
                let documents = match &self.settings.document_events {
                    Some(events) => scope.and(events.predicate()),
                    None => scope,
                };
                documents.or(self.root_lifecycle())
            }
            None => self.root_lifecycle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DocumentEvents;
    use chrono::Utc;
    use syncwatch_core::LogEntry;

    fn doc(path: &str, uuid: &str) -> LogEntry {
        LogEntry::new("default", "eventDocumentCategory", "documentModified", Utc::now())
            .with_doc(path, uuid)
    }

    fn root_event(event_id: &str) -> LogEntry {
        LogEntry::new("default", "synchronizationRoot", event_id, Utc::now())
    }

    #[test]
    fn test_path_is_anchored_on_segments() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::new(["/a/b"]).unwrap(),
            &CollectionMembership::empty(),
        );

        assert!(filter.matches(&doc("/a/b", "1")));
        assert!(filter.matches(&doc("/a/b/c", "2")));
        assert!(!filter.matches(&doc("/a/bc", "3")));
        assert!(!filter.matches(&doc("/a", "4")));
    }

    #[test]
    fn test_collections_match_by_uuid() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::empty(),
            &CollectionMembership::new(["uuid-7"]),
        );

        assert!(filter.matches(&doc("/anywhere", "uuid-7")));
        assert!(!filter.matches(&doc("/anywhere", "uuid-8")));
    }

    #[test]
    fn test_roots_or_collections() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::new(["/x"]).unwrap(),
            &CollectionMembership::new(["uuid-7"]),
        );

        assert!(filter.matches(&doc("/x/y", "uuid-1")));
        assert!(filter.matches(&doc("/z", "uuid-7")));
        assert!(!filter.matches(&doc("/z", "uuid-1")));
    }

    #[test]
    fn test_nothing_synchronized_only_matches_root_registration() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings)
            .build_filter(&SynchronizationRoots::empty(), &CollectionMembership::empty());

        assert!(filter.matches(&root_event("rootRegistered")));
        assert!(!filter.matches(&root_event("rootUnregistered")));
        assert!(!filter.matches(&doc("/x", "uuid-1")));
    }

    #[test]
    fn test_root_registration_included_alongside_documents() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::new(["/x"]).unwrap(),
            &CollectionMembership::empty(),
        );

        assert!(filter.matches(&root_event("rootRegistered")));
        assert!(!filter.matches(&root_event("rootUnregistered")));
    }

    #[test]
    fn test_document_events_restrict_document_branch() {
        let settings = FinderSettings::default().with_document_events(DocumentEvents::default());
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::new(["/x"]).unwrap(),
            &CollectionMembership::empty(),
        );

        let viewed = LogEntry::new("default", "eventDocumentCategory", "documentViewed", Utc::now())
            .with_doc("/x/doc", "uuid-1");
        assert!(filter.matches(&doc("/x/doc", "uuid-1")));
        assert!(!filter.matches(&viewed));
        assert!(filter.matches(&root_event("rootRegistered")));
    }

    #[test]
    fn test_root_covering_everything() {
        let settings = FinderSettings::default();
        let filter = FilterBuilder::new(&settings).build_filter(
            &SynchronizationRoots::new(["/"]).unwrap(),
            &CollectionMembership::empty(),
        );

        assert!(filter.matches(&doc("/a", "1")));
        assert!(filter.matches(&doc("/a/b/c", "2")));
    }
}
