// crates/change-finder/tests/change_finder_tests.rs
//! Integration tests for the change finder

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use syncwatch_change_finder::{ChangeFinder, DocumentEvents, FinderSettings, WatermarkCalculator};
use syncwatch_core::{
    ChangeSummary, CollectionMembership, LogEntry, ManualClock, MemoryLogStore, Principal,
    StaticRepositories, SynchronizationRoots,
};

fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

fn doc(repo: &str, path: &str, millis: i64) -> LogEntry {
    LogEntry::new(repo, "eventDocumentCategory", "documentModified", at(millis))
        .with_doc(path, format!("uuid{}", path.replace('/', "-")))
}

fn finder(store: Arc<MemoryLogStore>, repos: StaticRepositories, clock: Arc<ManualClock>) -> ChangeFinder {
    ChangeFinder::new(store, Arc::new(repos), clock, FinderSettings::default())
}

fn default_repo() -> StaticRepositories {
    StaticRepositories::new().with_repository("R")
}

fn roots(paths: &[&str]) -> SynchronizationRoots {
    SynchronizationRoots::new(paths.iter().copied()).unwrap()
}

#[tokio::test]
async fn test_five_entry_example() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/doc1", 100)).unwrap();
    store.append(doc("R", "/x/doc2", 200)).unwrap();
    store.append(doc("R", "/x/sub/doc3", 300)).unwrap();
    store.append(doc("R", "/x/doc4", 400).impacting("bob")).unwrap();
    store.append(doc("R", "/x/doc5", 500).impacting("bob")).unwrap();

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &roots(&["/x"]),
            &CollectionMembership::empty(),
            0,
            100,
        )
        .await
        .unwrap();

    assert_eq!(summary.upper_bound, 5);
    let ids: BTreeSet<i64> = summary.ids().into_iter().collect();
    assert_eq!(ids, BTreeSet::from([1, 2, 3]));
    // most recent first
    assert_eq!(summary.ids(), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_pinned_window_is_idempotent() {
    let store = Arc::new(MemoryLogStore::new());
    for i in 0..6 {
        store.append(doc("R", "/x/doc", i * 10)).unwrap();
    }
    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(Arc::clone(&store), default_repo(), clock);
    let principal = Principal::new("alice", "R");
    let roots = roots(&["/x"]);
    let none = CollectionMembership::empty();

    let first = finder
        .find_changes_in_range(&principal, &roots, &none, 1, 4, 100)
        .await
        .unwrap();

    // new writes after the window must not change a replay
    store.append(doc("R", "/x/doc", 999)).unwrap();

    let second = finder
        .find_changes_in_range(&principal, &roots, &none, 1, 4, 100)
        .await
        .unwrap();

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.upper_bound, second.upper_bound);
    assert_eq!(first.ids(), vec![4, 3, 2]);
}

#[tokio::test]
async fn test_chained_calls_lose_nothing_and_repeat_nothing() {
    let store = Arc::new(MemoryLogStore::new());
    let clock = Arc::new(ManualClock::new(at(0)));
    let finder = finder(Arc::clone(&store), default_repo(), Arc::clone(&clock));
    let principal = Principal::new("alice", "R");
    let roots = roots(&["/x"]);
    let none = CollectionMembership::empty();

    let mut expected = Vec::new();
    let mut seen = Vec::new();
    let mut cursor = -1;

    for round in 0..5i64 {
        for n in 0..round + 1 {
            let visible = store.append(doc("R", "/x/doc", round * 100 + n)).unwrap();
            expected.push(visible);
            store.append(doc("R", "/y/doc", round * 100 + n)).unwrap();
            store
                .append(doc("R", "/x/private", round * 100 + n).impacting("bob"))
                .unwrap();
        }
        clock.advance(TimeDelta::seconds(1));

        let summary = finder
            .find_changes(&principal, &roots, &none, cursor, 1_000)
            .await
            .unwrap();
        assert!(summary.upper_bound >= cursor);
        seen.extend(summary.ids());
        cursor = summary.upper_bound;
    }

    seen.sort_unstable();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_impacted_user_entries_never_leak() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/shared", 0).impacting("alice")).unwrap();
    store.append(doc("R", "/x/public", 0)).unwrap();

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);
    let roots = roots(&["/x"]);
    let none = CollectionMembership::empty();

    let for_bob = finder
        .find_changes(&Principal::new("bob", "R"), &roots, &none, -1, 100)
        .await
        .unwrap();
    let for_alice = finder
        .find_changes(&Principal::new("alice", "R"), &roots, &none, -1, 100)
        .await
        .unwrap();

    assert_eq!(for_bob.ids(), vec![2]);
    assert_eq!(for_alice.ids(), vec![2, 1]);
    assert_eq!(for_bob.upper_bound, for_alice.upper_bound);
}

#[tokio::test]
async fn test_clustering_delay_holds_back_recent_commits() {
    const T: i64 = 100_000;
    const D: i64 = 5_000;

    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/old", 0)).unwrap();
    let committed = store.append(doc("R", "/x/new", T)).unwrap();

    let repos = StaticRepositories::new()
        .with_clustered_repository("R", Duration::from_millis(D as u64));
    let clock = Arc::new(ManualClock::new(at(T + D - 1)));
    let calculator = WatermarkCalculator::new(
        Arc::clone(&store) as Arc<dyn syncwatch_core::LogStore>,
        Arc::new(repos),
        Arc::clone(&clock) as Arc<dyn syncwatch_core::Clock>,
    );
    let scope = BTreeSet::from(["R".to_string()]);

    let early = calculator.compute_upper_bound(&scope).await.unwrap();
    assert!(early < committed);
    assert_eq!(early, 1);

    clock.set(at(T + 2 * D + 1));
    let settled = calculator.compute_upper_bound(&scope).await.unwrap();
    assert!(settled >= committed);
}

#[tokio::test]
async fn test_clustered_finder_reports_entry_only_once_settled() {
    const D: i64 = 1_000;

    let store = Arc::new(MemoryLogStore::new());
    let clock = Arc::new(ManualClock::new(at(10_000)));
    let repos = StaticRepositories::new()
        .with_clustered_repository("R", Duration::from_millis(D as u64));
    let finder = finder(Arc::clone(&store), repos, Arc::clone(&clock));
    let principal = Principal::new("alice", "R");
    let roots = roots(&["/x"]);
    let none = CollectionMembership::empty();

    store.append(doc("R", "/x/doc", 10_000)).unwrap();

    let pending = finder
        .find_changes(&principal, &roots, &none, -1, 100)
        .await
        .unwrap();
    assert_eq!(pending.upper_bound, 0);
    assert!(pending.is_empty());

    clock.advance(TimeDelta::milliseconds(2 * D + 1));
    let settled = finder
        .find_changes(&principal, &roots, &none, pending.upper_bound, 100)
        .await
        .unwrap();
    assert_eq!(settled.upper_bound, 1);
    assert_eq!(settled.ids(), vec![1]);
}

#[tokio::test]
async fn test_late_lower_id_from_another_node_is_reported_once() {
    const D: i64 = 1_000;

    let store = Arc::new(MemoryLogStore::new());
    for id in 1..=4 {
        store
            .insert(doc("R", &format!("/x/settled{}", id), 0).with_id(id))
            .unwrap();
    }
    let clock = Arc::new(ManualClock::new(at(10_100)));
    let repos = StaticRepositories::new()
        .with_clustered_repository("R", Duration::from_millis(D as u64));
    let finder = finder(Arc::clone(&store), repos, Arc::clone(&clock));
    let principal = Principal::new("alice", "R");
    let roots = roots(&["/x"]);
    let none = CollectionMembership::empty();

    // node B's id 6 is readable while node A's id 5 is still in flight
    store.insert(doc("R", "/x/from-b", 10_000).with_id(6)).unwrap();

    let mut cursor = -1;
    let mut seen = Vec::new();

    let first = finder
        .find_changes(&principal, &roots, &none, cursor, 100)
        .await
        .unwrap();
    assert_eq!(first.upper_bound, 4);
    seen.extend(first.ids());
    cursor = first.upper_bound;

    clock.set(at(10_500));
    store.insert(doc("R", "/x/from-a", 9_800).with_id(5)).unwrap();

    let second = finder
        .find_changes(&principal, &roots, &none, cursor, 100)
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(second.upper_bound, cursor);
    seen.extend(second.ids());
    cursor = second.upper_bound;

    clock.set(at(12_100));
    let third = finder
        .find_changes(&principal, &roots, &none, cursor, 100)
        .await
        .unwrap();
    assert_eq!(third.upper_bound, 6);
    assert_eq!(third.ids(), vec![6, 5]);
    seen.extend(third.ids());
    cursor = third.upper_bound;

    let fourth = finder
        .find_changes(&principal, &roots, &none, cursor, 100)
        .await
        .unwrap();
    assert!(fourth.is_empty());
    assert_eq!(fourth.upper_bound, 6);

    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_root_paths_are_anchored() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/a/bc/doc1", 0)).unwrap();
    store.append(doc("R", "/a/b/doc1", 0)).unwrap();

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &roots(&["/a/b"]),
            &CollectionMembership::empty(),
            -1,
            100,
        )
        .await
        .unwrap();

    assert_eq!(summary.ids(), vec![2]);
}

#[tokio::test]
async fn test_empty_log() {
    let store = Arc::new(MemoryLogStore::new());
    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let bound = finder
        .upper_bound_for(&Principal::new("alice", "R"))
        .await
        .unwrap();
    assert_eq!(bound, -1);
}

#[tokio::test]
async fn test_truncation_keeps_tie_break_order() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/a", 100)).unwrap();
    store.append(doc("R", "/x/b", 300)).unwrap();
    store.append(doc("R", "/x/c", 300)).unwrap();
    store.append(doc("R", "/x/d", 200)).unwrap();
    store.append(doc("R", "/x/e", 100)).unwrap();

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &roots(&["/x"]),
            &CollectionMembership::empty(),
            -1,
            2,
        )
        .await
        .unwrap();

    assert_eq!(summary.ids(), vec![3, 2]);
    assert!(summary.has_too_many_changes);
    assert_eq!(summary.upper_bound, 5);
}

#[tokio::test]
async fn test_collections_and_root_registration() {
    let store = Arc::new(MemoryLogStore::new());
    store
        .append(LogEntry::new("R", "synchronizationRoot", "rootRegistered", at(0)).impacting("alice"))
        .unwrap();
    store
        .append(LogEntry::new("R", "synchronizationRoot", "rootUnregistered", at(0)).impacting("alice"))
        .unwrap();
    store
        .append(doc("R", "/elsewhere/doc", 0).with_doc("/elsewhere/doc", "member"))
        .unwrap();
    store.append(doc("R", "/elsewhere/other", 0)).unwrap();

    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &SynchronizationRoots::empty(),
            &CollectionMembership::new(["member"]),
            -1,
            100,
        )
        .await
        .unwrap();

    let ids: BTreeSet<i64> = summary.ids().into_iter().collect();
    assert_eq!(ids, BTreeSet::from([1, 3]));
}

#[tokio::test]
async fn test_document_events_restriction() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/doc", 0)).unwrap();
    store
        .append(LogEntry::new("R", "eventDocumentCategory", "documentViewed", at(0)).with_doc("/x/doc", "d"))
        .unwrap();
    store
        .append(
            LogEntry::new("R", "eventLifeCycleCategory", "lifecycle_transition_event", at(0))
                .with_doc("/x/doc", "d")
                .with_life_cycle("deleted"),
        )
        .unwrap();

    let finder = ChangeFinder::new(
        store,
        Arc::new(default_repo()),
        Arc::new(ManualClock::new(at(1_000))),
        FinderSettings::default().with_document_events(DocumentEvents::default()),
    );

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &roots(&["/x"]),
            &CollectionMembership::empty(),
            -1,
            100,
        )
        .await
        .unwrap();

    assert_eq!(summary.ids(), vec![1]);
    assert_eq!(summary.upper_bound, 3);
}

#[tokio::test]
async fn test_finder_is_shareable_across_tasks() {
    let store = Arc::new(MemoryLogStore::new());
    for i in 0..10 {
        store.append(doc("R", "/x/doc", i)).unwrap();
    }
    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = Arc::new(finder(store, default_repo(), clock));

    let mut handles = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let finder = Arc::clone(&finder);
        handles.push(tokio::spawn(async move {
            finder
                .find_changes(
                    &Principal::new(name, "R"),
                    &SynchronizationRoots::new(["/x"]).unwrap(),
                    &CollectionMembership::empty(),
                    -1,
                    100,
                )
                .await
        }));
    }

    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.len(), 10);
    }
}

#[tokio::test]
async fn test_summary_serializes_to_json() {
    let store = Arc::new(MemoryLogStore::new());
    store.append(doc("R", "/x/doc", 0).impacting("alice")).unwrap();
    let clock = Arc::new(ManualClock::new(at(1_000)));
    let finder = finder(store, default_repo(), clock);

    let summary = finder
        .find_changes(
            &Principal::new("alice", "R"),
            &roots(&["/x"]),
            &CollectionMembership::empty(),
            -1,
            100,
        )
        .await
        .unwrap();

    let json = serde_json::to_string(&summary).unwrap();
    let parsed: ChangeSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, summary);
    assert!(json.contains("impactedUserName"));
}
