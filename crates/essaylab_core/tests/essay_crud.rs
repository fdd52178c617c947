use essaylab_core::{
    Essay, EssayRepository, FixedClock, KeySchema, KeyValueStore, RepoError, SqliteStore,
    StoreEssayRepository, TableLifecycle, UNASSIGNED_ID,
};
use std::time::Duration;

const TABLE: &str = "essays";

fn ready_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_table(TABLE, &KeySchema::default()).unwrap();
    store
}

fn test_lifecycle(dir: &tempfile::TempDir) -> TableLifecycle {
    TableLifecycle::with_timings(
        dir.path(),
        Duration::ZERO,
        Duration::ZERO,
        Duration::from_secs(5),
    )
}

fn draft(owner: &str, title: &str) -> Essay {
    Essay::draft(owner, title, "original text", "polished text")
}

#[test]
fn save_allocates_sequential_ids_per_owner() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    let mut first = draft("alice", "A");
    repo.save(&mut first).unwrap();
    assert_eq!(first.id, 1);

    let mut second = draft("alice", "B");
    repo.save(&mut second).unwrap();
    assert_eq!(second.id, 2);

    // Partitions allocate independently.
    let mut other = draft("bob", "X");
    repo.save(&mut other).unwrap();
    assert_eq!(other.id, 1);
}

#[test]
fn list_active_orders_by_id_descending() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    for title in ["A", "B", "C"] {
        repo.save(&mut draft("alice", title)).unwrap();
    }

    let listed = repo.list_active("alice").unwrap();
    let ids: Vec<_> = listed.iter().map(|essay| essay.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(listed[0].title, "C");
}

#[test]
fn save_stamps_updated_at_only_when_empty() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    let mut fresh = draft("alice", "fresh");
    repo.save(&mut fresh).unwrap();
    assert_eq!(fresh.updated_at, "2026-08-24T10:00:00Z");

    let mut stamped = draft("alice", "stamped");
    stamped.updated_at = "2020-01-01T00:00:00Z".to_string();
    repo.save(&mut stamped).unwrap();
    assert_eq!(stamped.updated_at, "2020-01-01T00:00:00Z");
}

#[test]
fn save_rejects_empty_owner_before_any_store_call() {
    // No table exists; a validation failure must short-circuit first.
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    let mut essay = draft("", "A");
    let err = repo.save(&mut essay).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn save_with_explicit_id_overwrites_that_key() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    let mut essay = draft("alice", "first");
    repo.save(&mut essay).unwrap();

    let mut replacement = draft("alice", "rewritten");
    replacement.id = essay.id;
    repo.save(&mut replacement).unwrap();

    let listed = repo.list_active("alice").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "rewritten");
}

#[test]
fn soft_delete_hides_record_from_list_active() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    repo.save(&mut draft("alice", "A")).unwrap();
    repo.save(&mut draft("alice", "B")).unwrap();

    repo.soft_delete("alice", 1).unwrap();

    let listed = repo.list_active("alice").unwrap();
    let ids: Vec<_> = listed.iter().map(|essay| essay.id).collect();
    assert_eq!(ids, vec![2]);

    // The record is tombstoned, not removed.
    let deleted = store.get_item(TABLE, "alice", 1).unwrap().unwrap();
    assert!(!deleted.is_active());
    assert_eq!(deleted.title, "A");
}

#[test]
fn soft_delete_is_idempotent_and_refreshes_timestamp() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);

    let first_clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &first_clock, TABLE);
    repo.save(&mut draft("alice", "A")).unwrap();
    repo.soft_delete("alice", 1).unwrap();

    let later_clock = FixedClock::new("2026-08-24T11:00:00Z");
    let later_repo = StoreEssayRepository::new(&store, &lifecycle, &later_clock, TABLE);
    later_repo.soft_delete("alice", 1).unwrap();

    let deleted = store.get_item(TABLE, "alice", 1).unwrap().unwrap();
    assert_eq!(deleted.deleted_at, "2026-08-24T11:00:00Z");
    assert_eq!(deleted.title, "A");
    assert_eq!(deleted.original_content, "original text");
}

#[test]
fn soft_delete_missing_record_returns_not_found_and_writes_nothing() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    repo.save(&mut draft("alice", "A")).unwrap();

    let err = repo.soft_delete("alice", 99).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { ref owner, id } if owner == "alice" && id == 99
    ));

    assert_eq!(repo.list_active("alice").unwrap().len(), 1);
}

#[test]
fn empty_partition_with_existing_table_lists_empty() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    assert!(repo.list_active("bob").unwrap().is_empty());
}

#[test]
fn ids_are_never_reused_after_soft_delete() {
    let store = ready_store();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T10:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    repo.save(&mut draft("alice", "A")).unwrap();
    repo.save(&mut draft("alice", "B")).unwrap();
    repo.soft_delete("alice", 2).unwrap();

    // The tombstoned row still holds the partition maximum.
    let mut next = draft("alice", "C");
    repo.save(&mut next).unwrap();
    assert_eq!(next.id, 3);
    assert_ne!(next.id, UNASSIGNED_ID);
}
