use essaylab_core::{
    Essay, EssayRepository, FixedClock, KeySchema, KeyValueStore, SqliteStore,
    StoreEssayRepository, StoreError, TableLifecycle,
};
use std::time::Duration;

const TABLE: &str = "essays";

fn test_lifecycle(dir: &tempfile::TempDir) -> TableLifecycle {
    TableLifecycle::with_timings(
        dir.path(),
        Duration::ZERO,
        Duration::ZERO,
        Duration::from_secs(5),
    )
}

fn seeded_essay(owner: &str, id: i64) -> Essay {
    let mut essay = Essay::draft(owner, "seed", "o", "p");
    essay.id = id;
    essay.updated_at = "2026-08-24T09:00:00Z".to_string();
    essay
}

#[test]
fn ensure_ready_creates_table_and_persists_marker() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");

    assert!(!lifecycle.is_initialized(TABLE));
    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), false, &clock)
        .unwrap();

    assert!(store.describe_table(TABLE).unwrap().is_some());
    assert!(lifecycle.is_initialized(TABLE));

    let marker = std::fs::read_to_string(lifecycle.marker_path(TABLE)).unwrap();
    assert!(marker.contains("2026-08-24T09:00:00Z"));
}

#[test]
fn ensure_ready_without_reset_is_idempotent_and_preserves_data() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), false, &clock)
        .unwrap();
    store.put_item(TABLE, &seeded_essay("alice", 1)).unwrap();

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), false, &clock)
        .unwrap();

    assert!(store.get_item(TABLE, "alice", 1).unwrap().is_some());
}

#[test]
fn ensure_ready_with_reset_drops_existing_data() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), false, &clock)
        .unwrap();
    store.put_item(TABLE, &seeded_essay("alice", 1)).unwrap();

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), true, &clock)
        .unwrap();

    assert!(store.describe_table(TABLE).unwrap().is_some());
    assert!(store.get_item(TABLE, "alice", 1).unwrap().is_none());
}

#[test]
fn ensure_ready_with_reset_succeeds_when_table_was_absent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), true, &clock)
        .unwrap();

    assert!(store.describe_table(TABLE).unwrap().is_some());
}

#[test]
fn stale_marker_is_cleared_before_provisioning() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");

    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(lifecycle.marker_path(TABLE), "stale claim").unwrap();

    lifecycle
        .ensure_ready(&store, TABLE, &KeySchema::default(), false, &clock)
        .unwrap();

    let marker = std::fs::read_to_string(lifecycle.marker_path(TABLE)).unwrap();
    assert!(!marker.contains("stale claim"));
    assert!(marker.contains("provisioned at"));
}

#[test]
fn provision_surfaces_unsupported_key_schema() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);

    let schema = KeySchema {
        partition_key: "tenant".to_string(),
        sort_key: "seq".to_string(),
    };
    let err = lifecycle.provision(&store, TABLE, &schema).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedKeySchema(_)));
    assert!(!lifecycle.is_initialized(TABLE));
}

#[test]
fn list_active_self_heals_missing_table_with_single_retry() {
    // No table has ever been provisioned.
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    let listed = repo.list_active("carol").unwrap();
    assert!(listed.is_empty());

    // The heal provisioned the table for subsequent writes.
    assert!(store.describe_table(TABLE).unwrap().is_some());
}

#[test]
fn self_healed_table_serves_writes_afterwards() {
    let store = SqliteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lifecycle = test_lifecycle(&dir);
    let clock = FixedClock::new("2026-08-24T09:00:00Z");
    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, TABLE);

    assert!(repo.list_active("carol").unwrap().is_empty());

    let mut essay = Essay::draft("carol", "first", "o", "p");
    repo.save(&mut essay).unwrap();
    assert_eq!(essay.id, 1);
    assert_eq!(repo.list_active("carol").unwrap().len(), 1);
}
