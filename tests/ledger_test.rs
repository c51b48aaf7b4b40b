// tests/ledger_test.rs - Integration test: ledger sessions, partitions, legacy migration

use karmabot::ledger::{tally, tally_all, Direction, LedgerStore, NestedVotes, ReleaseId};
use rusqlite::{params, Connection};

fn f39() -> ReleaseId {
    ReleaseId::new("f39")
}

fn f40() -> ReleaseId {
    ReleaseId::new("f40")
}

fn vote(store: &LedgerStore, voter: &str, recipient: &str, release: &ReleaseId, d: Direction) -> bool {
    let mut session = store.session().unwrap();
    let applied = session.record_vote(voter, recipient, release, d).unwrap();
    session.commit().unwrap();
    applied
}

/// Write a pre-partition ledger: a bare `ledger` table with the old keys
/// and no migration markers.
fn write_legacy_ledger(path: &std::path::Path, forwards: &str, backwards: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE ledger (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO ledger (key, value) VALUES ('forwards', ?1), ('backwards', ?2)",
        params![forwards, backwards],
    )
    .unwrap();
}

#[test]
fn test_indices_mirror_each_other() {
    let store = LedgerStore::in_memory(&f40()).unwrap();
    assert!(vote(&store, "test", "dummy", &f40(), Direction::Up));
    assert!(vote(&store, "alice", "dummy", &f40(), Direction::Down));

    let session = store.session().unwrap();
    let forwards = session.get("forwards-f40").unwrap().unwrap();
    let backwards = session.get("backwards-f40").unwrap().unwrap();
    for (voter, given) in &forwards {
        for (recipient, d) in given {
            assert_eq!(backwards[recipient][voter], *d);
        }
    }
    assert_eq!(backwards["dummy"].len(), 2);
}

#[test]
fn test_duplicate_vote_is_noop() {
    let store = LedgerStore::in_memory(&f40()).unwrap();
    assert!(vote(&store, "test", "dummy", &f40(), Direction::Up));
    assert!(!vote(&store, "test", "dummy", &f40(), Direction::Up));

    let session = store.session().unwrap();
    assert_eq!(tally(&session.votes_received("dummy", &f40()).unwrap()), 1);
}

#[test]
fn test_opposite_vote_overwrites() {
    let store = LedgerStore::in_memory(&f40()).unwrap();
    assert!(vote(&store, "test", "dummy", &f40(), Direction::Up));
    assert!(vote(&store, "test", "dummy", &f40(), Direction::Down));

    let session = store.session().unwrap();
    let received = session.votes_received("dummy", &f40()).unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received["test"], Direction::Down);
    assert_eq!(tally(&received), -1);
    assert_eq!(session.votes_given("test", &f40()).unwrap()["dummy"], Direction::Down);
}

#[test]
fn test_partition_isolation() {
    let store = LedgerStore::in_memory(&f40()).unwrap();
    vote(&store, "test", "dummy", &f39(), Direction::Up);
    vote(&store, "alice", "dummy", &f40(), Direction::Up);
    // Same voter may vote again in a new release.
    assert!(vote(&store, "test", "dummy", &f40(), Direction::Up));

    let session = store.session().unwrap();
    assert_eq!(tally(&session.votes_received("dummy", &f39()).unwrap()), 1);
    assert_eq!(tally(&session.votes_received("dummy", &f40()).unwrap()), 2);
    assert_eq!(tally_all(&session.all_time_received("dummy").unwrap()), 3);

    let partitions = session.partitions().unwrap();
    assert_eq!(partitions, vec![f39(), f40()]);
}

#[test]
fn test_all_time_has_entry_per_partition() {
    let store = LedgerStore::in_memory(&f40()).unwrap();
    vote(&store, "test", "dummy", &f39(), Direction::Up);
    vote(&store, "test", "alice", &f40(), Direction::Up);

    let session = store.session().unwrap();
    let all = session.all_time_received("dummy").unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|m| m.is_empty()));
}

#[test]
fn test_legacy_ledger_migrated_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.db");
    write_legacy_ledger(
        &path,
        r#"{"test": {"dummy": 1}, "alice": {"dummy": -1}}"#,
        r#"{"dummy": {"test": 1, "alice": -1}}"#,
    );

    {
        let store = LedgerStore::open(&path, &f39()).unwrap();
        let session = store.session().unwrap();
        assert!(session.get("forwards").unwrap().is_none());
        assert!(session.get("backwards").unwrap().is_none());
        let received = session.votes_received("dummy", &f39()).unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(tally(&received), 0);
        assert_eq!(session.votes_given("test", &f39()).unwrap()["dummy"], Direction::Up);
    }

    // A later open under a new release must not migrate anything again.
    let store = LedgerStore::open(&path, &f40()).unwrap();
    assert_eq!(store.applied_migrations().unwrap().len(), 2);
    let session = store.session().unwrap();
    assert!(session.votes_received("dummy", &f40()).unwrap().is_empty());
    assert_eq!(session.partitions().unwrap(), vec![f39()]);
    assert_eq!(tally_all(&session.all_time_received("dummy").unwrap()), 0);
}

#[test]
fn test_legacy_merge_keeps_partitioned_votes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.db");
    write_legacy_ledger(
        &path,
        r#"{"test": {"dummy": 1}}"#,
        r#"{"dummy": {"test": 1}}"#,
    );
    {
        // A release partition written before the migration ran.
        let conn = Connection::open(&path).unwrap();
        let mut forwards = NestedVotes::new();
        forwards
            .entry("test".into())
            .or_default()
            .insert("dummy".into(), Direction::Down);
        let mut backwards = NestedVotes::new();
        backwards
            .entry("dummy".into())
            .or_default()
            .insert("test".into(), Direction::Down);
        conn.execute(
            "INSERT INTO ledger (key, value) VALUES ('forwards-f40', ?1), ('backwards-f40', ?2)",
            params![
                serde_json::to_string(&forwards).unwrap(),
                serde_json::to_string(&backwards).unwrap()
            ],
        )
        .unwrap();
    }

    let store = LedgerStore::open(&path, &f40()).unwrap();
    let session = store.session().unwrap();
    assert_eq!(
        session.votes_received("dummy", &f40()).unwrap()["test"],
        Direction::Down
    );
    assert_eq!(
        session.votes_given("test", &f40()).unwrap()["dummy"],
        Direction::Down
    );
    assert!(session.get("forwards").unwrap().is_none());
}

#[test]
fn test_votes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.db");
    {
        let store = LedgerStore::open(&path, &f40()).unwrap();
        vote(&store, "test", "dummy", &f40(), Direction::Up);
    }
    let store = LedgerStore::open(&path, &f40()).unwrap();
    let session = store.session().unwrap();
    assert_eq!(tally(&session.votes_received("dummy", &f40()).unwrap()), 1);
}

#[test]
fn test_corrupt_value_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("karma.db");
    {
        let store = LedgerStore::open(&path, &f40()).unwrap();
        drop(store);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO ledger (key, value) VALUES ('backwards-f40', '{\"dummy\": {\"test\": 5}}')",
            [],
        )
        .unwrap();
    }
    let store = LedgerStore::open(&path, &f40()).unwrap();
    let mut session = store.session().unwrap();
    assert!(session.votes_received("dummy", &f40()).is_err());
    assert!(session
        .record_vote("alice", "dummy", &f40(), Direction::Up)
        .is_err());
    drop(session);
    // The failed session released the lock.
    assert!(store.session().is_ok());
}
