//! State files survive a save and reload.

use schemaprobe_core::{open_store_with_report, ProbeConfig, VersionOptions};
use schemaprobe_storage::TransactionMode;
use schemaprobe_testkit::prelude::*;

#[test]
fn reloaded_state_needs_no_upgrade() {
    let mut state = TestState::new();
    let schema = scenarios::blog_with_users();

    let first = open_store_with_report(&*state, "db", &schema, &VersionOptions::default()).unwrap();
    {
        let mut txn = first
            .connection
            .transaction(&["users"], TransactionMode::ReadWrite)
            .unwrap();
        txn.collection("users")
            .unwrap()
            .add(serde_json::json!({"email": "ada@example.com"}))
            .unwrap();
        txn.commit().unwrap();
    }
    drop(first);

    state.save();
    state.reload();

    let again = open_store_with_report(&*state, "db", &schema, &VersionOptions::default()).unwrap();
    assert!(again.is_noop());
    let mut txn = again
        .connection
        .transaction(&["users"], TransactionMode::ReadOnly)
        .unwrap();
    let users = txn.collection("users").unwrap();
    assert_eq!(users.count(), 1);
    assert_eq!(users.get_all()[0]["id"], 1);
}

#[test]
fn excluded_legacy_collection_is_preserved_across_reloads() {
    let mut state = TestState::new();
    seed_store(&state, "db", 3, &shape(&[("legacy", &["old", "older"])]));
    state.save();
    state.reload();

    let options = VersionOptions::from(ProbeConfig::new().exclude("legacy"));
    let outcome = open_store_with_report(&*state, "db", &scenarios::blog_with_legacy(), &options).unwrap();

    assert_eq!(outcome.version, 4);
    assert_eq!(
        catalog_snapshot(&outcome.connection),
        shape(&[("legacy", &["old", "older"]), ("posts", &["title"])])
    );
    assert!(state.path().exists());
}
