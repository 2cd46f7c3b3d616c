//! Several threads opening the same store with the same schema.

use schemaprobe_core::VersionOptions;
use schemaprobe_storage::MemoryEngine;
use schemaprobe_testkit::prelude::*;

#[test]
fn concurrent_opens_of_a_fresh_store_agree() {
    let engine = MemoryEngine::new();
    let schema = scenarios::blog_with_users();

    let results = open_concurrently(&engine, "db", &schema, &VersionOptions::default(), 8);

    for result in results {
        assert_eq!(result.unwrap(), 1);
    }
    assert_eq!(engine.open_connections("db"), 0);
    let (version, catalog) = store_snapshot(&engine, "db").unwrap();
    assert_eq!(version, 1);
    assert_eq!(catalog.len(), 3);
}

#[test]
fn concurrent_opens_of_a_converged_store_never_upgrade() {
    let engine = MemoryEngine::new();
    seed_store(&engine, "db", 7, &shape(&[("posts", &["title"])]));

    let results = open_concurrently(&engine, "db", &scenarios::blog(), &VersionOptions::default(), 6);

    assert!(results.into_iter().all(|r| r.unwrap() == 7));
    assert_eq!(engine.version_of("db"), Some(7));
}
