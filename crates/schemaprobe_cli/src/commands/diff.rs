//! Diff command implementation.

use super::load_schema;
use schemaprobe_core::{compute_drift, DriftReport, Exclusions};
use schemaprobe_storage::{Catalog, MemoryEngine, StorageEngine, StorageError, StorageResult};
use std::path::Path;

/// Catalog of a store that does not exist yet.
struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn collection_name_at(&self, _position: usize) -> Option<&str> {
        None
    }

    fn index_name_at(&self, collection: &str, _position: usize) -> StorageResult<Option<&str>> {
        Err(StorageError::collection_not_found(collection))
    }
}

/// Computes drift between a stored catalog and a schema file.
///
/// The store is opened at its current version, so nothing is upgraded.
pub fn drift(
    engine: &MemoryEngine,
    name: &str,
    schema_path: &Path,
    exclude: &Exclusions,
) -> Result<(Option<u64>, DriftReport), Box<dyn std::error::Error>> {
    let schema = load_schema(schema_path)?;
    match engine.version_of(name) {
        Some(version) => {
            let conn = engine.open(name, version, &mut |_, _| Ok(()))?;
            Ok((Some(version), compute_drift(&conn, &schema, exclude)?))
        }
        None => Ok((None, compute_drift(&EmptyCatalog, &schema, exclude)?)),
    }
}

/// Runs the diff command.
pub fn run(
    state_path: &Path,
    name: &str,
    schema_path: &Path,
    exclude: &Exclusions,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = MemoryEngine::load_or_default(state_path)?;
    let (version, report) = drift(&engine, name, schema_path, exclude)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match version {
        Some(version) => println!("Store '{}' at version {}", name, version),
        None => println!("Store '{}' does not exist yet", name),
    }
    if report.is_converged() {
        println!("  Up to date.");
        return Ok(());
    }

    println!("  {} pending changes", report.change_count());
    for collection in &report.created_collections {
        println!("  + collection {}", collection);
    }
    for collection in &report.deleted_collections {
        println!("  - collection {}", collection);
    }
    for (collection, drift) in &report.index_drift {
        for index in &drift.created_indexes {
            println!("  + index {}.{}", collection, index);
        }
        for index in &drift.deleted_indexes {
            println!("  - index {}.{}", collection, index);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaprobe_storage::{CollectionParams, Connection};
    use std::io::Write;

    fn schema_file(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("schema.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_store_wants_every_collection() {
        let dir = tempfile::tempdir().unwrap();
        let schema = schema_file(dir.path(), r#"{"posts": {}, "users": {}}"#);
        let engine = MemoryEngine::new();

        let (version, report) = drift(&engine, "blog", &schema, &Exclusions::new()).unwrap();

        assert_eq!(version, None);
        assert_eq!(report.created_collections.len(), 2);
        assert!(engine.databases().unwrap().is_empty());
    }

    #[test]
    fn existing_store_is_not_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let schema = schema_file(dir.path(), r#"{"posts": {"indexes": ["title"]}}"#);
        let engine = MemoryEngine::new();
        engine
            .open("blog", 2, &mut |tx, _| {
                tx.create_collection("posts", &CollectionParams::default())?;
                tx.create_collection("old", &CollectionParams::default())
            })
            .unwrap()
            .close();

        let exclude: Exclusions = ["old"].into_iter().collect();
        let (version, report) = drift(&engine, "blog", &schema, &exclude).unwrap();

        assert_eq!(version, Some(2));
        assert!(report.deleted_collections.is_empty());
        assert_eq!(report.change_count(), 1);
        assert_eq!(engine.version_of("blog"), Some(2));
    }
}
