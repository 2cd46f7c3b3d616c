//! Inspect command implementation.

use schemaprobe_core::{collection_names, index_names};
use schemaprobe_storage::{MemoryEngine, StorageEngine};
use serde::Serialize;
use std::path::Path;

/// A store as listed by `inspect`.
#[derive(Debug, Serialize)]
pub struct StoreInfo {
    /// Store name.
    pub name: String,
    /// Persisted version.
    pub version: u64,
    /// Collections with their indexes.
    pub collections: Vec<CollectionInfo>,
}

/// A collection as listed by `inspect`.
#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Index names.
    pub indexes: Vec<String>,
}

/// Collects catalog information, optionally for one store only.
pub fn collect(
    engine: &MemoryEngine,
    only: Option<&str>,
) -> Result<Vec<StoreInfo>, Box<dyn std::error::Error>> {
    let mut stores = Vec::new();
    for db in engine.databases()? {
        if only.is_some_and(|name| name != db.name) {
            continue;
        }
        let conn = engine.open(&db.name, db.version, &mut |_, _| Ok(()))?;
        let mut collections = Vec::new();
        for name in collection_names(&conn) {
            let indexes = index_names(&conn, &name)?;
            collections.push(CollectionInfo { name, indexes });
        }
        stores.push(StoreInfo {
            name: db.name,
            version: db.version,
            collections,
        });
    }
    Ok(stores)
}

/// Runs the inspect command.
pub fn run(state_path: &Path, only: Option<&str>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !state_path.exists() {
        return Err(format!("No state file found at {:?}", state_path).into());
    }
    let engine = MemoryEngine::load(state_path)?;
    let stores = collect(&engine, only)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stores)?);
        return Ok(());
    }

    if stores.is_empty() {
        println!("No stores.");
    }
    for store in &stores {
        println!("Store '{}' (version {})", store.name, store.version);
        for collection in &store.collections {
            if collection.indexes.is_empty() {
                println!("  {}", collection.name);
            } else {
                println!("  {} [{}]", collection.name, collection.indexes.join(", "));
            }
        }
    }
    Ok(())
}
