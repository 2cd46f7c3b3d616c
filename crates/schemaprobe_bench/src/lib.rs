//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemaprobe_core::{CollectionSpec, SchemaModel};
use schemaprobe_storage::{CollectionParams, IndexParams, MemoryEngine, StorageEngine};

/// Schema of `collections` collections with `indexes` indexes each.
pub fn wide_schema(collections: usize, indexes: usize) -> SchemaModel {
    (0..collections)
        .map(|c| {
            (0..indexes).fold(CollectionSpec::new(format!("c{c}")).key_path("id"), |spec, i| {
                spec.index(format!("i{i}"))
            })
        })
        .collect()
}

/// Creates `name` at version 1 with half of `schema`'s collections, each
/// missing its last index, plus one stray collection.
pub fn half_migrated(engine: &MemoryEngine, name: &str, schema: &SchemaModel) {
    let conn = engine
        .open(name, 1, &mut |tx, _| {
            for spec in schema.iter().step_by(2) {
                tx.create_collection(&spec.name, &CollectionParams::with_key_path("id"))?;
                let keep = spec.indexes.len().saturating_sub(1);
                for index in spec.indexes.iter().take(keep) {
                    tx.create_index(&spec.name, &IndexParams::named(index.as_str(), false))?;
                }
            }
            tx.create_collection("stray", &CollectionParams::default())
        })
        .expect("Failed to seed benchmark store");
    drop(conn);
}
