//! Test fixtures and store helpers.
//!
//! Provides seeding, snapshotting and sample schemas for tests that drive
//! `open_store` against the in-memory engine.

use schemaprobe_core::{collection_names, index_names, CollectionSpec, Exclusions, SchemaModel};
use schemaprobe_storage::{Catalog, CollectionParams, IndexParams, MemoryEngine, StorageEngine};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Collection names mapped to their index names.
pub type CatalogShape = BTreeMap<String, BTreeSet<String>>;

/// Builds a [`CatalogShape`] from literals.
pub fn shape(collections: &[(&str, &[&str])]) -> CatalogShape {
    collections
        .iter()
        .map(|(name, indexes)| {
            let indexes = indexes.iter().map(|i| i.to_string()).collect();
            (name.to_string(), indexes)
        })
        .collect()
}

/// Reads the full catalog behind a connection.
pub fn catalog_snapshot<C: Catalog + ?Sized>(catalog: &C) -> CatalogShape {
    collection_names(catalog)
        .into_iter()
        .map(|name| {
            let indexes = index_names(catalog, &name)
                .expect("listed collection must exist")
                .into_iter()
                .collect();
            (name, indexes)
        })
        .collect()
}

/// Returns the version and catalog of `name`, or `None` if it does not exist.
///
/// Opens and closes a connection at the persisted version.
pub fn store_snapshot(engine: &MemoryEngine, name: &str) -> Option<(u64, CatalogShape)> {
    let version = engine.version_of(name)?;
    let conn = engine
        .open(name, version, &mut |_, _| Ok(()))
        .expect("Failed to open store at its own version");
    Some((version, catalog_snapshot(&conn)))
}

/// Creates `name` at `version` with exactly the given catalog, bypassing the
/// schema core.
///
/// # Panics
///
/// Panics if the store already exists at `version` or higher.
pub fn seed_store(engine: &MemoryEngine, name: &str, version: u64, catalog: &CatalogShape) {
    let conn = engine
        .open(name, version, &mut |tx, _| {
            for (collection, indexes) in catalog {
                tx.create_collection(collection, &CollectionParams::default())?;
                for index in indexes {
                    tx.create_index(collection, &IndexParams::named(index.as_str(), false))?;
                }
            }
            Ok(())
        })
        .expect("Failed to seed store");
    drop(conn);
}

/// The catalog an auto-probed open must end with.
///
/// Non-excluded collections match the schema exactly. Excluded collections
/// keep whatever `seed` gave them.
pub fn expected_shape(schema: &SchemaModel, exclude: &Exclusions, seed: &CatalogShape) -> CatalogShape {
    let mut expected: CatalogShape = seed
        .iter()
        .filter(|(name, _)| exclude.contains(name))
        .map(|(name, indexes)| (name.clone(), indexes.clone()))
        .collect();
    for spec in schema.iter().filter(|spec| !exclude.contains(&spec.name)) {
        let indexes = spec.secondary_indexes().map(str::to_string).collect();
        expected.insert(spec.name.clone(), indexes);
    }
    expected
}

/// An engine whose state is saved to a temporary JSON file.
pub struct TestState {
    /// The engine instance.
    pub engine: MemoryEngine,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestState {
    /// Creates an empty engine with a fresh state file location.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            engine: MemoryEngine::new(),
            path: temp_dir.path().join("state.json"),
            _temp_dir: temp_dir,
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the engine to the state file.
    pub fn save(&self) {
        self.engine.save(&self.path).expect("Failed to save state");
    }

    /// Replaces the engine with a fresh load of the state file.
    pub fn reload(&mut self) {
        self.engine = MemoryEngine::load(&self.path).expect("Failed to load state");
    }
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestState {
    type Target = MemoryEngine;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// Sample schemas.
pub mod scenarios {
    use super::*;

    /// `posts` keyed by `id` with a `title` index.
    pub fn blog() -> SchemaModel {
        SchemaModel::new().collection(
            CollectionSpec::new("posts")
                .key_path("id")
                .index("id")
                .index("title"),
        )
    }

    /// [`blog`] plus `users` with a unique `email` index and `comments`.
    pub fn blog_with_users() -> SchemaModel {
        blog()
            .collection(
                CollectionSpec::new("users")
                    .key_path("id")
                    .auto_increment(true)
                    .unique_index("email"),
            )
            .collection(CollectionSpec::new("comments").auto_increment(true).index("post"))
    }

    /// [`blog`] plus a `legacy` collection meant to be excluded.
    pub fn blog_with_legacy() -> SchemaModel {
        blog().collection(CollectionSpec::new("legacy").index("old"))
    }
}
