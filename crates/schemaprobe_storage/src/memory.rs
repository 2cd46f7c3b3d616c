//! In-memory storage engine.

use crate::engine::{
    Catalog, CollectionParams, Connection, DatabaseInfo, IndexParams, SchemaEditor,
    StorageEngine, UpgradeHandler, VersionChange,
};
use crate::error::{StorageError, StorageResult};
use crate::state::{CollectionState, IndexState, StoreState};
use crate::transaction::{Transaction, TransactionMode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared engine state guarded by the engine mutex.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct EngineState {
    pub stores: BTreeMap<String, StoreState>,
    #[serde(skip)]
    open: HashMap<String, BTreeSet<u64>>,
    #[serde(skip)]
    next_connection_id: u64,
}

impl EngineState {
    fn open_count(&self, name: &str) -> usize {
        self.open.get(name).map_or(0, BTreeSet::len)
    }

    fn register(&mut self, name: &str) -> u64 {
        self.next_connection_id += 1;
        let id = self.next_connection_id;
        self.open.entry(name.to_string()).or_default().insert(id);
        id
    }

    fn release(&mut self, name: &str, id: u64) {
        if let Some(ids) = self.open.get_mut(name) {
            ids.remove(&id);
            if ids.is_empty() {
                self.open.remove(name);
            }
        }
    }
}

/// An in-memory, versioned store engine.
///
/// The engine follows the host contract of [`StorageEngine`]:
/// - Versions only move forward
/// - Structural edits happen inside a staged upgrade that commits or
///   rolls back as a whole
/// - A version change is refused with `Blocked` while connections are open
///
/// Cloning the engine yields another handle to the same stores, so clones
/// can be handed to other threads.
///
/// # Example
///
/// ```rust
/// use schemaprobe_storage::{Catalog, CollectionParams, Connection, MemoryEngine, StorageEngine};
///
/// let engine = MemoryEngine::new();
/// let conn = engine
///     .open("app", 1, &mut |tx, _change| {
///         tx.create_collection("notes", &CollectionParams::default())
///     })
///     .unwrap();
/// assert_eq!(conn.version(), 1);
/// assert_eq!(conn.collection_name_at(0), Some("notes"));
/// assert_eq!(conn.collection_name_at(1), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MemoryEngine {
    /// Creates an engine with no stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads engine state previously written by [`MemoryEngine::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let state: EngineState = serde_json::from_str(&text)?;
        debug!(path = %path.display(), stores = state.stores.len(), "loaded engine state");
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Loads engine state from `path`, or starts empty if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> StorageResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Writes all stores, records included, to `path` as JSON.
    ///
    /// Open connections are not persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let text = {
            let state = self.state.lock();
            serde_json::to_string_pretty(&*state)?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "saved engine state");
        Ok(())
    }

    /// Returns the persisted version of a store, if it exists.
    #[must_use]
    pub fn version_of(&self, name: &str) -> Option<u64> {
        self.state.lock().stores.get(name).map(|s| s.version)
    }

    /// Returns the number of open connections to a store.
    #[must_use]
    pub fn open_connections(&self, name: &str) -> usize {
        self.state.lock().open_count(name)
    }

    /// Deletes a store and everything in it.
    ///
    /// Returns `false` if the store did not exist.
    ///
    /// # Errors
    ///
    /// Returns `Blocked` while connections to the store are open.
    pub fn delete_database(&self, name: &str) -> StorageResult<bool> {
        let mut state = self.state.lock();
        let open_connections = state.open_count(name);
        if open_connections > 0 {
            return Err(StorageError::Blocked {
                name: name.to_string(),
                open_connections,
            });
        }
        let existed = state.stores.remove(name).is_some();
        if existed {
            info!(store = name, "deleted store");
        }
        Ok(existed)
    }
}

impl StorageEngine for MemoryEngine {
    type Connection = MemoryConnection;

    fn databases(&self) -> StorageResult<Vec<DatabaseInfo>> {
        Ok(self
            .state
            .lock()
            .stores
            .iter()
            .map(|(name, store)| DatabaseInfo {
                name: name.clone(),
                version: store.version,
            })
            .collect())
    }

    fn open(
        &self,
        name: &str,
        version: u64,
        on_upgrade: &mut UpgradeHandler<'_>,
    ) -> StorageResult<MemoryConnection> {
        let mut state = self.state.lock();
        let stored = state.stores.get(name).map_or(0, |s| s.version);

        if version == 0 || version < stored {
            return Err(StorageError::VersionError {
                name: name.to_string(),
                requested: version,
                stored,
            });
        }

        if version > stored {
            let open_connections = state.open_count(name);
            if open_connections > 0 {
                debug!(store = name, open_connections, "version change blocked");
                return Err(StorageError::Blocked {
                    name: name.to_string(),
                    open_connections,
                });
            }

            let mut staged = state.stores.get(name).cloned().unwrap_or_default();
            staged.version = version;
            let change = VersionChange {
                old_version: stored,
                new_version: version,
            };
            debug!(store = name, from = stored, to = version, "running upgrade");

            let mut upgrade = UpgradeTransaction {
                store: &mut staged,
            };
            let editor: &mut dyn SchemaEditor = &mut upgrade;
            if let Err(source) = on_upgrade(editor, change) {
                warn!(store = name, version, error = %source, "upgrade aborted");
                return Err(StorageError::Aborted {
                    name: name.to_string(),
                    version,
                    source: Box::new(source),
                });
            }

            state.stores.insert(name.to_string(), staged);
            info!(store = name, from = stored, to = version, "upgrade committed");
        }

        let catalog = state
            .stores
            .get(name)
            .map(StoreState::catalog)
            .unwrap_or_default();
        let id = state.register(name);

        Ok(MemoryConnection {
            id,
            name: name.to_string(),
            version,
            catalog,
            state: Arc::clone(&self.state),
        })
    }
}

/// Structural editor over a staged copy of a store.
struct UpgradeTransaction<'a> {
    store: &'a mut StoreState,
}

impl Catalog for UpgradeTransaction<'_> {
    fn collection_name_at(&self, position: usize) -> Option<&str> {
        self.store.collections.keys().nth(position).map(String::as_str)
    }

    fn index_name_at(&self, collection: &str, position: usize) -> StorageResult<Option<&str>> {
        Ok(self
            .store
            .collection(collection)?
            .indexes
            .keys()
            .nth(position)
            .map(String::as_str))
    }
}

impl SchemaEditor for UpgradeTransaction<'_> {
    fn create_collection(&mut self, name: &str, params: &CollectionParams) -> StorageResult<()> {
        if self.store.collections.contains_key(name) {
            return Err(StorageError::CollectionExists {
                name: name.to_string(),
            });
        }
        self.store.collections.insert(
            name.to_string(),
            CollectionState::new(params.key_path.clone(), params.auto_increment),
        );
        Ok(())
    }

    fn delete_collection(&mut self, name: &str) -> StorageResult<()> {
        self.store
            .collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::collection_not_found(name))
    }

    fn create_index(&mut self, collection: &str, params: &IndexParams) -> StorageResult<()> {
        let target = self.store.collection_mut(collection)?;
        if target.indexes.contains_key(&params.name) {
            return Err(StorageError::IndexExists {
                collection: collection.to_string(),
                index: params.name.clone(),
            });
        }
        let index = IndexState {
            key_path: params.key_path.clone(),
            unique: params.unique,
        };
        target.check_index_buildable(collection, &params.name, &index)?;
        target.indexes.insert(params.name.clone(), index);
        Ok(())
    }

    fn delete_index(&mut self, collection: &str, index: &str) -> StorageResult<()> {
        self.store
            .collection_mut(collection)?
            .indexes
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| StorageError::index_not_found(collection, index))
    }
}

/// A connection to a store in a [`MemoryEngine`].
///
/// The catalog is captured at open time; it cannot change underneath the
/// connection because version changes are blocked while it is open.
/// Dropping the connection closes it.
#[derive(Debug)]
pub struct MemoryConnection {
    id: u64,
    name: String,
    version: u64,
    catalog: Vec<(String, Vec<String>)>,
    pub(crate) state: Arc<Mutex<EngineState>>,
}

impl MemoryConnection {
    /// Collection names in enumeration order.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        self.catalog.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Starts a record transaction over `collections`.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if any collection is missing, or
    /// `InvalidState` if the scope is empty.
    pub fn transaction(
        &self,
        collections: &[&str],
        mode: TransactionMode,
    ) -> StorageResult<Transaction<'_>> {
        if collections.is_empty() {
            return Err(StorageError::invalid_state(
                "a transaction needs at least one collection",
            ));
        }
        let state = self.state.lock();
        let store = state
            .stores
            .get(&self.name)
            .ok_or_else(|| StorageError::invalid_state(format!("store '{}' is gone", self.name)))?;
        let mut scope = BTreeMap::new();
        for name in collections {
            scope.insert((*name).to_string(), store.collection(name)?.clone());
        }
        Ok(Transaction::new(self, mode, scope))
    }

    pub(crate) fn store_name(&self) -> &str {
        &self.name
    }
}

impl Catalog for MemoryConnection {
    fn collection_name_at(&self, position: usize) -> Option<&str> {
        self.catalog.get(position).map(|(name, _)| name.as_str())
    }

    fn index_name_at(&self, collection: &str, position: usize) -> StorageResult<Option<&str>> {
        let (_, indexes) = self
            .catalog
            .iter()
            .find(|(name, _)| name == collection)
            .ok_or_else(|| StorageError::collection_not_found(collection))?;
        Ok(indexes.get(position).map(String::as_str))
    }
}

impl Connection for MemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.state.lock().release(&self.name, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_upgrade(_: &mut dyn SchemaEditor, _: VersionChange) -> StorageResult<()> {
        Ok(())
    }

    fn with_posts(tx: &mut dyn SchemaEditor, _: VersionChange) -> StorageResult<()> {
        tx.create_collection(
            "posts",
            &CollectionParams {
                key_path: Some("id".into()),
                auto_increment: true,
            },
        )?;
        tx.create_index("posts", &IndexParams::named("title", false))
    }

    #[test]
    fn open_new_store_runs_upgrade_from_zero() {
        let engine = MemoryEngine::new();
        let mut seen = None;
        let conn = engine
            .open("db", 1, &mut |tx, change| {
                seen = Some(change);
                with_posts(tx, change)
            })
            .unwrap();

        assert_eq!(
            seen,
            Some(VersionChange {
                old_version: 0,
                new_version: 1
            })
        );
        assert_eq!(conn.collection_names(), vec!["posts"]);
        assert_eq!(conn.index_name_at("posts", 0).unwrap(), Some("title"));
        assert_eq!(conn.index_name_at("posts", 1).unwrap(), None);
        assert_eq!(engine.version_of("db"), Some(1));
    }

    #[test]
    fn same_version_skips_upgrade() {
        let engine = MemoryEngine::new();
        drop(engine.open("db", 2, &mut with_posts).unwrap());

        let mut called = false;
        let conn = engine
            .open("db", 2, &mut |_, _| {
                called = true;
                Ok(())
            })
            .unwrap();
        assert!(!called);
        assert_eq!(conn.version(), 2);
    }

    #[test]
    fn lower_or_zero_version_is_rejected() {
        let engine = MemoryEngine::new();
        drop(engine.open("db", 3, &mut no_upgrade).unwrap());

        let err = engine.open("db", 2, &mut no_upgrade).unwrap_err();
        assert!(matches!(err, StorageError::VersionError { stored: 3, .. }));
        let err = engine.open("other", 0, &mut no_upgrade).unwrap_err();
        assert!(matches!(err, StorageError::VersionError { requested: 0, .. }));
    }

    #[test]
    fn open_connection_blocks_version_change() {
        let engine = MemoryEngine::new();
        let conn = engine.open("db", 1, &mut no_upgrade).unwrap();

        let err = engine.open("db", 2, &mut no_upgrade).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Blocked {
                open_connections: 1,
                ..
            }
        ));

        // Same version is still fine.
        let second = engine.open("db", 1, &mut no_upgrade).unwrap();
        assert_eq!(engine.open_connections("db"), 2);

        conn.close();
        drop(second);
        assert_eq!(engine.open_connections("db"), 0);
        assert!(engine.open("db", 2, &mut no_upgrade).is_ok());
    }

    #[test]
    fn failed_upgrade_rolls_back() {
        let engine = MemoryEngine::new();
        drop(engine.open("db", 1, &mut with_posts).unwrap());

        let err = engine
            .open("db", 2, &mut |tx, _| {
                tx.create_collection("users", &CollectionParams::default())?;
                tx.delete_index("posts", "title")?;
                tx.create_collection("users", &CollectionParams::default())
            })
            .unwrap_err();

        match err {
            StorageError::Aborted {
                version, source, ..
            } => {
                assert_eq!(version, 2);
                assert!(matches!(*source, StorageError::CollectionExists { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.version_of("db"), Some(1));
        let conn = engine.open("db", 1, &mut no_upgrade).unwrap();
        assert_eq!(conn.collection_names(), vec!["posts"]);
        assert_eq!(conn.index_name_at("posts", 0).unwrap(), Some("title"));
        assert_eq!(engine.open_connections("db"), 1);
    }

    #[test]
    fn failed_first_upgrade_leaves_no_store() {
        let engine = MemoryEngine::new();
        let result = engine.open("db", 1, &mut |tx, _| tx.delete_collection("ghost"));
        assert!(result.is_err());
        assert!(engine.databases().unwrap().is_empty());
    }

    #[test]
    fn editor_reports_structural_errors() {
        let engine = MemoryEngine::new();
        drop(engine.open("db", 1, &mut with_posts).unwrap());
        engine
            .open("db", 2, &mut |tx, _| {
                assert!(matches!(
                    tx.create_index("posts", &IndexParams::named("title", true)),
                    Err(StorageError::IndexExists { .. })
                ));
                assert!(matches!(
                    tx.delete_index("posts", "nope"),
                    Err(StorageError::IndexNotFound { .. })
                ));
                assert!(matches!(
                    tx.index_name_at("missing", 0),
                    Err(StorageError::CollectionNotFound { .. })
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn unknown_collection_index_lookup_fails() {
        let engine = MemoryEngine::new();
        let conn = engine.open("db", 1, &mut with_posts).unwrap();
        let err = conn.index_name_at("users", 0).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn databases_lists_versions() {
        let engine = MemoryEngine::new();
        drop(engine.open("a", 4, &mut no_upgrade).unwrap());
        drop(engine.open("b", 1, &mut no_upgrade).unwrap());

        let dbs = engine.databases().unwrap();
        assert_eq!(
            dbs,
            vec![
                DatabaseInfo {
                    name: "a".into(),
                    version: 4
                },
                DatabaseInfo {
                    name: "b".into(),
                    version: 1
                },
            ]
        );
    }

    #[test]
    fn delete_database_respects_open_connections() {
        let engine = MemoryEngine::new();
        let conn = engine.open("db", 1, &mut no_upgrade).unwrap();
        assert!(engine.delete_database("db").is_err());
        drop(conn);
        assert!(engine.delete_database("db").unwrap());
        assert!(!engine.delete_database("db").unwrap());
        assert_eq!(engine.version_of("db"), None);
    }

    #[test]
    fn save_and_load_preserve_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("engine.json");

        let engine = MemoryEngine::new();
        let conn = engine.open("db", 5, &mut with_posts).unwrap();
        engine.save(&path).unwrap();
        drop(conn);

        let loaded = MemoryEngine::load(&path).unwrap();
        assert_eq!(loaded.version_of("db"), Some(5));
        assert_eq!(loaded.open_connections("db"), 0);
        let conn = loaded.open("db", 5, &mut no_upgrade).unwrap();
        assert_eq!(conn.collection_names(), vec!["posts"]);
    }

    #[test]
    fn load_or_default_without_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MemoryEngine::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert!(engine.databases().unwrap().is_empty());
    }
}
