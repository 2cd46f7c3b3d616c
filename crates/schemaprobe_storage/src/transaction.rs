//! Record transactions on an open connection.

use crate::error::{StorageError, StorageResult};
use crate::key::Key;
use crate::memory::MemoryConnection;
use crate::state::CollectionState;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Access mode of a record transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Reads only.
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

/// A record transaction scoped to a fixed set of collections.
///
/// Writes are staged and become visible on [`Transaction::commit`]. Dropping
/// the transaction without committing discards them. Structural changes are
/// not available here; they only happen inside an upgrade.
///
/// # Example
///
/// ```rust
/// use schemaprobe_storage::{CollectionParams, MemoryEngine, StorageEngine, TransactionMode};
/// use serde_json::json;
///
/// let engine = MemoryEngine::new();
/// let conn = engine
///     .open("app", 1, &mut |tx, _| {
///         tx.create_collection(
///             "notes",
///             &CollectionParams { key_path: Some("id".into()), auto_increment: true },
///         )
///     })
///     .unwrap();
///
/// let mut txn = conn.transaction(&["notes"], TransactionMode::ReadWrite).unwrap();
/// let key = txn.collection("notes").unwrap().add(json!({"text": "hi"})).unwrap();
/// txn.commit().unwrap();
///
/// let mut txn = conn.transaction(&["notes"], TransactionMode::ReadOnly).unwrap();
/// let note = txn.collection("notes").unwrap().get(&key).unwrap();
/// assert_eq!(note["text"], "hi");
/// ```
#[derive(Debug)]
pub struct Transaction<'c> {
    connection: &'c MemoryConnection,
    mode: TransactionMode,
    scope: BTreeMap<String, CollectionState>,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(
        connection: &'c MemoryConnection,
        mode: TransactionMode,
        scope: BTreeMap<String, CollectionState>,
    ) -> Self {
        Self {
            connection,
            mode,
            scope,
        }
    }

    /// Returns the transaction mode.
    #[must_use]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Returns a handle to one collection in the transaction's scope.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection is outside the scope.
    pub fn collection(&mut self, name: &str) -> StorageResult<CollectionHandle<'_>> {
        let mode = self.mode;
        let (name, state) = self
            .scope
            .iter_mut()
            .find(|(n, _)| n.as_str() == name)
            .ok_or_else(|| StorageError::collection_not_found(name))?;
        Ok(CollectionHandle { name, state, mode })
    }

    /// Publishes staged writes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the store or a scoped collection disappeared.
    pub fn commit(self) -> StorageResult<()> {
        if self.mode == TransactionMode::ReadOnly {
            return Ok(());
        }
        let store_name = self.connection.store_name();
        let mut state = self.connection.state.lock();
        let store = state
            .stores
            .get_mut(store_name)
            .ok_or_else(|| StorageError::invalid_state(format!("store '{store_name}' is gone")))?;
        for name in self.scope.keys() {
            if !store.collections.contains_key(name) {
                return Err(StorageError::invalid_state(format!(
                    "collection '{name}' was deleted during the transaction"
                )));
            }
        }
        let count = self.scope.len();
        store.collections.extend(self.scope);
        debug!(store = store_name, collections = count, "transaction committed");
        Ok(())
    }
}

/// Read/write access to one collection inside a [`Transaction`].
#[derive(Debug)]
pub struct CollectionHandle<'t> {
    name: &'t str,
    state: &'t mut CollectionState,
    mode: TransactionMode,
}

impl CollectionHandle<'_> {
    fn ensure_writable(&self) -> StorageResult<()> {
        match self.mode {
            TransactionMode::ReadWrite => Ok(()),
            TransactionMode::ReadOnly => Err(StorageError::ReadOnly),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Number of records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.state.records.len()
    }

    /// Gets a record by primary key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.state.records.get(key).cloned()
    }

    /// Returns all records in primary key order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Value> {
        self.state.records.values().cloned().collect()
    }

    /// Returns all records whose `index` key equals `key`.
    ///
    /// # Errors
    ///
    /// Returns `IndexNotFound` if the index does not exist.
    pub fn index_get_all(&self, index: &str, key: &Key) -> StorageResult<Vec<Value>> {
        self.state.index_lookup(self.name, index, key)
    }

    /// Inserts a record whose key comes from the key path or generator.
    ///
    /// # Errors
    ///
    /// Returns `KeyExists` if the key is taken, plus the errors of [`Self::put`].
    pub fn add(&mut self, record: Value) -> StorageResult<Key> {
        self.ensure_writable()?;
        self.state.write(self.name, record, None, false)
    }

    /// Inserts a record under an explicit key (collections without a key path).
    ///
    /// # Errors
    ///
    /// Returns `KeyExists` if the key is taken, plus the errors of [`Self::put`].
    pub fn add_with_key(&mut self, record: Value, key: Key) -> StorageResult<Key> {
        self.ensure_writable()?;
        self.state.write(self.name, record, Some(key), false)
    }

    /// Inserts or replaces a record whose key comes from the key path or generator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction is read-only
    /// - No key can be determined (`DataError`)
    /// - A unique index would be violated
    pub fn put(&mut self, record: Value) -> StorageResult<Key> {
        self.ensure_writable()?;
        self.state.write(self.name, record, None, true)
    }

    /// Inserts or replaces a record under an explicit key.
    ///
    /// # Errors
    ///
    /// Same as [`Self::put`].
    pub fn put_with_key(&mut self, record: Value, key: Key) -> StorageResult<Key> {
        self.ensure_writable()?;
        self.state.write(self.name, record, Some(key), true)
    }

    /// Deletes a record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `ReadOnly` in a read-only transaction.
    pub fn delete(&mut self, key: &Key) -> StorageResult<bool> {
        self.ensure_writable()?;
        Ok(self.state.records.remove(key).is_some())
    }
}
