//! Persisted shape of the in-memory engine.

use crate::error::{StorageError, StorageResult};
use crate::key::{extract_key, inject_key, Key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single store: its version and collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub version: u64,
    pub collections: BTreeMap<String, CollectionState>,
}

impl StoreState {
    /// Collection and index names in enumeration order.
    pub fn catalog(&self) -> Vec<(String, Vec<String>)> {
        self.collections
            .iter()
            .map(|(name, c)| (name.clone(), c.indexes.keys().cloned().collect()))
            .collect()
    }

    pub fn collection(&self, name: &str) -> StorageResult<&CollectionState> {
        self.collections
            .get(name)
            .ok_or_else(|| StorageError::collection_not_found(name))
    }

    pub fn collection_mut(&mut self, name: &str) -> StorageResult<&mut CollectionState> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StorageError::collection_not_found(name))
    }
}

/// Index definition. Entries are derived from records on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IndexState {
    pub key_path: String,
    pub unique: bool,
}

/// A collection: key configuration, indexes and records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CollectionState {
    pub key_path: Option<String>,
    pub auto_increment: bool,
    pub next_key: i64,
    pub indexes: BTreeMap<String, IndexState>,
    #[serde(with = "record_pairs")]
    pub records: BTreeMap<Key, Value>,
}

impl CollectionState {
    pub fn new(key_path: Option<String>, auto_increment: bool) -> Self {
        Self {
            key_path,
            auto_increment,
            next_key: 1,
            indexes: BTreeMap::new(),
            records: BTreeMap::new(),
        }
    }

    /// Index key of `record` for `index`. Records without a valid key are not indexed.
    fn index_key(index: &IndexState, record: &Value) -> Option<Key> {
        extract_key(record, &index.key_path).ok().flatten()
    }

    /// Fails if adding `index` would index two records under the same key.
    pub fn check_index_buildable(
        &self,
        collection: &str,
        name: &str,
        index: &IndexState,
    ) -> StorageResult<()> {
        if !index.unique {
            return Ok(());
        }
        let mut seen = std::collections::BTreeSet::new();
        for record in self.records.values() {
            if let Some(key) = Self::index_key(index, record) {
                if !seen.insert(key) {
                    return Err(StorageError::UniqueViolation {
                        collection: collection.to_string(),
                        index: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolves the primary key for a write, generating one if configured.
    fn resolve_key(&mut self, record: &mut Value, explicit: Option<Key>) -> StorageResult<Key> {
        let key = match (&self.key_path, explicit) {
            (Some(_), Some(_)) => {
                return Err(StorageError::data_error(
                    "explicit key given for a collection with an inline key path",
                ))
            }
            (Some(path), None) => match extract_key(record, path)? {
                Some(key) => key,
                None if self.auto_increment => {
                    let key = Key::Int(self.next_key);
                    inject_key(record, path, &key)?;
                    key
                }
                None => {
                    return Err(StorageError::data_error(format!(
                        "record has no value at key path '{path}'"
                    )))
                }
            },
            (None, Some(key)) => key,
            (None, None) if self.auto_increment => Key::Int(self.next_key),
            (None, None) => {
                return Err(StorageError::data_error(
                    "collection has no key path or key generator and no key was given",
                ))
            }
        };
        if let Key::Int(n) = key {
            if self.auto_increment && n >= self.next_key {
                self.next_key = n.saturating_add(1);
            }
        }
        Ok(key)
    }

    /// Inserts or replaces a record, enforcing unique indexes.
    pub fn write(
        &mut self,
        collection: &str,
        mut record: Value,
        explicit: Option<Key>,
        overwrite: bool,
    ) -> StorageResult<Key> {
        let next_key_before = self.next_key;
        let key = match self.resolve_key(&mut record, explicit) {
            Ok(key) => key,
            Err(e) => {
                self.next_key = next_key_before;
                return Err(e);
            }
        };

        let conflict = if !overwrite && self.records.contains_key(&key) {
            Some(StorageError::KeyExists {
                collection: collection.to_string(),
            })
        } else {
            self.unique_conflict(collection, &key, &record)
        };
        if let Some(err) = conflict {
            self.next_key = next_key_before;
            return Err(err);
        }

        self.records.insert(key.clone(), record);
        Ok(key)
    }

    fn unique_conflict(&self, collection: &str, primary: &Key, record: &Value) -> Option<StorageError> {
        for (name, index) in self.indexes.iter().filter(|(_, i)| i.unique) {
            let Some(candidate) = Self::index_key(index, record) else {
                continue;
            };
            let clash = self.records.iter().any(|(other, existing)| {
                other != primary && Self::index_key(index, existing).as_ref() == Some(&candidate)
            });
            if clash {
                return Some(StorageError::UniqueViolation {
                    collection: collection.to_string(),
                    index: name.clone(),
                });
            }
        }
        None
    }

    /// Records whose index key equals `key`, in primary key order.
    pub fn index_lookup(&self, collection: &str, index: &str, key: &Key) -> StorageResult<Vec<Value>> {
        let index = self
            .indexes
            .get(index)
            .ok_or_else(|| StorageError::index_not_found(collection, index))?;
        Ok(self
            .records
            .values()
            .filter(|record| Self::index_key(index, record).as_ref() == Some(key))
            .cloned()
            .collect())
    }
}

/// Serializes a key-ordered record map as a list of `[key, value]` pairs.
mod record_pairs {
    use crate::key::Key;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<Key, Value>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<Key, Value>, D::Error> {
        let pairs: Vec<(Key, Value)> = Vec::deserialize(d)?;
        Ok(pairs.into_iter().collect())
    }
}
