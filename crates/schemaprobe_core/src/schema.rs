//! Declarative schema model.
//!
//! A [`SchemaModel`] names every collection a store should have, with its
//! primary key configuration and secondary indexes. It carries no logic
//! beyond validation; the diff engine compares it with a live catalog.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Desired shape of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    /// Collection name. Filled from the map key when deserialized.
    #[serde(default, skip_serializing)]
    pub name: String,
    /// Field path of the primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Whether the engine generates integer keys.
    #[serde(default)]
    pub auto_increment: bool,
    /// Declared index names, in declaration order, without duplicates.
    #[serde(default)]
    pub indexes: Vec<String>,
    /// Indexes that enforce uniqueness. Must be a subset of `indexes`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unique_indexes: BTreeSet<String>,
}

impl CollectionSpec {
    /// Creates a collection with no key path and no indexes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: None,
            auto_increment: false,
            indexes: Vec::new(),
            unique_indexes: BTreeSet::new(),
        }
    }

    /// Sets the primary key path.
    #[must_use]
    pub fn key_path(mut self, path: impl Into<String>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Enables generated integer keys.
    #[must_use]
    pub fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = value;
        self
    }

    /// Declares a non-unique index.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.indexes.contains(&name) {
            self.indexes.push(name);
        }
        self
    }

    /// Declares a unique index.
    #[must_use]
    pub fn unique_index(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut spec = self.index(name.clone());
        spec.unique_indexes.insert(name);
        spec
    }

    /// Returns true if `index` is declared unique.
    #[must_use]
    pub fn is_unique(&self, index: &str) -> bool {
        self.unique_indexes.contains(index)
    }

    /// Indexes that are materialised as secondary indexes.
    ///
    /// An index named like the key path is served by the primary key.
    pub fn secondary_indexes(&self) -> impl Iterator<Item = &str> + '_ {
        self.indexes
            .iter()
            .map(String::as_str)
            .filter(move |name| self.key_path.as_deref() != Some(*name))
    }

    /// Checks the collection's invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if the name or an index name is empty, an index
    /// is declared twice, or a unique index is not declared as an index.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::invalid_schema("collection name is empty"));
        }
        let mut seen = BTreeSet::new();
        for index in &self.indexes {
            if index.is_empty() {
                return Err(CoreError::invalid_schema(format!(
                    "collection '{}' declares an empty index name",
                    self.name
                )));
            }
            if !seen.insert(index.as_str()) {
                return Err(CoreError::invalid_schema(format!(
                    "collection '{}' declares index '{}' twice",
                    self.name, index
                )));
            }
        }
        if let Some(stray) = self.unique_indexes.iter().find(|u| !seen.contains(u.as_str())) {
            return Err(CoreError::invalid_schema(format!(
                "collection '{}' marks '{}' unique but does not declare it as an index",
                self.name, stray
            )));
        }
        Ok(())
    }
}

/// Desired schema of a store: collection name to spec.
///
/// Deserializes from a JSON object keyed by collection name:
///
/// ```rust
/// use schemaprobe_core::SchemaModel;
///
/// let schema: SchemaModel = serde_json::from_str(
///     r#"{ "posts": { "keyPath": "id", "indexes": ["id", "title"], "uniqueIndexes": ["title"] } }"#,
/// )
/// .unwrap();
/// let posts = schema.get("posts").unwrap();
/// assert_eq!(posts.name, "posts");
/// assert!(posts.is_unique("title"));
/// assert_eq!(posts.secondary_indexes().collect::<Vec<_>>(), vec!["title"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, CollectionSpec>",
    into = "BTreeMap<String, CollectionSpec>"
)]
pub struct SchemaModel {
    collections: BTreeMap<String, CollectionSpec>,
}

impl SchemaModel {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a collection.
    #[must_use]
    pub fn collection(mut self, spec: CollectionSpec) -> Self {
        self.insert(spec);
        self
    }

    /// Adds or replaces a collection in place.
    pub fn insert(&mut self, spec: CollectionSpec) {
        self.collections.insert(spec.name.clone(), spec);
    }

    /// Looks up a collection by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.get(name)
    }

    /// Returns true if the schema declares `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Declared collection names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.collections.keys().map(String::as_str)
    }

    /// Declared collections in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CollectionSpec> + '_ {
        self.collections.values()
    }

    /// Number of declared collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if no collection is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Checks every collection's invariants.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidSchema` found.
    pub fn validate(&self) -> CoreResult<()> {
        for (name, spec) in &self.collections {
            if name != &spec.name {
                return Err(CoreError::invalid_schema(format!(
                    "collection registered as '{}' is named '{}'",
                    name, spec.name
                )));
            }
            spec.validate()?;
        }
        Ok(())
    }
}

impl From<BTreeMap<String, CollectionSpec>> for SchemaModel {
    fn from(map: BTreeMap<String, CollectionSpec>) -> Self {
        let collections = map
            .into_iter()
            .map(|(name, mut spec)| {
                spec.name.clone_from(&name);
                (name, spec)
            })
            .collect();
        Self { collections }
    }
}

impl From<SchemaModel> for BTreeMap<String, CollectionSpec> {
    fn from(schema: SchemaModel) -> Self {
        schema.collections
    }
}

impl FromIterator<CollectionSpec> for SchemaModel {
    fn from_iter<I: IntoIterator<Item = CollectionSpec>>(iter: I) -> Self {
        let mut schema = Self::new();
        for spec in iter {
            schema.insert(spec);
        }
        schema
    }
}
