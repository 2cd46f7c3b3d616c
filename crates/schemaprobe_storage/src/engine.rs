//! Host engine contract.
//!
//! These traits describe the versioned store the schema core drives. An
//! engine persists named stores, each at a version number, and only lets
//! collections and indexes change inside the upgrade transaction it runs when
//! a store is opened at a version above the persisted one.

use crate::error::StorageResult;
use serde::{Deserialize, Serialize};

/// A persisted store as reported by the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Store name.
    pub name: String,
    /// Persisted version.
    pub version: u64,
}

/// Version transition passed to the upgrade handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionChange {
    /// Version before the upgrade (0 when the store did not exist).
    pub old_version: u64,
    /// Version being installed.
    pub new_version: u64,
}

/// Parameters for creating a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionParams {
    /// Field path of the primary key inside each record, if any.
    pub key_path: Option<String>,
    /// Whether the engine generates integer keys.
    pub auto_increment: bool,
}

impl CollectionParams {
    /// Parameters for a collection keyed by `path`.
    #[must_use]
    pub fn with_key_path(path: impl Into<String>) -> Self {
        Self {
            key_path: Some(path.into()),
            auto_increment: false,
        }
    }
}

/// Parameters for creating an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexParams {
    /// Index name.
    pub name: String,
    /// Field path the index is keyed on.
    pub key_path: String,
    /// Whether the index rejects duplicate keys.
    pub unique: bool,
}

impl IndexParams {
    /// Creates parameters for an index whose key path equals its name.
    pub fn named(name: impl Into<String>, unique: bool) -> Self {
        let name = name.into();
        Self {
            key_path: name.clone(),
            name,
            unique,
        }
    }
}

/// Positional, read-only access to a store's catalog.
///
/// Names are only reachable by position; the sequence ends at the first
/// position that returns `None`.
pub trait Catalog {
    /// Returns the collection name at `position`, or `None` past the end.
    fn collection_name_at(&self, position: usize) -> Option<&str>;

    /// Returns the index name at `position` on `collection`, or `None` past
    /// the end.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if `collection` does not exist.
    fn index_name_at(&self, collection: &str, position: usize) -> StorageResult<Option<&str>>;
}

/// Structural edit rights, only handed out inside an upgrade transaction.
///
/// Every edit is staged; the engine commits them together when the upgrade
/// handler returns `Ok`, and discards all of them otherwise.
pub trait SchemaEditor: Catalog {
    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns `CollectionExists` if the name is taken.
    fn create_collection(&mut self, name: &str, params: &CollectionParams) -> StorageResult<()>;

    /// Deletes a collection and all its records and indexes.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist.
    fn delete_collection(&mut self, name: &str) -> StorageResult<()>;

    /// Creates an index on an existing collection.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The collection does not exist
    /// - The index name is taken
    /// - The index is unique and existing records collide
    fn create_index(&mut self, collection: &str, params: &IndexParams) -> StorageResult<()>;

    /// Deletes an index.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `IndexNotFound`.
    fn delete_index(&mut self, collection: &str, index: &str) -> StorageResult<()>;
}

/// An open connection to a store at a fixed version.
pub trait Connection: Catalog + Send {
    /// Store name.
    fn name(&self) -> &str;

    /// Version the connection was opened at.
    fn version(&self) -> u64;

    /// Closes the connection, releasing its hold on the store.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Callback the engine invokes inside the upgrade transaction.
pub type UpgradeHandler<'a> =
    dyn FnMut(&mut dyn SchemaEditor, VersionChange) -> StorageResult<()> + 'a;

/// A versioned, transactional store engine.
///
/// # Invariants
///
/// - Versions only move forward; opening below the persisted version fails
/// - The upgrade handler runs at most once per `open` and only when the
///   requested version exceeds the persisted one
/// - An upgrade is all-or-nothing
/// - A version change is refused while connections to the store are open
pub trait StorageEngine: Send + Sync {
    /// Connection type returned by `open`.
    type Connection: Connection;

    /// Lists persisted stores and their versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn databases(&self) -> StorageResult<Vec<DatabaseInfo>>;

    /// Opens `name` at `version`, running `on_upgrade` if the version moves.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `version` is zero or below the persisted version (`VersionError`)
    /// - Other connections hold the store open during a version change (`Blocked`)
    /// - The upgrade handler fails (`Aborted`, store left unchanged)
    fn open(
        &self,
        name: &str,
        version: u64,
        on_upgrade: &mut UpgradeHandler<'_>,
    ) -> StorageResult<Self::Connection>;
}
