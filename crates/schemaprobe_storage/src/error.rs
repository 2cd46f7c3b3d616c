//! Error types for storage engine operations.

use std::io;
use thiserror::Error;

/// Result type for storage engine operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur inside a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred while persisting or loading engine state.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Engine state could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested version is zero or lower than the persisted version.
    #[error("version error on store '{name}': requested {requested}, stored {stored}")]
    VersionError {
        /// Store name.
        name: String,
        /// Version passed to `open`.
        requested: u64,
        /// Version currently persisted.
        stored: u64,
    },

    /// A version change was refused because connections are still open.
    #[error("store '{name}' is blocked by {open_connections} open connection(s)")]
    Blocked {
        /// Store name.
        name: String,
        /// Number of connections holding the store open.
        open_connections: usize,
    },

    /// The upgrade handler failed and the version change was rolled back.
    #[error("upgrade of store '{name}' to version {version} aborted: {source}")]
    Aborted {
        /// Store name.
        name: String,
        /// Version the upgrade was moving to.
        version: u64,
        /// The error raised inside the upgrade transaction.
        #[source]
        source: Box<StorageError>,
    },

    /// Collection does not exist.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Collection name.
        name: String,
    },

    /// Collection already exists.
    #[error("collection already exists: {name}")]
    CollectionExists {
        /// Collection name.
        name: String,
    },

    /// Index does not exist on the collection.
    #[error("index '{index}' not found on collection '{collection}'")]
    IndexNotFound {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
    },

    /// Index already exists on the collection.
    #[error("index '{index}' already exists on collection '{collection}'")]
    IndexExists {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
    },

    /// A unique index would hold the same key twice.
    #[error("unique index '{index}' on collection '{collection}' violated")]
    UniqueViolation {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
    },

    /// `add` was called with a primary key that is already present.
    #[error("key already exists in collection '{collection}'")]
    KeyExists {
        /// Collection name.
        collection: String,
    },

    /// A record or key was malformed.
    #[error("data error: {message}")]
    DataError {
        /// Description of the problem.
        message: String,
    },

    /// The operation is not allowed in the current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the operation is not allowed.
        message: String,
    },

    /// A write was attempted in a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,
}

impl StorageError {
    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates an index not found error.
    pub fn index_not_found(collection: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexNotFound {
            collection: collection.into(),
            index: index.into(),
        }
    }

    /// Creates a data error.
    pub fn data_error(message: impl Into<String>) -> Self {
        Self::DataError {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Returns true for errors that report a missing collection or index.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound { .. } | Self::IndexNotFound { .. }
        )
    }
}
