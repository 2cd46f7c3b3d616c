//! Error types for SchemaProbe core.

use crate::diff::DriftReport;
use schemaprobe_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while opening or migrating a store.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The engine refused or failed the open (blocked, bad version ordering).
    #[error("failed to open store '{name}' at version {version}: {source}")]
    Open {
        /// Store name.
        name: String,
        /// Version that was requested.
        version: u64,
        /// The engine error, unchanged.
        #[source]
        source: StorageError,
    },

    /// A structural edit failed and the engine rolled the upgrade back.
    #[error("upgrade of store '{name}' to version {version} failed: {source}")]
    Upgrade {
        /// Store name.
        name: String,
        /// Version the upgrade was moving to.
        version: u64,
        /// The error raised inside the upgrade transaction.
        #[source]
        source: StorageError,
    },

    /// Catalog introspection or another engine call failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Drift persisted after the configured number of attempts.
    #[error(
        "store '{name}' did not converge after {attempts} attempt(s), last version {last_version}"
    )]
    Convergence {
        /// Store name.
        name: String,
        /// Attempts made.
        attempts: u32,
        /// Version of the last attempt.
        last_version: u64,
        /// Drift observed on the last attempt.
        drift: Box<DriftReport>,
    },

    /// The declared schema violates its own invariants.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the violation.
        message: String,
    },

    /// The blocking task behind an async open did not complete.
    #[error("open task failed: {message}")]
    TaskFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Classifies an error returned by `StorageEngine::open`.
    ///
    /// An aborted upgrade becomes [`CoreError::Upgrade`] carrying the error
    /// raised inside the upgrade; anything else becomes [`CoreError::Open`].
    pub fn from_open(name: &str, version: u64, error: StorageError) -> Self {
        match error {
            StorageError::Aborted {
                version: upgrade_version,
                source,
                ..
            } => Self::Upgrade {
                name: name.to_string(),
                version: upgrade_version,
                source: *source,
            },
            source => Self::Open {
                name: name.to_string(),
                version,
                source,
            },
        }
    }

    /// Returns the underlying engine error, if this error wraps one.
    #[must_use]
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Open { source, .. } | Self::Upgrade { source, .. } => Some(source),
            Self::Storage(source) => Some(source),
            _ => None,
        }
    }

    /// Returns true if a missing collection or index caused this error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.storage_error().is_some_and(StorageError::is_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_open_becomes_upgrade_error() {
        let engine_error = StorageError::Aborted {
            name: "db".into(),
            version: 4,
            source: Box::new(StorageError::collection_not_found("users")),
        };
        let err = CoreError::from_open("db", 4, engine_error);
        match &err {
            CoreError::Upgrade { version, source, .. } => {
                assert_eq!(*version, 4);
                assert!(matches!(source, StorageError::CollectionNotFound { .. }));
            }
            other => panic!("unexpected: {other}"),
        }
        assert!(err.is_not_found());
    }

    #[test]
    fn other_open_failures_keep_engine_error() {
        let engine_error = StorageError::Blocked {
            name: "db".into(),
            open_connections: 2,
        };
        let err = CoreError::from_open("db", 7, engine_error);
        assert!(matches!(
            err,
            CoreError::Open {
                version: 7,
                source: StorageError::Blocked { .. },
                ..
            }
        ));
        assert!(!err.is_not_found());
    }

    #[test]
    fn display_mentions_store() {
        let err = CoreError::invalid_schema("bad");
        assert_eq!(err.to_string(), "invalid schema: bad");
        assert!(err.storage_error().is_none());
    }
}
