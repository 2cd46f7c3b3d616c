//! Store entry points.

use crate::config::VersionOptions;
use crate::error::CoreResult;
use crate::prober::{ProbeOutcome, VersionProber};
use crate::schema::SchemaModel;
use schemaprobe_storage::StorageEngine;

/// Opens `name` on `engine` with its catalog reconciled to `schema`.
///
/// In auto-probe mode the returned connection's catalog matches `schema`
/// (excluded collections aside). In explicit mode the store is opened once at
/// the given version and returned as-is.
///
/// The caller owns the returned connection and closes it when done.
///
/// # Errors
///
/// See [`VersionProber::run`].
///
/// # Example
///
/// ```rust
/// use schemaprobe_core::{open_store, CollectionSpec, SchemaModel, VersionOptions};
/// use schemaprobe_storage::{Connection, MemoryEngine};
///
/// let engine = MemoryEngine::new();
/// let schema = SchemaModel::new()
///     .collection(CollectionSpec::new("users").key_path("id").unique_index("email"));
///
/// let conn = open_store(&engine, "app", &schema, &VersionOptions::default()).unwrap();
/// assert_eq!(conn.version(), 1);
/// ```
pub fn open_store<E: StorageEngine>(
    engine: &E,
    name: &str,
    schema: &SchemaModel,
    options: &VersionOptions,
) -> CoreResult<E::Connection> {
    open_store_with_report(engine, name, schema, options).map(|outcome| outcome.connection)
}

/// Like [`open_store`], but also reports how the store got there.
///
/// # Errors
///
/// See [`VersionProber::run`].
pub fn open_store_with_report<E: StorageEngine>(
    engine: &E,
    name: &str,
    schema: &SchemaModel,
    options: &VersionOptions,
) -> CoreResult<ProbeOutcome<E::Connection>> {
    VersionProber::new(engine, name, schema, options).run()
}

/// Runs [`open_store`] on tokio's blocking pool.
///
/// # Errors
///
/// Everything [`open_store`] returns, plus `TaskFailed` if the blocking task
/// panicked or was cancelled.
#[cfg(feature = "async")]
pub async fn open_store_async<E>(
    engine: std::sync::Arc<E>,
    name: impl Into<String>,
    schema: SchemaModel,
    options: VersionOptions,
) -> CoreResult<E::Connection>
where
    E: StorageEngine + 'static,
    E::Connection: 'static,
{
    let name = name.into();
    tokio::task::spawn_blocking(move || open_store(&*engine, &name, &schema, &options))
        .await
        .map_err(|e| crate::error::CoreError::TaskFailed {
            message: e.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSpec;
    use schemaprobe_storage::{Catalog, Connection, MemoryEngine};

    #[test]
    fn open_returns_converged_connection() {
        let engine = MemoryEngine::new();
        let schema = SchemaModel::new().collection(CollectionSpec::new("notes").index("tag"));
        let conn = open_store(&engine, "db", &schema, &VersionOptions::default()).unwrap();
        assert_eq!(conn.name(), "db");
        assert_eq!(conn.index_name_at("notes", 0).unwrap(), Some("tag"));
    }

    #[test]
    fn report_lists_upgrades() {
        let engine = MemoryEngine::new();
        let schema = SchemaModel::new().collection(CollectionSpec::new("notes"));
        let outcome =
            open_store_with_report(&engine, "db", &schema, &VersionOptions::default()).unwrap();
        assert_eq!(outcome.upgrades.len(), 1);
        assert_eq!(outcome.upgrades[0].new_version, 1);

        outcome.connection.close();
        let again =
            open_store_with_report(&engine, "db", &schema, &VersionOptions::default()).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.version, 1);
    }
}
