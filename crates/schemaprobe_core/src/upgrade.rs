//! Upgrade executor.
//!
//! Runs inside the engine's upgrade transaction and reconciles the catalog
//! with the declared schema in one pass:
//!
//! 1. Diff collections against the catalog before touching anything
//! 2. Create new collections with all their indexes; fix up indexes of
//!    existing ones
//! 3. Delete undeclared collections last
//!
//! The engine commits the result as a whole or not at all.

use crate::config::Exclusions;
use crate::diff::{collections_to_create, collections_to_delete, IndexDrift};
use crate::introspect::{collection_names, index_names};
use crate::schema::{CollectionSpec, SchemaModel};
use schemaprobe_storage::{CollectionParams, IndexParams, SchemaEditor, StorageResult, VersionChange};
use serde::Serialize;
use tracing::debug;

/// A structural edit applied during an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaOperation {
    /// Created a collection.
    CreateCollection {
        /// Name of the collection.
        name: String,
    },
    /// Deleted a collection.
    DeleteCollection {
        /// Name of the collection.
        name: String,
    },
    /// Created an index.
    CreateIndex {
        /// Collection the index is on.
        collection: String,
        /// Name of the index.
        index: String,
        /// Whether the index is unique.
        unique: bool,
    },
    /// Deleted an index.
    DeleteIndex {
        /// Collection the index was on.
        collection: String,
        /// Name of the index.
        index: String,
    },
}

/// Edits applied by one committed upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    /// Version before the upgrade.
    pub old_version: u64,
    /// Version after the upgrade.
    pub new_version: u64,
    /// Edits in the order they were applied.
    pub operations: Vec<SchemaOperation>,
}

/// Reconciles a catalog with a schema from inside an upgrade transaction.
#[derive(Debug)]
pub struct UpgradeExecutor<'a> {
    schema: &'a SchemaModel,
    exclude: &'a Exclusions,
}

impl<'a> UpgradeExecutor<'a> {
    /// Creates an executor for `schema`, leaving `exclude` untouched.
    #[must_use]
    pub fn new(schema: &'a SchemaModel, exclude: &'a Exclusions) -> Self {
        Self { schema, exclude }
    }

    /// Applies every structural change the schema calls for.
    ///
    /// # Errors
    ///
    /// Returns the first engine error. The caller must let it abort the
    /// upgrade transaction; edits made so far are then discarded by the engine.
    pub fn apply(
        &self,
        editor: &mut dyn SchemaEditor,
        change: VersionChange,
    ) -> StorageResult<UpgradeReport> {
        let existing = collection_names(&*editor);
        let created = self.exclude.filter(collections_to_create(&existing, self.schema));
        let deleted = self.exclude.filter(collections_to_delete(&existing, self.schema));

        let mut operations = Vec::new();
        for spec in self.schema.iter() {
            if self.exclude.contains(&spec.name) {
                continue;
            }
            if created.contains(&spec.name) {
                create_collection(editor, spec, &mut operations)?;
            } else {
                reconcile_indexes(editor, spec, &mut operations)?;
            }
        }

        for name in deleted {
            editor.delete_collection(&name)?;
            debug!(collection = %name, "deleted collection");
            operations.push(SchemaOperation::DeleteCollection { name });
        }

        Ok(UpgradeReport {
            old_version: change.old_version,
            new_version: change.new_version,
            operations,
        })
    }
}

fn create_collection(
    editor: &mut dyn SchemaEditor,
    spec: &CollectionSpec,
    operations: &mut Vec<SchemaOperation>,
) -> StorageResult<()> {
    let params = CollectionParams {
        key_path: spec.key_path.clone(),
        auto_increment: spec.auto_increment,
    };
    editor.create_collection(&spec.name, &params)?;
    debug!(collection = %spec.name, "created collection");
    operations.push(SchemaOperation::CreateCollection {
        name: spec.name.clone(),
    });

    for index in spec.secondary_indexes() {
        create_index(editor, spec, index, operations)?;
    }
    Ok(())
}

fn reconcile_indexes(
    editor: &mut dyn SchemaEditor,
    spec: &CollectionSpec,
    operations: &mut Vec<SchemaOperation>,
) -> StorageResult<()> {
    let live = index_names(&*editor, &spec.name)?;
    let declared: Vec<&str> = spec.secondary_indexes().collect();
    let drift = IndexDrift::between(&live, &declared);

    // Declaration order, so creation order is deterministic.
    for index in declared.iter().filter(|i| drift.created_indexes.contains(**i)) {
        create_index(editor, spec, index, operations)?;
    }
    for index in drift.deleted_indexes {
        editor.delete_index(&spec.name, &index)?;
        debug!(collection = %spec.name, index = %index, "deleted index");
        operations.push(SchemaOperation::DeleteIndex {
            collection: spec.name.clone(),
            index,
        });
    }
    Ok(())
}

fn create_index(
    editor: &mut dyn SchemaEditor,
    spec: &CollectionSpec,
    index: &str,
    operations: &mut Vec<SchemaOperation>,
) -> StorageResult<()> {
    let unique = spec.is_unique(index);
    editor.create_index(&spec.name, &IndexParams::named(index, unique))?;
    debug!(collection = %spec.name, index, unique, "created index");
    operations.push(SchemaOperation::CreateIndex {
        collection: spec.name.clone(),
        index: index.to_string(),
        unique,
    });
    Ok(())
}
