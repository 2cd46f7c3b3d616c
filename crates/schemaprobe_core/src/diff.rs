//! Schema diff engine.
//!
//! Pure set differences between what a catalog holds and what a
//! [`SchemaModel`] declares. Result order carries no meaning.

use crate::config::Exclusions;
use crate::introspect::{collection_names, index_names};
use crate::schema::SchemaModel;
use schemaprobe_storage::{Catalog, StorageResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Declared collections missing from `existing`.
pub fn collections_to_create<S: AsRef<str>>(existing: &[S], schema: &SchemaModel) -> BTreeSet<String> {
    let existing: BTreeSet<&str> = existing.iter().map(AsRef::as_ref).collect();
    schema
        .names()
        .filter(|name| !existing.contains(name))
        .map(str::to_string)
        .collect()
}

/// Existing collections the schema no longer declares.
pub fn collections_to_delete<S: AsRef<str>>(existing: &[S], schema: &SchemaModel) -> BTreeSet<String> {
    existing
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !schema.contains(name))
        .map(str::to_string)
        .collect()
}

/// Declared indexes missing from `existing`.
pub fn indexes_to_create<E, D>(existing: &[E], declared: &[D]) -> BTreeSet<String>
where
    E: AsRef<str>,
    D: AsRef<str>,
{
    difference(declared, existing)
}

/// Existing indexes no longer declared.
pub fn indexes_to_delete<E, D>(existing: &[E], declared: &[D]) -> BTreeSet<String>
where
    E: AsRef<str>,
    D: AsRef<str>,
{
    difference(existing, declared)
}

fn difference<A: AsRef<str>, B: AsRef<str>>(from: &[A], minus: &[B]) -> BTreeSet<String> {
    let minus: BTreeSet<&str> = minus.iter().map(AsRef::as_ref).collect();
    from.iter()
        .map(AsRef::as_ref)
        .filter(|name| !minus.contains(name))
        .map(str::to_string)
        .collect()
}

/// Index drift of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexDrift {
    /// Declared indexes the collection lacks.
    pub created_indexes: BTreeSet<String>,
    /// Indexes the collection has but the schema no longer declares.
    pub deleted_indexes: BTreeSet<String>,
}

impl IndexDrift {
    /// Compares a collection's live index names with its declared ones.
    pub fn between<E: AsRef<str>, D: AsRef<str>>(existing: &[E], declared: &[D]) -> Self {
        Self {
            created_indexes: indexes_to_create(existing, declared),
            deleted_indexes: indexes_to_delete(existing, declared),
        }
    }

    /// Returns true if nothing differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created_indexes.is_empty() && self.deleted_indexes.is_empty()
    }
}

/// Everything that differs between a catalog and a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    /// Declared collections the catalog lacks.
    pub created_collections: BTreeSet<String>,
    /// Catalog collections the schema does not declare.
    pub deleted_collections: BTreeSet<String>,
    /// Index drift of declared collections that exist. Only collections with
    /// drift are listed.
    pub index_drift: BTreeMap<String, IndexDrift>,
}

impl DriftReport {
    /// Returns true if the catalog matches the schema.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.created_collections.is_empty()
            && self.deleted_collections.is_empty()
            && self.index_drift.values().all(IndexDrift::is_empty)
    }

    /// Number of individual structural changes the drift calls for.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.created_collections.len()
            + self.deleted_collections.len()
            + self
                .index_drift
                .values()
                .map(|d| d.created_indexes.len() + d.deleted_indexes.len())
                .sum::<usize>()
    }
}

/// Compares a live catalog with the schema, ignoring excluded collections.
///
/// Index drift is computed for every declared, non-excluded collection that
/// exists in the catalog.
///
/// # Errors
///
/// Propagates catalog errors from the engine unchanged.
pub fn compute_drift<C: Catalog + ?Sized>(
    catalog: &C,
    schema: &SchemaModel,
    exclude: &Exclusions,
) -> StorageResult<DriftReport> {
    let existing = collection_names(catalog);
    let created_collections = exclude.filter(collections_to_create(&existing, schema));
    let deleted_collections = exclude.filter(collections_to_delete(&existing, schema));

    let mut index_drift = BTreeMap::new();
    for spec in schema.iter() {
        if exclude.contains(&spec.name) || created_collections.contains(&spec.name) {
            continue;
        }
        if !existing.iter().any(|n| n == &spec.name) {
            continue;
        }
        let live = index_names(catalog, &spec.name)?;
        let declared: Vec<&str> = spec.secondary_indexes().collect();
        let drift = IndexDrift::between(&live, &declared);
        if !drift.is_empty() {
            index_drift.insert(spec.name.clone(), drift);
        }
    }

    Ok(DriftReport {
        created_collections,
        deleted_collections,
        index_drift,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollectionSpec;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn schema() -> SchemaModel {
        SchemaModel::new()
            .collection(CollectionSpec::new("posts").key_path("id").index("id").index("title"))
            .collection(CollectionSpec::new("users").unique_index("email"))
    }

    #[test]
    fn everything_is_created_from_nothing() {
        let none: [&str; 0] = [];
        assert_eq!(collections_to_create(&none, &schema()), names(&["posts", "users"]));
        assert!(collections_to_delete(&none, &schema()).is_empty());
    }

    #[test]
    fn superset_creates_nothing() {
        let existing = ["users", "posts", "extra"];
        assert!(collections_to_create(&existing, &schema()).is_empty());
        assert_eq!(collections_to_delete(&existing, &schema()), names(&["extra"]));
    }

    #[test]
    fn deletions_from_empty_schema() {
        let existing = vec!["a".to_string(), "b".to_string()];
        assert_eq!(collections_to_delete(&existing, &SchemaModel::new()), names(&["a", "b"]));
        assert!(collections_to_create(&existing, &SchemaModel::new()).is_empty());
    }

    #[test]
    fn index_differences_are_symmetric() {
        let existing = ["title", "stale"];
        let declared = ["title", "author"];
        assert_eq!(indexes_to_create(&existing, &declared), names(&["author"]));
        assert_eq!(indexes_to_delete(&existing, &declared), names(&["stale"]));

        let none: [&str; 0] = [];
        assert_eq!(indexes_to_create(&none, &declared), names(&["title", "author"]));
        assert!(indexes_to_delete(&none, &declared).is_empty());
        assert!(indexes_to_create(&existing, &none).is_empty());
    }

    #[test]
    fn empty_report_is_converged() {
        let mut report = DriftReport::default();
        assert!(report.is_converged());
        report.index_drift.insert("posts".into(), IndexDrift::default());
        assert!(report.is_converged());
        report
            .index_drift
            .insert("users".into(), IndexDrift::between(&["a"], &["b"]));
        assert!(!report.is_converged());
        assert_eq!(report.change_count(), 2);
    }

    proptest::proptest! {
        #[test]
        fn collection_diff_is_a_partition(
            existing in proptest::collection::btree_set("[a-e]", 0..5),
            declared in proptest::collection::btree_set("[a-e]", 0..5),
        ) {
            let schema: SchemaModel = declared.iter().map(CollectionSpec::new).collect();
            let existing: Vec<String> = existing.into_iter().collect();
            let created = collections_to_create(&existing, &schema);
            let deleted = collections_to_delete(&existing, &schema);

            for name in &created {
                proptest::prop_assert!(declared.contains(name) && !existing.contains(name));
            }
            for name in &deleted {
                proptest::prop_assert!(existing.contains(name) && !declared.contains(name));
            }
            // Applying both sets to the catalog yields exactly the declaration.
            let mut after: BTreeSet<String> = existing.iter().cloned().collect();
            after.extend(created);
            after.retain(|n| !deleted.contains(n));
            proptest::prop_assert_eq!(after, declared);
        }

        #[test]
        fn index_diff_is_a_partition(
            existing in proptest::collection::btree_set("[a-e]", 0..5),
            declared in proptest::collection::btree_set("[a-e]", 0..5),
        ) {
            let existing: Vec<String> = existing.into_iter().collect();
            let declared: Vec<String> = declared.into_iter().collect();
            let drift = IndexDrift::between(&existing, &declared);

            proptest::prop_assert!(drift.created_indexes.is_disjoint(&drift.deleted_indexes));
            let mut after: BTreeSet<String> = existing.iter().cloned().collect();
            after.extend(drift.created_indexes);
            after.retain(|n| !drift.deleted_indexes.contains(n));
            proptest::prop_assert_eq!(after, declared.into_iter().collect::<BTreeSet<_>>());
        }
    }
}
