//! Property-based test generators using proptest.
//!
//! Names come from small pools so that generated schemas and catalogs
//! overlap often enough to exercise every branch of the diff.

use crate::fixtures::CatalogShape;
use proptest::prelude::*;
use schemaprobe_core::{CollectionSpec, Exclusions, SchemaModel};
use std::collections::BTreeSet;

const COLLECTION_POOL: &[&str] = &["posts", "users", "comments", "tags", "legacy", "audit"];
const INDEX_POOL: &[&str] = &["id", "title", "email", "author", "slug", "created"];

/// Strategy for a collection name from the shared pool.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(COLLECTION_POOL).prop_map(str::to_string)
}

/// Strategy for an index name from the shared pool.
pub fn index_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(INDEX_POOL).prop_map(str::to_string)
}

/// Strategy for a set of index names.
pub fn index_set_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(index_name_strategy(), 0..4)
}

/// Strategy for a valid collection declaration named `name`.
pub fn collection_spec_strategy(name: String) -> impl Strategy<Value = CollectionSpec> {
    (
        prop::option::of(Just("id".to_string())),
        any::<bool>(),
        index_set_strategy(),
        prop::collection::vec(any::<bool>(), 4),
    )
        .prop_map(move |(key_path, auto_increment, indexes, unique)| {
            let mut spec = CollectionSpec::new(name.clone()).auto_increment(auto_increment);
            if let Some(path) = key_path {
                spec = spec.key_path(path);
            }
            for (index, unique) in indexes.into_iter().zip(unique) {
                spec = if unique {
                    spec.unique_index(index)
                } else {
                    spec.index(index)
                };
            }
            spec
        })
}

/// Strategy for a valid schema of up to four collections.
pub fn schema_strategy() -> impl Strategy<Value = SchemaModel> {
    prop::collection::btree_set(collection_name_strategy(), 0..5).prop_flat_map(|names| {
        let specs: Vec<_> = names.into_iter().map(collection_spec_strategy).collect();
        specs.prop_map(|specs| specs.into_iter().collect::<SchemaModel>())
    })
}

/// Strategy for an existing catalog.
pub fn catalog_strategy() -> impl Strategy<Value = CatalogShape> {
    prop::collection::btree_map(collection_name_strategy(), index_set_strategy(), 0..5)
}

/// Strategy for an exclusion list, usually empty.
pub fn exclusions_strategy() -> impl Strategy<Value = Exclusions> {
    prop_oneof![
        3 => Just(Exclusions::new()),
        1 => prop::collection::btree_set(collection_name_strategy(), 1..3)
            .prop_map(|names| names.into_iter().collect::<Exclusions>()),
    ]
}

/// Strategy for a persisted store version.
pub fn version_strategy() -> impl Strategy<Value = u64> {
    1u64..50
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;

    #[test]
    fn generated_schemas_are_valid() {
        let mut runner = TestRunner::default();
        runner
            .run(&schema_strategy(), |schema| {
                prop_assert!(schema.validate().is_ok());
                prop_assert!(schema.len() <= 4);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn catalogs_use_pool_names() {
        let mut runner = TestRunner::default();
        runner
            .run(&catalog_strategy(), |catalog| {
                for (name, indexes) in &catalog {
                    prop_assert!(COLLECTION_POOL.contains(&name.as_str()));
                    prop_assert!(indexes.iter().all(|i| INDEX_POOL.contains(&i.as_str())));
                }
                Ok(())
            })
            .unwrap();
    }
}
