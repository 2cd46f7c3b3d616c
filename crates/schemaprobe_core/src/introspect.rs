//! Catalog introspection over positional name lookups.

use schemaprobe_storage::{Catalog, StorageResult};

/// Lazy scan over a positional name lookup.
///
/// Yields names from position 0 upward and stops at the first position the
/// lookup reports as absent.
pub struct NameScan<F> {
    lookup: F,
    position: usize,
    done: bool,
}

impl<F> NameScan<F> {
    /// Creates a scan starting at position 0.
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            position: 0,
            done: false,
        }
    }
}

impl<'a, F> Iterator for NameScan<F>
where
    F: FnMut(usize) -> Option<&'a str>,
{
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.lookup)(self.position) {
            Some(name) => {
                self.position += 1;
                Some(name)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Lists collection names in the catalog's enumeration order.
pub fn collection_names<C: Catalog + ?Sized>(catalog: &C) -> Vec<String> {
    NameScan::new(|position| catalog.collection_name_at(position))
        .map(str::to_string)
        .collect()
}

/// Lists index names of one collection in enumeration order.
///
/// # Errors
///
/// Returns `CollectionNotFound` from the engine if `collection` does not exist.
pub fn index_names<C: Catalog + ?Sized>(catalog: &C, collection: &str) -> StorageResult<Vec<String>> {
    let mut names = Vec::new();
    let mut position = 0;
    while let Some(name) = catalog.index_name_at(collection, position)? {
        names.push(name.to_string());
        position += 1;
    }
    Ok(names)
}
