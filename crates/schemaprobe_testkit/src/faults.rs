//! Fault-injecting engine wrappers.
//!
//! Both wrappers delegate to a [`MemoryEngine`] and hand out its connections,
//! so tests can still inspect the wrapped engine directly.

use schemaprobe_storage::{
    Catalog, CollectionParams, DatabaseInfo, IndexParams, MemoryConnection, MemoryEngine,
    SchemaEditor, StorageEngine, StorageError, StorageResult, UpgradeHandler,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Engine that bumps versions without ever running the upgrade handler.
///
/// A store opened through it never converges.
#[derive(Debug, Default)]
pub struct SkipUpgradeEngine {
    inner: MemoryEngine,
    opens: AtomicUsize,
}

impl SkipUpgradeEngine {
    /// Wraps `inner`.
    pub fn new(inner: MemoryEngine) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &MemoryEngine {
        &self.inner
    }

    /// Number of `open` calls so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl StorageEngine for SkipUpgradeEngine {
    type Connection = MemoryConnection;

    fn databases(&self) -> StorageResult<Vec<DatabaseInfo>> {
        self.inner.databases()
    }

    fn open(
        &self,
        name: &str,
        version: u64,
        _on_upgrade: &mut UpgradeHandler<'_>,
    ) -> StorageResult<MemoryConnection> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(name, version, &mut |_, _| Ok(()))
    }
}

/// Engine whose upgrades fail at a chosen structural edit.
///
/// The first `succeed` edits of every upgrade go through; the next one fails
/// with `InvalidState`, which aborts the upgrade.
#[derive(Debug)]
pub struct FailingEngine {
    inner: MemoryEngine,
    succeed: usize,
}

impl FailingEngine {
    /// Wraps `inner`, letting `succeed` edits per upgrade through.
    pub fn new(inner: MemoryEngine, succeed: usize) -> Self {
        Self { inner, succeed }
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &MemoryEngine {
        &self.inner
    }
}

impl StorageEngine for FailingEngine {
    type Connection = MemoryConnection;

    fn databases(&self) -> StorageResult<Vec<DatabaseInfo>> {
        self.inner.databases()
    }

    fn open(
        &self,
        name: &str,
        version: u64,
        on_upgrade: &mut UpgradeHandler<'_>,
    ) -> StorageResult<MemoryConnection> {
        self.inner.open(name, version, &mut |editor, change| {
            let mut faulty = FaultyEditor {
                inner: editor,
                remaining: self.succeed,
            };
            let editor: &mut dyn SchemaEditor = &mut faulty;
            on_upgrade(editor, change)
        })
    }
}

struct FaultyEditor<'a> {
    inner: &'a mut dyn SchemaEditor,
    remaining: usize,
}

impl FaultyEditor<'_> {
    fn spend(&mut self) -> StorageResult<()> {
        if self.remaining == 0 {
            return Err(StorageError::invalid_state("injected edit failure"));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl Catalog for FaultyEditor<'_> {
    fn collection_name_at(&self, position: usize) -> Option<&str> {
        self.inner.collection_name_at(position)
    }

    fn index_name_at(&self, collection: &str, position: usize) -> StorageResult<Option<&str>> {
        self.inner.index_name_at(collection, position)
    }
}

impl SchemaEditor for FaultyEditor<'_> {
    fn create_collection(&mut self, name: &str, params: &CollectionParams) -> StorageResult<()> {
        self.spend()?;
        self.inner.create_collection(name, params)
    }

    fn delete_collection(&mut self, name: &str) -> StorageResult<()> {
        self.spend()?;
        self.inner.delete_collection(name)
    }

    fn create_index(&mut self, collection: &str, params: &IndexParams) -> StorageResult<()> {
        self.spend()?;
        self.inner.create_index(collection, params)
    }

    fn delete_index(&mut self, collection: &str, index: &str) -> StorageResult<()> {
        self.spend()?;
        self.inner.delete_index(collection, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaprobe_storage::Connection;

    #[test]
    fn skip_engine_never_runs_handler() {
        let engine = SkipUpgradeEngine::default();
        let mut ran = false;
        let conn = engine
            .open("db", 2, &mut |_, _| {
                ran = true;
                Ok(())
            })
            .unwrap();
        assert!(!ran);
        assert_eq!(conn.version(), 2);
        assert_eq!(engine.opens(), 1);
    }

    #[test]
    fn failing_engine_aborts_after_budget() {
        let engine = FailingEngine::new(MemoryEngine::new(), 1);
        let err = engine
            .open("db", 1, &mut |tx, _| {
                tx.create_collection("a", &CollectionParams::default())?;
                tx.create_collection("b", &CollectionParams::default())
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::Aborted { .. }));
        assert_eq!(engine.inner().version_of("db"), None);
    }
}
