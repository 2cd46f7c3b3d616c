//! Concurrent open helpers.

use schemaprobe_core::{open_store, CoreResult, SchemaModel, VersionOptions};
use schemaprobe_storage::{Connection, MemoryEngine};
use std::sync::{Arc, Barrier};
use std::thread;

/// Opens `name` from `threads` threads at once, closing each connection
/// immediately.
///
/// Returns the version each thread saw, in thread order.
pub fn open_concurrently(
    engine: &MemoryEngine,
    name: &str,
    schema: &SchemaModel,
    options: &VersionOptions,
    threads: usize,
) -> Vec<CoreResult<u64>> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();
            let schema = schema.clone();
            let options = options.clone();
            thread::spawn(move || {
                barrier.wait();
                let conn = open_store(&engine, &name, &schema, &options)?;
                let version = conn.version();
                conn.close();
                Ok(version)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("open thread panicked"))
        .collect()
}
