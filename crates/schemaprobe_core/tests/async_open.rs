#![cfg(feature = "async")]

use schemaprobe_core::{open_store_async, CollectionSpec, CoreError, SchemaModel, VersionOptions};
use schemaprobe_storage::{Connection, MemoryEngine};
use std::sync::Arc;

#[tokio::test]
async fn async_open_converges() {
    let engine = Arc::new(MemoryEngine::new());
    let schema = SchemaModel::new().collection(CollectionSpec::new("events").index("at"));

    let conn = open_store_async(Arc::clone(&engine), "log", schema.clone(), VersionOptions::default())
        .await
        .unwrap();
    assert_eq!(conn.version(), 1);
    conn.close();

    let changed = schema.collection(CollectionSpec::new("sessions"));
    let conn = open_store_async(Arc::clone(&engine), "log", changed, VersionOptions::default())
        .await
        .unwrap();
    assert_eq!(conn.version(), 2);
}

#[tokio::test]
async fn async_open_reports_engine_errors() {
    let engine = Arc::new(MemoryEngine::new());
    let err = open_store_async(engine, "log", SchemaModel::new(), VersionOptions::explicit(0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Open { version: 0, .. }));
}
