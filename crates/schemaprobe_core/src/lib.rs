//! # SchemaProbe Core
//!
//! Declarative schema management for versioned key-value stores.
//!
//! Callers declare the collections and indexes a store should have. Opening
//! the store through [`open_store`] diffs the live catalog against that
//! declaration and, when they differ, re-opens the store at increasing
//! versions so the engine's upgrade transaction can apply the changes.
//!
//! This crate provides:
//! - [`SchemaModel`] and [`CollectionSpec`] for declaring the target shape
//! - Diff functions and [`DriftReport`]
//! - [`UpgradeExecutor`] for edits inside an upgrade transaction
//! - [`VersionProber`] for the open-and-bump loop
//!
//! ## Example
//!
//! ```rust
//! use schemaprobe_core::{open_store, CollectionSpec, ProbeConfig, SchemaModel, VersionOptions};
//! use schemaprobe_storage::{Connection, MemoryEngine};
//!
//! let engine = MemoryEngine::new();
//! let v1 = SchemaModel::new().collection(CollectionSpec::new("posts").key_path("id"));
//! open_store(&engine, "blog", &v1, &VersionOptions::default()).unwrap().close();
//!
//! let v2 = v1.clone().collection(CollectionSpec::new("tags"));
//! let options = VersionOptions::from(ProbeConfig::new().max_attempts(8));
//! let conn = open_store(&engine, "blog", &v2, &options).unwrap();
//! assert_eq!(conn.version(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod diff;
mod error;
mod introspect;
mod prober;
mod schema;
mod store;
mod upgrade;

pub use config::{Exclusions, ProbeConfig, VersionOptions, DEFAULT_MAX_ATTEMPTS};
pub use diff::{
    collections_to_create, collections_to_delete, compute_drift, indexes_to_create,
    indexes_to_delete, DriftReport, IndexDrift,
};
pub use error::{CoreError, CoreResult};
pub use introspect::{collection_names, index_names, NameScan};
pub use prober::{persisted_version, ProbeOutcome, VersionProber};
pub use schema::{CollectionSpec, SchemaModel};
#[cfg(feature = "async")]
pub use store::open_store_async;
pub use store::{open_store, open_store_with_report};
pub use upgrade::{SchemaOperation, UpgradeExecutor, UpgradeReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
