//! # SchemaProbe Storage
//!
//! Host engine contract and reference engine for SchemaProbe.
//!
//! This crate describes the versioned, transactional store that the schema
//! core drives. Engines own all persisted state; the core only opens stores
//! at a version, inspects their catalog and edits structure from inside the
//! engine's upgrade transaction.
//!
//! ## Design Principles
//!
//! - Catalogs are reached by position only (no bulk listing)
//! - Structural edits are only possible inside an upgrade, which is
//!   all-or-nothing
//! - Versions only move forward and a version change waits for no one: it
//!   fails with `Blocked` while connections are open
//! - Engines must be `Send + Sync`
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - In-memory engine, optionally saved to a JSON file
//!
//! ## Example
//!
//! ```rust
//! use schemaprobe_storage::{Catalog, CollectionParams, IndexParams, MemoryEngine, StorageEngine};
//!
//! let engine = MemoryEngine::new();
//! let conn = engine
//!     .open("app", 1, &mut |tx, _| {
//!         tx.create_collection("users", &CollectionParams::default())?;
//!         tx.create_index("users", &IndexParams::named("email", true))
//!     })
//!     .unwrap();
//! assert_eq!(conn.index_name_at("users", 0).unwrap(), Some("email"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod key;
mod memory;
mod state;
mod transaction;

pub use engine::{
    Catalog, CollectionParams, Connection, DatabaseInfo, IndexParams, SchemaEditor,
    StorageEngine, UpgradeHandler, VersionChange,
};
pub use error::{StorageError, StorageResult};
pub use key::{extract_key, inject_key, Key};
pub use memory::{MemoryConnection, MemoryEngine};
pub use transaction::{CollectionHandle, Transaction, TransactionMode};
