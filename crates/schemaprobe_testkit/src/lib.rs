//! # SchemaProbe Testkit
//!
//! Test utilities for SchemaProbe.
//!
//! This crate provides:
//! - Fixtures for seeding stores and snapshotting catalogs
//! - Property-based generators for schemas and catalogs using proptest
//! - Fault-injecting engine wrappers
//! - Concurrent open helpers
//!
//! ## Usage
//!
//! ```rust
//! use schemaprobe_testkit::prelude::*;
//! use schemaprobe_storage::MemoryEngine;
//!
//! let engine = MemoryEngine::new();
//! let seed: CatalogShape = shape(&[("posts", &["title"]), ("users", &[])]);
//! seed_store(&engine, "db", 3, &seed);
//! assert_eq!(store_snapshot(&engine, "db"), Some((3, seed)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
