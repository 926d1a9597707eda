//! lakeimport store - persistence and storage access
//!
//! Provides:
//! - SQLite catalog with an embedded migrations framework
//! - Filesystem object store addressed by `s3://bucket/key` URLs
//! - JSON-lines partition reader and manifest-driven inventory generation

pub mod catalog;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod objstore;

// Re-export key types
pub use catalog::{CatalogInventoryIterator, SqliteCatalog};
pub use errors::Result;
pub use objstore::{generate_inventory, FsInventoryGenerator, FsObjectStore};
