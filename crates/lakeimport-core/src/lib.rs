//! lakeimport core - inventory iteration and diff engine
//!
//! This crate turns object-store inventories into catalog mutations:
//! - Row Batch Source contract for partition files ([`source`])
//! - Manifest-backed, batched, lazily-opened inventory iteration ([`inventory`])
//! - Single-pass merge-join diff between two inventories ([`diff`])
//! - Domain model, commit metadata and the catalog boundary
//! - Error and logging facilities shared by the other crates
//!
//! Nothing here performs I/O on its own; storage access is injected through
//! [`source::RowSourceFactory`] and [`catalog::Catalog`].

pub mod catalog;
pub mod diff;
pub mod errors;
pub mod inventory;
pub mod logging_facility;
pub mod model;
pub mod source;

// Re-export commonly used types
pub use catalog::{Catalog, CommitRecord};
pub use diff::DiffIterator;
pub use errors::{ExError, ExErrorKind, InventoryError, Result};
pub use inventory::{
    Inventory, InventoryGenerator, InventoryIterator, ManifestInventory, ManifestInventoryIterator,
};
pub use model::{DiffObj, ImportStats, InventoryDiff, InventoryObject, Manifest};

// Used by the logging macros so callers need no direct dependency.
#[doc(hidden)]
pub use lakeimport_core_types;
