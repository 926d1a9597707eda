//! Domain model for inventory import
//!
//! - [`InventoryObject`]: one object record decoded from an inventory row
//! - [`Manifest`]: the document naming an inventory's partition files
//! - [`DiffObj`], [`ImportStats`], [`InventoryDiff`]: diff output
//! - [`CommitMetadata`]: the flat mapping attached to an import commit

pub mod diff;
pub mod manifest;
pub mod metadata;
pub mod object;

pub use diff::{DiffObj, DiffSide, ImportStats, InventoryDiff};
pub use manifest::{Manifest, ManifestFile};
pub use metadata::{create_commit_metadata, extract_inventory_url, CommitMetadata};
pub use object::InventoryObject;
