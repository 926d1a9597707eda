//! Commit metadata attached to an import commit.

use std::collections::BTreeMap;

use super::ImportStats;
use crate::inventory::Inventory;

/// Flat string-keyed mapping stored with a catalog commit
pub type CommitMetadata = BTreeMap<String, String>;

pub const META_INVENTORY_URL: &str = "inventory_url";
pub const META_SOURCE: &str = "source";
pub const META_ADDED_OR_CHANGED: &str = "added_or_changed_objects";
pub const META_DELETED: &str = "deleted_objects";

/// Build the metadata recorded on the commit that finishes an import
pub fn create_commit_metadata(inventory: &dyn Inventory, stats: &ImportStats) -> CommitMetadata {
    let mut metadata = CommitMetadata::new();
    metadata.insert(
        META_INVENTORY_URL.to_string(),
        inventory.inventory_url().to_string(),
    );
    metadata.insert(META_SOURCE.to_string(), inventory.source_name().to_string());
    metadata.insert(
        META_ADDED_OR_CHANGED.to_string(),
        stats.added_or_changed.to_string(),
    );
    metadata.insert(META_DELETED.to_string(), stats.deleted.to_string());
    metadata
}

/// Inventory URL recorded by a previous import commit, if any
pub fn extract_inventory_url(metadata: &CommitMetadata) -> Option<&str> {
    metadata
        .get(META_INVENTORY_URL)
        .map(String::as_str)
        .filter(|url| !url.is_empty())
}
