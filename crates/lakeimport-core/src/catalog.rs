//! Catalog boundary.
//!
//! The import orchestrator hands every diff item to a [`Catalog`]: upserts
//! for additions and modifications, removals for deletions, then one commit
//! carrying the import's metadata. The catalog owns atomicity; this crate
//! only guarantees that mutations arrive in non-decreasing key order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::inventory::InventoryIterator;
use crate::model::{CommitMetadata, DiffObj, InventoryObject};

/// A commit recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub commit_id: String,
    pub branch: String,
    pub parent_id: Option<String>,
    pub message: String,
    pub metadata: CommitMetadata,
    pub created_at: DateTime<Utc>,
}

/// Version-controlled object catalog that imports are applied to.
pub trait Catalog {
    /// Stage object metadata at `obj.key` on `branch`
    ///
    /// # Errors
    ///
    /// `Persistence` if the write fails.
    fn upsert_object(&self, branch: &str, obj: &InventoryObject) -> Result<()>;

    /// Stage removal of `key` on `branch`
    ///
    /// # Errors
    ///
    /// `Persistence` if the write fails.
    fn remove_object(&self, branch: &str, key: &str) -> Result<()>;

    /// Commit staged changes on `branch` with `metadata` attached
    ///
    /// # Errors
    ///
    /// `Persistence` if the commit cannot be recorded.
    fn commit(&self, branch: &str, message: &str, metadata: &CommitMetadata) -> Result<CommitRecord>;

    /// Most recent commit on `branch`
    ///
    /// # Errors
    ///
    /// `Persistence` if the lookup fails.
    fn last_commit(&self, branch: &str) -> Result<Option<CommitRecord>>;

    /// Live objects of `branch` as a key-ordered inventory
    fn list_objects(&self, branch: &str, read_batch_size: i64) -> Box<dyn InventoryIterator + '_>;

    /// Apply one diff item
    ///
    /// # Errors
    ///
    /// Whatever the underlying upsert or removal returns.
    fn apply(&self, branch: &str, item: &DiffObj) -> Result<()> {
        if item.is_deleted {
            self.remove_object(branch, &item.obj.key)
        } else {
            self.upsert_object(branch, &item.obj)
        }
    }
}
