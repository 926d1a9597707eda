//! Diff output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InventoryObject;

/// Which input of a diff an item or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSide {
    /// The previous/base snapshot
    Left,
    /// The current/incoming inventory
    Right,
}

impl DiffSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffSide::Left => "left",
            DiffSide::Right => "right",
        }
    }
}

impl std::fmt::Display for DiffSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output unit of the diff: the winning record and whether it was deleted.
///
/// For additions and modifications `obj` is the incoming record; for
/// deletions it is the previous record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffObj {
    pub obj: InventoryObject,
    pub is_deleted: bool,
}

impl DiffObj {
    pub fn added_or_changed(obj: InventoryObject) -> Self {
        Self {
            obj,
            is_deleted: false,
        }
    }

    pub fn deleted(obj: InventoryObject) -> Self {
        Self {
            obj,
            is_deleted: true,
        }
    }
}

/// Counters and provenance of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub dry_run: bool,
    /// Additions and modifications together
    pub added_or_changed: u64,
    pub deleted: u64,
    /// Inventory the diff was computed against, if any.
    ///
    /// `None` when the branch's catalog contents were the diff base.
    pub previous_inventory_url: Option<String>,
    /// When that previous inventory was imported
    pub previous_import_date: Option<DateTime<Utc>>,
}

impl ImportStats {
    /// Count one diff item
    pub fn record(&mut self, item: &DiffObj) {
        if item.is_deleted {
            self.deleted += 1;
        } else {
            self.added_or_changed += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_or_changed == 0 && self.deleted == 0
    }
}

/// Fully materialised diff, for reports on inventories small enough to hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDiff {
    pub dry_run: bool,
    pub added_or_changed: Vec<InventoryObject>,
    pub deleted: Vec<InventoryObject>,
    pub previous_inventory_url: Option<String>,
    pub previous_import_date: Option<DateTime<Utc>>,
}

impl InventoryDiff {
    pub fn push(&mut self, item: DiffObj) {
        if item.is_deleted {
            self.deleted.push(item.obj);
        } else {
            self.added_or_changed.push(item.obj);
        }
    }

    pub fn stats(&self) -> ImportStats {
        ImportStats {
            dry_run: self.dry_run,
            added_or_changed: self.added_or_changed.len() as u64,
            deleted: self.deleted.len() as u64,
            previous_inventory_url: self.previous_inventory_url.clone(),
            previous_import_date: self.previous_import_date,
        }
    }
}
