use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object record read from a storage inventory.
///
/// `key` is the sort and join key. Only records that are the latest version
/// and not a delete marker take part in diffing (see [`InventoryObject::is_effective`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryObject {
    /// Bucket the object lives in (empty when not known, e.g. catalog rows)
    #[serde(default)]
    pub bucket: String,
    pub key: String,
    /// Content fingerprint, ETag-equivalent
    pub checksum: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_latest: bool,
    #[serde(default)]
    pub is_delete_marker: bool,
}

impl InventoryObject {
    /// Create a latest, non-deleted record with no size or timestamp
    pub fn new(key: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            bucket: String::new(),
            key: key.into(),
            checksum: checksum.into(),
            size: 0,
            last_modified: None,
            is_latest: true,
            is_delete_marker: false,
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_latest(mut self, is_latest: bool) -> Self {
        self.is_latest = is_latest;
        self
    }

    pub fn with_delete_marker(mut self, is_delete_marker: bool) -> Self {
        self.is_delete_marker = is_delete_marker;
        self
    }

    /// Whether this record is the one version of its key that reaches the diff
    pub fn is_effective(&self) -> bool {
        self.is_latest && !self.is_delete_marker
    }
}
