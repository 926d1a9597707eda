//! Inventory manifest document.
//!
//! The manifest names the partition files of one inventory, in read order,
//! plus provenance:
//!
//! ```json
//! {
//!   "sourceBucket": "lake-data",
//!   "destinationBucket": "arn:aws:s3:::inventory-bucket",
//!   "version": "2016-11-30",
//!   "creationTimestamp": "1593216000000",
//!   "fileFormat": "JSONL",
//!   "files": [{"key": "inv/data/part-0.jsonl"}]
//! }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ExError, ExErrorKind, Result};

const ARN_PREFIX: &str = "arn:aws:s3:::";

/// Required top-level manifest fields.
const REQUIRED_FIELDS: &[&str] = &["destinationBucket", "fileFormat", "files"];

/// One partition file entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        rename = "MD5checksum",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub md5_checksum: Option<String>,
}

/// Parsed inventory manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub source_bucket: String,
    /// Bucket holding the partition files, as an ARN or bare name
    pub destination_bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Milliseconds since the epoch, as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    pub file_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_schema: Option<String>,
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    /// Parse manifest bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidManifest`: bytes are not UTF-8 JSON, the root is not an
    ///   object, a field has the wrong type, or `creationTimestamp` is not a
    ///   millisecond count
    /// - `MissingField`: `destinationBucket`, `fileFormat` or `files` is absent
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            invalid_manifest(format!("manifest is not valid UTF-8: {}", e))
        })?;

        let raw: Value = serde_json::from_str(text)
            .map_err(|e| invalid_manifest(format!("manifest is not valid JSON: {}", e)))?;

        let obj = raw
            .as_object()
            .ok_or_else(|| invalid_manifest("manifest JSON root must be an object"))?;

        for field in REQUIRED_FIELDS {
            if !obj.contains_key(*field) {
                return Err(ExError::new(ExErrorKind::MissingField)
                    .with_op("parse_manifest")
                    .with_message(format!("required field `{}` is absent", field)));
            }
        }

        let manifest: Manifest = serde_json::from_value(raw)
            .map_err(|e| invalid_manifest(format!("failed to deserialize manifest: {}", e)))?;

        if let Some(ts) = &manifest.creation_timestamp {
            parse_millis(ts).ok_or_else(|| {
                invalid_manifest(format!("`creationTimestamp` is not a millisecond count: {}", ts))
            })?;
        }

        Ok(manifest)
    }

    /// Bucket name the partition files are read from, with any ARN prefix removed
    pub fn destination_bucket_name(&self) -> &str {
        self.destination_bucket
            .strip_prefix(ARN_PREFIX)
            .unwrap_or(&self.destination_bucket)
    }

    /// Creation time of the inventory, if the manifest records it
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_timestamp.as_deref().and_then(parse_millis)
    }

    /// Partition file keys in read order
    pub fn file_keys(&self) -> Vec<String> {
        self.files.iter().map(|f| f.key.clone()).collect()
    }
}

fn parse_millis(ts: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = ts.trim().parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

fn invalid_manifest(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidManifest)
        .with_op("parse_manifest")
        .with_message(message)
}
