//! JSON-lines partition files.
//!
//! ```text
//! {"row_count": 2}
//! {"key": "a/1.csv", "e_tag": "9b2c", "size": 120, "last_modified_date": 1593216000000}
//! {"key": "a/2.csv", "e_tag": "77e1", "size": 64, "is_latest": false}
//! ```
//!
//! The header line carries the row count the reader checks against. Blank
//! lines are ignored and do not count as rows.

use std::io::BufRead;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use lakeimport_core::errors::{ExError, ExErrorKind, InventoryError};
use lakeimport_core::model::InventoryObject;
use lakeimport_core::source::{RowBatchSource, RowSourceFactory};
use serde::Deserialize;

use super::fs_store::FsObjectStore;
use crate::errors::{io_error, Result};

#[derive(Debug, Deserialize)]
struct Header {
    row_count: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRow {
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    e_tag: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    last_modified_date: Option<i64>,
    #[serde(default = "default_true")]
    is_latest: bool,
    #[serde(default)]
    is_delete_marker: bool,
}

fn default_true() -> bool {
    true
}

/// One JSON-lines partition file, read sequentially.
pub struct JsonLinesRowSource {
    file: String,
    default_bucket: String,
    reader: Box<dyn BufRead + Send>,
    line: String,
    total_rows: u64,
    row: u64,
}

impl std::fmt::Debug for JsonLinesRowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesRowSource")
            .field("file", &self.file)
            .field("total_rows", &self.total_rows)
            .field("row", &self.row)
            .finish()
    }
}

impl JsonLinesRowSource {
    /// Read the header of `reader` and position it at the first row.
    ///
    /// Rows without a `bucket` field are attributed to `default_bucket`.
    ///
    /// # Errors
    ///
    /// `Decode` if the header is missing or malformed, `Io` if it cannot be read.
    pub fn open(
        file: impl Into<String>,
        default_bucket: impl Into<String>,
        reader: Box<dyn BufRead + Send>,
    ) -> Result<Self> {
        let mut source = Self {
            file: file.into(),
            default_bucket: default_bucket.into(),
            reader,
            line: String::new(),
            total_rows: 0,
            row: 0,
        };

        if !source.read_line()? {
            return Err(source.header_error("file is empty"));
        }
        let header: Header = serde_json::from_str(source.line.trim())
            .map_err(|e| source.header_error(&e.to_string()))?;
        source.total_rows = header.row_count;
        Ok(source)
    }

    /// Read the next non-blank line into `self.line`; `false` at end of file
    fn read_line(&mut self) -> Result<bool> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line).map_err(|e| {
                io_error("read_partition", e)
                    .with_file(self.file.clone())
                    .with_row(self.row)
            })?;
            if n == 0 {
                return Ok(false);
            }
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    fn header_error(&self, reason: &str) -> ExError {
        ExError::new(ExErrorKind::Decode)
            .with_op("open_partition")
            .with_file(self.file.clone())
            .with_message(format!("invalid row count header: {}", reason))
    }

    fn decode_row(&self) -> Result<InventoryObject> {
        let row: JsonRow = serde_json::from_str(self.line.trim()).map_err(|e| {
            ExError::from(InventoryError::MalformedRow {
                file: self.file.clone(),
                row: self.row,
                reason: e.to_string(),
            })
        })?;

        let key = match row.key {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(InventoryError::EmptyKey {
                    file: self.file.clone(),
                    row: self.row,
                }
                .into())
            }
        };

        let mut obj = InventoryObject::new(key, row.e_tag)
            .with_bucket(row.bucket.unwrap_or_else(|| self.default_bucket.clone()))
            .with_size(row.size)
            .with_latest(row.is_latest)
            .with_delete_marker(row.is_delete_marker);
        if let Some(ms) = row.last_modified_date {
            let ts = Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
                ExError::from(InventoryError::MalformedRow {
                    file: self.file.clone(),
                    row: self.row,
                    reason: format!("last_modified_date out of range: {}", ms),
                })
            })?;
            obj = obj.with_last_modified(ts);
        }
        Ok(obj)
    }
}

impl RowBatchSource for JsonLinesRowSource {
    fn read_batch(&mut self, buf: &mut Vec<InventoryObject>, capacity: usize) -> Result<usize> {
        buf.clear();
        while buf.len() < capacity {
            if !self.read_line()? {
                break;
            }
            let obj = self.decode_row()?;
            buf.push(obj);
            self.row += 1;
        }
        Ok(buf.len())
    }

    fn total_rows(&self) -> u64 {
        self.total_rows
    }

    fn check_exhausted(&mut self) -> Result<()> {
        if self.read_line()? {
            return Err(InventoryError::ExcessRows {
                file: self.file.clone(),
                expected: self.total_rows,
            }
            .into());
        }
        Ok(())
    }
}

/// Opens JSON-lines partition files from an [`FsObjectStore`].
#[derive(Debug, Clone)]
pub struct JsonLinesSourceFactory {
    store: Arc<FsObjectStore>,
    source_bucket: String,
}

impl JsonLinesSourceFactory {
    /// Rows without a `bucket` field are attributed to `source_bucket`
    pub fn new(store: Arc<FsObjectStore>, source_bucket: impl Into<String>) -> Self {
        Self {
            store,
            source_bucket: source_bucket.into(),
        }
    }
}

impl RowSourceFactory for JsonLinesSourceFactory {
    fn open(&self, bucket: &str, key: &str) -> Result<Box<dyn RowBatchSource>> {
        let reader = self.store.open(bucket, key)?;
        let source = JsonLinesRowSource::open(key, self.source_bucket.clone(), Box::new(reader))?;
        Ok(Box::new(source))
    }
}
