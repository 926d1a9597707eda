//! In-memory row sources, for tests and for inventories already held in memory.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{RowBatchSource, RowSourceFactory};
use crate::errors::{ExError, ExErrorKind, InventoryError, Result};
use crate::model::InventoryObject;

/// A partition file held in memory.
///
/// `None` rows stand for rows that fail to decode.
#[derive(Debug, Clone)]
pub struct MemoryRowSource {
    file: String,
    rows: Vec<Option<InventoryObject>>,
    cursor: usize,
    io_error_at: Option<usize>,
}

impl MemoryRowSource {
    pub fn new(file: impl Into<String>, rows: Vec<Option<InventoryObject>>) -> Self {
        Self {
            file: file.into(),
            rows,
            cursor: 0,
            io_error_at: None,
        }
    }

    /// Fail with an I/O error when a batch would include row `row`
    pub fn with_io_error_at(mut self, row: usize) -> Self {
        self.io_error_at = Some(row);
        self
    }
}

impl RowBatchSource for MemoryRowSource {
    fn read_batch(&mut self, buf: &mut Vec<InventoryObject>, capacity: usize) -> Result<usize> {
        buf.clear();
        let end = self.rows.len().min(self.cursor + capacity);
        for idx in self.cursor..end {
            if self.io_error_at == Some(idx) {
                return Err(ExError::new(ExErrorKind::Io)
                    .with_op("read_batch")
                    .with_file(self.file.clone())
                    .with_row(idx as u64)
                    .with_message("simulated read failure"));
            }
            match &self.rows[idx] {
                Some(row) => buf.push(row.clone()),
                None => {
                    return Err(InventoryError::EmptyKey {
                        file: self.file.clone(),
                        row: idx as u64,
                    }
                    .into())
                }
            }
        }
        self.cursor = end;
        Ok(buf.len())
    }

    fn total_rows(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// Factory serving [`MemoryRowSource`]s from one bucket.
///
/// Records every file it opens so tests can check that files are opened
/// lazily and in manifest order.
#[derive(Debug, Default)]
pub struct MemoryRowSourceFactory {
    bucket: String,
    files: HashMap<String, Vec<Option<InventoryObject>>>,
    io_errors: HashMap<String, usize>,
    opened: Mutex<Vec<String>>,
}

impl MemoryRowSourceFactory {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Register a file of well-formed rows
    pub fn with_file(mut self, key: impl Into<String>, rows: Vec<InventoryObject>) -> Self {
        self.files
            .insert(key.into(), rows.into_iter().map(Some).collect());
        self
    }

    /// Register a file whose `None` rows fail to decode
    pub fn with_raw_file(
        mut self,
        key: impl Into<String>,
        rows: Vec<Option<InventoryObject>>,
    ) -> Self {
        self.files.insert(key.into(), rows);
        self
    }

    /// Make reads of `key` fail with an I/O error at `row`
    pub fn with_io_error(mut self, key: impl Into<String>, row: usize) -> Self {
        self.io_errors.insert(key.into(), row);
        self
    }

    /// Files opened so far, in open order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl RowSourceFactory for MemoryRowSourceFactory {
    fn open(&self, bucket: &str, key: &str) -> Result<Box<dyn RowBatchSource>> {
        if bucket != self.bucket {
            return Err(ExError::new(ExErrorKind::NotFound)
                .with_op("open_partition")
                .with_file(key)
                .with_message(format!("wrong bucket name: {}", bucket)));
        }
        let rows = self.files.get(key).ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("open_partition")
                .with_file(key)
                .with_message("partition file not found")
        })?;

        if let Ok(mut opened) = self.opened.lock() {
            opened.push(key.to_string());
        }

        let mut source = MemoryRowSource::new(key, rows.clone());
        if let Some(row) = self.io_errors.get(key) {
            source = source.with_io_error_at(*row);
        }
        Ok(Box::new(source))
    }
}
