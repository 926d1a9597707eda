//! Manifest-backed inventory iterator.
//!
//! Flattens the partition files named by a manifest into one logical
//! sequence: each file's rows in stored order, files in manifest order.
//! Files are opened lazily, one at a time, and read in batches of at most
//! `read_batch_size` rows into a buffer owned by the iterator and reused
//! across batches. Memory held is O(batch size), never O(inventory).

use std::collections::VecDeque;
use std::sync::Arc;

use super::InventoryIterator;
use crate::errors::{ExError, InventoryError, Result};
use crate::model::InventoryObject;
use crate::source::{RowBatchSource, RowSourceFactory};

/// Rows per batch read when no positive size is configured
pub const DEFAULT_READ_BATCH_SIZE: usize = 100_000;

/// Normalise a configured batch size; non-positive means "use the default"
pub fn effective_batch_size(configured: i64) -> usize {
    if configured <= 0 {
        DEFAULT_READ_BATCH_SIZE
    } else {
        usize::try_from(configured).unwrap_or(DEFAULT_READ_BATCH_SIZE)
    }
}

/// The partition file currently being read.
struct OpenPartition {
    key: String,
    source: Box<dyn RowBatchSource>,
    total_rows: u64,
    rows_left: u64,
}

/// Iterator over the effective records of a manifest's partition files.
///
/// Records that are not the latest version of their key, or that are delete
/// markers, are skipped. A second effective record for the key just yielded
/// always latches `DuplicateKey`. With key-order verification on (the
/// default), a key that sorts strictly before its predecessor latches an
/// `OrderingViolation`.
pub struct ManifestInventoryIterator {
    factory: Arc<dyn RowSourceFactory>,
    bucket: String,
    pending: VecDeque<String>,
    partition: Option<OpenPartition>,
    read_batch_size: usize,
    verify_key_order: bool,
    buffer: Vec<InventoryObject>,
    cursor: usize,
    current: Option<usize>,
    last_key: Option<String>,
    rows_read: u64,
    exhausted: bool,
    err: Option<ExError>,
}

impl ManifestInventoryIterator {
    /// Create an iterator over `files`, read from `bucket` through `factory`.
    ///
    /// Nothing is opened until the first call to `next`.
    pub fn new(
        factory: Arc<dyn RowSourceFactory>,
        bucket: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self {
            factory,
            bucket: bucket.into(),
            pending: files.into(),
            partition: None,
            read_batch_size: DEFAULT_READ_BATCH_SIZE,
            verify_key_order: true,
            buffer: Vec::new(),
            cursor: 0,
            current: None,
            last_key: None,
            rows_read: 0,
            exhausted: false,
            err: None,
        }
    }

    /// Rows per batch read; non-positive selects [`DEFAULT_READ_BATCH_SIZE`]
    pub fn with_read_batch_size(mut self, read_batch_size: i64) -> Self {
        self.read_batch_size = effective_batch_size(read_batch_size);
        self
    }

    pub fn with_key_order_check(mut self, verify: bool) -> Self {
        self.verify_key_order = verify;
        self
    }

    pub fn read_batch_size(&self) -> usize {
        self.read_batch_size
    }

    /// Rows decoded so far, including skipped non-effective versions
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn fail(&mut self, err: ExError) {
        tracing::debug!(
            bucket = %self.bucket,
            rows_read = self.rows_read,
            error = %err,
            "inventory iteration failed"
        );
        self.current = None;
        self.partition = None;
        self.buffer.clear();
        self.cursor = 0;
        self.err = Some(err);
    }

    /// Close the current partition and open the next one in manifest order.
    ///
    /// A partition is only closed once it confirms it holds no rows past its
    /// announced count. Returns `false` when no partitions remain.
    fn open_next_partition(&mut self) -> Result<bool> {
        if let Some(mut done) = self.partition.take() {
            done.source
                .check_exhausted()
                .map_err(|e| e.or_file(done.key.clone()))?;
        }
        let Some(key) = self.pending.pop_front() else {
            return Ok(false);
        };

        let source = self.factory.open(&self.bucket, &key).map_err(|e| {
            e.or_file(key.clone())
        })?;
        let total_rows = source.total_rows();
        tracing::debug!(
            bucket = %self.bucket,
            partition_file = %key,
            total_rows,
            "opened inventory partition"
        );

        self.partition = Some(OpenPartition {
            key,
            source,
            total_rows,
            rows_left: total_rows,
        });
        Ok(true)
    }

    /// Refill the buffer with the next non-empty batch.
    ///
    /// Returns `false` when every partition is exhausted.
    fn fill_buffer(&mut self) -> Result<bool> {
        loop {
            let needs_partition = self
                .partition
                .as_ref()
                .map_or(true, |p| p.rows_left == 0);
            if needs_partition {
                if !self.open_next_partition()? {
                    return Ok(false);
                }
                // Empty partitions fall through to the next iteration.
                continue;
            }

            let batch_size = self.read_batch_size;
            let Some(partition) = self.partition.as_mut() else {
                continue;
            };
            let want = partition.rows_left.min(batch_size as u64) as usize;
            let read = partition
                .source
                .read_batch(&mut self.buffer, want)
                .map_err(|e| e.or_file(partition.key.clone()))?;

            if read == 0 {
                return Err(InventoryError::TruncatedPartition {
                    file: partition.key.clone(),
                    expected: partition.total_rows,
                    read: partition.total_rows - partition.rows_left,
                }
                .into());
            }

            partition.rows_left = partition.rows_left.saturating_sub(read as u64);
            self.rows_read += read as u64;
            self.cursor = 0;
            return Ok(true);
        }
    }

    /// Check the record at `idx` against the previous effective key.
    ///
    /// Repeats are always rejected; keys going backwards only when key-order
    /// verification is on.
    fn check_order(&mut self, idx: usize) -> Result<()> {
        let key = &self.buffer[idx].key;
        if let Some(previous) = &self.last_key {
            if key == previous {
                return Err(InventoryError::DuplicateKey { key: key.clone() }.into());
            }
            if self.verify_key_order && key < previous {
                return Err(InventoryError::KeyOrderViolation {
                    previous: previous.clone(),
                    key: key.clone(),
                }
                .into());
            }
        }
        match &mut self.last_key {
            Some(last) => {
                last.clear();
                last.push_str(key);
            }
            None => self.last_key = Some(key.clone()),
        }
        Ok(())
    }
}

impl InventoryIterator for ManifestInventoryIterator {
    fn next(&mut self) -> bool {
        self.current = None;
        if self.err.is_some() || self.exhausted {
            return false;
        }

        loop {
            while self.cursor < self.buffer.len() {
                let idx = self.cursor;
                self.cursor += 1;
                if !self.buffer[idx].is_effective() {
                    continue;
                }
                if let Err(err) = self.check_order(idx) {
                    let file = self.partition.as_ref().map(|p| p.key.clone());
                    self.fail(match file {
                        Some(file) => err.or_file(file),
                        None => err,
                    });
                    return false;
                }
                self.current = Some(idx);
                return true;
            }

            match self.fill_buffer() {
                Ok(true) => continue,
                Ok(false) => {
                    tracing::debug!(
                        bucket = %self.bucket,
                        rows_read = self.rows_read,
                        "inventory exhausted"
                    );
                    self.exhausted = true;
                    self.buffer.clear();
                    self.cursor = 0;
                    return false;
                }
                Err(err) => {
                    self.fail(err);
                    return false;
                }
            }
        }
    }

    fn get(&self) -> Option<&InventoryObject> {
        self.current.and_then(|idx| self.buffer.get(idx))
    }

    fn err(&self) -> Option<&ExError> {
        self.err.as_ref()
    }
}
