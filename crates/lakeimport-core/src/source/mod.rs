//! Row Batch Source contract.
//!
//! A [`RowBatchSource`] is one inventory partition file seen as a pull-based
//! sequence of row batches. A [`RowSourceFactory`] opens one per file and is
//! injected into the inventory iterator, so tests can substitute in-memory
//! sources without touching the iterator's control flow.

pub mod memory;

pub use memory::{MemoryRowSource, MemoryRowSourceFactory};

use crate::errors::Result;
use crate::model::InventoryObject;

/// A single partition file, read in bounded batches.
pub trait RowBatchSource: Send {
    /// Replace the contents of `buf` with up to `capacity` rows starting at
    /// the source's cursor, returning how many rows were read.
    ///
    /// Returns fewer than `capacity` rows only at end of file. Any error is
    /// terminal for the source; a row that fails to decode is an error, never
    /// skipped, and names the file and row.
    ///
    /// # Errors
    ///
    /// `Decode` for malformed rows, `Io` for read failures.
    fn read_batch(&mut self, buf: &mut Vec<InventoryObject>, capacity: usize) -> Result<usize>;

    /// Total number of rows in the file, known from file metadata
    fn total_rows(&self) -> u64;

    /// Confirm nothing follows the last announced row.
    ///
    /// Called once `total_rows` rows have been read. Sources whose row count
    /// cannot disagree with their contents keep the default.
    ///
    /// # Errors
    ///
    /// `TruncatedPartition` if further rows remain, `Io` for read failures.
    fn check_exhausted(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens the [`RowBatchSource`] for one partition file.
pub trait RowSourceFactory: Send + Sync {
    /// # Errors
    ///
    /// `NotFound` if the file does not exist, `Io` if it cannot be opened,
    /// `Decode` if its metadata cannot be read.
    fn open(&self, bucket: &str, key: &str) -> Result<Box<dyn RowBatchSource>>;
}
