//! Catalog listing as an inventory.
//!
//! Live objects of one branch are read in pages of `read_batch_size` rows,
//! each page starting strictly after the last key of the previous one. Keys
//! are SQLite TEXT under the default BINARY collation, so page order is byte
//! order, the same order the diff compares in.
//!
//! A page is fully materialised before it is yielded, so no statement is
//! open while the importer writes through the same connection. Mutations
//! arrive in key order and never touch keys past the current page.

use lakeimport_core::errors::ExError;
use lakeimport_core::inventory::{effective_batch_size, InventoryIterator};
use lakeimport_core::model::InventoryObject;
use rusqlite::Connection;

use super::sqlite_catalog::row_to_object;
use crate::errors::{from_rusqlite, Result};

/// Key-ordered iterator over a branch's non-tombstoned objects.
pub struct CatalogInventoryIterator<'a> {
    conn: &'a Connection,
    branch: String,
    read_batch_size: usize,
    page: Vec<InventoryObject>,
    cursor: usize,
    current: Option<usize>,
    last_key: Option<String>,
    last_page: bool,
    err: Option<ExError>,
}

impl<'a> CatalogInventoryIterator<'a> {
    pub fn new(conn: &'a Connection, branch: impl Into<String>) -> Self {
        Self {
            conn,
            branch: branch.into(),
            read_batch_size: effective_batch_size(0),
            page: Vec::new(),
            cursor: 0,
            current: None,
            last_key: None,
            last_page: false,
            err: None,
        }
    }

    /// Rows per page; non-positive selects the default batch size
    pub fn with_read_batch_size(mut self, read_batch_size: i64) -> Self {
        self.read_batch_size = effective_batch_size(read_batch_size);
        self
    }

    fn fetch_page(&mut self) -> Result<()> {
        let conn = self.conn;
        let mut stmt = conn
            .prepare_cached(
                "SELECT key, bucket, checksum, size, last_modified_ms
                 FROM objects
                 WHERE branch = ?1 AND tombstone = 0 AND (?2 IS NULL OR key > ?2)
                 ORDER BY key
                 LIMIT ?3",
            )
            .map_err(from_rusqlite)?;

        let limit = i64::try_from(self.read_batch_size).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(
                rusqlite::params![self.branch, self.last_key, limit],
                row_to_object,
            )
            .map_err(from_rusqlite)?;

        self.page.clear();
        for row in rows {
            self.page.push(row.map_err(from_rusqlite)?);
        }
        self.cursor = 0;
        self.last_page = self.page.len() < self.read_batch_size;
        if let Some(last) = self.page.last() {
            self.last_key = Some(last.key.clone());
        }
        Ok(())
    }
}

impl InventoryIterator for CatalogInventoryIterator<'_> {
    fn next(&mut self) -> bool {
        self.current = None;
        if self.err.is_some() {
            return false;
        }

        if self.cursor >= self.page.len() {
            if self.last_page {
                return false;
            }
            if let Err(err) = self.fetch_page() {
                let err = err.with_op("list_objects");
                tracing::debug!(branch = %self.branch, error = %err, "catalog listing failed");
                self.page.clear();
                self.err = Some(err);
                return false;
            }
            if self.page.is_empty() {
                return false;
            }
        }

        self.current = Some(self.cursor);
        self.cursor += 1;
        true
    }

    fn get(&self) -> Option<&InventoryObject> {
        self.current.and_then(|idx| self.page.get(idx))
    }

    fn err(&self) -> Option<&ExError> {
        self.err.as_ref()
    }
}
