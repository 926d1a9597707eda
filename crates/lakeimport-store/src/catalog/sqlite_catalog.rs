//! Catalog implementation over a borrowed SQLite connection.

use chrono::{DateTime, TimeZone, Utc};
use lakeimport_core::errors::{ExError, ExErrorKind};
use lakeimport_core::inventory::InventoryIterator;
use lakeimport_core::model::{CommitMetadata, InventoryObject};
use lakeimport_core::{Catalog, CommitRecord};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::listing::CatalogInventoryIterator;
use crate::errors::{from_rusqlite, Result};

/// Catalog stored in the `objects` and `commits` tables.
///
/// Every mutation is written immediately and marked staged; `commit` records
/// a commit row and clears the staged marks in one transaction. Nothing is
/// rolled back if an import fails between mutations.
pub struct SqliteCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalog<'a> {
    /// Wrap a connection whose schema has already been migrated
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Live object at `key`, ignoring tombstones
    ///
    /// # Errors
    ///
    /// `Persistence` if the lookup fails.
    pub fn get_object(&self, branch: &str, key: &str) -> Result<Option<InventoryObject>> {
        self.conn
            .query_row(
                "SELECT key, bucket, checksum, size, last_modified_ms
                 FROM objects WHERE branch = ?1 AND key = ?2 AND tombstone = 0",
                rusqlite::params![branch, key],
                row_to_object,
            )
            .optional()
            .map_err(from_rusqlite)
    }

    /// Number of uncommitted mutations on `branch`
    ///
    /// # Errors
    ///
    /// `Persistence` if the count fails.
    pub fn staged_count(&self, branch: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM objects WHERE branch = ?1 AND staged = 1",
                [branch],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(count.max(0) as u64)
    }

    /// Commits on `branch`, newest first
    ///
    /// # Errors
    ///
    /// `Persistence` if the query fails or a stored row cannot be decoded.
    pub fn commit_log(&self, branch: &str) -> Result<Vec<CommitRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT commit_id, branch, parent_id, message, metadata_json, created_at_ms
                 FROM commits WHERE branch = ?1 ORDER BY seq DESC",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([branch], read_commit_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter().map(CommitRow::into_record).collect()
    }
}

impl Catalog for SqliteCatalog<'_> {
    fn upsert_object(&self, branch: &str, obj: &InventoryObject) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO objects (branch, key, bucket, checksum, size, last_modified_ms, tombstone, staged)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1)
                 ON CONFLICT(branch, key) DO UPDATE SET
                    bucket = excluded.bucket,
                    checksum = excluded.checksum,
                    size = excluded.size,
                    last_modified_ms = excluded.last_modified_ms,
                    tombstone = 0,
                    staged = 1",
                rusqlite::params![
                    branch,
                    obj.key,
                    obj.bucket,
                    obj.checksum,
                    obj.size,
                    obj.last_modified.map(|t| t.timestamp_millis()),
                ],
            )
            .map_err(|e| from_rusqlite(e).with_op("upsert_object").with_key(obj.key.clone()))?;
        Ok(())
    }

    fn remove_object(&self, branch: &str, key: &str) -> Result<()> {
        // Removing a key the catalog never held is a no-op.
        self.conn
            .execute(
                "UPDATE objects SET tombstone = 1, staged = 1
                 WHERE branch = ?1 AND key = ?2 AND tombstone = 0",
                rusqlite::params![branch, key],
            )
            .map_err(|e| from_rusqlite(e).with_op("remove_object").with_key(key))?;
        Ok(())
    }

    fn commit(&self, branch: &str, message: &str, metadata: &CommitMetadata) -> Result<CommitRecord> {
        let parent_id = self.last_commit(branch)?.map(|c| c.commit_id);
        let metadata_json = serde_json::to_string(metadata).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("commit")
                .with_message(format!("Failed to serialize commit metadata: {}", e))
        })?;

        // Millisecond precision, matching what is stored.
        let now = Utc::now();
        let created_at = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);
        let record = CommitRecord {
            commit_id: Uuid::now_v7().to_string(),
            branch: branch.to_string(),
            parent_id,
            message: message.to_string(),
            metadata: metadata.clone(),
            created_at,
        };

        let tx = self.conn.unchecked_transaction().map_err(from_rusqlite)?;
        tx.execute(
            "INSERT INTO commits (commit_id, branch, parent_id, message, metadata_json, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.commit_id,
                record.branch,
                record.parent_id,
                record.message,
                metadata_json,
                record.created_at.timestamp_millis(),
            ],
        )
        .map_err(|e| from_rusqlite(e).with_op("commit"))?;
        let committed = tx
            .execute(
                "UPDATE objects SET staged = 0 WHERE branch = ?1 AND staged = 1",
                [branch],
            )
            .map_err(|e| from_rusqlite(e).with_op("commit"))?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            commit_id = %record.commit_id,
            branch,
            committed,
            "recorded catalog commit"
        );
        Ok(record)
    }

    fn last_commit(&self, branch: &str) -> Result<Option<CommitRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT commit_id, branch, parent_id, message, metadata_json, created_at_ms
                 FROM commits WHERE branch = ?1 ORDER BY seq DESC LIMIT 1",
                [branch],
                read_commit_row,
            )
            .optional()
            .map_err(|e| from_rusqlite(e).with_op("last_commit"))?;
        row.map(CommitRow::into_record).transpose()
    }

    fn list_objects(&self, branch: &str, read_batch_size: i64) -> Box<dyn InventoryIterator + '_> {
        Box::new(CatalogInventoryIterator::new(self.conn, branch).with_read_batch_size(read_batch_size))
    }
}

/// Map a `(key, bucket, checksum, size, last_modified_ms)` row
pub(crate) fn row_to_object(row: &Row<'_>) -> rusqlite::Result<InventoryObject> {
    let key: String = row.get(0)?;
    let bucket: String = row.get(1)?;
    let checksum: String = row.get(2)?;
    let size: i64 = row.get(3)?;
    let last_modified_ms: Option<i64> = row.get(4)?;

    let mut obj = InventoryObject::new(key, checksum)
        .with_bucket(bucket)
        .with_size(size);
    if let Some(ts) = last_modified_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        obj = obj.with_last_modified(ts);
    }
    Ok(obj)
}

/// Raw commit row; metadata is decoded outside the rusqlite closure so a
/// corrupt value surfaces as a serialization error.
struct CommitRow {
    commit_id: String,
    branch: String,
    parent_id: Option<String>,
    message: String,
    metadata_json: String,
    created_at_ms: i64,
}

fn read_commit_row(row: &Row<'_>) -> rusqlite::Result<CommitRow> {
    Ok(CommitRow {
        commit_id: row.get(0)?,
        branch: row.get(1)?,
        parent_id: row.get(2)?,
        message: row.get(3)?,
        metadata_json: row.get(4)?,
        created_at_ms: row.get(5)?,
    })
}

impl CommitRow {
    fn into_record(self) -> Result<CommitRecord> {
        let metadata: CommitMetadata = serde_json::from_str(&self.metadata_json).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("read_commit")
                .with_message(format!(
                    "Commit {} has unreadable metadata: {}",
                    self.commit_id, e
                ))
        })?;
        let created_at: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.created_at_ms)
            .single()
            .ok_or_else(|| {
                ExError::new(ExErrorKind::Persistence)
                    .with_op("read_commit")
                    .with_message(format!(
                        "Commit {} has an out-of-range timestamp",
                        self.commit_id
                    ))
            })?;
        Ok(CommitRecord {
            commit_id: self.commit_id,
            branch: self.branch,
            parent_id: self.parent_id,
            message: self.message,
            metadata,
            created_at,
        })
    }
}
