use std::sync::Arc;

use lakeimport_store::{db, FsObjectStore};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

pub const INVENTORY_BUCKET: &str = "inventory-dest";
pub const SOURCE_BUCKET: &str = "lake-data";

/// Object store and catalog database rooted in one temp dir
#[allow(dead_code)]
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<FsObjectStore>,
    pub conn: Connection,
}

#[allow(dead_code)]
pub fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FsObjectStore::new(dir.path().join("objects")));
    let conn = db::open_catalog(dir.path().join("catalog.db")).unwrap();
    Fixture { dir, store, conn }
}

/// Write one JSONL partition of `(key, e_tag)` rows
#[allow(dead_code)]
pub fn write_partition(store: &FsObjectStore, key: &str, rows: &[(&str, &str)]) {
    let mut text = json!({ "row_count": rows.len() }).to_string();
    text.push('\n');
    for (k, etag) in rows {
        text.push_str(&json!({ "key": k, "e_tag": etag, "size": 10 }).to_string());
        text.push('\n');
    }
    store.put(INVENTORY_BUCKET, key, text.as_bytes()).unwrap();
}

/// Write a complete inventory, one partition per entry, and return its URL
#[allow(dead_code)]
pub fn write_inventory(
    store: &FsObjectStore,
    name: &str,
    partitions: &[&[(&str, &str)]],
) -> String {
    let files: Vec<String> = (0..partitions.len())
        .map(|i| partition_key(name, i))
        .collect();
    for (file, rows) in files.iter().zip(partitions) {
        write_partition(store, file, rows);
    }
    write_manifest(store, name, &files)
}

#[allow(dead_code)]
pub fn partition_key(name: &str, index: usize) -> String {
    format!("{}/data/part-{}.jsonl", name, index)
}

#[allow(dead_code)]
pub fn write_manifest(store: &FsObjectStore, name: &str, files: &[String]) -> String {
    let manifest_key = format!("{}/manifest.json", name);
    let manifest = json!({
        "sourceBucket": SOURCE_BUCKET,
        "destinationBucket": format!("arn:aws:s3:::{}", INVENTORY_BUCKET),
        "version": "2016-11-30",
        "creationTimestamp": "1593216000000",
        "fileFormat": "JSONL",
        "files": files.iter().map(|f| json!({ "key": f })).collect::<Vec<_>>(),
    });
    store
        .put(INVENTORY_BUCKET, &manifest_key, manifest.to_string().as_bytes())
        .unwrap();
    format!("s3://{}/{}", INVENTORY_BUCKET, manifest_key)
}
