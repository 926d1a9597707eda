use lakeimport_store::FsObjectStore;
use serde_json::json;

pub const INVENTORY_BUCKET: &str = "inventory-dest";
pub const SOURCE_BUCKET: &str = "lake-data";

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

/// Write a manifest naming `files` and return its URL
#[allow(dead_code)]
pub fn write_manifest(store: &FsObjectStore, manifest_key: &str, format: &str, files: &[&str]) -> String {
    let manifest = json!({
        "sourceBucket": SOURCE_BUCKET,
        "destinationBucket": format!("arn:aws:s3:::{}", INVENTORY_BUCKET),
        "version": "2016-11-30",
        "creationTimestamp": "1593216000000",
        "fileFormat": format,
        "files": files.iter().map(|f| json!({ "key": f })).collect::<Vec<_>>(),
    });
    store
        .put(INVENTORY_BUCKET, manifest_key, manifest.to_string().as_bytes())
        .unwrap();
    format!("s3://{}/{}", INVENTORY_BUCKET, manifest_key)
}

/// Write a complete inventory: one partition per entry, then its manifest
#[allow(dead_code)]
pub fn write_inventory(
    store: &FsObjectStore,
    name: &str,
    partitions: &[&[(&str, &str)]],
) -> String {
    let files: Vec<String> = (0..partitions.len())
        .map(|i| format!("{}/data/part-{}.jsonl", name, i))
        .collect();
    for (file, rows) in files.iter().zip(partitions) {
        write_partition(store, file, rows);
    }
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();
    write_manifest(store, &format!("{}/manifest.json", name), "JSONL", &refs)
}
