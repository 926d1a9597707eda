use std::sync::Arc;

use lakeimport_core::inventory::{InventoryIterator, ManifestInventoryIterator};
use lakeimport_core::source::MemoryRowSourceFactory;
use lakeimport_core::{DiffIterator, InventoryObject};

pub const BUCKET: &str = "inventory-dest";

/// Object with a checksum derived from its key
#[allow(dead_code)]
pub fn obj(key: &str) -> InventoryObject {
    InventoryObject::new(key, format!("etag-{}", key)).with_bucket("source")
}

#[allow(dead_code)]
pub fn obj_with(key: &str, checksum: &str) -> InventoryObject {
    InventoryObject::new(key, checksum).with_bucket("source")
}

/// Factory serving one file per `(name, keys)` entry
#[allow(dead_code)]
pub fn factory_with(files: &[(&str, &[&str])]) -> MemoryRowSourceFactory {
    files
        .iter()
        .fold(MemoryRowSourceFactory::new(BUCKET), |f, (name, keys)| {
            f.with_file(*name, keys.iter().map(|k| obj(k)).collect())
        })
}

#[allow(dead_code)]
pub fn manifest_iter(
    factory: Arc<MemoryRowSourceFactory>,
    files: &[&str],
    batch_size: i64,
) -> ManifestInventoryIterator {
    ManifestInventoryIterator::new(
        factory,
        BUCKET,
        files.iter().map(|f| f.to_string()).collect(),
    )
    .with_read_batch_size(batch_size)
}

/// Drain an iterator, returning the keys it yielded
#[allow(dead_code)]
pub fn drain_keys(it: &mut dyn InventoryIterator) -> Vec<String> {
    let mut keys = Vec::new();
    while it.next() {
        keys.push(it.get().expect("value after next").key.clone());
    }
    keys
}

/// Drained diff split into (added_or_changed, deleted) keys
#[allow(dead_code)]
pub fn drain_diff(diff: &mut DiffIterator<'_>) -> (Vec<String>, Vec<String>) {
    let mut upserts = Vec::new();
    let mut deletes = Vec::new();
    while diff.next() {
        let item = diff.get().expect("value after next");
        if item.is_deleted {
            deletes.push(item.obj.key.clone());
        } else {
            upserts.push(item.obj.key.clone());
        }
    }
    (upserts, deletes)
}
