//! Inventory generation from a manifest URL.

use std::sync::Arc;

use lakeimport_core::errors::InventoryError;
use lakeimport_core::source::RowSourceFactory;
use lakeimport_core::{Inventory, InventoryGenerator, Manifest, ManifestInventory};

use super::fs_store::FsObjectStore;
use super::jsonl::JsonLinesSourceFactory;
use crate::errors::Result;

/// `fileFormat` value of JSON-lines inventories
pub const FORMAT_JSONL: &str = "JSONL";

/// Pick the Row Batch Source factory for a manifest's file format
///
/// # Errors
///
/// `UnsupportedFormat` if no reader handles the format.
pub fn row_source_factory(
    manifest: &Manifest,
    store: Arc<FsObjectStore>,
) -> Result<Arc<dyn RowSourceFactory>> {
    if manifest.file_format.eq_ignore_ascii_case(FORMAT_JSONL) {
        return Ok(Arc::new(JsonLinesSourceFactory::new(
            store,
            manifest.source_bucket.clone(),
        )));
    }
    Err(InventoryError::UnsupportedFormat {
        format: manifest.file_format.clone(),
    }
    .into())
}

/// Load the manifest at `manifest_url` and build an inventory over it
///
/// Partition files are not touched until the inventory is iterated.
///
/// # Errors
///
/// See [`FsObjectStore::load_manifest`] and [`row_source_factory`].
pub fn generate_inventory(
    manifest_url: &str,
    store: Arc<FsObjectStore>,
    read_batch_size: i64,
    verify_key_order: bool,
) -> Result<ManifestInventory> {
    let manifest = store.load_manifest(manifest_url)?;
    let factory = row_source_factory(&manifest, store)?;
    tracing::debug!(
        inventory_url = manifest_url,
        files = manifest.files.len(),
        file_format = %manifest.file_format,
        "loaded inventory manifest"
    );
    Ok(ManifestInventory::new(manifest_url, manifest, factory)
        .with_read_batch_size(read_batch_size)
        .with_key_order_check(verify_key_order))
}

/// [`InventoryGenerator`] over an [`FsObjectStore`], with fixed read settings.
#[derive(Debug, Clone)]
pub struct FsInventoryGenerator {
    store: Arc<FsObjectStore>,
    read_batch_size: i64,
    verify_key_order: bool,
}

impl FsInventoryGenerator {
    pub fn new(store: Arc<FsObjectStore>) -> Self {
        Self {
            store,
            read_batch_size: 0,
            verify_key_order: true,
        }
    }

    pub fn with_read_batch_size(mut self, read_batch_size: i64) -> Self {
        self.read_batch_size = read_batch_size;
        self
    }

    pub fn with_key_order_check(mut self, verify: bool) -> Self {
        self.verify_key_order = verify;
        self
    }
}

impl InventoryGenerator for FsInventoryGenerator {
    fn generate_inventory(&self, manifest_url: &str) -> Result<Box<dyn Inventory + Send + Sync>> {
        let inventory = generate_inventory(
            manifest_url,
            self.store.clone(),
            self.read_batch_size,
            self.verify_key_order,
        )?;
        Ok(Box::new(inventory))
    }
}
