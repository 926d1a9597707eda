use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Inventory, InventoryIterator, ManifestInventoryIterator};
use crate::errors::Result;
use crate::model::Manifest;
use crate::source::RowSourceFactory;

/// An inventory described by a manifest, read through an injected factory.
pub struct ManifestInventory {
    url: String,
    manifest: Manifest,
    factory: Arc<dyn RowSourceFactory>,
    read_batch_size: i64,
    verify_key_order: bool,
}

impl ManifestInventory {
    pub fn new(url: impl Into<String>, manifest: Manifest, factory: Arc<dyn RowSourceFactory>) -> Self {
        Self {
            url: url.into(),
            manifest,
            factory,
            read_batch_size: 0,
            verify_key_order: true,
        }
    }

    /// Batch size handed to every iterator this inventory creates
    pub fn with_read_batch_size(mut self, read_batch_size: i64) -> Self {
        self.read_batch_size = read_batch_size;
        self
    }

    pub fn with_key_order_check(mut self, verify: bool) -> Self {
        self.verify_key_order = verify;
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Concrete iterator, for callers that want its extra accessors
    pub fn manifest_iterator(&self) -> ManifestInventoryIterator {
        ManifestInventoryIterator::new(
            self.factory.clone(),
            self.manifest.destination_bucket_name(),
            self.manifest.file_keys(),
        )
        .with_read_batch_size(self.read_batch_size)
        .with_key_order_check(self.verify_key_order)
    }
}

impl Inventory for ManifestInventory {
    fn iterator(&self) -> Result<Box<dyn InventoryIterator + Send + '_>> {
        Ok(Box::new(self.manifest_iterator()))
    }

    fn inventory_url(&self) -> &str {
        &self.url
    }

    fn source_name(&self) -> &str {
        &self.manifest.source_bucket
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.manifest.created_at()
    }
}
