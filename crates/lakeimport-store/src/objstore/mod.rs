//! Filesystem-backed object store and inventory readers
//!
//! Provides:
//! - [`FsObjectStore`]: `s3://bucket/key` URLs resolved under a root directory
//! - [`JsonLinesRowSource`]: a JSON-lines partition file as a Row Batch Source
//! - [`FsInventoryGenerator`]: manifest URL to [`ManifestInventory`]
//!
//! [`ManifestInventory`]: lakeimport_core::ManifestInventory

mod atomic;
mod fs_store;
mod generate;
mod jsonl;

pub use fs_store::{parse_url, FsObjectStore};
pub use generate::{generate_inventory, row_source_factory, FsInventoryGenerator, FORMAT_JSONL};
pub use jsonl::{JsonLinesRowSource, JsonLinesSourceFactory};
