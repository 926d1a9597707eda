//! SQLite-backed object catalog
//!
//! Provides:
//! - [`SqliteCatalog`]: staged upserts and tombstones, commits with metadata
//! - [`CatalogInventoryIterator`]: a branch's live objects as a key-ordered
//!   inventory, paged from the database

mod listing;
mod sqlite_catalog;

pub use listing::CatalogInventoryIterator;
pub use sqlite_catalog::SqliteCatalog;
