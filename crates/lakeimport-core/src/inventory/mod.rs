//! Inventory iteration.
//!
//! Every inventory, whether manifest-backed or catalog-backed, is consumed
//! through [`InventoryIterator`]: a single-pass, forward-only cursor with a
//! `next`/`get`/`err` protocol. `next` returning `false` means either
//! "exhausted" or "failed"; `err` tells the two apart and stays set once set.

pub mod manifest_inventory;
pub mod manifest_iter;

pub use manifest_inventory::ManifestInventory;
pub use manifest_iter::{effective_batch_size, ManifestInventoryIterator, DEFAULT_READ_BATCH_SIZE};

use chrono::{DateTime, Utc};

use crate::errors::{ExError, Result};
use crate::model::InventoryObject;

/// Pull-based cursor over inventory records in ascending key order.
pub trait InventoryIterator {
    /// Advance to the next record. Returns `false` at the end or on error;
    /// after an error every further call returns `false`.
    fn next(&mut self) -> bool;

    /// The current record; `None` before the first `next` and after a
    /// `next` that returned `false`. The reference is valid until the next
    /// call to `next`.
    fn get(&self) -> Option<&InventoryObject>;

    /// The sticky error, if iteration failed
    fn err(&self) -> Option<&ExError>;
}

impl<T: InventoryIterator + ?Sized> InventoryIterator for Box<T> {
    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn get(&self) -> Option<&InventoryObject> {
        (**self).get()
    }

    fn err(&self) -> Option<&ExError> {
        (**self).err()
    }
}

/// An inventory with no records; stands in for a missing previous snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyInventoryIterator;

impl InventoryIterator for EmptyInventoryIterator {
    fn next(&mut self) -> bool {
        false
    }

    fn get(&self) -> Option<&InventoryObject> {
        None
    }

    fn err(&self) -> Option<&ExError> {
        None
    }
}

/// Iterator over records already held in memory, yielded in the given order.
#[derive(Debug)]
pub struct VecInventoryIterator {
    items: std::vec::IntoIter<InventoryObject>,
    current: Option<InventoryObject>,
}

impl VecInventoryIterator {
    pub fn new(items: Vec<InventoryObject>) -> Self {
        Self {
            items: items.into_iter(),
            current: None,
        }
    }
}

impl InventoryIterator for VecInventoryIterator {
    fn next(&mut self) -> bool {
        self.current = self.items.next();
        self.current.is_some()
    }

    fn get(&self) -> Option<&InventoryObject> {
        self.current.as_ref()
    }

    fn err(&self) -> Option<&ExError> {
        None
    }
}

/// A point-in-time listing that can be iterated and attributed.
pub trait Inventory {
    /// Start a fresh pass over the inventory
    ///
    /// # Errors
    ///
    /// Implementation specific; manifest-backed inventories never fail here
    /// because partition files are opened lazily.
    fn iterator(&self) -> Result<Box<dyn InventoryIterator + Send + '_>>;

    /// URL the inventory was loaded from (its manifest location)
    fn inventory_url(&self) -> &str;

    /// Name of the system or bucket the inventory describes
    fn source_name(&self) -> &str;

    /// When the inventory was produced, if known
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// Resolves a manifest URL into an [`Inventory`].
pub trait InventoryGenerator {
    /// # Errors
    ///
    /// `InvalidInput` for an unparsable URL, `NotFound` if the manifest is
    /// missing, `InvalidManifest`/`MissingField` if it cannot be parsed,
    /// `UnsupportedFormat` if no reader handles its file format.
    fn generate_inventory(&self, manifest_url: &str) -> Result<Box<dyn Inventory + Send + Sync>>;
}
