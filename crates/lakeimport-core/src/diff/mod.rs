//! Inventory diff engine.
//!
//! Merge-joins two key-ordered inventories in one forward pass and emits the
//! additions, modifications and deletions that turn the left (previous)
//! inventory into the right (current) one.
//!
//! ```ignore
//! use lakeimport_core::diff::DiffIterator;
//!
//! let mut diff = DiffIterator::new(Some(previous.iterator()?), current.iterator()?);
//! while diff.next() {
//!     let item = diff.get().unwrap();
//!     // apply item
//! }
//! if let Some(err) = diff.err() { /* abort */ }
//! ```

pub mod engine;

pub use engine::{DiffIterator, DiffSummary};
