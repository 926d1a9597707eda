//! Command orchestration layer.
//!
//! Coordinates inventory generation, the diff engine and the catalog.

pub mod diff_report;
pub mod import;

pub use diff_report::compute_inventory_diff;
pub use import::{import_inventory, ImportOutcome};
