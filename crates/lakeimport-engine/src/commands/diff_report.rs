//! Read-only inventory diff report.
//!
//! Materialises the full diff between two inventories without touching a
//! catalog. Intended for inventories small enough to hold in memory; imports
//! stream through [`super::import::import_inventory`] instead.

use lakeimport_core::errors::Result;
use lakeimport_core::{
    log_op_end, log_op_error, log_op_start, DiffIterator, Inventory, InventoryDiff,
    InventoryIterator,
};

/// Diff `previous` against `current`
///
/// A missing `previous` makes every current record an addition.
///
/// # Errors
///
/// `InventorySourceFailed` naming the side whose iteration failed.
pub fn compute_inventory_diff(
    previous: Option<&dyn Inventory>,
    current: &dyn Inventory,
    dry_run: bool,
) -> Result<InventoryDiff> {
    log_op_start!(
        "inventory_diff",
        previous_inventory_url = previous.map(|p| p.inventory_url()).unwrap_or(""),
        inventory_url = current.inventory_url()
    );
    let start = std::time::Instant::now();

    let diff = compute_inventory_diff_impl(previous, current, dry_run).map_err(|e| {
        log_op_error!(
            "inventory_diff",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "inventory_diff",
        duration_ms = start.elapsed().as_millis() as u64,
        added_or_changed = diff.added_or_changed.len() as u64,
        deleted = diff.deleted.len() as u64
    );
    Ok(diff)
}

fn compute_inventory_diff_impl(
    previous: Option<&dyn Inventory>,
    current: &dyn Inventory,
    dry_run: bool,
) -> Result<InventoryDiff> {
    let left: Option<Box<dyn InventoryIterator + '_>> = match previous {
        Some(p) => Some(p.iterator()?),
        None => None,
    };
    let mut report = InventoryDiff {
        dry_run,
        previous_inventory_url: previous.map(|p| p.inventory_url().to_string()),
        previous_import_date: previous.and_then(|p| p.created_at()),
        ..InventoryDiff::default()
    };

    let mut diff = DiffIterator::new(left, current.iterator()?);
    while diff.next() {
        if let Some(item) = diff.take() {
            report.push(item);
        }
    }
    match diff.err() {
        Some(err) => Err(err.clone()),
        None => Ok(report),
    }
}
