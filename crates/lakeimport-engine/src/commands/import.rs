//! Import orchestration.
//!
//! Drains a diff between the branch's previous state and an incoming
//! inventory, applies each item to the catalog in key order, and commits
//! with metadata naming the inventory so the next import can diff against it.
//!
//! ## Steps
//! 1. Generate the incoming inventory from its manifest URL
//! 2. Resolve the diff base (previous inventory, or catalog listing)
//! 3. Drain the diff, counting and (unless dry-run) applying every item
//! 4. Commit with `inventory_url`, `source` and the two counts
//!
//! A failure at any step returns before the commit. Mutations already
//! applied stay staged in the catalog; they are not rolled back.
//!
//! ## Logging
//! - `log_op_start!` at entry
//! - `log_op_end!` on success, with the counts
//! - `log_op_error!` on failure

use lakeimport_core::diff::DiffSummary;
use lakeimport_core::errors::{ExError, Result};
use lakeimport_core::inventory::InventoryIterator;
use lakeimport_core::model::{create_commit_metadata, extract_inventory_url, ImportStats};
use lakeimport_core::{
    log_op_end, log_op_error, log_op_start, Catalog, CommitRecord, DiffIterator,
    InventoryGenerator,
};
use lakeimport_core_types::RunContext;

use crate::config::{DiffBase, ImportConfig};

/// Result of a completed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub stats: ImportStats,
    /// Per-kind counts, splitting additions from modifications
    pub summary: DiffSummary,
    /// The recorded commit; `None` for a dry run
    pub commit: Option<CommitRecord>,
}

/// Import the inventory at `manifest_url` into `config.branch`
///
/// # Errors
///
/// Any error from generating either inventory, from the diff (naming the
/// failing side), or from the catalog. No commit is made on error.
pub fn import_inventory(
    manifest_url: &str,
    config: &ImportConfig,
    catalog: &dyn Catalog,
    generator: &dyn InventoryGenerator,
    ctx: &RunContext,
) -> Result<ImportOutcome> {
    log_op_start!(
        "import_inventory",
        inventory_url = manifest_url,
        branch = %config.branch,
        dry_run = config.dry_run,
        run_id = %ctx.run_id
    );
    let start = std::time::Instant::now();

    let outcome = import_inventory_impl(manifest_url, config, catalog, generator).map_err(|e| {
        let e = with_context(e, ctx);
        log_op_error!(
            "import_inventory",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            inventory_url = manifest_url,
            run_id = %ctx.run_id
        );
        e
    })?;

    log_op_end!(
        "import_inventory",
        duration_ms = start.elapsed().as_millis() as u64,
        inventory_url = manifest_url,
        added_or_changed = outcome.stats.added_or_changed,
        deleted = outcome.stats.deleted,
        dry_run = config.dry_run,
        run_id = %ctx.run_id
    );

    Ok(outcome)
}

fn import_inventory_impl(
    manifest_url: &str,
    config: &ImportConfig,
    catalog: &dyn Catalog,
    generator: &dyn InventoryGenerator,
) -> Result<ImportOutcome> {
    let branch = config.branch.as_str();
    let current = generator.generate_inventory(manifest_url)?;

    let last_commit = catalog.last_commit(branch)?;
    let previous_url = last_commit
        .as_ref()
        .and_then(|c| extract_inventory_url(&c.metadata))
        .map(str::to_string);

    // A catalog-based diff has no previous inventory to report.
    let diffed_against = match config.diff_base {
        DiffBase::PreviousInventory => previous_url.as_ref(),
        DiffBase::Catalog => None,
    };
    let mut stats = ImportStats {
        dry_run: config.dry_run,
        previous_import_date: diffed_against
            .and(last_commit.as_ref())
            .map(|c| c.created_at),
        previous_inventory_url: diffed_against.cloned(),
        ..ImportStats::default()
    };

    // Owns the previous inventory for as long as its iterator is read.
    let previous = match (config.diff_base, &previous_url) {
        (DiffBase::PreviousInventory, Some(url)) => Some(generator.generate_inventory(url)?),
        _ => None,
    };
    let left: Option<Box<dyn InventoryIterator + '_>> = match config.diff_base {
        DiffBase::Catalog => Some(catalog.list_objects(branch, config.read_batch_size)),
        DiffBase::PreviousInventory => match &previous {
            Some(inventory) => Some(inventory.iterator()?),
            None => None,
        },
    };
    tracing::debug!(
        branch,
        diff_base = ?config.diff_base,
        previous_inventory_url = previous_url.as_deref().unwrap_or(""),
        first_import = left.is_none(),
        "resolved diff base"
    );

    let mut diff = DiffIterator::new(left, current.iterator()?);
    while diff.next() {
        let Some(item) = diff.take() else {
            continue;
        };
        stats.record(&item);
        if !config.dry_run {
            catalog.apply(branch, &item)?;
        }
    }
    if let Some(err) = diff.err() {
        return Err(err.clone());
    }
    let summary = diff.summary();

    if config.dry_run {
        return Ok(ImportOutcome {
            stats,
            summary,
            commit: None,
        });
    }

    let metadata = create_commit_metadata(current.as_ref(), &stats);
    let commit = catalog.commit(branch, &config.commit_message, &metadata)?;

    Ok(ImportOutcome {
        stats,
        summary,
        commit: Some(commit),
    })
}

fn with_context(err: ExError, ctx: &RunContext) -> ExError {
    let err = if err.run_id().is_none() {
        err.with_run_id(ctx.run_id.clone())
    } else {
        err
    };
    match (&ctx.trace_id, err.trace_id()) {
        (Some(trace_id), None) => err.with_trace_id(trace_id.clone()),
        _ => err,
    }
}
