//! lakeimport engine - import orchestration
//!
//! Wires inventory generation, the diff engine and the SQLite catalog into
//! the import commands:
//! - [`commands::import_inventory`] applies an inventory to a catalog branch
//! - [`commands::compute_inventory_diff`] reports a diff without applying it
//! - [`config::ImportConfig`] carries the knobs, from TOML and environment

pub mod commands;
pub mod config;

pub use commands::{compute_inventory_diff, import_inventory, ImportOutcome};
pub use config::{DiffBase, ImportConfig};
