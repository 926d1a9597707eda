//! Import configuration.
//!
//! Loaded from TOML, then overridden by `LAKEIMPORT_*` environment variables:
//!
//! ```toml
//! read_batch_size = 50000
//! dry_run = false
//! verify_key_order = true
//! diff_base = "previous_inventory"
//! branch = "main"
//! commit_message = "Import from inventory"
//! ```

use std::path::Path;
use std::sync::Arc;

use lakeimport_core::errors::{ExError, ExErrorKind, Result};
use lakeimport_store::{FsInventoryGenerator, FsObjectStore};
use serde::{Deserialize, Serialize};

pub const ENV_READ_BATCH_SIZE: &str = "LAKEIMPORT_READ_BATCH_SIZE";
pub const ENV_DRY_RUN: &str = "LAKEIMPORT_DRY_RUN";
pub const ENV_VERIFY_KEY_ORDER: &str = "LAKEIMPORT_VERIFY_KEY_ORDER";
pub const ENV_BRANCH: &str = "LAKEIMPORT_BRANCH";

/// What the incoming inventory is diffed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffBase {
    /// The inventory named by the branch's last import commit
    #[default]
    PreviousInventory,
    /// The branch's current catalog listing
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Rows per batch read; zero or negative selects the default
    pub read_batch_size: i64,
    /// Compute the diff and statistics without touching the catalog
    pub dry_run: bool,
    pub verify_key_order: bool,
    pub diff_base: DiffBase,
    pub branch: String,
    pub commit_message: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            read_batch_size: 0,
            dry_run: false,
            verify_key_order: true,
            diff_base: DiffBase::default(),
            branch: "main".to_string(),
            commit_message: "Import from inventory".to_string(),
        }
    }
}

impl ImportConfig {
    /// Parse a TOML document; absent keys keep their defaults
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the document does not parse or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_config")
                .with_message(format!("invalid import config: {}", e))
        })
    }

    /// Read a TOML file and apply environment overrides
    ///
    /// # Errors
    ///
    /// `Io`/`NotFound` if the file cannot be read, `InvalidInput` if it or an
    /// override does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            let kind = match e.kind() {
                std::io::ErrorKind::NotFound => ExErrorKind::NotFound,
                _ => ExErrorKind::Io,
            };
            ExError::new(kind)
                .with_op("load_config")
                .with_file(path.display().to_string())
                .with_message(e.to_string())
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `LAKEIMPORT_*` overrides from the process environment
    ///
    /// # Errors
    ///
    /// `InvalidInput` naming the variable whose value does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup; blank values are ignored
    ///
    /// # Errors
    ///
    /// `InvalidInput` naming the variable whose value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(ENV_READ_BATCH_SIZE) {
            self.read_batch_size = v.parse::<i64>().map_err(|e| {
                invalid_env(ENV_READ_BATCH_SIZE, &format!("must be an integer: {}", e))
            })?;
        }
        if let Some(v) = get(ENV_DRY_RUN) {
            self.dry_run = parse_bool(ENV_DRY_RUN, &v)?;
        }
        if let Some(v) = get(ENV_VERIFY_KEY_ORDER) {
            self.verify_key_order = parse_bool(ENV_VERIFY_KEY_ORDER, &v)?;
        }
        if let Some(v) = get(ENV_BRANCH) {
            self.branch = v;
        }
        Ok(())
    }

    /// Inventory generator reading from `store` with this config's settings
    pub fn inventory_generator(&self, store: Arc<FsObjectStore>) -> FsInventoryGenerator {
        FsInventoryGenerator::new(store)
            .with_read_batch_size(self.read_batch_size)
            .with_key_order_check(self.verify_key_order)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(invalid_env(name, "must be a boolean (true/false/1/0)")),
    }
}

fn invalid_env(name: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("load_config")
        .with_message(format!("{} {}", name, reason))
}
