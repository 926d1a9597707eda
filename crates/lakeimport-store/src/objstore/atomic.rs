//! Atomic write primitives
//!
//! Uses temp→rename so readers never see a partially written object

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically write bytes to a file, creating parent directories
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_object_dir", e))?;
    }

    // Keep the full file name so "a.json" and "a.jsonl" never share a temp file.
    let mut temp_name = target_path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    fs::write(temp_path, content).map_err(|e| io_error("write_object_temp", e))?;
    fs::rename(temp_path, target_path).map_err(|e| io_error("rename_object_temp", e))?;

    Ok(())
}
