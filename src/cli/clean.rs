//! Removal of generated output for the `clean` command.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::catalog::{CATALOG_FILE, INDEX_FILE};
use crate::config::PipelineConfig;
use crate::log;

/// Delete the icon output root and the catalog pair.
///
/// Returns the number of removed paths. Missing paths are not an error.
pub fn clean_output(config: &PipelineConfig) -> Result<usize> {
    let mut removed = 0;

    let output = &config.paths.output;
    if output.is_dir() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to remove {}", output.display()))?;
        log!("clean"; "removed {}", output.display());
        removed += 1;
    }

    for name in [CATALOG_FILE, INDEX_FILE] {
        if remove_file(&config.paths.data.join(name))? {
            removed += 1;
        }
    }

    if removed == 0 {
        log!("clean"; "nothing to clean");
    }
    Ok(removed)
}

fn remove_file(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    log!("clean"; "removed {}", path.display());
    Ok(true)
}
