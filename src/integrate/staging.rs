//! Moving files between the extracted upstream tree and the output tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::CommandConfig;
use crate::core::SyncError;
use crate::utils::{copy_path, ensure_parent_dir, remove_path};

/// Result of [`stage_items`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub copied: Vec<String>,
    /// Items absent from the source tree.
    pub skipped: Vec<String>,
    /// The custom module had to be written back after staging.
    pub module_restored: bool,
}

/// Read the custom command module from `source_root`.
pub fn read_custom_module(source_root: &Path, command: &CommandConfig) -> Result<Vec<u8>> {
    let path = source_root.join(command.module_path());
    if !path.is_file() {
        return Err(SyncError::ModuleNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write the custom module into the tree at `root`.
pub fn place_custom_module(root: &Path, command: &CommandConfig, module: &[u8]) -> Result<PathBuf> {
    let target = root.join(command.module_path());
    ensure_parent_dir(&target)?;
    fs::write(&target, module).with_context(|| format!("Failed to write {}", target.display()))?;
    debug!("Placed custom module at {}", target.display());
    Ok(target)
}

/// Replace each of `items` under `to` with its copy from `from`.
///
/// Items missing from `from` are skipped and whatever `to` has is kept.
pub fn stage_items(from: &Path, to: &Path, items: &[String]) -> Result<StageReport> {
    let mut report = StageReport::default();

    for item in items {
        let src = from.join(item);
        let dst = to.join(item);

        if !src.exists() {
            warn!("Skipping {} (not found in {})", item, from.display());
            report.skipped.push(item.clone());
            continue;
        }

        remove_path(&dst)?;
        copy_path(&src, &dst).with_context(|| format!("Failed to copy {item}"))?;
        debug!("Copied {}", item);
        report.copied.push(item.clone());
    }

    info!("Staged {} items into {}", report.copied.len(), to.display());
    Ok(report)
}

/// [`stage_items`], then write `module` back if staging removed it.
///
/// Staging replaces whole directories, so a custom module that only exists in
/// the output tree would otherwise be lost.
pub fn stage_preserving_module(
    from: &Path,
    to: &Path,
    items: &[String],
    command: &CommandConfig,
    module: Option<&[u8]>,
) -> Result<StageReport> {
    let module = match module {
        Some(bytes) => Some(bytes.to_vec()),
        None => {
            let existing = to.join(command.module_path());
            if existing.is_file() {
                Some(fs::read(&existing)?)
            } else {
                None
            }
        }
    };

    let mut report = stage_items(from, to, items)?;

    if let Some(bytes) = module
        && !to.join(command.module_path()).exists()
    {
        info!("Restoring custom module {}", command.module_path().display());
        place_custom_module(to, command, &bytes)?;
        report.module_restored = true;
    }

    Ok(report)
}
