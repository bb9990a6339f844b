//! `MANIFEST.in`, created from a template when absent.
//!
//! An existing packaging manifest is never modified.

use std::path::Path;
use tracing::debug;

use crate::constants::PACKAGING_MANIFEST_TEMPLATE;
use crate::utils::atomic_write;

#[must_use]
pub fn render_packaging_manifest(package: &str) -> String {
    PACKAGING_MANIFEST_TEMPLATE.replace("{package}", package)
}

/// Write the template to `path` unless a file exists there.
///
/// Returns `true` if the file was created.
pub fn ensure_packaging_manifest(path: &Path, package: &str) -> anyhow::Result<bool> {
    if path.exists() {
        debug!("{} already exists, leaving it untouched", path.display());
        return Ok(false);
    }
    atomic_write(path, render_packaging_manifest(package).as_bytes())?;
    Ok(true)
}
