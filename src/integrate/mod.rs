//! Assembling an upstream release with the fork's custom command.
//!
//! The steps, in the order the commands run them:
//!
//! 1. [`IntegrationContext`] owns the scratch directory for the run
//! 2. [`backup::BackupManager`] copies the output tree's essential items aside
//! 3. [`staging`] places the custom module and copies upstream items over
//! 4. [`patch_tree`] applies every fork patch to a tree
//! 5. [`verify::verify_integration`] checks the result without modifying it

pub mod backup;
pub mod context;
pub mod staging;
pub mod verify;

use anyhow::Result;
use std::path::Path;

use crate::config::SyncConfig;
use crate::constants::{PACKAGING_MANIFEST, PROJECT_MANIFEST};
use crate::patch::{
    ManifestUpdate, PatchOutcome, ensure_packaging_manifest, patch_registry,
    update_project_manifest,
};

pub use backup::BackupManager;
pub use context::IntegrationContext;
pub use staging::{
    StageReport, place_custom_module, read_custom_module, stage_items, stage_preserving_module,
};
pub use verify::{Check, VerificationReport, verify_integration};

/// What [`patch_tree`] did to each file.
#[derive(Debug, Clone, Default)]
pub struct TreePatchSummary {
    /// `None` when the tree has no registry file.
    pub registry: Option<PatchOutcome>,
    /// `None` when the tree has no project manifest.
    pub manifest: Option<ManifestUpdate>,
    pub packaging_manifest_created: bool,
}

impl TreePatchSummary {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.registry.as_ref().is_some_and(PatchOutcome::changed)
            || self.manifest.as_ref().is_some_and(ManifestUpdate::changed)
            || self.packaging_manifest_created
    }

    /// Names of rules skipped for a missing anchor, across all files.
    #[must_use]
    pub fn missing_anchors(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if let Some(registry) = &self.registry {
            missing.extend(registry.missing_anchor.iter().cloned());
        }
        if let Some(manifest) = &self.manifest {
            missing.extend(manifest.rules.missing_anchor.iter().cloned());
        }
        missing
    }
}

/// Apply the registry, project manifest and packaging manifest patches to
/// the tree at `root`.
pub fn patch_tree(root: &Path, version: &str, config: &SyncConfig) -> Result<TreePatchSummary> {
    let registry = patch_registry(root, &config.command)?;

    let manifest_path = root.join(PROJECT_MANIFEST);
    let manifest = if manifest_path.exists() {
        Some(update_project_manifest(&manifest_path, version, &config.project)?)
    } else {
        tracing::warn!("Project manifest not found at {}", manifest_path.display());
        None
    };

    let packaging_manifest_created =
        ensure_packaging_manifest(&root.join(PACKAGING_MANIFEST), &config.command.package)?;

    Ok(TreePatchSummary {
        registry,
        manifest,
        packaging_manifest_created,
    })
}
