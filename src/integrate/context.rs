//! Per-run state shared by the integration steps.

use std::path::Path;
use tempfile::TempDir;

use crate::config::SyncConfig;
use crate::core::SyncError;
use crate::version::ReleaseVersion;

/// Everything one integration run needs, passed explicitly to each step.
///
/// Owns the scratch directory for downloads and extraction. Dropping the
/// context removes it, on success and on every error path alike.
pub struct IntegrationContext {
    pub version: ReleaseVersion,
    pub config: SyncConfig,
    workspace: TempDir,
}

impl IntegrationContext {
    pub fn new(version: ReleaseVersion, config: SyncConfig) -> Result<Self, SyncError> {
        let workspace = tempfile::Builder::new().prefix("packn-sync-").tempdir()?;
        Ok(Self {
            version,
            config,
            workspace,
        })
    }

    /// Scratch directory for this run.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Where archives are extracted, inside the workspace.
    #[must_use]
    pub fn extract_dir(&self) -> std::path::PathBuf {
        self.workspace.path().join("extracted")
    }

    #[must_use]
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let ctx = IntegrationContext::new("0.80.2".parse().unwrap(), SyncConfig::default()).unwrap();
        let workspace = ctx.workspace().to_path_buf();
        assert!(workspace.is_dir());
        assert!(ctx.extract_dir().starts_with(&workspace));
        assert_eq!(ctx.version_string(), "0.80.2");

        drop(ctx);
        assert!(!workspace.exists());
    }
}
