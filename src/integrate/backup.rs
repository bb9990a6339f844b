//! Backups of the output tree taken before staging.
//!
//! A backup lives in `<root>/.backup_<version>/` and holds copies of the
//! configured essential items. Taking a backup for a version that already has
//! one replaces it.
//!
//! ```text
//! project/
//! ├── src/
//! ├── pyproject.toml
//! └── .backup_0.80.2/
//!     ├── src/
//!     └── pyproject.toml
//! ```

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::utils::{copy_path, ensure_dir, remove_path};

pub struct BackupManager {
    root: PathBuf,
    backup_path: PathBuf,
}

impl BackupManager {
    pub fn new(root: &Path, version: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            backup_path: root.join(format!(".backup_{version}")),
        }
    }

    /// Copy each of `items` that exists under the root into the backup.
    ///
    /// Returns the items that were copied.
    pub fn create_backup(&self, items: &[String]) -> Result<Vec<String>> {
        if self.backup_path.exists() {
            debug!("Removing old backup at {}", self.backup_path.display());
            remove_path(&self.backup_path).context("Failed to remove old backup")?;
        }
        ensure_dir(&self.backup_path)?;

        info!("Creating backup at {}", self.backup_path.display());
        let mut saved = Vec::new();
        for item in items {
            let src = self.root.join(item);
            if !src.exists() {
                debug!("Nothing to back up for {}", item);
                continue;
            }
            copy_path(&src, &self.backup_path.join(item))
                .with_context(|| format!("Failed to back up {item}"))?;
            saved.push(item.clone());
        }

        info!("Backup created with {} items", saved.len());
        Ok(saved)
    }

    /// Put the backed-up copies of `items` back in place.
    ///
    /// Items absent from the backup are left as they are.
    pub fn restore_backup(&self, items: &[String]) -> Result<()> {
        if !self.backup_path.exists() {
            bail!("No backup found at {}", self.backup_path.display());
        }

        warn!("Restoring from backup at {}", self.backup_path.display());
        for item in items {
            let saved = self.backup_path.join(item);
            if !saved.exists() {
                continue;
            }
            let target = self.root.join(item);
            remove_path(&target)?;
            copy_path(&saved, &target).with_context(|| format!("Failed to restore {item}"))?;
        }

        info!("Successfully restored from backup");
        Ok(())
    }

    pub fn backup_exists(&self) -> bool {
        self.backup_path.exists()
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }
}
