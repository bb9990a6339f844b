//! The `packn-sync.toml` configuration file.
//!
//! Every field has a default matching the flet-cli fork, so the file is
//! optional. A fork of another tool only needs to override the sections that
//! differ:
//!
//! ```toml
//! [upstream]
//! owner = "flet-dev"
//! repo = "flet"
//! asset_prefix = "flet_cli"
//!
//! [command]
//! package = "flet_cli"
//! name = "packn"
//! sibling = "pack"
//!
//! [project]
//! maintainer = "LingyeSoul"
//! extras_requirements = ["nuitka"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants::*;
use crate::core::SyncError;

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub upstream: UpstreamConfig,
    pub command: CommandConfig,
    pub project: ProjectConfig,
    pub staging: StagingConfig,
    pub git: GitConfig,
}

/// Where upstream releases come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    pub owner: String,
    pub repo: String,
    /// REST API root, without trailing slash.
    pub api_base: String,
    /// Web root used for release and archive downloads.
    pub web_base: String,
    /// Release assets are named `{asset_prefix}-{version}.tar.gz`.
    pub asset_prefix: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_UPSTREAM_OWNER.to_string(),
            repo: DEFAULT_UPSTREAM_REPO.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            timeout_secs: HTTP_TIMEOUT.as_secs(),
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The custom command and the registry it is added to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    /// Python package holding `cli.py` and `commands/`.
    pub package: String,
    /// The fork's command.
    pub name: String,
    /// Upstream command whose import and registration lines serve as anchors.
    pub sibling: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            name: DEFAULT_COMMAND.to_string(),
            sibling: DEFAULT_SIBLING_COMMAND.to_string(),
        }
    }
}

impl CommandConfig {
    /// `src/<package>/commands/<name>.py`, relative to a project root.
    #[must_use]
    pub fn module_path(&self) -> PathBuf {
        Path::new("src").join(&self.package).join("commands").join(format!("{}.py", self.name))
    }

    /// `src/<package>/cli.py`, relative to a project root.
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        Path::new("src").join(&self.package).join("cli.py")
    }

    /// Distribution name used in commit and pull request titles (`flet-cli`).
    #[must_use]
    pub fn distribution_name(&self) -> String {
        self.package.replace('_', "-")
    }

    #[must_use]
    pub fn import_line(&self) -> String {
        format!("import {}.commands.{}", self.package, self.name)
    }

    #[must_use]
    pub fn sibling_import_line(&self) -> String {
        format!("import {}.commands.{}", self.package, self.sibling)
    }

    #[must_use]
    pub fn registration_line(&self) -> String {
        registration(&self.package, &self.name)
    }

    #[must_use]
    pub fn sibling_registration_line(&self) -> String {
        registration(&self.package, &self.sibling)
    }
}

fn registration(package: &str, command: &str) -> String {
    format!("{package}.commands.{command}.Command.register_to(sp, \"{command}\")")
}

/// Metadata the fork writes into the project manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub description: String,
    /// Only descriptions starting with this text are rewritten.
    pub description_prefix: String,
    pub author: String,
    pub author_email: String,
    pub maintainer: String,
    pub maintainer_email: String,
    pub extras_name: String,
    pub extras_requirements: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            description_prefix: DEFAULT_DESCRIPTION_PREFIX.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
            maintainer: DEFAULT_MAINTAINER.to_string(),
            maintainer_email: DEFAULT_MAINTAINER_EMAIL.to_string(),
            extras_name: DEFAULT_EXTRAS_NAME.to_string(),
            extras_requirements: vec![DEFAULT_EXTRAS_REQUIREMENT.to_string()],
        }
    }
}

/// Which top-level items are taken from the upstream tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StagingConfig {
    /// Items `integrate` copies from upstream into the output directory.
    pub integrate_items: Vec<String>,
    /// Items `auto-update` copies; the fork keeps its own manifest and README.
    pub update_items: Vec<String>,
    /// Items saved to `.backup_<version>` before staging.
    pub backup_items: Vec<String>,
    /// Paths staged with `git add` by `auto-update`.
    pub commit_paths: Vec<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        let full = || {
            ["src", "pyproject.toml", "README.md", "LICENSE", "MANIFEST.in"]
                .map(String::from)
                .to_vec()
        };
        Self {
            integrate_items: full(),
            update_items: vec!["src".to_string(), "LICENSE".to_string()],
            backup_items: full(),
            commit_paths: full(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    pub remote: String,
    /// Pull requests target this branch.
    pub base_branch: String,
    /// Update branches are named `{branch_prefix}-{version}`.
    pub branch_prefix: String,
    pub bot_name: String,
    pub bot_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            bot_name: BOT_NAME.to_string(),
            bot_email: BOT_EMAIL.to_string(),
        }
    }
}

impl GitConfig {
    #[must_use]
    pub fn update_branch(&self, version: &str) -> String {
        format!("{}-{}", self.branch_prefix, version)
    }
}

impl SyncConfig {
    /// Load configuration for a run.
    ///
    /// An explicit `path` must exist. Without one, `packn-sync.toml` in
    /// `base_dir` is used if present, otherwise defaults.
    pub async fn load_with_optional(path: Option<&Path>, base_dir: &Path) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => {
                let default_path = base_dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load_from(&default_path).await
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Ok(Self::default())
                }
            }
        }
    }

    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = Self::parse(&content, path)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text; `origin` only labels errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, SyncError> {
        toml::from_str(content).map_err(|e| SyncError::ConfigParse {
            file: origin.display().to_string(),
            reason: e.to_string(),
        })
    }
}
