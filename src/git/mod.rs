//! Git operations for publishing an update.
//!
//! All operations shell out to the system `git` through
//! [`command_builder::GitCommand`], so the user's credential helpers and
//! configuration apply. [`ensure_git_available`] is checked before any
//! repository is touched.

pub mod command_builder;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::GIT_PUSH_TIMEOUT;
use crate::core::SyncError;
use command_builder::GitCommand;

/// Fail with [`SyncError::GitNotFound`] if no `git` is on `PATH`.
pub fn ensure_git_available() -> Result<(), SyncError> {
    which::which("git").map(|_| ()).map_err(|_| SyncError::GitNotFound)
}

/// Whether [`GitRepo::switch_to_branch`] created the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSwitch {
    Created,
    Existing,
}

/// A working tree at a known path.
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, command: GitCommand) -> GitCommand {
        command.current_dir(&self.path)
    }

    /// Set the commit identity for this repository only.
    pub async fn configure_user(&self, name: &str, email: &str) -> Result<()> {
        self.git(GitCommand::config("user.name", name)).execute_success().await?;
        self.git(GitCommand::config("user.email", email)).execute_success().await?;
        debug!("Configured git identity {} <{}>", name, email);
        Ok(())
    }

    /// Create and switch to `branch`, or switch to it if it already exists.
    pub async fn switch_to_branch(&self, branch: &str) -> Result<BranchSwitch> {
        match self.git(GitCommand::create_branch(branch)).execute_success().await {
            Ok(()) => {
                info!("Created branch {}", branch);
                Ok(BranchSwitch::Created)
            }
            Err(create_err) => {
                debug!("Could not create {}: {:#}", branch, create_err);
                self.git(GitCommand::checkout(branch)).execute_success().await?;
                info!("Switched to existing branch {}", branch);
                Ok(BranchSwitch::Existing)
            }
        }
    }

    pub async fn current_branch(&self) -> Result<String> {
        self.git(GitCommand::current_branch()).execute_stdout().await
    }

    /// Stage those of `paths` that exist in the working tree.
    ///
    /// Returns the paths passed to `git add`.
    pub async fn add_existing(&self, paths: &[String]) -> Result<Vec<String>> {
        let existing: Vec<String> =
            paths.iter().filter(|p| self.path.join(p.as_str()).exists()).cloned().collect();
        if existing.is_empty() {
            debug!("Nothing to stage");
            return Ok(existing);
        }
        self.git(GitCommand::add(existing.iter().cloned())).execute_success().await?;
        Ok(existing)
    }

    pub async fn status_porcelain(&self) -> Result<String> {
        Ok(self.git(GitCommand::status_porcelain()).execute().await?.stdout)
    }

    /// `true` if `git status --porcelain` reports anything.
    pub async fn has_changes(&self) -> Result<bool> {
        Ok(!self.status_porcelain().await?.trim().is_empty())
    }

    pub async fn commit(&self, message: &str) -> Result<()> {
        self.git(GitCommand::commit(message)).execute_success().await?;
        info!("Committed: {}", message);
        Ok(())
    }

    /// Push `branch` to `remote`, or the current branch when `None`.
    pub async fn push(&self, remote: &str, branch: Option<&str>) -> Result<()> {
        let refspec = branch.unwrap_or("HEAD");
        self.git(GitCommand::push(remote, refspec))
            .with_timeout(GIT_PUSH_TIMEOUT)
            .with_context("push")
            .execute_success()
            .await?;
        info!("Pushed {} to {}", refspec, remote);
        Ok(())
    }
}
