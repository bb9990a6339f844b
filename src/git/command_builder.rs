//! Builder for git invocations.
//!
//! Every command runs as `git -C <dir> ...` under a timeout, with output
//! captured. A non-zero exit or a timeout becomes
//! [`SyncError::GitCommandError`] naming the git subcommand.
//!
//! # Examples
//!
//! ```rust,no_run
//! use packn_sync::git::command_builder::GitCommand;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let status = GitCommand::status_porcelain()
//!     .current_dir("/path/to/repo")
//!     .execute_stdout()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::GIT_LOCAL_TIMEOUT;
use crate::core::SyncError;

const GIT: &str = if cfg!(windows) { "git.exe" } else { "git" };

pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Duration,
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never wait on a credential prompt
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: GIT_LOCAL_TIMEOUT,
            context: None,
        }
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub const fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    pub async fn execute(self) -> Result<GitCommandOutput> {
        let mut full_args = Vec::new();
        if let Some(dir) = &self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        match &self.context {
            Some(ctx) => {
                tracing::debug!(target: "git", "({}) Executing command: {} {}", ctx, GIT, full_args.join(" "));
            }
            None => tracing::debug!(target: "git", "Executing command: {} {}", GIT, full_args.join(" ")),
        }

        let mut cmd = Command::new(GIT);
        cmd.args(&full_args).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let Ok(result) = timeout(self.timeout_duration, cmd.output()).await else {
            tracing::warn!(
                target: "git",
                "Command timed out after {} seconds: git {}",
                self.timeout_duration.as_secs(),
                full_args.join(" ")
            );
            return Err(SyncError::GitCommandError {
                operation: self.operation(),
                stderr: format!(
                    "Git command timed out after {} seconds. Try running it manually: git {}",
                    self.timeout_duration.as_secs(),
                    full_args.join(" ")
                ),
            }
            .into());
        };
        let output = result.context(format!("Failed to execute git {}", full_args.join(" ")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(target: "git", "Command failed with exit code: {:?}", output.status.code());
            return Err(SyncError::GitCommandError {
                operation: self.operation(),
                stderr: if stderr.trim().is_empty() { stdout } else { stderr },
            }
            .into());
        }

        if !stdout.trim().is_empty() {
            tracing::debug!(target: "git", "{}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(target: "git", "{}", stderr.trim());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

// Convenience builders for the operations auto-update performs

impl GitCommand {
    pub fn config(key: &str, value: &str) -> Self {
        Self::new().args(["config", key, value])
    }

    pub fn create_branch(branch_name: &str) -> Self {
        Self::new().args(["checkout", "-b", branch_name])
    }

    pub fn checkout(ref_name: &str) -> Self {
        Self::new().args(["checkout", ref_name])
    }

    pub fn current_branch() -> Self {
        Self::new().args(["branch", "--show-current"])
    }

    pub fn add<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().args(["add", "--"]).args(paths)
    }

    pub fn status_porcelain() -> Self {
        Self::new().args(["status", "--porcelain"])
    }

    pub fn commit(message: &str) -> Self {
        Self::new().args(["commit", "-m", message])
    }

    pub fn push(remote: &str, refspec: &str) -> Self {
        Self::new().args(["push", remote, refspec])
    }
}
