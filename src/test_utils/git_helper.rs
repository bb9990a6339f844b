//! Git test helper utilities
//!
//! Thin synchronous wrapper for setting up scratch repositories in tests.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs git inside one test repository.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Initialize a repository whose first branch is `main`.
    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init", "--quiet"], "Failed to initialize git repository")?;
        self.run_git_command(&["checkout", "-q", "-B", "main"], "Failed to name initial branch")?;
        Ok(())
    }

    pub fn init_bare(&self) -> Result<()> {
        self.run_git_command(&["init", "--bare", "--quiet"], "Failed to initialize bare repository")?;
        Ok(())
    }

    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@packn-sync.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(&["config", "user.name", "Test User"], "Failed to configure git user name")?;
        Ok(())
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run_git_command(&["remote", "add", name, url], "Failed to add remote")?;
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "-q", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    pub fn get_current_branch(&self) -> Result<String> {
        let output = self.run_git_command(&["branch", "--show-current"], "Failed to get branch")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn last_commit_message(&self) -> Result<String> {
        let output = self.run_git_command(&["log", "-1", "--format=%s"], "Failed to read git log")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn commit_count(&self) -> Result<usize> {
        let output =
            self.run_git_command(&["rev-list", "--count", "HEAD"], "Failed to count commits")?;
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .context("Failed to parse commit count")
    }

    pub fn config_value(&self, key: &str) -> Result<String> {
        let output = self.run_git_command(&["config", "--get", key], "Failed to read git config")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn status_porcelain(&self) -> Result<String> {
        let output = self.run_git_command(&["status", "--porcelain"], "Failed to get git status")?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
