//! Shared helpers for the packn-sync integration tests
//!
//! A [`TestProject`] is a scratch directory holding a fork checkout, an
//! optional bare remote, and any archives or config files a test needs.

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use packn_sync::config::SyncConfig;
use packn_sync::integrate::{patch_tree, place_custom_module};
use packn_sync::test_utils::{CUSTOM_MODULE, TestGit, UpstreamTreeFixture};

pub const MODULE_PATH: &str = "src/flet_cli/commands/packn.py";
pub const REGISTRY_PATH: &str = "src/flet_cli/cli.py";

pub struct TestProject {
    _temp_dir: TempDir,
    root: PathBuf,
    fork_dir: PathBuf,
}

impl TestProject {
    /// An empty fork directory inside a fresh scratch directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let fork_dir = root.join("fork");
        fs::create_dir_all(&fork_dir)?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            fork_dir,
        })
    }

    /// A fork that only carries the custom command module.
    pub fn with_custom_module() -> Result<Self> {
        let project = Self::new()?;
        project.write_fork_file(MODULE_PATH, CUSTOM_MODULE)?;
        Ok(project)
    }

    /// A fork already integrated with `version`, committed on `main`.
    pub fn integrated_fork(version: &str) -> Result<Self> {
        let project = Self::new()?;
        let staging = project.root.join("staging");
        fs::create_dir_all(&staging)?;
        let tree = UpstreamTreeFixture::new(version).write_to(&staging)?;
        fs::remove_dir_all(&project.fork_dir)?;
        fs::rename(&tree, &project.fork_dir)?;

        let config = SyncConfig::default();
        place_custom_module(&project.fork_dir, &config.command, CUSTOM_MODULE.as_bytes())?;
        patch_tree(&project.fork_dir, version, &config)?;

        let git = project.git();
        git.init()?;
        git.config_user()?;
        git.add_all()?;
        git.commit("Initial fork")?;
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fork_path(&self) -> &Path {
        &self.fork_dir
    }

    pub fn git(&self) -> TestGit {
        TestGit::new(&self.fork_dir)
    }

    pub fn write_fork_file(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.fork_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn read_fork_file(&self, relative: &str) -> String {
        fs::read_to_string(self.fork_dir.join(relative))
            .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
    }

    /// Write an upstream release archive for `version` and return its path.
    pub fn upstream_archive(&self, version: &str) -> Result<PathBuf> {
        let path = self.root.join(format!("flet_cli-{version}.tar.gz"));
        UpstreamTreeFixture::new(version).write_archive(&path)?;
        Ok(path)
    }

    /// Create a bare repository and add it as `origin` of the fork.
    pub fn add_bare_remote(&self) -> Result<TestGit> {
        let remote_dir = self.root.join("remote.git");
        fs::create_dir_all(&remote_dir)?;
        let remote = TestGit::new(&remote_dir);
        remote.init_bare()?;
        self.git().remote_add("origin", &remote_dir.display().to_string())?;
        Ok(remote)
    }

    /// Write a config file outside the fork pointing the upstream at `base_url`.
    pub fn write_config(&self, base_url: &str) -> Result<PathBuf> {
        let path = self.root.join("packn-sync.toml");
        fs::write(
            &path,
            format!("[upstream]\napi_base = \"{base_url}\"\nweb_base = \"{base_url}\"\ntimeout_secs = 10\n"),
        )?;
        Ok(path)
    }

    /// The binary, run from the fork directory with GitHub variables cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("packn-sync").expect("packn-sync binary");
        cmd.current_dir(&self.fork_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("GITHUB_TOKEN")
            .env_remove("GITHUB_REPOSITORY")
            .env_remove("GITHUB_REF");
        // The mock server listens on localhost
        for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
            cmd.env_remove(proxy);
        }
        cmd
    }
}

/// Snapshot of the files integration touches, for idempotence checks.
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    [MODULE_PATH, REGISTRY_PATH, "pyproject.toml", "MANIFEST.in"]
        .iter()
        .map(|f| (f.to_string(), fs::read(root.join(f)).unwrap_or_default()))
        .collect()
}
