//! Command-line interface for packn-sync.
//!
//! # Commands
//!
//! - `integrate <VERSION>` - merge a specific upstream release into a directory
//! - `auto-update` - fetch the latest release, integrate it and publish the result
//! - `verify` - check an already integrated tree
//!
//! # Global Options
//!
//! - `--verbose` - debug logging on stderr
//! - `--quiet` - only failures are printed
//! - `--config <path>` - configuration file instead of `./packn-sync.toml`
//!
//! ```bash
//! packn-sync integrate 0.80.2 --output ../flet-cli-fork
//! packn-sync auto-update --create-pr
//! packn-sync --verbose verify --repo-dir .
//! ```

mod auto_update;
mod integrate;
pub mod output;
mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::SyncConfig;
pub use output::Reporter;

/// Options shared by every command, resolved from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub verbose: bool,
    pub quiet: bool,
    /// Explicit configuration file; must exist when set.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn reporter(&self) -> Reporter {
        Reporter::new(self.quiet)
    }

    /// Load the configuration, looking for `packn-sync.toml` in `base_dir`
    /// when no explicit path was given.
    pub async fn load_sync_config(&self, base_dir: &Path) -> Result<SyncConfig> {
        SyncConfig::load_with_optional(self.config_path.as_deref(), base_dir).await
    }

    /// Default filter directive when `RUST_LOG` is not set.
    #[must_use]
    pub const fn default_log_directive(&self) -> &'static str {
        if self.quiet {
            "off"
        } else if self.verbose {
            "packn_sync=debug,git=debug,warn"
        } else {
            "warn"
        }
    }

    /// Install the global tracing subscriber. Later calls are ignored.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_log_directive()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .compact()
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "packn-sync",
    about = "Keep a fork's custom command merged into upstream flet-cli releases",
    version,
    long_about = "packn-sync downloads an upstream flet-cli release, adds the fork's custom \
                  command to it, patches the project metadata and verifies the result. \
                  auto-update additionally commits, pushes and opens a pull request."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print failures
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a packn-sync.toml configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate a specific upstream release into a directory
    Integrate(integrate::IntegrateCommand),

    /// Integrate the latest upstream release and publish it
    AutoUpdate(auto_update::AutoUpdateCommand),

    /// Verify an integrated tree
    Verify(verify::VerifyCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        CliConfig {
            verbose: self.verbose,
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Integrate(cmd) => cmd.execute(&config).await,
            Commands::AutoUpdate(cmd) => cmd.execute(&config).await,
            Commands::Verify(cmd) => cmd.execute(&config).await,
        }
    }
}

/// `dir`, or the current directory when `None`.
pub(crate) fn dir_or_cwd(dir: Option<PathBuf>) -> Result<PathBuf> {
    use anyhow::Context;

    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}
