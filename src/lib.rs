//! packn-sync - keep a fork's custom command merged into upstream releases
//!
//! A fork of `flet-cli` adds one command (`packn`) to the upstream tool.
//! Every upstream release has to be merged again: download the release,
//! drop the custom module in, register it in the command registry, patch the
//! project metadata, and check that nothing was lost. packn-sync does this as
//! a CLI, both interactively (`integrate`) and from a scheduled CI job
//! (`auto-update`, which also commits, pushes and opens a pull request).
//!
//! # Modules
//!
//! - [`cli`] - command-line parsing and the three commands
//! - [`config`] - the optional `packn-sync.toml` file
//! - [`core`] - [`core::SyncError`] and user-facing error rendering
//! - [`version`] - release version validation and up-to-date decisions
//! - [`upstream`] - release metadata, downloads, checksums and safe extraction
//! - [`patch`] - idempotent, marker-guarded text insertions
//! - [`integrate`] - staging, backups and post-integration verification
//! - [`git`] - commits and pushes through the system `git`
//! - [`utils`] - filesystem and path helpers
//!
//! # Re-running is safe
//!
//! Every patch is guarded by a marker string, so running any command twice
//! on the same tree leaves it byte-identical after the first run.
//!
//! # Configuration
//!
//! ```toml
//! [upstream]
//! owner = "flet-dev"
//! repo = "flet"
//!
//! [command]
//! package = "flet_cli"
//! name = "packn"
//! sibling = "pack"
//!
//! [git]
//! base_branch = "main"
//! branch_prefix = "update/flet-cli"
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod integrate;
pub mod patch;
pub mod upstream;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
