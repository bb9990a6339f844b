//! Configuration for packn-sync.
//!
//! Settings come from three places, later ones winning:
//!
//! 1. Built-in defaults for the flet-cli fork ([`crate::constants`])
//! 2. An optional `packn-sync.toml` (or the file given with `--config`)
//! 3. Command-line flags and the `GITHUB_*` environment variables, applied by
//!    [`crate::cli`]
//!
//! Credentials are never read from the file; the access token only comes
//! from `--token` or `GITHUB_TOKEN`.

mod sync;

pub use sync::{
    CommandConfig, GitConfig, ProjectConfig, StagingConfig, SyncConfig, UpstreamConfig,
};
