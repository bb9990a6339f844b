//! Constants shared across packn-sync.
//!
//! Timeouts, default upstream coordinates, and the fixed file layout of the
//! upstream project. Most of these are only defaults: [`crate::config`] lets a
//! fork override them.

use std::time::Duration;

/// Timeout applied to every HTTP request (30 seconds).
///
/// Requests are never retried; a timeout is fatal for the invocation.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for local git operations such as `add` and `commit` (60 seconds).
pub const GIT_LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for `git push` (120 seconds).
pub const GIT_PUSH_TIMEOUT: Duration = Duration::from_secs(120);

/// User agent sent with API requests; GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("packn-sync/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
pub const DEFAULT_UPSTREAM_OWNER: &str = "flet-dev";
pub const DEFAULT_UPSTREAM_REPO: &str = "flet";

/// Release assets are named `{prefix}-{version}.tar.gz`.
pub const DEFAULT_ASSET_PREFIX: &str = "flet_cli";

/// Python package that hosts the command registry.
pub const DEFAULT_PACKAGE: &str = "flet_cli";
/// Name of the fork's custom command.
pub const DEFAULT_COMMAND: &str = "packn";
/// Upstream command the custom command is registered next to.
pub const DEFAULT_SIBLING_COMMAND: &str = "pack";

pub const DEFAULT_DESCRIPTION: &str = "Flet CLI with Nuitka packaging support for Windows";
/// Only descriptions starting with this prefix are rewritten.
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "Flet CLI";
pub const DEFAULT_AUTHOR: &str = "Appveyor Systems Inc.";
pub const DEFAULT_AUTHOR_EMAIL: &str = "hello@flet.dev";
pub const DEFAULT_MAINTAINER: &str = "LingyeSoul";
pub const DEFAULT_MAINTAINER_EMAIL: &str = "lingyesoul@users.noreply.github.com";
pub const DEFAULT_EXTRAS_NAME: &str = "nuitka";
pub const DEFAULT_EXTRAS_REQUIREMENT: &str = "nuitka";

pub const PROJECT_MANIFEST: &str = "pyproject.toml";
pub const PACKAGING_MANIFEST: &str = "MANIFEST.in";

/// Written to the packaging manifest when the upstream tree has none.
///
/// `{package}` is replaced with the configured Python package.
pub const PACKAGING_MANIFEST_TEMPLATE: &str = "include README.md
include LICENSE
include pyproject.toml
recursive-include src/{package}/__pyinstaller *.dat
global-exclude __pycache__
global-exclude *.py[cod]
global-exclude *.pyo
global-exclude *.pyd
prune __pycache__
";

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_BRANCH_PREFIX: &str = "update/flet-cli";
pub const BOT_NAME: &str = "github-actions[bot]";
pub const BOT_EMAIL: &str = "github-actions[bot]@users.noreply.github.com";

/// Default name of the optional configuration file in the working directory.
pub const CONFIG_FILE_NAME: &str = "packn-sync.toml";
