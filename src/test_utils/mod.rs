//! Test utilities for packn-sync
//!
//! Helpers for building upstream source trees and archives, driving git in
//! scratch repositories, and enabling logging inside tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use packn_sync::test_utils::UpstreamTreeFixture;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let archive = temp.path().join("flet_cli-0.80.2.tar.gz");
//! UpstreamTreeFixture::new("0.80.2").write_archive(&archive).unwrap();
//! ```

pub mod fixtures;
pub mod git_helper;
pub mod http;

pub use fixtures::{
    ArchiveMember, CUSTOM_MODULE, UPSTREAM_CLI_PY, UpstreamTreeFixture, upstream_pyproject,
    write_tar_gz,
};
pub use git_helper::TestGit;
pub use http::{MockResponse, MockServer, RecordedRequest};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set that level is used,
/// otherwise `RUST_LOG` is honoured; with neither, tests stay silent.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
