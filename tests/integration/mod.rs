//! Integration test suite for packn-sync
//!
//! Every test drives the built binary against scratch directories. Upstream
//! releases come from local archives or a localhost mock server, and pushes go
//! to a bare repository, so nothing touches the network.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cli**: argument handling and error exit codes
//! - **integrate**: `integrate` with `--offline-archive`
//! - **verify**: `verify` on patched and unpatched trees
//! - **auto_update**: `auto-update` against the mock release server

#[path = "../common/mod.rs"]
mod common;

mod auto_update;
mod cli;
mod integrate;
mod verify;
