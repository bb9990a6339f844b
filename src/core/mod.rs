//! Core types shared across packn-sync.
//!
//! Currently this is the error vocabulary: [`SyncError`] for typed failures,
//! [`ErrorContext`] for the user-facing rendering, and [`user_friendly_error`]
//! to bridge `anyhow::Error` values at the CLI boundary.

pub mod error;

pub use error::{ErrorContext, SyncError, create_error_context, user_friendly_error};
