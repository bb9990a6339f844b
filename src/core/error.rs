//! Error handling for packn-sync
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`SyncError`]) for every failure the tool can
//!    classify, so callers can branch on them (for example, falling back to a
//!    different download URL on [`SyncError::ReleaseNotFound`]).
//! 2. **User-facing messages** ([`ErrorContext`]) with details and a suggestion,
//!    produced at the CLI boundary by [`user_friendly_error`].
//!
//! # Error Categories
//!
//! - **Invalid input**: [`SyncError::InvalidVersion`], [`SyncError::ConfigParse`]
//! - **Network**: [`SyncError::ReleaseNotFound`], [`SyncError::HttpStatus`],
//!   [`SyncError::Network`]
//! - **Archive integrity**: [`SyncError::PathTraversal`],
//!   [`SyncError::ArchiveCorrupt`], [`SyncError::DigestMismatch`]
//! - **Staging**: [`SyncError::ModuleNotFound`], [`SyncError::ExtractedRootMissing`]
//! - **Verification**: [`SyncError::VerificationFailed`]
//! - **External tools**: [`SyncError::GitNotFound`], [`SyncError::GitCommandError`]
//!
//! A missing patch anchor is deliberately *not* an error; see [`crate::patch`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use packn_sync::core::{SyncError, user_friendly_error};
//!
//! let err = anyhow::Error::from(SyncError::InvalidVersion {
//!     version: "1.2".to_string(),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure packn-sync classifies.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A version string did not match `MAJOR.MINOR.PATCH[-(alpha|beta|rc).N]`.
    #[error("Invalid version format: {version}")]
    InvalidVersion {
        /// The rejected input, verbatim.
        version: String,
    },

    /// The server answered 404 for a download or metadata URL.
    #[error("Release not found (HTTP 404): {url}")]
    ReleaseNotFound {
        /// URL that returned 404.
        url: String,
    },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Numeric status code.
        status: u16,
    },

    /// DNS failure, refused connection, timeout, or a body that failed to decode.
    #[error("Network error: {operation}")]
    Network {
        /// What was being attempted.
        operation: String,
        /// Underlying cause.
        reason: String,
    },

    /// An archive member would have been written outside the destination.
    #[error("Path traversal detected in archive member: {member}")]
    PathTraversal {
        /// Member name as stored in the archive.
        member: String,
    },

    /// The archive could not be decompressed or read.
    #[error("Corrupt archive {archive}")]
    ArchiveCorrupt {
        /// Archive path.
        archive: String,
        /// Underlying cause.
        reason: String,
    },

    /// The downloaded asset's SHA-256 differs from the digest the release advertises.
    #[error("Checksum mismatch for '{asset}': expected {expected}, got {actual}")]
    DigestMismatch {
        /// Asset file name.
        asset: String,
        /// Digest from the release metadata.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// Extraction succeeded but produced no top-level directory.
    #[error("No directory found after extracting into {path}")]
    ExtractedRootMissing {
        /// Extraction destination.
        path: String,
    },

    /// The custom command module to integrate does not exist.
    #[error("Command module not found at {path}")]
    ModuleNotFound {
        /// Expected module path.
        path: String,
    },

    /// At least one post-integration check failed.
    #[error("Integration verification failed ({failed} of {total} checks)")]
    VerificationFailed {
        /// Number of failed checks.
        failed: usize,
        /// Number of checks run.
        total: usize,
    },

    /// Git is not installed or not on `PATH`.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// A git subprocess exited non-zero or timed out.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// Git subcommand (`commit`, `push`, ...).
        operation: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The configuration file exists but is not valid.
    #[error("Invalid configuration file {file}")]
    ConfigParse {
        /// Configuration path.
        file: String,
        /// Parser message.
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl Clone for SyncError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidVersion {
                version,
            } => Self::InvalidVersion {
                version: version.clone(),
            },
            Self::ReleaseNotFound {
                url,
            } => Self::ReleaseNotFound {
                url: url.clone(),
            },
            Self::HttpStatus {
                url,
                status,
            } => Self::HttpStatus {
                url: url.clone(),
                status: *status,
            },
            Self::Network {
                operation,
                reason,
            } => Self::Network {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::PathTraversal {
                member,
            } => Self::PathTraversal {
                member: member.clone(),
            },
            Self::ArchiveCorrupt {
                archive,
                reason,
            } => Self::ArchiveCorrupt {
                archive: archive.clone(),
                reason: reason.clone(),
            },
            Self::DigestMismatch {
                asset,
                expected,
                actual,
            } => Self::DigestMismatch {
                asset: asset.clone(),
                expected: expected.clone(),
                actual: actual.clone(),
            },
            Self::ExtractedRootMissing {
                path,
            } => Self::ExtractedRootMissing {
                path: path.clone(),
            },
            Self::ModuleNotFound {
                path,
            } => Self::ModuleNotFound {
                path: path.clone(),
            },
            Self::VerificationFailed {
                failed,
                total,
            } => Self::VerificationFailed {
                failed: *failed,
                total: *total,
            },
            Self::GitNotFound => Self::GitNotFound,
            Self::GitCommandError {
                operation,
                stderr,
            } => Self::GitCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::ConfigParse {
                file,
                reason,
            } => Self::ConfigParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            // io::Error is not Clone
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// A [`SyncError`] plus the extra lines shown to the user.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: SyncError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: SyncError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colour.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] for display.
///
/// The chain is searched for a [`SyncError`] first so that typed errors
/// wrapped by `anyhow::Context` still get their specific suggestion.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut current: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(sync_error) = current.downcast_ref::<SyncError>() {
            let mut ctx = create_error_context(sync_error);
            // Keep the outer context lines, which usually name the file or URL
            if ctx.details.is_none() && current.to_string() != error.to_string() {
                ctx.details = Some(format!("{error:#}"));
            }
            return ctx;
        }
        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(SyncError::Other {
            message: error.to_string(),
        })
        .with_suggestion("Check file permissions and try running with appropriate privileges");
    }

    ErrorContext::new(SyncError::Other {
        message: format!("{error:#}"),
    })
}

/// Attach details and a suggestion appropriate for each [`SyncError`].
#[must_use]
pub fn create_error_context(error: &SyncError) -> ErrorContext {
    let ctx = ErrorContext::new(error.clone());
    match error {
        SyncError::InvalidVersion {
            ..
        } => ctx
            .with_details("Versions must look like 1.2.3, 1.2.3-alpha.1, 1.2.3-beta.2 or 1.2.3-rc.1")
            .with_suggestion("Pass the release tag without extra suffixes, for example 0.80.2"),
        SyncError::ReleaseNotFound {
            ..
        } => ctx.with_suggestion("Check that the version exists as an upstream release tag"),
        SyncError::HttpStatus {
            status,
            ..
        } if *status == 401 || *status == 403 => ctx
            .with_details("The API rejected the request; the token may be missing, expired, or rate limited")
            .with_suggestion("Set GITHUB_TOKEN to a token with access to the repository"),
        SyncError::HttpStatus {
            ..
        }
        | SyncError::Network {
            ..
        } => ctx.with_suggestion("Check your internet connection and try again"),
        SyncError::PathTraversal {
            ..
        } => ctx
            .with_details("Extraction was aborted; files extracted before this member stay in the temporary directory, which is removed")
            .with_suggestion("Do not use this archive; it may have been tampered with"),
        SyncError::ArchiveCorrupt {
            reason,
            ..
        } => ctx.with_details(reason.clone()).with_suggestion("Download the archive again"),
        SyncError::DigestMismatch {
            ..
        } => ctx.with_suggestion("Download the archive again; if the mismatch persists, do not use it"),
        SyncError::ModuleNotFound {
            ..
        } => ctx.with_suggestion("Run from the fork's repository root or pass --source"),
        SyncError::VerificationFailed {
            ..
        } => ctx.with_suggestion("Inspect the [FAIL] lines above; the upstream layout may have changed"),
        SyncError::GitNotFound => ctx
            .with_suggestion("Install git from https://git-scm.com/ or your package manager")
            .with_details("packn-sync requires git to be installed and available in your PATH"),
        SyncError::GitCommandError {
            operation,
            stderr,
        } => {
            let suggestion = match operation.as_str() {
                "push" => "Check the remote configuration and that the token may push to it",
                "commit" => "Check that git user.name and user.email are configured",
                "checkout" => "Verify the branch name is valid",
                _ => "Ensure git is properly configured and try again",
            };
            ctx.with_details(stderr.trim().to_string()).with_suggestion(suggestion)
        }
        SyncError::ConfigParse {
            file,
            reason,
        } => ctx
            .with_details(reason.clone())
            .with_suggestion(format!("Fix the TOML syntax in '{file}' or remove the file")),
        SyncError::ExtractedRootMissing {
            ..
        }
        | SyncError::IoError(_)
        | SyncError::Other {
            ..
        } => ctx,
    }
}
