//! Fetching upstream releases.
//!
//! - [`client`]: release metadata, archive download with the tag-archive
//!   fallback, and pull-request creation
//! - [`archive`]: `.tar.gz` extraction behind a path-traversal guard
//! - [`verification`]: SHA-256 check against the digest a release advertises

pub mod archive;
pub mod client;
pub mod verification;

pub use archive::{extract_tar_gz, find_extracted_root, safe_extract};
pub use client::{
    CreatedPullRequest, DownloadedArchive, GitHubAsset, GitHubRelease, PullRequest, ReleaseClient,
};
pub use verification::ChecksumVerifier;
