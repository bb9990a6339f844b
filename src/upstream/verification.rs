//! SHA-256 verification of downloaded release assets.
//!
//! GitHub reports asset digests as `sha256:<hex>`. Digests in any other
//! algorithm are ignored rather than treated as a mismatch.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::SyncError;

const SHA256_PREFIX: &str = "sha256:";

pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// `sha256:<hex>` of the file at `file_path`.
    pub async fn compute_sha256(file_path: &Path) -> Result<String, SyncError> {
        debug!("Computing SHA256 checksum for: {}", file_path.display());

        let contents = fs::read(file_path).await?;
        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(format!("{SHA256_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    /// Compare the file against `expected`.
    ///
    /// Returns `Ok(false)` when `expected` is not a SHA-256 digest and nothing
    /// was checked.
    pub async fn verify(file_path: &Path, expected: &str, asset: &str) -> Result<bool, SyncError> {
        let Some(expected_hex) = expected.strip_prefix(SHA256_PREFIX) else {
            warn!("Unsupported digest format for {}: {}", asset, expected);
            return Ok(false);
        };

        let actual = Self::compute_sha256(file_path).await?;
        let actual_hex = &actual[SHA256_PREFIX.len()..];

        // Digests may be published in either case
        if !actual_hex.eq_ignore_ascii_case(expected_hex) {
            return Err(SyncError::DigestMismatch {
                asset: asset.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }

        info!("Checksum verified for {}", asset);
        Ok(true)
    }
}
