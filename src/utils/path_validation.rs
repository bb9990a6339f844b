//! Path containment checks.
//!
//! Used by the archive extractor to decide whether a member would land
//! outside its destination directory.

use std::path::{Path, PathBuf};

use super::fs::normalize_path;

/// Where `relative` would land under an already canonical `root`.
///
/// Absolute `relative` paths replace `root` entirely, as `Path::join` does,
/// and `..` is resolved lexically since the target usually does not exist yet.
#[must_use]
pub fn resolve_under(root: &Path, relative: &Path) -> PathBuf {
    normalize_path(&root.join(relative))
}

/// `true` if `candidate` is `root` itself or lies beneath it.
///
/// Both paths should already be absolute and normalized; containment is
/// checked component-wise, so `/tmp/dest-evil` is not inside `/tmp/dest`.
#[must_use]
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}
