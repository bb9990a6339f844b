//! Extraction of upstream source archives with a path-traversal guard.
//!
//! Every member's destination is resolved against the canonicalized
//! destination directory before anything is written. A member that would land
//! outside it aborts the whole extraction with
//! [`SyncError::PathTraversal`]; it is never skipped. Link members are checked
//! the same way against their link target. Members extracted before the
//! offending one stay on disk; callers extract into a temporary directory that
//! is discarded on error.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, trace};

use crate::core::SyncError;
use crate::utils::{is_within, resolve_under};

/// Extract a `.tar.gz` file into `dest`, creating `dest` if needed.
///
/// Returns the number of members written.
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<usize, SyncError> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);

    safe_extract(&mut archive, dest).map_err(|e| match e {
        SyncError::ArchiveCorrupt {
            reason,
            ..
        } => SyncError::ArchiveCorrupt {
            archive: archive_path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Extract every member of `archive` into `dest`, refusing any member whose
/// resolved path is not inside `dest`.
///
/// Paths are checked lexically first, then again on disk: parent directories
/// are created one component at a time and canonicalized, so a link extracted
/// earlier from the same archive cannot redirect a later member.
pub fn safe_extract<R: Read>(archive: &mut Archive<R>, dest: &Path) -> Result<usize, SyncError> {
    fs::create_dir_all(dest)?;
    let root = dest.canonicalize()?;
    let corrupt = |reason: String| SyncError::ArchiveCorrupt {
        archive: "<stream>".to_string(),
        reason,
    };

    let mut extracted = 0;
    for entry in archive.entries().map_err(|e| corrupt(e.to_string()))? {
        let mut entry = entry.map_err(|e| corrupt(e.to_string()))?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_pax_global_extensions() {
            continue;
        }

        let member = entry.path().map_err(|e| corrupt(e.to_string()))?.into_owned();
        let lexical = resolve_under(&root, &member);
        if !is_within(&root, &lexical) {
            return Err(traversal(&member));
        }
        if lexical == root {
            continue;
        }

        let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
            return Err(traversal(&member));
        };
        let parent = create_dir_within(&root, parent, &member)?;
        let target = parent.join(name);

        let link = if matches!(entry_type, EntryType::Symlink | EntryType::Link) {
            entry.link_name().map_err(|e| corrupt(e.to_string()))?.map(|l| l.into_owned())
        } else {
            None
        };

        let mut hard_link_source = None;
        if let Some(link) = &link {
            // Symlink targets are relative to the link; hard link targets to the archive root
            let base = if entry_type == EntryType::Symlink { &parent } else { &root };
            let resolved = resolve_under(base, link);
            if !is_within(&root, &resolved) {
                return Err(link_traversal(&member, link));
            }
            if entry_type == EntryType::Link {
                let source = resolved.canonicalize()?;
                if !is_within(&root, &source) {
                    return Err(link_traversal(&member, link));
                }
                hard_link_source = Some(source);
            }
        }

        if let Ok(existing) = fs::symlink_metadata(&target)
            && existing.file_type().is_symlink()
        {
            if entry_type.is_dir() {
                // Directory metadata would be applied through the link
                let resolved = target.canonicalize().map_err(|_| traversal(&member))?;
                if !is_within(&root, &resolved) {
                    return Err(traversal(&member));
                }
            } else {
                fs::remove_file(&target)?;
            }
        }

        trace!("Extracting {}", member.display());
        match hard_link_source {
            Some(source) => fs::hard_link(&source, &target)?,
            None => {
                entry
                    .unpack(&target)
                    .map_err(|e| corrupt(format!("failed to extract {}: {e}", member.display())))?;
            }
        }

        // A link that resolves lexically inside may still leave through another link
        if entry_type == EntryType::Symlink
            && let Some(link) = &link
            && let Ok(resolved) = target.canonicalize()
            && !is_within(&root, &resolved)
        {
            fs::remove_file(&target)?;
            return Err(link_traversal(&member, link));
        }
        extracted += 1;
    }

    debug!("Extracted {} members into {}", extracted, root.display());
    Ok(extracted)
}

/// Create `dir` beneath `root` one component at a time and return its
/// canonical path. Fails if any existing component resolves outside `root`.
fn create_dir_within(root: &Path, dir: &Path, member: &Path) -> Result<PathBuf, SyncError> {
    let relative = dir.strip_prefix(root).map_err(|_| traversal(member))?;
    let mut current = root.to_path_buf();
    for component in relative.components() {
        let next = current.join(component);
        match fs::symlink_metadata(&next) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(&next)?,
            Err(e) => return Err(e.into()),
        }
        // Dangling links cannot be canonicalized; treat them as escaping
        current = next.canonicalize().map_err(|_| traversal(member))?;
        if !is_within(root, &current) {
            return Err(traversal(member));
        }
    }
    Ok(current)
}

fn traversal(member: &Path) -> SyncError {
    SyncError::PathTraversal {
        member: member.display().to_string(),
    }
}

fn link_traversal(member: &Path, link: &Path) -> SyncError {
    SyncError::PathTraversal {
        member: format!("{} -> {}", member.display(), link.display()),
    }
}

/// The single top-level directory an upstream archive unpacks to.
///
/// Archives contain one root such as `flet-0.80.2/`. When there are several,
/// the first in name order is used so the choice is stable.
pub fn find_extracted_root(dest: &Path) -> Result<PathBuf, SyncError> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dest)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter().next().ok_or_else(|| SyncError::ExtractedRootMissing {
        path: dest.display().to_string(),
    })
}
