//! Read-only post-integration checks.
//!
//! Every check runs even after an earlier one fails; the report carries one
//! entry per file or marker and an overall verdict.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::SyncConfig;
use crate::constants::{PACKAGING_MANIFEST, PROJECT_MANIFEST};
use crate::core::SyncError;
use crate::patch::read_version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// File the check is about, relative to the project root.
    pub file: String,
    pub description: String,
    pub passed: bool,
    /// Why a failed check failed.
    pub detail: Option<String>,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.description)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub checks: Vec<Check>,
}

impl VerificationReport {
    fn record(&mut self, file: &str, description: impl Into<String>, outcome: Result<(), String>) {
        let (passed, detail) = match outcome {
            Ok(()) => (true, None),
            Err(detail) => (false, Some(detail)),
        };
        self.checks.push(Check {
            file: file.to_string(),
            description: description.into(),
            passed,
            detail,
        });
    }

    /// `true` only if every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    #[must_use]
    pub fn failed(&self) -> Vec<&Check> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn into_result(self) -> Result<Self, SyncError> {
        if self.passed() {
            Ok(self)
        } else {
            Err(SyncError::VerificationFailed {
                failed: self.failed().len(),
                total: self.checks.len(),
            })
        }
    }
}

fn file_label(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Check the integrated tree at `root`.
///
/// With `expected_version`, the project manifest must carry exactly that
/// version; otherwise any version field is accepted.
pub fn verify_integration(
    root: &Path,
    config: &SyncConfig,
    expected_version: Option<&str>,
) -> VerificationReport {
    let mut report = VerificationReport::default();
    let command = &config.command;

    let module = file_label(&command.module_path());
    let registry = file_label(&command.registry_path());
    for file in [module.as_str(), registry.as_str(), PROJECT_MANIFEST, PACKAGING_MANIFEST] {
        let outcome = if root.join(file).is_file() { Ok(()) } else { Err("missing".to_string()) };
        report.record(file, "exists", outcome);
    }

    let registry_content = fs::read_to_string(root.join(command.registry_path()));
    for (description, marker) in [
        ("command import", command.import_line()),
        ("command registration", command.registration_line()),
    ] {
        let outcome = match &registry_content {
            Ok(content) if content.contains(&marker) => Ok(()),
            Ok(_) => Err(format!("'{marker}' not found")),
            Err(e) => Err(format!("unreadable: {e}")),
        };
        report.record(&registry, description, outcome);
    }

    let manifest_content = fs::read_to_string(root.join(PROJECT_MANIFEST));
    let parsed = match &manifest_content {
        Ok(content) => content.parse::<toml_edit::DocumentMut>().map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => Err(format!("unreadable: {e}")),
    };
    report.record(PROJECT_MANIFEST, "parses as TOML", parsed);

    let version_outcome = match &manifest_content {
        Ok(content) => match (read_version(content), expected_version) {
            (Some(found), Some(expected)) if found == expected => Ok(()),
            (Some(found), Some(expected)) => Err(format!("found {found}, expected {expected}")),
            (Some(_), None) => Ok(()),
            (None, _) => Err("no version field".to_string()),
        },
        Err(e) => Err(format!("unreadable: {e}")),
    };
    let version_description = match expected_version {
        Some(v) => format!("version is {v}"),
        None => "has a version".to_string(),
    };
    report.record(PROJECT_MANIFEST, version_description, version_outcome);

    report
}
