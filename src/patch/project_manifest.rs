//! Fork metadata in `pyproject.toml`.
//!
//! Edits are textual so upstream formatting and comments survive:
//!
//! - every line-leading `version = "..."` gets the new version
//! - `description` is replaced only while it still starts with the configured
//!   prefix, so a hand-written description is left alone
//! - a `maintainers` line is added after a single-line `authors` array
//! - an optional-dependencies table is added before `[project.urls]`

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{Anchor, PatchOutcome, PatchRule, Placement, apply_rules};
use crate::config::ProjectConfig;
use crate::utils::{atomic_write, read_text_file};

static VERSION_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([ \t]*)version([ \t]*)=([ \t]*)["']([^"'\n]*)["']"#)
        .expect("version field pattern is valid")
});

static DESCRIPTION_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([ \t]*)description[ \t]*=[ \t]*["']([^"'\n]*)["']"#)
        .expect("description field pattern is valid")
});

// Single-line arrays only; a multi-line `authors = [` is left alone
const AUTHORS_LINE: &str = r"^[ \t]*authors[ \t]*=[ \t]*\[.*\][ \t]*\r?$";
const OPTIONAL_DEPENDENCIES: &str = "[project.optional-dependencies]";
const URLS_TABLE: &str = "[project.urls]";

/// The first quoted `version` field, if any.
pub fn read_version(content: &str) -> Option<String> {
    VERSION_FIELD.captures(content).map(|caps| caps[4].to_string())
}

/// Point every `version = "..."` line at `version`.
///
/// Returns the new content and how many fields now differ from before.
pub fn set_version(content: &str, version: &str) -> (String, usize) {
    let mut changed = 0;
    let updated = VERSION_FIELD.replace_all(content, |caps: &regex::Captures<'_>| {
        if &caps[4] != version {
            changed += 1;
        }
        format!("{}version{}={}\"{version}\"", &caps[1], &caps[2], &caps[3])
    });
    (updated.into_owned(), changed)
}

/// Replace the description when it still carries the upstream prefix.
pub fn set_description(content: &str, project: &ProjectConfig) -> (String, bool) {
    let Some(caps) = DESCRIPTION_FIELD.captures(content) else {
        return (content.to_string(), false);
    };
    if !caps[2].starts_with(&project.description_prefix) || &caps[2] == project.description {
        return (content.to_string(), false);
    }

    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let mut updated = String::with_capacity(content.len());
    updated.push_str(&content[..whole.start]);
    updated.push_str(&format!("{}description = {}", &caps[1], toml_string(&project.description)));
    updated.push_str(&content[whole.end..]);
    (updated, true)
}

fn toml_string(value: &str) -> String {
    toml_edit::Value::from(value).to_string().trim().to_string()
}

fn toml_string_array(values: &[String]) -> String {
    let array: toml_edit::Array = values.iter().map(String::as_str).collect();
    array.to_string().trim().to_string()
}

pub fn project_manifest_rules(project: &ProjectConfig) -> Vec<PatchRule> {
    let authors = Anchor::line_matching(AUTHORS_LINE).expect("authors pattern is valid");
    let mut rules = vec![
        PatchRule::new(
            "maintainers",
            "maintainers",
            authors,
            Placement::After,
            format!(
                "maintainers = [{{ name = {}, email = {} }}]\n",
                toml_string(&project.maintainer),
                toml_string(&project.maintainer_email)
            ),
        )
        .with_matching_indent(),
    ];

    rules.push(PatchRule::new(
        "optional dependencies",
        OPTIONAL_DEPENDENCIES,
        Anchor::line(URLS_TABLE),
        Placement::Before,
        format!(
            "{OPTIONAL_DEPENDENCIES}\n{} = {}\n\n",
            project.extras_name,
            toml_string_array(&project.extras_requirements)
        ),
    ));

    rules
}

/// What [`update_project_manifest`] did.
#[derive(Debug, Clone, Default)]
pub struct ManifestUpdate {
    pub versions_updated: usize,
    pub description_updated: bool,
    pub rules: PatchOutcome,
}

impl ManifestUpdate {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.versions_updated > 0 || self.description_updated || self.rules.changed()
    }
}

/// Apply version, description and rule edits to the manifest at `path`.
pub fn update_project_manifest(
    path: &Path,
    version: &str,
    project: &ProjectConfig,
) -> anyhow::Result<ManifestUpdate> {
    let original = read_text_file(path)?;

    let (content, versions_updated) = set_version(&original, version);
    let (content, description_updated) = set_description(&content, project);
    let rules = apply_rules(&content, &project_manifest_rules(project));

    let update = ManifestUpdate {
        versions_updated,
        description_updated,
        rules,
    };
    if update.changed() {
        atomic_write(path, update.rules.content.as_bytes())?;
    }
    Ok(update)
}
