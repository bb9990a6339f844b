//! Idempotent text patching.
//!
//! A [`PatchRule`] pairs an idempotency marker with text to insert next to an
//! anchor. [`apply_rules`] runs rules in order against progressively modified
//! content:
//!
//! - marker already present: the rule is skipped and the content untouched
//! - anchor found: the insertion is placed before or after the first match
//! - anchor missing: the rule is skipped and a warning logged
//!
//! A missing anchor never fails the operation. Whether the file ended up in
//! the expected state is checked separately by
//! [`crate::integrate::verify`].
//!
//! Because a successfully applied rule makes its marker present, applying the
//! same rules to their own output changes nothing.
//!
//! ```rust
//! use packn_sync::patch::{Anchor, PatchRule, Placement, apply_rules};
//!
//! let rules = vec![PatchRule::new(
//!     "import",
//!     "import b",
//!     Anchor::line("import a"),
//!     Placement::After,
//!     "import b\n",
//! )];
//!
//! let once = apply_rules("import a\nimport c\n", &rules);
//! assert_eq!(once.content, "import a\nimport b\nimport c\n");
//!
//! let twice = apply_rules(&once.content, &rules);
//! assert!(!twice.changed());
//! assert_eq!(twice.content, once.content);
//! ```

pub mod packaging_manifest;
pub mod project_manifest;
pub mod registry;

use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use crate::utils::{atomic_write, read_text_file};

pub use packaging_manifest::{ensure_packaging_manifest, render_packaging_manifest};
pub use project_manifest::{
    ManifestUpdate, project_manifest_rules, read_version, set_description, set_version,
    update_project_manifest,
};
pub use registry::{patch_registry, registry_rules};

/// Where an anchor sits in the content.
#[derive(Debug, Clone)]
pub struct Anchor {
    description: String,
    regex: Regex,
    whole_line: bool,
}

impl Anchor {
    /// A line whose trimmed text equals `text`.
    pub fn line(text: &str) -> Self {
        let pattern = format!(r"(?m)^[ \t]*{}[ \t]*\r?$", regex::escape(text.trim()));
        Self {
            description: format!("line '{}'", text.trim()),
            regex: Regex::new(&pattern).expect("escaped literal is a valid pattern"),
            whole_line: true,
        }
    }

    /// The first line matching `pattern`.
    ///
    /// The pattern is searched in multi-line mode, so `^` and `$` refer to
    /// line boundaries.
    pub fn line_matching(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            description: format!("line matching /{pattern}/"),
            regex: Regex::new(&format!("(?m){pattern}"))?,
            whole_line: true,
        })
    }

    /// A literal block of text, possibly spanning lines.
    ///
    /// Insertions go directly before its first character or after its last.
    pub fn literal(text: &str) -> Self {
        Self {
            description: format!("text {text:?}"),
            regex: Regex::new(&regex::escape(text)).expect("escaped literal is a valid pattern"),
            whole_line: false,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Byte offset where an insertion goes, and the indentation of the anchor line.
    fn locate<'a>(&self, content: &'a str, placement: Placement) -> Option<(usize, &'a str)> {
        let found = self.regex.find(content)?;
        let line_start = content[..found.start()].rfind('\n').map_or(0, |i| i + 1);
        let indent_len = content[line_start..]
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(content.len() - line_start);
        let indent = &content[line_start..line_start + indent_len];

        let offset = match (placement, self.whole_line) {
            (Placement::Before, true) => line_start,
            (Placement::After, true) => {
                content[found.end()..].find('\n').map_or(content.len(), |i| found.end() + i + 1)
            }
            (Placement::Before, false) => found.start(),
            (Placement::After, false) => found.end(),
        };
        Some((offset, indent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// One marker-guarded insertion.
#[derive(Debug, Clone)]
pub struct PatchRule {
    pub name: String,
    /// Present in the content once the insertion has been made.
    pub marker: String,
    pub anchor: Anchor,
    pub placement: Placement,
    pub insertion: String,
    /// Prefix each inserted line with the anchor line's indentation.
    pub match_indent: bool,
}

impl PatchRule {
    pub fn new(
        name: impl Into<String>,
        marker: impl Into<String>,
        anchor: Anchor,
        placement: Placement,
        insertion: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            marker: marker.into(),
            anchor,
            placement,
            insertion: insertion.into(),
            match_indent: false,
        }
    }

    #[must_use]
    pub const fn with_matching_indent(mut self) -> Self {
        self.match_indent = true;
        self
    }

    fn is_satisfied(&self, content: &str) -> bool {
        content.contains(&self.marker)
    }

    fn render(&self, indent: &str) -> String {
        if !self.match_indent || indent.is_empty() {
            return self.insertion.clone();
        }
        self.insertion
            .split_inclusive('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect()
    }
}

/// Result of running a rule list over some content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub content: String,
    /// Rules whose insertion was made.
    pub applied: Vec<String>,
    /// Rules skipped because their marker was already present.
    pub already_present: Vec<String>,
    /// Rules skipped because their anchor was not found.
    pub missing_anchor: Vec<String>,
}

impl PatchOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Apply `rules` in order. Never fails; see the module docs.
pub fn apply_rules(content: &str, rules: &[PatchRule]) -> PatchOutcome {
    let mut outcome = PatchOutcome {
        content: content.to_string(),
        ..PatchOutcome::default()
    };

    for rule in rules {
        if rule.is_satisfied(&outcome.content) {
            debug!("Patch '{}' already present", rule.name);
            outcome.already_present.push(rule.name.clone());
            continue;
        }

        let Some((offset, indent)) = rule.anchor.locate(&outcome.content, rule.placement) else {
            warn!("Skipping patch '{}': {} not found", rule.name, rule.anchor.description());
            outcome.missing_anchor.push(rule.name.clone());
            continue;
        };

        let mut insertion = rule.render(indent);
        // Anchor on a final line without a trailing newline
        if rule.anchor.whole_line
            && rule.placement == Placement::After
            && offset == outcome.content.len()
            && !outcome.content.is_empty()
            && !outcome.content.ends_with('\n')
        {
            insertion.insert(0, '\n');
        }

        outcome.content.insert_str(offset, &insertion);
        debug!("Applied patch '{}'", rule.name);
        outcome.applied.push(rule.name.clone());
    }

    outcome
}

/// Apply `rules` to the file at `path`, rewriting it only if something changed.
///
/// An unchanged file keeps its exact bytes and modification time.
pub fn patch_file(path: &Path, rules: &[PatchRule]) -> anyhow::Result<PatchOutcome> {
    let content = read_text_file(path)?;
    let outcome = apply_rules(&content, rules);
    if outcome.changed() {
        atomic_write(path, outcome.content.as_bytes())?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(marker: &str, anchor: Anchor, placement: Placement, insertion: &str) -> PatchRule {
        PatchRule::new(marker, marker, anchor, placement, insertion)
    }

    #[test]
    fn test_insert_after_line() {
        let rules = [rule("b", Anchor::line("a"), Placement::After, "b\n")];
        let outcome = apply_rules("a\nc\n", &rules);
        assert_eq!(outcome.content, "a\nb\nc\n");
        assert_eq!(outcome.applied, vec!["b"]);
    }

    #[test]
    fn test_insert_before_line() {
        let rules = [rule("[extra]", Anchor::line("[urls]"), Placement::Before, "[extra]\nx = 1\n\n")];
        let outcome = apply_rules("[main]\n\n[urls]\nhome = 1\n", &rules);
        assert_eq!(outcome.content, "[main]\n\n[extra]\nx = 1\n\n[urls]\nhome = 1\n");
    }

    #[test]
    fn test_line_anchor_requires_whole_line() {
        // "import pack" must not match "import packer"
        let rules = [rule("import new", Anchor::line("import pack"), Placement::After, "import new\n")];
        let outcome = apply_rules("import packer\nimport pack\n", &rules);
        assert_eq!(outcome.content, "import packer\nimport pack\nimport new\n");
    }

    #[test]
    fn test_only_first_anchor_occurrence() {
        let rules = [rule("x", Anchor::line("a"), Placement::After, "x\n")];
        let outcome = apply_rules("a\na\n", &rules);
        assert_eq!(outcome.content, "a\nx\na\n");
    }

    #[test]
    fn test_anchor_on_last_line_without_newline() {
        let rules = [rule("b", Anchor::line("a"), Placement::After, "b\n")];
        assert_eq!(apply_rules("a", &rules).content, "a\nb\n");
    }

    #[test]
    fn test_crlf_line_anchor() {
        let rules = [rule("b", Anchor::line("a"), Placement::After, "b\r\n")];
        assert_eq!(apply_rules("a\r\nc\r\n", &rules).content, "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn test_match_indent() {
        let rules = [rule("reg(b)", Anchor::line("reg(a)"), Placement::After, "reg(b)\n")
            .with_matching_indent()];
        let outcome = apply_rules("def f():\n    reg(a)\n    return\n", &rules);
        assert_eq!(outcome.content, "def f():\n    reg(a)\n    reg(b)\n    return\n");
    }

    #[test]
    fn test_literal_anchor() {
        let rules = [rule("Y", Anchor::literal("]\n\n[urls]"), Placement::Before, "]\n\nY")];
        let outcome = apply_rules("deps = [\n]\n\n[urls]\n", &rules);
        assert_eq!(outcome.content, "deps = [\n]\n\nY]\n\n[urls]\n");

        let after = [rule("Z", Anchor::literal("[urls]"), Placement::After, "\nZ = 1")];
        assert_eq!(apply_rules("[urls]\n", &after).content, "[urls]\nZ = 1\n");
    }

    #[test]
    fn test_line_matching_anchor() {
        let anchor = Anchor::line_matching(r"^authors\s*=.*$").unwrap();
        let rules = [rule("maintainers", anchor, Placement::After, "maintainers = []\n")];
        let outcome = apply_rules("name = \"x\"\nauthors = [1]\nlicense = \"MIT\"\n", &rules);
        assert_eq!(outcome.content, "name = \"x\"\nauthors = [1]\nmaintainers = []\nlicense = \"MIT\"\n");
        assert!(Anchor::line_matching("(").is_err());
    }

    #[test]
    fn test_missing_anchor_is_skipped() {
        crate::test_utils::init_test_logging(None);
        let rules = [
            rule("x", Anchor::line("nowhere"), Placement::After, "x\n"),
            rule("y", Anchor::line("a"), Placement::After, "y\n"),
        ];
        let outcome = apply_rules("a\n", &rules);
        assert_eq!(outcome.content, "a\ny\n");
        assert_eq!(outcome.missing_anchor, vec!["x"]);
        assert_eq!(outcome.applied, vec!["y"]);
    }

    #[test]
    fn test_rules_see_previous_insertions() {
        let rules = [
            rule("b", Anchor::line("a"), Placement::After, "b\n"),
            rule("c", Anchor::line("b"), Placement::After, "c\n"),
        ];
        assert_eq!(apply_rules("a\n", &rules).content, "a\nb\nc\n");
    }

    #[test]
    fn test_patching_twice_equals_once() {
        let rules = [
            rule("b", Anchor::line("a"), Placement::After, "b\n"),
            rule("[z]", Anchor::line("[end]"), Placement::Before, "[z]\n"),
            rule("never", Anchor::line("missing"), Placement::After, "never\n"),
        ];
        let original = "a\n[end]\n";
        let once = apply_rules(original, &rules);
        let twice = apply_rules(&once.content, &rules);
        assert_eq!(once.content, twice.content);
        assert!(!twice.changed());
        assert_eq!(twice.already_present, vec!["b", "[z]"]);
    }

    #[test]
    fn test_patch_file_leaves_unchanged_file_alone() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("f.txt");
        std::fs::write(&path, "a\nb\n").unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        let rules = [rule("b", Anchor::line("a"), Placement::After, "b\n")];
        let outcome = patch_file(&path, &rules).unwrap();
        assert!(!outcome.changed());
        assert_eq!(std::fs::read(&path).unwrap(), b"a\nb\n");
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
        assert!(!temp.path().join("f.txt.tmp").exists());
    }
}
