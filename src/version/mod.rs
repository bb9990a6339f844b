//! Release version validation and ordering.
//!
//! Upstream releases are tagged `vMAJOR.MINOR.PATCH` with an optional
//! `-alpha.N`, `-beta.N` or `-rc.N` suffix. [`ReleaseVersion`] is the parsed
//! form of such a tag; it is the only way a version reaches URL construction,
//! so a malformed string is rejected before any network or file operation.
//!
//! # Ordering
//!
//! [`ReleaseVersion`] orders by numeric components, then by pre-release rank
//! (`alpha < beta < rc < final release`), then by the pre-release number.
//! String comparison is never used for parsed versions; `"9.9.9" < "10.0.0"`
//! holds as expected.
//!
//! ```rust
//! use packn_sync::version::ReleaseVersion;
//!
//! let old: ReleaseVersion = "9.9.9".parse().unwrap();
//! let new: ReleaseVersion = "10.0.0".parse().unwrap();
//! assert!(old < new);
//!
//! let rc: ReleaseVersion = "1.0.0-rc.1".parse().unwrap();
//! let final_release: ReleaseVersion = "1.0.0".parse().unwrap();
//! assert!(rc < final_release);
//! ```
//!
//! Comparing versions that may not follow the grammar (for example the
//! version currently recorded in a manifest) goes through
//! [`comparison::is_up_to_date`].

pub mod comparison;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::SyncError;

pub use comparison::{ComparisonMethod, is_up_to_date};

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-(alpha|beta|rc)\.(\d+))?$")
        .expect("version pattern is valid")
});

/// Pre-release channel, in increasing rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreReleaseKind {
    Alpha,
    Beta,
    Rc,
}

impl PreReleaseKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Rc => "rc",
        }
    }
}

/// A pre-release suffix such as `beta.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub kind: PreReleaseKind,
    pub number: u64,
}

/// A validated upstream release version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
}

impl ReleaseVersion {
    /// Parse a version, accepting an optional leading `v` as found in tags.
    pub fn from_tag(tag: &str) -> Result<Self, SyncError> {
        strip_tag_prefix(tag).parse()
    }

    /// Git tag for this version (`v1.2.3`).
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{self}")
    }

    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl FromStr for ReleaseVersion {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SyncError::InvalidVersion {
            version: s.to_string(),
        };
        let caps = VERSION_PATTERN.captures(s).ok_or_else(invalid)?;
        let number = |idx: usize| -> Result<u64, SyncError> {
            caps[idx].parse::<u64>().map_err(|_| invalid())
        };

        let pre = match caps.get(4) {
            Some(kind) => Some(PreRelease {
                kind: match kind.as_str() {
                    "alpha" => PreReleaseKind::Alpha,
                    "beta" => PreReleaseKind::Beta,
                    _ => PreReleaseKind::Rc,
                },
                number: number(5)?,
            }),
            None => None,
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre,
        })
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)).then_with(
            || match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A final release outranks any of its pre-releases
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            },
        )
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}.{}", pre.kind.as_str(), pre.number)?;
        }
        Ok(())
    }
}

/// Reject anything that is not `MAJOR.MINOR.PATCH[-(alpha|beta|rc).N]`.
///
/// No `v` prefix is accepted here; use [`strip_tag_prefix`] first for tags.
pub fn validate_version(version: &str) -> Result<(), SyncError> {
    version.parse::<ReleaseVersion>().map(|_| ())
}

/// Strip a single leading `v` from a release tag.
#[must_use]
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}
