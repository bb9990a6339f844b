//! "Is the current version up to date?" decisions.
//!
//! The version recorded in a fork's manifest is not guaranteed to follow the
//! release grammar (a local build may carry `0.80.2.dev1`, for instance), so
//! the comparison degrades in steps:
//!
//! 1. Both sides parse as [`ReleaseVersion`]: numeric ordering.
//! 2. Both sides parse as [`semver::Version`]: semver precedence.
//! 3. Otherwise: plain string comparison. This last step is deprecated. It
//!    misorders multi-digit components (`"9.0.0" >= "10.0.0"` is true as
//!    strings), and a warning is logged whenever it is used.

use semver::Version;
use tracing::warn;

use super::{ReleaseVersion, strip_tag_prefix};

/// Which rule decided a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMethod {
    Release,
    Semver,
    /// Deprecated string fallback; can misorder versions.
    Lexicographic,
}

/// `true` when `current >= latest`.
///
/// A leading `v` is ignored on both sides.
#[must_use]
pub fn is_up_to_date(current: &str, latest: &str) -> bool {
    compare_up_to_date(current, latest).0
}

/// Like [`is_up_to_date`] but also reports which rule was used.
#[must_use]
pub fn compare_up_to_date(current: &str, latest: &str) -> (bool, ComparisonMethod) {
    let current = strip_tag_prefix(current.trim());
    let latest = strip_tag_prefix(latest.trim());

    if let (Ok(c), Ok(l)) = (current.parse::<ReleaseVersion>(), latest.parse::<ReleaseVersion>()) {
        return (c >= l, ComparisonMethod::Release);
    }

    if let (Ok(c), Ok(l)) = (Version::parse(current), Version::parse(latest)) {
        return (c >= l, ComparisonMethod::Semver);
    }

    warn!(
        "Comparing versions '{}' and '{}' as strings; this can misorder versions with \
         different digit counts",
        current, latest
    );
    (current >= latest, ComparisonMethod::Lexicographic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_comparison() {
        assert!(is_up_to_date("1.2.3", "1.2.3"));
        assert!(is_up_to_date("1.2.4", "1.2.3"));
        assert!(!is_up_to_date("1.2.3", "1.2.4"));
        assert!(!is_up_to_date("9.9.9", "10.0.0"));
        assert!(is_up_to_date("10.0.0", "9.0.0"));
        assert!(!is_up_to_date("0.80.2-rc.1", "0.80.2"));
        assert!(is_up_to_date("v0.80.2", "0.80.2"));

        let (_, method) = compare_up_to_date("9.0.0", "10.0.0");
        assert_eq!(method, ComparisonMethod::Release);
    }

    #[test]
    fn test_semver_step_for_non_release_grammar() {
        // "dev" is not an accepted pre-release kind but is valid semver
        let (up_to_date, method) = compare_up_to_date("1.0.0-dev.1", "1.0.0");
        assert_eq!(method, ComparisonMethod::Semver);
        assert!(!up_to_date);

        let (up_to_date, method) = compare_up_to_date("10.0.0+local", "9.0.0");
        assert_eq!(method, ComparisonMethod::Semver);
        assert!(up_to_date);
    }

    #[test]
    fn test_lexicographic_fallback_is_reported() {
        let (up_to_date, method) = compare_up_to_date("0.80.2.dev1", "0.80.2");
        assert_eq!(method, ComparisonMethod::Lexicographic);
        assert!(up_to_date);

        // The known misordering of the fallback
        let (up_to_date, method) = compare_up_to_date("9.0", "10.0");
        assert_eq!(method, ComparisonMethod::Lexicographic);
        assert!(up_to_date);
    }
}
