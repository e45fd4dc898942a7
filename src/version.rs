//! # Tag Selection
//!
//! Picks the tag an unpinned reference should resolve to.
//!
//! Action publishers conventionally move a major-version tag (`v4`) forward
//! with every compatible release. A "major-only" tag is therefore preferred
//! over any full semantic version tag:
//!
//! 1.  **Major-only tags**: after stripping an optional leading `v`, the name
//!     is all digits. The numerically greatest one wins.
//! 2.  **Semantic version tags**: otherwise the greatest tag that parses as a
//!     semantic version (with optional `v`) wins, using semver precedence, so
//!     prereleases lose to the release they precede.
//!
//! Prerelease tags never take part in the major-only comparison because their
//! names are not all digits.

use semver::Version;

/// Which rule picked a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    MajorOnly,
    Semver,
}

/// Returns the major number of a tag like `v4` or `12`.
pub fn parse_major_tag(tag: &str) -> Option<u64> {
    let tag = tag.strip_prefix("refs/tags/").unwrap_or(tag);
    let digits = tag.strip_prefix('v').unwrap_or(tag);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a tag string into a semantic version
pub fn parse_semver_tag(tag: &str) -> Option<Version> {
    let tag = tag.strip_prefix("refs/tags/").unwrap_or(tag);
    let version_str = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(version_str).ok()
}

/// Filter git tags to semantic versions only
pub fn filter_semver_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter(|tag| parse_semver_tag(tag).is_some())
        .cloned()
        .collect()
}

/// Find the numerically greatest major-only tag.
///
/// Ties (`v4` and `4`) keep the first tag seen.
pub fn find_major_tag(tags: &[String]) -> Option<(String, u64)> {
    let mut best: Option<(String, u64)> = None;

    for tag in tags {
        if let Some(major) = parse_major_tag(tag) {
            match best {
                Some((_, current)) if current >= major => {}
                _ => best = Some((tag.clone(), major)),
            }
        }
    }

    best
}

/// Find the latest version from a list of semantic version tags
pub fn find_latest_version(tags: &[String]) -> Option<(String, Version)> {
    let mut latest: Option<(String, Version)> = None;

    for tag in tags {
        if let Some(version) = parse_semver_tag(tag) {
            if let Some((_, ref latest_ver)) = latest {
                if version > *latest_ver {
                    latest = Some((tag.clone(), version));
                }
            } else {
                latest = Some((tag.clone(), version));
            }
        }
    }

    latest
}

/// Applies the tag-preference rules to a tag listing.
pub fn preferred_tag(tags: &[String]) -> Option<(String, TagKind)> {
    if let Some((tag, _)) = find_major_tag(tags) {
        return Some((tag, TagKind::MajorOnly));
    }
    find_latest_version(tags).map(|(tag, _)| (tag, TagKind::Semver))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_major_tag() {
        assert_eq!(parse_major_tag("v4"), Some(4));
        assert_eq!(parse_major_tag("12"), Some(12));
        assert_eq!(parse_major_tag("refs/tags/v3"), Some(3));
        assert_eq!(parse_major_tag("v4.1"), None);
        assert_eq!(parse_major_tag("v"), None);
        assert_eq!(parse_major_tag(""), None);
        assert_eq!(parse_major_tag("vv4"), None);
        assert_eq!(parse_major_tag("v4-beta"), None);
    }

    #[test]
    fn test_parse_semver_tag_variations() {
        assert_eq!(
            parse_semver_tag("v2.1.3-alpha"),
            Some(Version::parse("2.1.3-alpha").unwrap())
        );
        assert_eq!(
            parse_semver_tag("3.0.0"),
            Some(Version::parse("3.0.0").unwrap())
        );
        assert_eq!(parse_semver_tag("v1.0"), None);
        assert_eq!(parse_semver_tag("not-a-version"), None);
    }

    #[test]
    fn test_filter_semver_tags() {
        let filtered = filter_semver_tags(&tags(&["v1.0.0", "main", "v2", "2.0.0"]));
        assert_eq!(filtered, vec!["v1.0.0", "2.0.0"]);
    }

    #[test]
    fn test_major_tag_preferred_over_patch() {
        let picked = preferred_tag(&tags(&["v4.1.2", "v4.1.0", "v4", "v3"])).unwrap();
        assert_eq!(picked, ("v4".to_string(), TagKind::MajorOnly));
    }

    #[test]
    fn test_semver_fallback_without_major_tags() {
        let picked = preferred_tag(&tags(&["4.1.2", "4.1.1", "4.0.0"])).unwrap();
        assert_eq!(picked, ("4.1.2".to_string(), TagKind::Semver));
    }

    #[test]
    fn test_prerelease_never_wins_major_comparison() {
        let picked =
            preferred_tag(&tags(&["v4.1.0-beta.1", "v4.1.2", "v4", "v3.6.0"])).unwrap();
        assert_eq!(picked.0, "v4");
    }

    #[test]
    fn test_prerelease_loses_semver_comparison() {
        let picked = preferred_tag(&tags(&["v2.0.0-rc.1", "v1.9.0", "v2.0.0"])).unwrap();
        assert_eq!(picked.0, "v2.0.0");
    }

    #[test]
    fn test_major_numeric_not_lexical() {
        let picked = find_major_tag(&tags(&["v9", "v10", "v2"])).unwrap();
        assert_eq!(picked, ("v10".to_string(), 10));
    }

    #[test]
    fn test_no_usable_tags() {
        assert_eq!(preferred_tag(&tags(&["nightly", "stable"])), None);
        assert_eq!(preferred_tag(&[]), None);
    }
}
