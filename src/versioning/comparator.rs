//! Version/tag string ordering shared by all fetchers.
//!
//! `compare_versions` returns `Ordering::Less` when `a` is *newer* than `b`,
//! so sorting a tag list with it yields newest-first order. Callers rely on
//! index 0 being the latest tag, so this sign convention must not change.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static SEMVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[vV]?\d+\.\d+\.\d+(-[0-9A-Za-z.\-]+)?(\+[0-9A-Za-z.\-]+)?$").unwrap()
});

static STRICT_SEMVER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[vV]?\d+\.\d+\.\d+$").unwrap());

/// Loose semver shape: optional `v` prefix, optional prerelease/build suffix.
/// Excludes `latest`, branch names and SHA-style tags.
pub fn is_semver(tag: &str) -> bool {
    SEMVER_RE.is_match(tag)
}

/// Exactly MAJOR.MINOR.PATCH (optional `v` prefix), no suffix. Used by the
/// container-registry fetchers, which drop prerelease-style tags entirely.
pub fn is_strict_semver(tag: &str) -> bool {
    STRICT_SEMVER_RE.is_match(tag)
}

fn strip_v_prefix(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Newest-first comparator. Never panics on malformed input; non-numeric
/// segments fall back to lexicographic comparison.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = strip_v_prefix(a).split(['.', '-']).collect();
    let b_parts: Vec<&str> = strip_v_prefix(b).split(['.', '-']).collect();

    let len = a_parts.len().max(b_parts.len());
    for i in 0..len {
        // Missing trailing parts default to 0, so "1.2" == "1.2.0".
        let pa = a_parts.get(i).copied().unwrap_or("0");
        let pb = b_parts.get(i).copied().unwrap_or("0");

        match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => {
                if na != nb {
                    return nb.cmp(&na);
                }
            }
            _ => {
                if pa != pb {
                    return pb.cmp(pa);
                }
            }
        }
    }

    Ordering::Equal
}

/// Sorts tags in place, newest first. Stable, comparator-only (no secondary
/// tie-break key).
pub fn sort_newest_first(tags: &mut [String]) {
    tags.sort_by(|a, b| compare_versions(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_major_sorts_first() {
        assert_eq!(compare_versions("v2.0.0", "1.9.9"), Ordering::Less);
        assert_eq!(compare_versions("1.9.9", "v2.0.0"), Ordering::Greater);
    }

    #[test]
    fn equal_versions_ignore_prefix() {
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("v1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("V1.0.0", "v1.0.0"), Ordering::Equal);
    }

    #[test]
    fn segments_compare_numerically_not_lexicographically() {
        // 1.10.0 is newer than 1.2.0.
        assert_eq!(compare_versions("1.2.0", "1.10.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.10.0", "1.2.0"), Ordering::Less);
    }

    #[test]
    fn missing_trailing_parts_default_to_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2.1", "1.2"), Ordering::Less);
    }

    #[test]
    fn antisymmetry_over_sample_pairs() {
        let versions = ["1.0.0", "v2.3.4", "0.9.9", "1.0.1", "10.0.0", "1.0.0-rc.1"];
        for a in versions {
            for b in versions {
                let ab = compare_versions(a, b);
                let ba = compare_versions(b, a);
                assert_eq!(ab, ba.reverse(), "compare({a}, {b}) not antisymmetric");
            }
        }
    }

    #[test]
    fn malformed_input_does_not_panic() {
        compare_versions("", "");
        compare_versions("not-a-version", "1.0.0");
        compare_versions("1..2", "1.2");
    }

    #[test]
    fn sort_puts_newest_at_index_zero() {
        let mut tags = vec![
            "1.2.0".to_string(),
            "v2.0.0".to_string(),
            "1.10.0".to_string(),
            "0.1.0".to_string(),
        ];
        sort_newest_first(&mut tags);
        assert_eq!(tags[0], "v2.0.0");
        assert_eq!(tags[1], "1.10.0");
        assert_eq!(tags[3], "0.1.0");
    }

    #[test]
    fn semver_filter_accepts_release_shapes() {
        assert!(is_semver("v1.2.3"));
        assert!(is_semver("1.2.3"));
        assert!(is_semver("2.0.0-rc.1"));
        assert!(is_semver("1.2.3+build.5"));
    }

    #[test]
    fn semver_filter_rejects_branch_and_sha_tags() {
        assert!(!is_semver("latest"));
        assert!(!is_semver("main"));
        assert!(!is_semver("sha-abc123"));
        assert!(!is_semver("1.2"));
        assert!(!is_semver(""));
    }

    #[test]
    fn strict_semver_rejects_suffixes() {
        assert!(is_strict_semver("v1.2.3"));
        assert!(is_strict_semver("1.2.3"));
        assert!(!is_strict_semver("2.0.0-rc.1"));
        assert!(!is_strict_semver("latest"));
    }
}
