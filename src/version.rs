//! A total order over release, pre-release, build-metadata, and
//! pseudo-version strings.

use crate::errors::{Error, Result, VersionRole};

/// Strip a single leading `v`, if present.
pub(crate) fn normalize(raw: &str) -> &str {
    raw.strip_prefix('v').unwrap_or(raw)
}

/// A pseudo-version is `<anything>-<14 digits>-<12 lowercase hex>`, i.e. at
/// least three dash-separated segments where the penultimate segment is
/// exactly 14 digits and the final segment is exactly 12 lowercase hex
/// characters.
pub fn is_pseudo_version(raw: &str) -> bool {
    let normalized = normalize(raw);
    let segments: Vec<&str> = normalized.split('-').collect();
    if segments.len() < 3 {
        return false;
    }
    let hash = segments[segments.len() - 1];
    let timestamp = segments[segments.len() - 2];
    is_exact_len_digits(timestamp, 14) && is_exact_len_lower_hex(hash, 12)
}

fn is_exact_len_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_digit())
}

fn is_exact_len_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Compares `current` against `target`, returning whether `current` needs to
/// be updated to reach `target` (`current < target`).
///
/// - If `current` is a pseudo-version and `target` is not, an update is
///   always needed (a pseudo-version is assumed to predate any tagged
///   release).
/// - If both are pseudo-versions, they compare by byte-lexical order on
///   their normalized strings (valid only when both share the same base
///   version).
/// - Otherwise both are parsed as semantic versions; build metadata is
///   ignored and pre-release precedence follows SemVer 2.0 rules (numeric
///   identifiers compare numerically, alphanumeric lexically, a pre-release
///   is always less than the same version without one).
pub fn compare_versions(current: &str, target: &str) -> Result<bool> {
    let current_pseudo = is_pseudo_version(current);
    let target_pseudo = is_pseudo_version(target);

    if current_pseudo && !target_pseudo {
        return Ok(true);
    }
    if current_pseudo && target_pseudo {
        return Ok(normalize(current) < normalize(target));
    }

    let current_semver = parse_semver(current, VersionRole::Current)?;
    let target_semver = parse_semver(target, VersionRole::Target)?;
    Ok(current_semver < target_semver)
}

fn parse_semver(raw: &str, role: VersionRole) -> Result<semver::Version> {
    semver::Version::parse(normalize(raw)).map_err(|_| Error::InvalidVersion {
        role,
        value: raw.to_string(),
    })
}
