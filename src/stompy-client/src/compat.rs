//! Client/server version compatibility check.

/// Warning text when `cli_version` is older than `min_required`, `None` otherwise.
///
/// Empty or `dev` client versions and anything that is not a plain
/// `major.minor.patch` (optionally `v`-prefixed, pre-release suffixes
/// ignored) are treated as compatible.
pub fn check_compat(cli_version: &str, min_required: &str) -> Option<String> {
    if cli_version.is_empty() || cli_version == "dev" || min_required.is_empty() {
        return None;
    }

    let cli = parse_semver(cli_version)?;
    let min = parse_semver(min_required)?;

    (cli < min).then(|| {
        format!(
            "Warning: stompy-cli {cli_version} is below minimum supported version {min_required}. Run 'stompy update' to upgrade."
        )
    })
}

/// `[major, minor, patch]` from `1.2.3`, `v1.2.3` or `1.2.3-beta`.
fn parse_semver(version: &str) -> Option<[u64; 3]> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let parts: Vec<&str> = version.splitn(3, '.').collect();
    if parts.len() != 3 {
        return None;
    }

    let mut out = [0u64; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        let numeric = part.split(['-', '+']).next().unwrap_or(part);
        *slot = numeric.parse().ok()?;
    }
    Some(out)
}
