//! Composer-style version range handling.
//!
//! Manifest constraints follow Composer semantics, which differ from
//! Cargo's in two ways that matter here: a bare version is an exact
//! match, and `~X.Y` allows everything up to the next major release.

use crate::error::{AuditError, Result};

/// Check whether a version satisfies a Composer constraint expression.
///
/// Supported syntax: exact versions, comparison operators, `^` and `~`
/// ranges, `*` / `X.Y.*` wildcards, hyphen ranges, `||` alternatives and
/// whitespace/comma conjunctions.
pub fn satisfies(version: &semver::Version, constraint: &str) -> Result<bool> {
    let alternatives = parse_alternatives(constraint)?;
    Ok(alternatives
        .iter()
        .any(|bounds| bounds.iter().all(|b| b.contains(version))))
}

/// Parse a version that may be missing parts or carry distribution
/// suffixes, e.g. `7.4`, `v2.1`, `8.1.2-1ubuntu2.14`, `103.0.5.1`.
pub fn parse_loose(version: &str) -> Result<semver::Version> {
    let trimmed = version.trim().trim_start_matches('v');
    let numeric: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let parts: Vec<&str> = numeric
        .split('.')
        .filter(|p| !p.is_empty())
        .take(3)
        .collect();
    if parts.is_empty() {
        // No usable digits at all; report the semver error for the raw input.
        return semver::Version::parse(trimmed).map_err(|source| AuditError::Version {
            version: version.to_string(),
            source,
        });
    }

    let mut candidate = parts.join(".");
    for _ in parts.len()..3 {
        candidate.push_str(".0");
    }
    semver::Version::parse(&candidate).map_err(|source| AuditError::Version {
        version: version.to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Exact(semver::Version),
    Greater(semver::Version),
    GreaterEq(semver::Version),
    Less(semver::Version),
    LessEq(semver::Version),
    NotEqual(semver::Version),
    Any,
}

impl Bound {
    fn contains(&self, version: &semver::Version) -> bool {
        match self {
            Bound::Exact(v) => version == v,
            Bound::Greater(v) => version > v,
            Bound::GreaterEq(v) => version >= v,
            Bound::Less(v) => version < v,
            Bound::LessEq(v) => version <= v,
            Bound::NotEqual(v) => version != v,
            Bound::Any => true,
        }
    }
}

/// Split on `|` / `||` into OR-alternatives, each a set of AND-bounds.
fn parse_alternatives(constraint: &str) -> Result<Vec<Vec<Bound>>> {
    let mut alternatives = Vec::new();
    for alternative in constraint.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        alternatives.push(parse_conjunction(alternative, constraint)?);
    }
    if alternatives.is_empty() {
        return Err(AuditError::constraint(constraint, "empty constraint"));
    }
    Ok(alternatives)
}

fn parse_conjunction(expr: &str, raw: &str) -> Result<Vec<Bound>> {
    // Hyphen ranges are written with spaces around the dash, so they have
    // to be recognized before the conjunction is tokenized.
    if let Some((low, high)) = expr.split_once(" - ") {
        return hyphen_range(low.trim(), high.trim(), raw);
    }

    let mut bounds = Vec::new();
    let mut tokens = expr
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());
    while let Some(token) = tokens.next() {
        // Composer allows whitespace between an operator and its version.
        let merged;
        let token = if is_operator(token) {
            match tokens.next() {
                Some(next) => {
                    merged = format!("{token}{next}");
                    merged.as_str()
                }
                None => {
                    return Err(AuditError::constraint(
                        raw,
                        format!("dangling operator \"{token}\""),
                    ))
                }
            }
        } else {
            token
        };
        bounds.extend(parse_simple(token, raw)?);
    }
    if bounds.is_empty() {
        return Err(AuditError::constraint(raw, "empty constraint"));
    }
    Ok(bounds)
}

fn is_operator(token: &str) -> bool {
    matches!(
        token,
        ">" | ">=" | "<" | "<=" | "=" | "==" | "!=" | "^" | "~"
    )
}

fn parse_simple(token: &str, raw: &str) -> Result<Vec<Bound>> {
    // Stability flags like `1.0.*@dev` do not affect range checks here.
    let token = match token.split_once('@') {
        Some((t, _)) => t,
        None => token,
    };

    if token == "*" || token == "x" || token == "X" {
        return Ok(vec![Bound::Any]);
    }

    if let Some(rest) = token.strip_prefix('^') {
        let (version, _) = parse_partial(rest, raw)?;
        let upper = caret_upper(&version);
        return Ok(vec![Bound::GreaterEq(version), Bound::Less(upper)]);
    }
    if let Some(rest) = token.strip_prefix('~') {
        let (version, parts) = parse_partial(rest, raw)?;
        let upper = tilde_upper(&version, parts);
        return Ok(vec![Bound::GreaterEq(version), Bound::Less(upper)]);
    }
    if let Some(rest) = token.strip_prefix(">=") {
        return Ok(vec![Bound::GreaterEq(parse_partial(rest, raw)?.0)]);
    }
    if let Some(rest) = token.strip_prefix("<=") {
        return Ok(vec![Bound::LessEq(parse_partial(rest, raw)?.0)]);
    }
    if let Some(rest) = token.strip_prefix("!=") {
        return Ok(vec![Bound::NotEqual(parse_partial(rest, raw)?.0)]);
    }
    if let Some(rest) = token.strip_prefix('>') {
        return Ok(vec![Bound::Greater(parse_partial(rest, raw)?.0)]);
    }
    if let Some(rest) = token.strip_prefix('<') {
        return Ok(vec![Bound::Less(parse_partial(rest, raw)?.0)]);
    }

    let wildcard = token
        .strip_suffix(".*")
        .or_else(|| token.strip_suffix(".x"))
        .or_else(|| token.strip_suffix(".X"));
    if let Some(rest) = wildcard {
        let (version, parts) = parse_partial(rest, raw)?;
        let upper = bump_last(&version, parts);
        return Ok(vec![Bound::GreaterEq(version), Bound::Less(upper)]);
    }

    // Bare versions are exact matches in Composer, unlike Cargo.
    let rest = token
        .strip_prefix("==")
        .or_else(|| token.strip_prefix('='))
        .unwrap_or(token);
    Ok(vec![Bound::Exact(parse_partial(rest, raw)?.0)])
}

/// `A - B`: inclusive lower bound; the upper bound is inclusive for a full
/// version and `< bump` when partial (`1.0 - 2.0` allows 2.0.x).
fn hyphen_range(low: &str, high: &str, raw: &str) -> Result<Vec<Bound>> {
    let (low_version, _) = parse_partial(low, raw)?;
    let (high_version, high_parts) = parse_partial(high, raw)?;
    let upper = if high_parts < 3 {
        Bound::Less(bump_last(&high_version, high_parts))
    } else {
        Bound::LessEq(high_version)
    };
    Ok(vec![Bound::GreaterEq(low_version), upper])
}

/// Parse a possibly partial constraint version, returning the padded
/// version and how many parts were actually given.
fn parse_partial(version: &str, raw: &str) -> Result<(semver::Version, usize)> {
    let version = version.trim().trim_start_matches('v');
    if version.is_empty() {
        return Err(AuditError::constraint(raw, "missing version"));
    }

    let (numbers, pre) = match version.split_once('-') {
        Some((n, p)) => (n, Some(p)),
        None => (version, None),
    };
    let given: Vec<&str> = numbers.split('.').take(3).collect();
    let parts = given.len();

    let mut candidate = given.join(".");
    for _ in parts..3 {
        candidate.push_str(".0");
    }
    if let Some(pre) = pre {
        candidate.push('-');
        candidate.push_str(pre);
    }

    let parsed = semver::Version::parse(&candidate)
        .map_err(|e| AuditError::constraint(raw, e.to_string()))?;
    Ok((parsed, parts))
}

/// `^` bumps the leftmost non-zero component.
fn caret_upper(v: &semver::Version) -> semver::Version {
    if v.major > 0 {
        semver::Version::new(v.major + 1, 0, 0)
    } else if v.minor > 0 {
        semver::Version::new(0, v.minor + 1, 0)
    } else {
        semver::Version::new(0, 0, v.patch + 1)
    }
}

/// Composer `~` lets the last given part float: `~1.2` is `<2.0.0`,
/// `~1.2.3` is `<1.3.0`.
fn tilde_upper(v: &semver::Version, parts: usize) -> semver::Version {
    if parts <= 2 {
        semver::Version::new(v.major + 1, 0, 0)
    } else {
        semver::Version::new(v.major, v.minor + 1, 0)
    }
}

fn bump_last(v: &semver::Version, parts: usize) -> semver::Version {
    match parts {
        1 => semver::Version::new(v.major + 1, 0, 0),
        2 => semver::Version::new(v.major, v.minor + 1, 0),
        _ => semver::Version::new(v.major, v.minor, v.patch + 1),
    }
}
