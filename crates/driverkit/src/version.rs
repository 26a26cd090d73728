//! Version resolution and validation.
//!
//! A run either installs an explicitly requested version or asks the release
//! server for the latest one. Either way the string must parse as a version
//! constraint before anything else happens.
//!
//! The grammar is the Composer constraint language, so constraints such as
//! `^2.0` or `>=2.40 <3.0` validate as well as exact versions:
//!
//! ```
//! use driverkit::version;
//!
//! assert!(version::validate("2.41").is_ok());
//! assert!(version::validate("^2.0").is_ok());
//! assert!(version::validate("not-a-version!!").is_err());
//! ```

use crate::error::{Error, Result};
use crate::remote::{Endpoints, Remote};
use regex::Regex;
use std::sync::LazyLock;

/// Operator, version with up to four numeric parts (last may be a
/// wildcard), optional stability suffix and build metadata.
static CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^
        (?:>=|<=|<>|!=|==|>|<|=|\^|~)?
        v?
        [0-9]+ (?: (?:\.[0-9]+){0,2} \.[*x] | (?:\.[0-9]+){0,3} )
        (?:
            [._-]?
            (?:stable|beta|b|rc|alpha|a|patch|pl|p)
            (?:[.-]?[0-9]+)*
        )?
        (?:[.-]?dev)?
        (?:\+[0-9a-z.-]+)?
        $",
    )
    .expect("valid constraint regex")
});

/// Branch names such as `dev-master` or `2.x-dev`. Names never contain a
/// path separator or `..`, so a version always maps to one cache directory.
static BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^
        (?:
            dev- [0-9a-z_-]+ (?:\.[0-9a-z_-]+)*
          | v? [0-9]+ (?:\.(?:[0-9]+|x)){0,2} \.x-dev
        )
        $",
    )
    .expect("valid branch regex")
});

/// Stability flag appended to a constraint, e.g. `@dev`.
static STABILITY_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)@(?:stable|rc|beta|alpha|dev)$").expect("valid stability regex")
});

/// Hyphen range, e.g. `1.0 - 2.0`.
static HYPHEN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+-\s+(\S+)$").expect("valid range regex"));

/// Resolve the version to install.
///
/// A requested version is returned verbatim. Without one (or with an empty
/// one) the latest release is fetched from the server; a failed request
/// yields an empty string, which [`validate`] then rejects.
pub fn resolve(requested: Option<&str>, remote: &dyn Remote, endpoints: &Endpoints) -> String {
    if let Some(version) = requested.filter(|v| !v.is_empty()) {
        return version.to_string();
    }

    let url = endpoints.latest_release_url();
    log::info!("Polling for the latest version of ChromeDriver");

    match remote.fetch_text(&url) {
        Ok(body) => body.trim().to_string(),
        Err(e) => {
            log::debug!("Latest release lookup failed: {e}");
            String::new()
        }
    }
}

/// Check that a string parses as a version constraint.
///
/// # Errors
///
/// Returns `Error::InvalidVersion` carrying the offending string.
pub fn validate(version: &str) -> Result<()> {
    if is_valid_constraint(version) {
        Ok(())
    } else {
        Err(Error::InvalidVersion(version.to_string()))
    }
}

/// Whether the whole expression parses.
fn is_valid_constraint(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.is_empty() {
        return false;
    }

    let alternatives: Vec<&str> = if expr.contains("||") {
        expr.split("||").collect()
    } else {
        expr.split('|').collect()
    };

    alternatives
        .into_iter()
        .all(|alternative| is_valid_conjunction(alternative.trim()))
}

/// Whether an `AND` group (comma or whitespace separated) parses.
fn is_valid_conjunction(group: &str) -> bool {
    if group.is_empty() {
        return false;
    }

    if let Some(caps) = HYPHEN_RANGE.captures(group) {
        return is_plain_version(&caps[1]) && is_plain_version(&caps[2]);
    }

    let mut atoms: Vec<String> = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for token in group.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if is_bare_operator(token) {
            if pending_operator.is_some() {
                return false;
            }
            pending_operator = Some(token);
            continue;
        }
        match pending_operator.take() {
            Some(op) => atoms.push(format!("{op}{token}")),
            None => atoms.push(token.to_string()),
        }
    }

    pending_operator.is_none() && !atoms.is_empty() && atoms.iter().all(|a| is_valid_atom(a))
}

fn is_valid_atom(atom: &str) -> bool {
    let atom = STABILITY_FLAG.replace(atom, "");
    if atom.is_empty() {
        // A bare flag such as `@dev` stands for "any version".
        return true;
    }
    atom == "*" || BRANCH.is_match(&atom) || CONSTRAINT.is_match(&atom)
}

/// Hyphen range bounds take no operator.
fn is_plain_version(version: &str) -> bool {
    !version.starts_with(['>', '<', '=', '!', '^', '~']) && CONSTRAINT.is_match(version)
}

fn is_bare_operator(token: &str) -> bool {
    matches!(
        token,
        ">=" | "<=" | "<>" | "!=" | "==" | ">" | "<" | "=" | "^" | "~"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemote;

    #[test]
    fn test_validate_accepts_exact_versions() {
        for version in ["2.41", "2", "2.41.578700", "114.0.5735.90", "v2.41"] {
            assert!(validate(version).is_ok(), "{version}");
        }
    }

    #[test]
    fn test_validate_accepts_constraints() {
        for constraint in [
            "^2.0",
            "~2.40",
            ">=2.40",
            ">=2.40 <3.0",
            ">= 2.40, < 3.0",
            "2.*",
            "2.40.x",
            "*",
            "1.0 - 2.0",
            "~1.2 || ^2.0",
            "2.40|2.41",
            "!=2.39",
            "2.0.0-beta.2",
            "2.0-RC1",
            "2.41@dev",
            "dev-master",
            "dev-release-2.41",
            "2.x-dev",
            "1.2.3.x",
        ] {
            assert!(validate(constraint).is_ok(), "{constraint}");
        }
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for bad in [
            "not-a-version!!",
            "",
            "   ",
            ">=",
            "^",
            "1..2",
            "1.2.3.4.5",
            "2.41 ||",
            "|| 2.41",
            ">= >= 2.0",
            "2.41-banana",
            "<html>",
            "1.2.3.4.x",
            "\u{662}.\u{664}\u{661}",
            "dev-../../../escape",
            "dev-feature/login",
            "dev-a..b",
        ] {
            assert!(validate(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_validate_error_carries_input() {
        match validate("not-a-version!!") {
            Err(Error::InvalidVersion(v)) => assert_eq!(v, "not-a-version!!"),
            other => panic!("Expected InvalidVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_uses_requested_verbatim() {
        let remote = MockRemote::new();
        let endpoints = Endpoints::default();

        assert_eq!(resolve(Some("2.41"), &remote, &endpoints), "2.41");
        assert!(remote.requests().is_empty());
    }

    #[test]
    fn test_resolve_latest_trims_body() {
        let mut remote = MockRemote::new();
        let endpoints = Endpoints::with_base("mock://dl");
        remote.add_text("mock://dl/LATEST_RELEASE", "2.41\n");

        assert_eq!(resolve(None, &remote, &endpoints), "2.41");
        assert_eq!(remote.requests().len(), 1);
    }

    #[test]
    fn test_resolve_empty_request_polls_latest() {
        let mut remote = MockRemote::new();
        let endpoints = Endpoints::with_base("mock://dl");
        remote.add_text("mock://dl/LATEST_RELEASE", " 2.40 ");

        assert_eq!(resolve(Some(""), &remote, &endpoints), "2.40");
    }

    #[test]
    fn test_resolve_network_failure_fails_validation() {
        let remote = MockRemote::new();
        let endpoints = Endpoints::with_base("mock://dl");

        let version = resolve(None, &remote, &endpoints);
        assert_eq!(version, "");
        assert!(validate(&version).is_err());
    }
}
