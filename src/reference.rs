//! Parsing of user-supplied action references.
//!
//! The grammar is `owner/repo(@ref)?`. The string is split at the last `@`;
//! an empty ref means "resolve the latest release", the literal `latest`
//! means "latest tag only", and anything else is used verbatim as a branch,
//! tag, or commit. Subpaths are never part of the reference; they are found
//! by schema discovery.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The literal ref token that asks for the newest tag.
pub const LATEST: &str = "latest";

fn org_repo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9_.-]+$").expect("static pattern")
    })
}

/// What the caller asked for after the `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefRequest {
    /// No ref: prefer a major tag, then a semver tag, then the default branch.
    Unspecified,
    /// `latest`: like `Unspecified`, but never falls back to a branch.
    Latest,
    /// A branch, tag, or commit used verbatim.
    Explicit(String),
}

/// An `owner/repo` coordinate plus an optional ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReference {
    pub org_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
}

impl ActionReference {
    /// Parses `owner/repo[@ref]`.
    ///
    /// A leading `https://github.com/` and a trailing `.git` are tolerated so
    /// that URLs copied from a browser work.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (coordinate, r#ref) = match trimmed.rfind('@') {
            Some(at) => (&trimmed[..at], Some(&trimmed[at + 1..])),
            None => (trimmed, None),
        };

        let coordinate = normalize_coordinate(coordinate);

        if coordinate.matches('/').count() > 1 {
            return Err(Error::InvalidReference {
                input: input.to_string(),
                message: "expected exactly one '/' between owner and repository".to_string(),
                hint: Some(
                    "Subpaths are discovered automatically; reference the repository only"
                        .to_string(),
                ),
            });
        }

        if !org_repo_pattern().is_match(&coordinate) {
            return Err(Error::InvalidReference {
                input: input.to_string(),
                message: "expected owner/repo".to_string(),
                hint: Some("Use the form owner/repo or owner/repo@ref".to_string()),
            });
        }

        Ok(Self {
            org_repo: coordinate,
            r#ref: r#ref
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        })
    }

    pub fn new(org_repo: impl Into<String>, r#ref: Option<String>) -> Self {
        Self {
            org_repo: org_repo.into(),
            r#ref,
        }
    }

    /// Classifies the ref part of the reference.
    pub fn request(&self) -> RefRequest {
        match self.r#ref.as_deref() {
            None => RefRequest::Unspecified,
            Some(LATEST) => RefRequest::Latest,
            Some(other) => RefRequest::Explicit(other.to_string()),
        }
    }

    /// The owner half of `owner/repo`, which names the output namespace.
    pub fn owner(&self) -> &str {
        split_org_repo(&self.org_repo).0
    }

    /// The repository half of `owner/repo`.
    pub fn repo(&self) -> &str {
        split_org_repo(&self.org_repo).1
    }
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.r#ref {
            Some(r) => write!(f, "{}@{}", self.org_repo, r),
            None => write!(f, "{}", self.org_repo),
        }
    }
}

/// Splits `owner/repo` into its halves. A string without `/` is all owner.
pub fn split_org_repo(org_repo: &str) -> (&str, &str) {
    org_repo.split_once('/').unwrap_or((org_repo, ""))
}

fn normalize_coordinate(coordinate: &str) -> String {
    let without_scheme = coordinate
        .strip_prefix("https://github.com/")
        .or_else(|| coordinate.strip_prefix("http://github.com/"))
        .or_else(|| coordinate.strip_prefix("github.com/"))
        .unwrap_or(coordinate);
    let without_suffix = without_scheme.strip_suffix(".git").unwrap_or(without_scheme);
    without_suffix.trim_end_matches('/').to_string()
}
