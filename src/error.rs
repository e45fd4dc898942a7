//! # Error Handling
//!
//! This module defines the centralized error type for `action-synth`. It uses
//! `thiserror` to describe every anticipated failure mode of the registration
//! and synthesis pipeline with a clear, user-facing message.
//!
//! ## Taxonomy
//!
//! - **`InvalidReference`**: the `owner/repo[@ref]` string is malformed. Always
//!   fatal to the single request.
//! - **`RevisionResolutionFailed`**: no tag, branch, or commit matched. Fatal to
//!   the request and never retried.
//! - **`SchemaNotFound`** / **`SchemaParse`**: a declared action schema is
//!   missing or unreadable at a location. Fatal when it is the only location
//!   attempted, otherwise recorded as a partial failure.
//! - **`RegistryCorrupt`**: the registry document failed to parse. The
//!   document is never repaired automatically.
//! - **`Filesystem`**: an I/O failure while writing or deleting. Callers
//!   decide whether it is fatal (tracked generated files) or a warning
//!   (best-effort cleanup).
//!
//! No operation retries automatically; provider calls are attempted exactly
//! once per logical step.

use thiserror::Error;

fn render_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// Main error type for action-synth operations
#[derive(Error, Debug)]
pub enum Error {
    /// The action reference string is not of the form `owner/repo[@ref]`.
    #[error("Invalid action reference '{input}': {message}{}", render_hint(hint))]
    InvalidReference {
        input: String,
        message: String,
        hint: Option<String>,
    },

    /// No branch, tag, or commit could be resolved for the reference.
    #[error("Could not resolve '{reference}' for {org_repo}: {message}")]
    RevisionResolutionFailed {
        org_repo: String,
        reference: String,
        message: String,
    },

    /// No action schema exists at the expected location.
    #[error("No action schema found in {org_repo} at '{subpath}'")]
    SchemaNotFound { org_repo: String, subpath: String },

    /// An action schema exists but could not be parsed.
    #[error("Invalid action schema {path}: {message}")]
    SchemaParse { path: String, message: String },

    /// A workflow file could not be parsed for rewriting.
    #[error("Invalid workflow {path}: {message}")]
    WorkflowParse { path: String, message: String },

    /// Every schema of a repository failed; nothing was registered.
    #[error("No action in {org_repo} could be synthesized:\n{details}")]
    NothingSynthesized { org_repo: String, details: String },

    /// The repository or subpath has no registry entry.
    #[error("{key} is not registered{}", render_hint(hint))]
    NotRegistered { key: String, hint: Option<String> },

    /// The registry document exists but could not be parsed.
    #[error("Registry document {path} is corrupt: {message}{}", render_hint(hint))]
    RegistryCorrupt {
        path: String,
        message: String,
        hint: Option<String>,
    },

    /// An I/O failure while writing or deleting part of the output tree.
    #[error("Filesystem error on {path}: {message}")]
    Filesystem { path: String, message: String },

    /// A path could not be related to another one.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// Code generation could not proceed (for example an empty identifier).
    #[error("Code generation error for {org_repo}: {message}")]
    Codegen { org_repo: String, message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn filesystem(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Error::Filesystem {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_reference() {
        let error = Error::InvalidReference {
            input: "checkout".to_string(),
            message: "expected owner/repo".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid action reference 'checkout'"));
        assert!(display.contains("expected owner/repo"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_invalid_reference_with_hint() {
        let error = Error::InvalidReference {
            input: "checkout".to_string(),
            message: "expected owner/repo".to_string(),
            hint: Some("Try actions/checkout".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint: Try actions/checkout"));
    }

    #[test]
    fn test_error_display_resolution_failed() {
        let error = Error::RevisionResolutionFailed {
            org_repo: "actions/checkout".to_string(),
            reference: "v99".to_string(),
            message: "no branch, tag, or commit matched".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'v99'"));
        assert!(display.contains("actions/checkout"));
    }

    #[test]
    fn test_error_display_schema_not_found() {
        let error = Error::SchemaNotFound {
            org_repo: "github/codeql-action".to_string(),
            subpath: "init".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("github/codeql-action"));
        assert!(display.contains("'init'"));
    }

    #[test]
    fn test_error_display_registry_corrupt() {
        let error = Error::RegistryCorrupt {
            path: ".action-synth/actions.json".to_string(),
            message: "expected value at line 1".to_string(),
            hint: Some("Fix the syntax error by hand".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("is corrupt"));
        assert!(display.contains("hint: Fix the syntax error"));
    }

    #[test]
    fn test_error_display_not_registered() {
        let error = Error::NotRegistered {
            key: "actions/cache".to_string(),
            hint: Some("Run 'action-synth list' to see registered actions".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.starts_with("actions/cache is not registered"));
        assert!(display.contains("hint: Run 'action-synth list'"));
    }

    #[test]
    fn test_error_filesystem_helper() {
        let error = Error::filesystem(std::path::Path::new("/tmp/out.ts"), "denied");
        let display = format!("{}", error);
        assert!(display.contains("/tmp/out.ts"));
        assert!(display.contains("denied"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(format!("{}", error).contains("I/O error"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
