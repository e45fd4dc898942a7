//! Default values for action-synth configuration.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Conventional subdirectory holding the registry document.
pub const REGISTRY_DIR: &str = ".action-synth";

/// Base name shared by every registry document form.
pub const REGISTRY_BASENAME: &str = "actions";

/// Registry filenames in search preference order.
pub const REGISTRY_FILENAMES: [&str; 4] = [
    "actions.json",
    "actions.toml",
    "actions.yaml",
    "actions.yml",
];

/// Version-control marker that stops the upward registry search.
pub const VCS_MARKER: &str = ".git";

/// Current registry schema version.
pub const REGISTRY_VERSION: &str = "1";

/// Output directory used when the document does not declare one.
pub const DEFAULT_OUTPUT_DIR: &str = "generated/actions";

/// Module the generated code imports its runtime helpers from.
pub const DEFAULT_RUNTIME_MODULE: &str = "@action-synth/runtime";

/// Environment variable consulted for the bearer token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Environment variable overriding the git host base URL.
pub const GIT_BASE_ENV_VAR: &str = "ACTION_SYNTH_GIT_BASE";

/// Git host used when no override is set.
pub const DEFAULT_GIT_BASE: &str = "https://github.com";

/// Schema filenames, first match wins.
pub const SCHEMA_FILENAMES: [&str; 2] = ["action.yml", "action.yaml"];

/// Directories never descended into while discovering schemas.
pub const SKIPPED_DIRS: [&str; 6] = [".git", "node_modules", ".github", "dist", "vendor", "target"];

/// Name of every aggregation file.
pub const BARREL_FILENAME: &str = "index.ts";

/// Extension of generated modules.
pub const MODULE_EXTENSION: &str = "ts";

/// File stem used for the repository-root schema in a multi-schema layout.
pub const ROOT_ACTION_STEM: &str = "action";

/// Workflows rewritten when no files are named, relative to the project root.
pub const DEFAULT_WORKFLOW_GLOB: &str = ".github/workflows/*.y*ml";

/// Where rewritten workflow modules go, relative to the project root.
pub const DEFAULT_WORKFLOW_OUT_DIR: &str = "generated/workflows";

/// Returns the default checkout cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/action-synth` (XDG Base Directory)
/// - macOS: `~/Library/Caches/action-synth`
/// - Windows: `{FOLDERID_LocalAppData}\action-synth`
///
/// Falls back to `.action-synth-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `ACTION_SYNTH_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".action-synth-cache"))
        .join("action-synth")
}

/// Returns the git base URL, honouring `ACTION_SYNTH_GIT_BASE`.
pub fn git_base_url() -> String {
    std::env::var(GIT_BASE_ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GIT_BASE.to_string())
}
