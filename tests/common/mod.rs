//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_registry(registries::TWO_REPOSITORIES);
//!     fixture.command().arg("list").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::registries;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Registry documents for testing.
#[allow(dead_code)]
pub mod registries {
    /// An empty registry with the default output directory.
    pub const EMPTY: &str = r#"{
  "version": "1",
  "outputDir": "generated/actions",
  "plugins": [],
  "stacks": [],
  "actions": []
}
"#;

    /// One single-action repository and one repository with two actions.
    pub const TWO_REPOSITORIES: &str = r#"{
  "version": "1",
  "outputDir": "generated/actions",
  "plugins": [],
  "stacks": [],
  "actions": [
    {
      "orgRepo": "actions/checkout",
      "pinnedRevision": "11bd71901bbe5b1630ceea73d27597364c9af683",
      "displayVersion": "v4",
      "generatedIdentifier": "Checkout",
      "outputPath": "actions/checkout.ts"
    },
    {
      "orgRepo": "github/codeql-action",
      "actionPath": "analyze",
      "pinnedRevision": "662472033e021d55d94146f66f6058822b0b39fd",
      "displayVersion": "v3",
      "generatedIdentifier": "CodeqlAnalyze",
      "outputPath": "github/codeql-action/analyze.ts"
    },
    {
      "orgRepo": "github/codeql-action",
      "actionPath": "init",
      "pinnedRevision": "662472033e021d55d94146f66f6058822b0b39fd",
      "displayVersion": "v3",
      "generatedIdentifier": "CodeqlInit",
      "outputPath": "github/codeql-action/init.ts"
    }
  ]
}
"#;

    /// Not JSON at all.
    pub const CORRUPT: &str = "{ \"version\": \"1\", \"actions\": [";
}

/// Check if network tests should be skipped.
///
/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary project: a directory with a `.git` marker, so the upward
/// registry search stops inside it, and an optional registry document.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new project with no registry.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child(".git")
            .create_dir_all()
            .expect("Failed to create .git marker");
        Self { temp_dir }
    }

    /// Write `.action-synth/actions.json` with the given content.
    pub fn with_registry(self, content: &str) -> Self {
        self.with_file(".action-synth/actions.json", content)
    }

    /// Write the generated modules and barrels that
    /// [`registries::TWO_REPOSITORIES`] tracks.
    #[allow(dead_code)]
    pub fn with_generated_tree(self) -> Self {
        const HEADER: &str = "// Generated by action-synth. Do not edit.\n\n";
        self.with_file("generated/actions/actions/checkout.ts", "export function checkout() {}\n")
            .with_file(
                "generated/actions/actions/index.ts",
                &format!("{HEADER}export * from './checkout';\n"),
            )
            .with_file(
                "generated/actions/github/codeql-action/analyze.ts",
                "export function codeqlAnalyze() {}\n",
            )
            .with_file(
                "generated/actions/github/codeql-action/init.ts",
                "export function codeqlInit() {}\n",
            )
            .with_file(
                "generated/actions/github/codeql-action/index.ts",
                &format!("{HEADER}export * from './analyze';\nexport * from './init';\n"),
            )
            .with_file(
                "generated/actions/github/index.ts",
                &format!("{HEADER}export * from './codeql-action';\n"),
            )
            .with_file(
                "generated/actions/index.ts",
                &format!(
                    "{HEADER}export * as actions from './actions';\nexport * as github from './github';\n"
                ),
            )
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the registry document.
    #[allow(dead_code)]
    pub fn registry_path(&self) -> PathBuf {
        self.temp_dir.path().join(".action-synth/actions.json")
    }

    /// Read a file below the project root.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command for the binary, run from the project root with a clean
    /// environment for the variables the CLI reads.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("action-synth");
        cmd.current_dir(self.path())
            .env_remove("ACTION_SYNTH_REGISTRY")
            .env_remove("ACTION_SYNTH_GIT_BASE")
            .env_remove("GITHUB_TOKEN")
            .env_remove("RUST_LOG")
            .env("ACTION_SYNTH_CACHE", self.path().join(".cache"))
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
