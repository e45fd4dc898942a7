//! # CLI Command Implementations
//!
//! One module per subcommand. Each contains an `Args` struct derived with
//! `clap` and an `execute` function that calls into the `action_synth`
//! library and presents the result.
//!
//! The helpers below are shared by the commands that work on a registry:
//! locating and loading the document, building the git-backed providers,
//! and printing synthesis reports.

pub mod add;
pub mod completions;
pub mod list;
pub mod remove;
pub mod rewrite;
pub mod update;

use anyhow::{Context, Result};
use serde::Serialize;

use action_synth::defaults::{default_cache_root, git_base_url};
use action_synth::output::{emoji, OutputConfig};
use action_synth::paths::{locate_registry, RegistryLocation};
use action_synth::provider::{GitRevisionProvider, GitWorkingCopy};
use action_synth::registry::{Registry, RegistryStore};
use action_synth::suggestions;
use action_synth::synthesis::{Outcome, SynthesisReport};

use crate::cli::GlobalArgs;

/// A loaded registry together with the store it came from.
pub struct Workspace {
    pub store: RegistryStore,
    pub registry: Registry,
}

impl Workspace {
    /// Sorts and writes the registry back to disk.
    pub fn save(&mut self) -> Result<()> {
        self.store
            .save(&mut self.registry)
            .with_context(|| format!("Failed to save registry {}", self.store.path().display()))
    }
}

/// Where the registry document is for this invocation.
pub fn registry_location(global: &GlobalArgs) -> Result<RegistryLocation> {
    match &global.registry {
        Some(path) => Ok(RegistryLocation {
            exists: path.is_file(),
            path: path.clone(),
        }),
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(locate_registry(&cwd))
        }
    }
}

/// Loads the registry. With `must_exist`, a missing document is an error;
/// otherwise it loads as an empty registry that is created on save.
pub fn open_workspace(global: &GlobalArgs, must_exist: bool) -> Result<Workspace> {
    let location = registry_location(global)?;
    if must_exist && !location.exists {
        return Err(suggestions::registry_not_found(&location.path));
    }

    let mut store = RegistryStore::new(&location.path);
    let registry = store.load()?;
    log::debug!(
        "Registry {} ({} entries)",
        store.path().display(),
        registry.actions.len()
    );
    Ok(Workspace { store, registry })
}

/// Git-backed providers for a session.
pub fn git_providers(
    global: &GlobalArgs,
    token: Option<String>,
) -> (GitRevisionProvider, GitWorkingCopy) {
    let base = git_base_url();
    let cache_root = global.cache_root.clone().unwrap_or_else(default_cache_root);
    (
        GitRevisionProvider::new(base.clone(), token.clone()),
        GitWorkingCopy::new(cache_root, base, token),
    )
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable summary of one synthesis report.
pub fn print_report(verb: &str, report: &SynthesisReport, output: &OutputConfig) {
    let marker = match report.outcome() {
        Outcome::Complete => emoji(output, "✅", "[OK]"),
        Outcome::Partial => emoji(output, "⚠️ ", "[WARN]"),
        Outcome::Failed => emoji(output, "❌", "[FAIL]"),
    };

    let version = match (&report.display_version, &report.pinned_revision) {
        (Some(version), Some(revision)) => {
            format!(" @ {} ({})", version, &revision[..revision.len().min(7)])
        }
        (Some(version), None) => format!(" @ {}", version),
        _ => String::new(),
    };
    println!("{} {} {}{}", marker, verb, report.org_repo, version);

    for action in &report.generated {
        println!("  {} -> {}", action.identifier, action.output_path);
    }
    for removed in &report.removed {
        println!("  removed {}", removed);
    }
    for failure in &report.failures {
        let location = if failure.action_path.is_empty() {
            "(root)"
        } else {
            failure.action_path.as_str()
        };
        eprintln!("  {} {}: {}", emoji(output, "⚠️ ", "[WARN]"), location, failure.message);
    }
}

/// Prints a report, in JSON or as text, and turns a partial outcome into an
/// error so the process exits non-zero.
pub fn finish_report(
    verb: &str,
    report: &SynthesisReport,
    json: bool,
    output: &OutputConfig,
) -> Result<()> {
    if json {
        print_json(report)?;
    } else {
        print_report(verb, report, output);
    }

    match report.outcome() {
        Outcome::Partial => Err(suggestions::partial_failure(report)),
        _ => Ok(()),
    }
}
