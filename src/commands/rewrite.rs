//! # Rewrite Command Implementation
//!
//! Converts CI workflow files into TypeScript modules whose steps call the
//! generated factories.
//!
//! ## Functionality
//!
//! - **Inputs**: the given workflow files, or every file matching
//!   `.github/workflows/*.y*ml` under the project root.
//! - **Outputs**: one `<workflow stem>.ts` per workflow in `--out`
//!   (default `generated/workflows` under the project root). Files whose
//!   content is unchanged are not rewritten.
//! - **Unmatched references**: `uses:` values that name no registered action
//!   are kept as plain step objects and reported.
//!
//! The registry's formatter command, when configured, runs over the written
//! modules.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use serde::Serialize;

use action_synth::defaults::{DEFAULT_WORKFLOW_GLOB, DEFAULT_WORKFLOW_OUT_DIR, MODULE_EXTENSION};
use action_synth::filesystem;
use action_synth::output::emoji;
use action_synth::paths::{absolutize, relative_path};
use action_synth::rewrite::rewrite_workflow;
use action_synth::synthesis::format::run_formatter;

use super::{open_workspace, print_json};
use crate::cli::GlobalArgs;

/// Rewrite workflow files into modules that call the generated factories
#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Workflow files to rewrite. Defaults to the project's workflow directory.
    #[arg(value_name = "WORKFLOW")]
    pub files: Vec<PathBuf>,

    /// Directory to write the modules to
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Print a machine-readable summary
    #[arg(long)]
    pub json: bool,
}

/// Summary of one rewritten workflow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowSummary {
    workflow: String,
    module: String,
    written: bool,
    exports: Vec<String>,
    rewritten: usize,
    unmatched: Vec<String>,
}

/// Execute the `rewrite` command.
pub fn execute(args: RewriteArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = open_workspace(global, true)?;
    let paths = workspace.store.resolver();
    let project_root = paths.project_root();

    let out_dir = match &args.out {
        Some(dir) => absolutize(dir),
        None => project_root.join(DEFAULT_WORKFLOW_OUT_DIR),
    };
    let files = if args.files.is_empty() {
        discover_workflows(&project_root)?
    } else {
        args.files.iter().map(|f| absolutize(f)).collect()
    };

    if files.is_empty() {
        if args.json {
            print_json(&Vec::<WorkflowSummary>::new())?;
        } else {
            println!("No workflow files found.");
        }
        return Ok(());
    }

    let mut summaries = Vec::new();
    let mut written = Vec::new();
    for file in &files {
        let origin = relative_path(&project_root, file)
            .unwrap_or_else(|_| file.display().to_string());
        let yaml = fs::read_to_string(file)
            .with_context(|| format!("Failed to read workflow {}", file.display()))?;

        let result = rewrite_workflow(&yaml, &origin, &workspace.registry, paths, &out_dir)?;
        for unmatched in &result.unmatched {
            warn!("{}: '{}' is not a registered action", origin, unmatched);
        }

        let module = out_dir.join(module_filename(file));
        let changed = filesystem::write_if_changed(&module, result.source.as_bytes())?;
        if changed {
            written.push(module.clone());
        }

        summaries.push(WorkflowSummary {
            workflow: origin,
            module: relative_path(&project_root, &module)
                .unwrap_or_else(|_| module.display().to_string()),
            written: changed,
            exports: result.exports,
            rewritten: result.rewritten,
            unmatched: result.unmatched,
        });
    }

    if let Some(command) = &workspace.registry.options.formatting.command {
        run_formatter(command, &written, &project_root);
    }

    if args.json {
        return print_json(&summaries);
    }

    let output = &global.output;
    for summary in &summaries {
        println!(
            "{} {} -> {} ({} step(s) rewritten)",
            emoji(output, "✅", "[OK]"),
            summary.workflow,
            summary.module,
            summary.rewritten
        );
        for unmatched in &summary.unmatched {
            println!("  {} unmatched: {}", emoji(output, "⚠️ ", "[WARN]"), unmatched);
        }
    }
    Ok(())
}

fn discover_workflows(project_root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = project_root.join(DEFAULT_WORKFLOW_GLOB);
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid workflow pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// `ci.yml` -> `ci.ts`
fn module_filename(workflow: &Path) -> String {
    let stem = workflow
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "workflow".to_string());
    format!("{}.{}", stem, MODULE_EXTENSION)
}
