//! # Remove Command Implementation
//!
//! Deletes the generated modules of a registered repository, or of one of its
//! actions, together with their registry entries. Aggregation files are
//! rebuilt and emptied directories pruned. Files outside the output root are
//! never deleted.
//!
//! Asks for confirmation unless `--yes` is given.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

use action_synth::registry::EntryKey;
use action_synth::suggestions;
use action_synth::synthesis::TreeSynthesizer;

use super::{finish_report, git_providers, open_workspace};
use crate::cli::GlobalArgs;

/// Remove a registered repository (or one of its actions)
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Registered repository to remove
    #[arg(value_name = "OWNER/REPO")]
    pub org_repo: String,

    /// Remove only the action at this subpath
    #[arg(long = "path", value_name = "SUBPATH")]
    pub subpath: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print a machine-readable summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, global: &GlobalArgs) -> Result<()> {
    let mut workspace = open_workspace(global, true)?;
    let org_repo = args.org_repo.trim().trim_end_matches('/').to_string();
    let subpath = args.subpath.as_deref().map(|s| s.trim_matches('/'));

    let targets: Vec<String> = workspace
        .registry
        .entries_for(&org_repo)
        .into_iter()
        .filter(|entry| subpath.is_none_or(|s| entry.subpath() == s))
        .map(|entry| entry.output_path.clone())
        .collect();
    if targets.is_empty() {
        let key = match subpath {
            Some(s) => EntryKey::new(org_repo.as_str(), s).to_string(),
            None => org_repo.clone(),
        };
        return Err(suggestions::not_registered(
            &key,
            &workspace.registry.repositories(),
        ));
    }

    if !args.yes {
        println!("The following generated modules will be deleted:");
        for path in &targets {
            println!("  {}", path);
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Remove {}?", org_repo))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    // Removal only touches the local tree; the providers are never queried.
    let (revisions, working_copies) = git_providers(global, None);
    let synthesizer = TreeSynthesizer::new(&revisions, &working_copies);
    let report = synthesizer.remove(
        &mut workspace.registry,
        workspace.store.resolver(),
        &org_repo,
        subpath,
    )?;
    workspace.save()?;

    finish_report("Removed", &report, args.json, &global.output)
}
