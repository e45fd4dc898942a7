//! # Update Command Implementation
//!
//! Re-resolves registered repositories and regenerates their modules.
//!
//! ## Functionality
//!
//! - **Single repository**: `update owner/repo` re-resolves the stored
//!   display version, so a moved major tag or branch picks up its new
//!   commit. `--ref` switches to a different ref.
//! - **Everything**: without an argument every registered repository is
//!   updated in turn. A failure for one repository does not stop the
//!   others; the command exits non-zero afterwards.
//!
//! The registry is saved once, after every repository was processed.

use anyhow::Result;
use clap::Args;
use log::warn;

use action_synth::output::{emoji, spinner};
use action_synth::suggestions;
use action_synth::synthesis::{Outcome, SynthesisReport, TreeSynthesizer};

use super::{git_providers, open_workspace, print_json, print_report};
use crate::cli::GlobalArgs;

/// Re-resolve registered repositories and regenerate their modules
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Registered repository to update. Updates every repository when omitted.
    #[arg(value_name = "OWNER/REPO")]
    pub org_repo: Option<String>,

    /// Ref to move the repository to, instead of its stored version
    #[arg(long = "ref", value_name = "REF", requires = "org_repo")]
    pub new_ref: Option<String>,

    /// Token for repository access. Falls back to GITHUB_TOKEN unless the
    /// registry sets `tokenSource` to `config`.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Print a machine-readable summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, global: &GlobalArgs) -> Result<()> {
    let mut workspace = open_workspace(global, true)?;
    let registered = workspace.registry.repositories();

    let targets = match &args.org_repo {
        Some(org_repo) => {
            let org_repo = org_repo.trim().trim_end_matches('/').to_string();
            if !registered.contains(&org_repo) {
                return Err(suggestions::not_registered(&org_repo, &registered));
            }
            vec![org_repo]
        }
        None => registered,
    };

    let output = if args.json {
        global.output.clone().quiet()
    } else {
        global.output.clone()
    };
    if targets.is_empty() {
        if args.json {
            print_json(&Vec::<SynthesisReport>::new())?;
        } else {
            println!("No actions registered.");
        }
        return Ok(());
    }

    let token = workspace.registry.options.token(args.token.as_deref());
    let (revisions, working_copies) = git_providers(global, token);
    let synthesizer = TreeSynthesizer::new(&revisions, &working_copies);

    let mut reports = Vec::new();
    let mut errors = Vec::new();
    for org_repo in &targets {
        let progress = spinner(&output, format!("Updating {}", org_repo));
        let result = synthesizer.update(
            &mut workspace.registry,
            workspace.store.resolver(),
            org_repo,
            args.new_ref.as_deref(),
        );
        progress.finish_and_clear();

        match result {
            Ok(report) => {
                if !args.json {
                    print_report("Updated", &report, &output);
                }
                reports.push(report);
            }
            Err(e) => {
                warn!("Update of {} failed: {}", org_repo, e);
                if !args.json {
                    eprintln!("{} {}: {}", emoji(&output, "❌", "[FAIL]"), org_repo, e);
                }
                errors.push(format!("{}: {}", org_repo, e));
            }
        }
    }

    if !reports.is_empty() {
        workspace.save()?;
    }
    if args.json {
        print_json(&reports)?;
    }

    let partial: Vec<&SynthesisReport> = reports
        .iter()
        .filter(|r| r.outcome() == Outcome::Partial)
        .collect();
    match (errors.is_empty(), partial.as_slice()) {
        (true, []) => Ok(()),
        (true, [only]) if targets.len() == 1 => Err(suggestions::partial_failure(only)),
        _ => {
            let failed_actions: usize = partial.iter().map(|r| r.failures.len()).sum();
            let mut message = format!(
                "{} of {} repositories failed to update",
                errors.len(),
                targets.len()
            );
            if failed_actions > 0 {
                message.push_str(&format!(", {} action(s) failed", failed_actions));
            }
            for error in &errors {
                message.push_str(&format!("\n  {}", error));
            }
            Err(anyhow::anyhow!(message))
        }
    }
}
