//! # Add Command Implementation
//!
//! Registers an action repository and generates a module for every action
//! schema found in it.
//!
//! ## Functionality
//!
//! - **Reference**: `owner/repo`, `owner/repo@latest`, or `owner/repo@<ref>`.
//!   Without a ref the newest major tag wins, then the newest semver tag,
//!   then the default branch.
//! - **Replace semantics**: adding a repository that is already registered
//!   replaces its entries and modules, exactly like `update`.
//! - **Registry creation**: when no registry document exists one is created
//!   at the default location.
//! - **Partial results**: actions that synthesized are kept and registered;
//!   the command still exits non-zero when any action failed.

use anyhow::Result;
use clap::Args;

use action_synth::output::spinner;
use action_synth::reference::ActionReference;
use action_synth::suggestions;
use action_synth::synthesis::TreeSynthesizer;

use super::{finish_report, git_providers, open_workspace};
use crate::cli::GlobalArgs;

/// Register an action repository and generate its modules
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Action reference (e.g., actions/checkout, actions/checkout@v4)
    #[arg(value_name = "OWNER/REPO[@REF]")]
    pub reference: String,

    /// Name to derive the generated identifier from, instead of the
    /// action's declared name
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Token for repository access. Falls back to GITHUB_TOKEN unless the
    /// registry sets `tokenSource` to `config`.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Print a machine-readable summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, global: &GlobalArgs) -> Result<()> {
    let reference = ActionReference::parse(&args.reference)
        .map_err(|e| suggestions::invalid_reference(&args.reference, &e))?;

    let mut workspace = open_workspace(global, false)?;
    let token = workspace.registry.options.token(args.token.as_deref());
    let (revisions, working_copies) = git_providers(global, token);
    let synthesizer = TreeSynthesizer::new(&revisions, &working_copies);

    let output = if args.json {
        global.output.clone().quiet()
    } else {
        global.output.clone()
    };
    let progress = spinner(&output, format!("Synthesizing {}", reference));
    let result = synthesizer.add(
        &mut workspace.registry,
        workspace.store.resolver(),
        &reference,
        args.name.as_deref(),
    );
    progress.finish_and_clear();

    let report = result?;
    workspace.save()?;
    finish_report("Added", &report, args.json, &output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_synth::output::OutputConfig;

    #[test]
    fn test_execute_invalid_reference() {
        let global = GlobalArgs {
            registry: Some(std::path::PathBuf::from("/nonexistent/actions.json")),
            cache_root: None,
            output: OutputConfig::from_env_and_flag("never"),
        };
        let args = AddArgs {
            reference: "not-a-reference".to_string(),
            name: None,
            token: None,
            json: false,
        };

        let message = execute(args, &global).unwrap_err().to_string();
        assert!(message.contains("Invalid action reference"));
        assert!(message.contains("hint:"));
    }
}
