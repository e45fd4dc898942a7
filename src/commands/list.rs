//! # List Command Implementation
//!
//! Lists registered actions. This command is read-only.
//!
//! ## Output Formats
//!
//! - **Table** (default): one line per action with its version, pinned
//!   revision, identifier and module path.
//! - **Tree** (`--tree`): actions grouped by namespace and repository,
//!   drawn with `ptree`.
//! - **JSON** (`--json`): the registry entries as stored.

use std::borrow::Cow;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use action_synth::codegen::naming::call_identifier;
use action_synth::reference::split_org_repo;
use action_synth::registry::{Registry, RegistryEntry};

use super::{open_workspace, print_json, registry_location};
use crate::cli::GlobalArgs;

/// List registered actions
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Group actions by namespace and repository
    #[arg(long)]
    pub tree: bool,

    /// Print the registry entries as JSON
    #[arg(long, conflicts_with = "tree")]
    pub json: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    if !registry_location(global)?.exists {
        if args.json {
            print_json(&Vec::<RegistryEntry>::new())?;
        } else {
            println!("No actions registered.");
        }
        return Ok(());
    }

    let workspace = open_workspace(global, true)?;
    let registry = &workspace.registry;

    if args.json {
        return print_json(&registry.actions);
    }
    if registry.actions.is_empty() {
        println!("No actions registered.");
        return Ok(());
    }

    if args.tree {
        print_tree(&build_tree(registry))?;
    } else {
        for line in table_lines(registry) {
            println!("{}", line);
        }
    }

    println!();
    println!(
        "{} action(s) from {} repositories in {}",
        registry.actions.len(),
        registry.repositories().len(),
        workspace.store.resolver().output_dir()
    );
    Ok(())
}

fn short(revision: &str) -> &str {
    &revision[..revision.len().min(7)]
}

fn table_lines(registry: &Registry) -> Vec<String> {
    let rows: Vec<[String; 5]> = registry
        .actions
        .iter()
        .map(|entry| {
            [
                entry.key().to_string(),
                entry.display_version.clone(),
                short(&entry.pinned_revision).to_string(),
                call_identifier(&entry.generated_identifier),
                entry.output_path.clone(),
            ]
        })
        .collect();

    let mut widths = [0usize; 5];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    if i == row.len() - 1 {
                        cell.clone()
                    } else {
                        format!("{:<width$}", cell, width = width)
                    }
                })
                .collect();
            cells.join("  ")
        })
        .collect()
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

/// Namespace -> repository@version -> action nodes, in registry order.
fn build_tree(registry: &Registry) -> TreeNode {
    let mut namespaces: Vec<TreeNode> = Vec::new();

    for org_repo in registry.repositories() {
        let (owner, repo) = split_org_repo(&org_repo);
        let entries = registry.entries_for(&org_repo);
        let version = entries
            .first()
            .map(|e| e.display_version.as_str())
            .unwrap_or_default();

        let actions = entries
            .iter()
            .map(|entry| TreeNode {
                label: format!(
                    "{} ({})",
                    call_identifier(&entry.generated_identifier),
                    entry.output_path
                ),
                children: Vec::new(),
            })
            .collect();
        let repo_node = TreeNode {
            label: format!("{}@{}", repo, version),
            children: actions,
        };

        match namespaces.iter_mut().find(|n| n.label == owner) {
            Some(namespace) => namespace.children.push(repo_node),
            None => namespaces.push(TreeNode {
                label: owner.to_string(),
                children: vec![repo_node],
            }),
        }
    }

    TreeNode {
        label: registry.output_dir.clone(),
        children: namespaces,
    }
}
