//! # Tree Synthesis
//!
//! Orchestrates the full pipeline for one repository and keeps the generated
//! tree and the registry in agreement.
//!
//! ## Process
//!
//! 1. **Resolve**: turn the reference into a display version and an
//!    immutable id. A failure here aborts before anything is touched.
//! 2. **Extract**: check the repository out at the immutable id and load
//!    every schema found under it.
//! 3. **Render**: derive unique identifiers and render one module per
//!    schema that loaded. If none did, the request fails without touching
//!    the registry or the tree.
//! 4. **Replace**: delete the files of the repository's previous entries,
//!    write the new modules, and upsert their entries.
//! 5. **Aggregate**: rebuild the repository, namespace, and root barrels
//!    from what is on disk, then run the optional formatter.
//!
//! Update is the same pipeline, re-resolving the stored display version
//! (or a new ref). Removal deletes the tracked files and rebuilds the same
//! barrels.
//!
//! The registry is passed in and mutated in memory; saving it is the
//! caller's final step.

pub mod barrel;
pub mod format;
pub mod layout;
pub mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codegen::{self, naming, ActionTarget, GeneratedModule};
use crate::error::{Error, Result};
use crate::filesystem;
use crate::paths::PathResolver;
use crate::provider::{RevisionProvider, WorkingCopyProvider};
use crate::reference::{split_org_repo, ActionReference};
use crate::registry::{EntryKey, Registry, RegistryEntry};
use crate::resolver::{ResolvedRevision, RevisionResolver};
use crate::schema::{discover_subpaths, load_schema};

use barrel::BarrelWriter;
pub use report::{GeneratedAction, Outcome, SchemaFailure, SynthesisReport};

struct PlannedModule {
    subpath: String,
    module: GeneratedModule,
    output_path: String,
}

/// Runs add, update, and remove against a registry and its output tree.
pub struct TreeSynthesizer<'a> {
    revisions: &'a dyn RevisionProvider,
    working_copies: &'a dyn WorkingCopyProvider,
}

impl<'a> TreeSynthesizer<'a> {
    pub fn new(
        revisions: &'a dyn RevisionProvider,
        working_copies: &'a dyn WorkingCopyProvider,
    ) -> Self {
        Self {
            revisions,
            working_copies,
        }
    }

    /// Resolves `reference` and synthesizes every schema of its repository.
    pub fn add(
        &self,
        registry: &mut Registry,
        paths: &PathResolver,
        reference: &ActionReference,
        identity_override: Option<&str>,
    ) -> Result<SynthesisReport> {
        let resolved = RevisionResolver::new(self.revisions).resolve(reference)?;
        info!(
            "Resolved {} to {} ({})",
            reference, resolved.resolved_ref, resolved.immutable_id
        );
        self.add_resolved(
            registry,
            paths,
            &reference.org_repo,
            &resolved,
            identity_override,
        )
    }

    /// Re-synthesizes a registered repository.
    ///
    /// Without `new_ref` the stored display version is resolved again, so a
    /// moved major tag or branch picks up its new commit.
    pub fn update(
        &self,
        registry: &mut Registry,
        paths: &PathResolver,
        org_repo: &str,
        new_ref: Option<&str>,
    ) -> Result<SynthesisReport> {
        let stored = registry
            .entries_for(org_repo)
            .first()
            .map(|entry| entry.display_version.clone())
            .ok_or_else(|| not_registered(org_repo))?;

        let r#ref = new_ref.map(str::to_string).unwrap_or(stored);
        let reference = ActionReference::new(org_repo, Some(r#ref));
        let resolved = RevisionResolver::new(self.revisions).resolve(&reference)?;
        info!(
            "Updating {} to {} ({})",
            org_repo, resolved.resolved_ref, resolved.immutable_id
        );
        self.add_resolved(registry, paths, org_repo, &resolved, None)
    }

    /// Synthesizes every schema of `org_repo` at an already resolved revision,
    /// replacing whatever the registry held for the repository.
    pub fn add_resolved(
        &self,
        registry: &mut Registry,
        paths: &PathResolver,
        org_repo: &str,
        resolved: &ResolvedRevision,
        identity_override: Option<&str>,
    ) -> Result<SynthesisReport> {
        let root = self
            .working_copies
            .checkout(org_repo, &resolved.immutable_id)?;
        let subpaths = discover_subpaths(&root)?;
        if subpaths.is_empty() {
            return Err(Error::SchemaNotFound {
                org_repo: org_repo.to_string(),
                subpath: String::new(),
            });
        }
        let shared = subpaths.len() > 1;
        debug!("{} exposes {} schema(s)", org_repo, subpaths.len());

        let mut failures: Vec<(String, Error)> = Vec::new();
        let mut loaded = Vec::new();
        for subpath in &subpaths {
            let attempt = load_schema(&root, subpath, org_repo).and_then(|schema| {
                let ident = naming::derive_identifier(
                    &schema.name,
                    identity_override,
                    subpath,
                    shared,
                    org_repo,
                )?;
                Ok((schema, ident))
            });
            match attempt {
                Ok((schema, ident)) => loaded.push((subpath.clone(), schema, ident)),
                Err(e) => {
                    warn!("Skipping {} at '{}': {}", org_repo, subpath, e);
                    failures.push((subpath.clone(), e));
                }
            }
        }

        if loaded.is_empty() {
            if failures.len() == 1 {
                return Err(failures.remove(0).1);
            }
            let details = failures
                .iter()
                .map(|(subpath, e)| format!("  {}: {}", display_subpath(subpath), e))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::NothingSynthesized {
                org_repo: org_repo.to_string(),
                details,
            });
        }

        let reserved = namespace_identifiers(registry, org_repo);
        let idents = naming::disambiguate(
            loaded.iter().map(|(_, _, ident)| ident.clone()).collect(),
            &reserved,
        );
        let options = registry.codegen_options();
        let planned: Vec<PlannedModule> = loaded
            .iter()
            .zip(idents)
            .map(|((subpath, schema, _), ident)| {
                let target = ActionTarget {
                    org_repo,
                    subpath,
                    immutable_id: &resolved.immutable_id,
                    display_version: &resolved.resolved_ref,
                };
                PlannedModule {
                    subpath: subpath.clone(),
                    module: codegen::render(schema, &target, &ident, &options),
                    output_path: layout::module_path(org_repo, subpath, shared),
                }
            })
            .collect();

        let mut report = SynthesisReport::new(org_repo);
        report.display_version = Some(resolved.resolved_ref.clone());
        report.pinned_revision = Some(resolved.immutable_id.clone());

        // Remove the previous generation first.
        let keep: HashSet<&str> = planned.iter().map(|p| p.output_path.as_str()).collect();
        let prior: Vec<RegistryEntry> = registry
            .entries_for(org_repo)
            .into_iter()
            .cloned()
            .collect();
        let mut emptied = Vec::new();
        for entry in &prior {
            registry.remove_entry(&entry.key());
            if keep.contains(entry.output_path.as_str()) {
                continue;
            }
            if let Some(dir) = self.delete_tracked(paths, &entry.output_path, &mut report)? {
                emptied.push(dir);
            }
        }

        let mut written = Vec::new();
        for plan in &planned {
            let path = paths.from_output_relative(&plan.output_path);
            if filesystem::write_if_changed(&path, plan.module.source.as_bytes())? {
                report.touch(plan.output_path.clone());
                written.push(path);
            }
            registry.upsert_entry(RegistryEntry {
                org_repo: org_repo.to_string(),
                action_path: (!plan.subpath.is_empty()).then(|| plan.subpath.clone()),
                pinned_revision: resolved.immutable_id.clone(),
                display_version: resolved.resolved_ref.clone(),
                generated_identifier: plan.module.type_identifier.clone(),
                output_path: plan.output_path.clone(),
            });
            report.generated.push(GeneratedAction {
                action_path: plan.subpath.clone(),
                identifier: plan.module.type_identifier.clone(),
                output_path: plan.output_path.clone(),
            });
        }

        for dir in emptied {
            filesystem::prune_empty_dirs(&dir, paths.output_root());
        }

        self.aggregate(registry, paths, org_repo, &mut report, written)?;

        report.failures = failures
            .into_iter()
            .map(|(subpath, e)| SchemaFailure {
                action_path: subpath,
                message: e.to_string(),
            })
            .collect();

        info!(
            "Synthesized {} module(s) for {} ({:?})",
            report.generated.len(),
            org_repo,
            report.outcome()
        );
        Ok(report)
    }

    /// Deletes the tracked modules of `org_repo` (or of one subpath) and
    /// their registry entries.
    pub fn remove(
        &self,
        registry: &mut Registry,
        paths: &PathResolver,
        org_repo: &str,
        subpath: Option<&str>,
    ) -> Result<SynthesisReport> {
        let subpath = subpath.map(|s| s.trim_matches('/'));
        let targets: Vec<RegistryEntry> = registry
            .entries_for(org_repo)
            .into_iter()
            .filter(|entry| subpath.is_none_or(|s| entry.subpath() == s))
            .cloned()
            .collect();

        if targets.is_empty() {
            let key = match subpath {
                Some(s) => EntryKey::new(org_repo, s).to_string(),
                None => org_repo.to_string(),
            };
            return Err(not_registered(&key));
        }

        let mut report = SynthesisReport::new(org_repo);
        let mut emptied = Vec::new();
        for entry in &targets {
            if let Some(dir) = self.delete_tracked(paths, &entry.output_path, &mut report)? {
                emptied.push(dir);
            }
            registry.remove_entry(&entry.key());
            info!("Removed {}", entry.key());
        }

        self.aggregate(registry, paths, org_repo, &mut report, Vec::new())?;
        for dir in emptied {
            filesystem::prune_empty_dirs(&dir, paths.output_root());
        }
        Ok(report)
    }

    /// Rebuilds every barrel under the output root from what is on disk.
    pub fn rebuild_tree(&self, registry: &Registry, paths: &PathResolver) -> Result<Vec<String>> {
        let options = registry.codegen_options();
        let writer = BarrelWriter::new(paths.output_root(), &options.style);
        let touched = writer.rebuild_all()?;
        run_formatter_over(registry, paths, &touched);
        Ok(touched.iter().map(|p| output_relative(paths, p)).collect())
    }

    /// Deletes one tracked module. Returns its directory for pruning.
    fn delete_tracked(
        &self,
        paths: &PathResolver,
        output_path: &str,
        report: &mut SynthesisReport,
    ) -> Result<Option<PathBuf>> {
        let path = paths.from_output_relative(output_path);
        if !path.starts_with(paths.output_root()) {
            warn!(
                "Not deleting {}: it lies outside the output directory",
                path.display()
            );
            return Ok(None);
        }
        if filesystem::remove_file(&path)? {
            debug!("Deleted {}", path.display());
            report.removed.push(output_path.to_string());
            report.touch(output_path.to_string());
        }
        Ok(path.parent().map(Path::to_path_buf))
    }

    fn aggregate(
        &self,
        registry: &Registry,
        paths: &PathResolver,
        org_repo: &str,
        report: &mut SynthesisReport,
        mut written: Vec<PathBuf>,
    ) -> Result<()> {
        let options = registry.codegen_options();
        let writer = BarrelWriter::new(paths.output_root(), &options.style);
        for barrel in writer.rebuild_for(org_repo)? {
            report.touch(output_relative(paths, &barrel));
            if barrel.is_file() {
                written.push(barrel);
            }
        }
        run_formatter_over(registry, paths, &written);
        Ok(())
    }
}

fn run_formatter_over(registry: &Registry, paths: &PathResolver, files: &[PathBuf]) {
    if let Some(command) = registry.options.formatting.command.as_deref() {
        let existing: Vec<PathBuf> = files.iter().filter(|f| f.is_file()).cloned().collect();
        format::run_formatter(command, &existing, &paths.project_root());
    }
}

fn output_relative(paths: &PathResolver, path: &Path) -> String {
    paths
        .to_output_relative(path)
        .unwrap_or_else(|_| path.display().to_string())
}

fn display_subpath(subpath: &str) -> &str {
    if subpath.is_empty() {
        "(root)"
    } else {
        subpath
    }
}

/// Identifiers already exported by other repositories of the same namespace.
fn namespace_identifiers(registry: &Registry, org_repo: &str) -> Vec<String> {
    let (owner, _) = split_org_repo(org_repo);
    registry
        .actions
        .iter()
        .filter(|e| e.org_repo != org_repo && split_org_repo(&e.org_repo).0 == owner)
        .map(|e| e.generated_identifier.clone())
        .collect()
}

fn not_registered(key: &str) -> Error {
    Error::NotRegistered {
        key: key.to_string(),
        hint: Some("Run 'action-synth list' to see registered actions".to_string()),
    }
}
