//! Aggregation ("barrel") files.
//!
//! Every barrel is rebuilt from a fresh listing of the directory it serves,
//! never patched line by line. Whatever a crashed run left behind, the next
//! rebuild lists exactly the modules present on disk. A barrel with nothing
//! to export is deleted along with any directory it leaves empty.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use super::layout::repository_dir;
use crate::codegen::naming::{call_identifier, disambiguate, type_identifier};
use crate::codegen::Style;
use crate::defaults::{BARREL_FILENAME, MODULE_EXTENSION};
use crate::error::{Error, Result};
use crate::filesystem::{self, list_dir};
use crate::reference::split_org_repo;

const HEADER: &str = "// Generated by action-synth. Do not edit.";

/// Rebuilds barrels below one output root.
pub struct BarrelWriter<'a> {
    output_root: &'a Path,
    style: &'a Style,
}

impl<'a> BarrelWriter<'a> {
    pub fn new(output_root: &'a Path, style: &'a Style) -> Self {
        Self { output_root, style }
    }

    /// `owner/repo/index.ts`, exporting every module under the repository
    /// directory. Returns the files written or deleted.
    pub fn rebuild_repository(&self, org_repo: &str) -> Result<Vec<PathBuf>> {
        let dir = self.output_root.join(repository_dir(org_repo));
        let mut specifiers = Vec::new();

        if dir.is_dir() {
            let walker = WalkDir::new(&dir)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter();
            for entry in walker {
                let entry = entry.map_err(|e| Error::filesystem(&dir, e))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/");
                if relative == BARREL_FILENAME {
                    continue;
                }
                if let Some(stem) = module_stem(&relative) {
                    specifiers.push(format!("./{}", stem));
                }
            }
        }

        let exports = specifiers
            .iter()
            .map(|s| format!("export * from {};", self.style.string_literal(s)))
            .collect();
        self.apply(&dir, exports)
    }

    /// `owner/index.ts`, exporting each module file and each subdirectory
    /// that has its own barrel.
    pub fn rebuild_namespace(&self, owner: &str) -> Result<Vec<PathBuf>> {
        let dir = self.output_root.join(owner);
        let mut specifiers = Vec::new();

        for entry in list_dir(&dir)? {
            if entry.is_dir {
                if dir.join(&entry.name).join(BARREL_FILENAME).is_file() {
                    specifiers.push(format!("./{}", entry.name));
                }
            } else if entry.name != BARREL_FILENAME {
                if let Some(stem) = module_stem(&entry.name) {
                    specifiers.push(format!("./{}", stem));
                }
            }
        }
        specifiers.sort();
        specifiers.dedup();

        let exports = specifiers
            .iter()
            .map(|s| format!("export * from {};", self.style.string_literal(s)))
            .collect();
        self.apply(&dir, exports)
    }

    /// `index.ts` at the output root, exporting one namespace object per
    /// namespace directory that has a barrel.
    pub fn rebuild_root(&self) -> Result<Vec<PathBuf>> {
        let namespaces: Vec<String> = list_dir(self.output_root)?
            .into_iter()
            .filter(|e| e.is_dir && self.output_root.join(&e.name).join(BARREL_FILENAME).is_file())
            .map(|e| e.name)
            .collect();

        let aliases: Vec<String> = namespaces
            .iter()
            .map(|ns| {
                type_identifier(ns)
                    .map(|t| call_identifier(&t))
                    .unwrap_or_else(|_| "_".to_string())
            })
            .collect();
        let aliases = disambiguate(aliases, &[]);

        let exports = namespaces
            .iter()
            .zip(aliases)
            .map(|(ns, alias)| {
                format!(
                    "export * as {} from {};",
                    alias,
                    self.style.string_literal(&format!("./{}", ns))
                )
            })
            .collect();
        self.apply_at(&self.output_root.join(BARREL_FILENAME), exports, false)
    }

    /// Rebuilds the barrels of every repository and namespace under the
    /// output root, then the root barrel.
    pub fn rebuild_all(&self) -> Result<Vec<PathBuf>> {
        let mut touched = Vec::new();
        for owner in list_dir(self.output_root)?.into_iter().filter(|e| e.is_dir) {
            let owner_dir = self.output_root.join(&owner.name);
            for repo in list_dir(&owner_dir)?.into_iter().filter(|e| e.is_dir) {
                touched.extend(self.rebuild_repository(&format!("{}/{}", owner.name, repo.name))?);
            }
            touched.extend(self.rebuild_namespace(&owner.name)?);
        }
        touched.extend(self.rebuild_root()?);
        Ok(touched)
    }

    /// Rebuilds the repository, namespace, and root barrels affected by a
    /// change to `org_repo`.
    pub fn rebuild_for(&self, org_repo: &str) -> Result<Vec<PathBuf>> {
        let (owner, _) = split_org_repo(org_repo);
        let mut touched = self.rebuild_repository(org_repo)?;
        touched.extend(self.rebuild_namespace(owner)?);
        touched.extend(self.rebuild_root()?);
        Ok(touched)
    }

    fn apply(&self, dir: &Path, exports: Vec<String>) -> Result<Vec<PathBuf>> {
        self.apply_at(&dir.join(BARREL_FILENAME), exports, true)
    }

    fn apply_at(&self, path: &Path, exports: Vec<String>, prune: bool) -> Result<Vec<PathBuf>> {
        let mut touched = Vec::new();

        if exports.is_empty() {
            if filesystem::remove_file(path)? {
                debug!("Removed empty barrel {}", path.display());
                touched.push(path.to_path_buf());
            }
            if prune {
                if let Some(dir) = path.parent() {
                    filesystem::prune_empty_dirs(dir, self.output_root);
                }
            }
            return Ok(touched);
        }

        if filesystem::write_if_changed(path, render(&exports).as_bytes())? {
            debug!("Wrote barrel {}", path.display());
            touched.push(path.to_path_buf());
        }
        Ok(touched)
    }
}

/// Strips the module extension, or `None` for files that are not modules.
fn module_stem(relative: &str) -> Option<&str> {
    relative
        .strip_suffix(MODULE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .filter(|s| !s.is_empty() && !s.ends_with(".d"))
}

fn render(exports: &[String]) -> String {
    let mut out = String::from(HEADER);
    out.push_str("\n\n");
    for line in exports {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export {};\n").unwrap();
    }

    fn read(root: &Path, relative: &str) -> String {
        fs::read_to_string(root.join(relative)).unwrap()
    }

    #[test]
    fn test_module_stem() {
        assert_eq!(module_stem("checkout.ts"), Some("checkout"));
        assert_eq!(module_stem("upload/sarif.ts"), Some("upload/sarif"));
        assert_eq!(module_stem("types.d.ts"), None);
        assert_eq!(module_stem("README.md"), None);
    }

    #[test]
    fn test_repository_barrel_lists_nested_modules() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "github/codeql-action/init.ts");
        touch(root, "github/codeql-action/upload/sarif.ts");
        let style = Style::default();

        BarrelWriter::new(root, &style)
            .rebuild_repository("github/codeql-action")
            .unwrap();

        assert_eq!(
            read(root, "github/codeql-action/index.ts"),
            "// Generated by action-synth. Do not edit.\n\nexport * from './init';\nexport * from './upload/sarif';\n"
        );
    }

    #[test]
    fn test_namespace_barrel_reflects_disk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "actions/checkout.ts");
        touch(root, "actions/cache.ts");
        touch(root, "actions/toolkit/index.ts");
        fs::create_dir_all(root.join("actions/empty")).unwrap();
        let style = Style::default();
        let writer = BarrelWriter::new(root, &style);

        writer.rebuild_namespace("actions").unwrap();
        assert_eq!(
            read(root, "actions/index.ts"),
            "// Generated by action-synth. Do not edit.\n\nexport * from './cache';\nexport * from './checkout';\nexport * from './toolkit';\n"
        );

        fs::remove_file(root.join("actions/cache.ts")).unwrap();
        writer.rebuild_namespace("actions").unwrap();
        assert!(!read(root, "actions/index.ts").contains("cache"));
    }

    #[test]
    fn test_root_barrel_uses_namespace_objects() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "actions/checkout.ts");
        touch(root, "my-org/tool.ts");
        let style = Style::default();
        let writer = BarrelWriter::new(root, &style);

        writer.rebuild_namespace("actions").unwrap();
        writer.rebuild_namespace("my-org").unwrap();
        writer.rebuild_root().unwrap();

        assert_eq!(
            read(root, "index.ts"),
            "// Generated by action-synth. Do not edit.\n\nexport * as actions from './actions';\nexport * as myOrg from './my-org';\n"
        );
    }

    #[test]
    fn test_empty_barrels_are_deleted_with_their_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        touch(&root, "github/codeql-action/init.ts");
        let style = Style::default();
        let writer = BarrelWriter::new(&root, &style);
        writer.rebuild_for("github/codeql-action").unwrap();
        assert!(root.join("index.ts").is_file());

        fs::remove_file(root.join("github/codeql-action/init.ts")).unwrap();
        let touched = writer.rebuild_for("github/codeql-action").unwrap();

        assert_eq!(touched.len(), 3);
        assert!(!root.join("github").exists());
        assert!(!root.join("index.ts").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_rebuild_all_is_stable() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "actions/checkout.ts");
        touch(root, "github/codeql-action/init.ts");
        touch(root, "github/codeql-action/analyze.ts");
        let style = Style::default();
        let writer = BarrelWriter::new(root, &style);

        assert!(!writer.rebuild_all().unwrap().is_empty());
        assert!(writer.rebuild_all().unwrap().is_empty());
        assert!(read(root, "github/index.ts").contains("export * from './codeql-action';"));
    }

    #[test]
    fn test_double_quote_style() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "actions/checkout.ts");
        let style = Style {
            indent_width: 2,
            single_quote: false,
        };
        BarrelWriter::new(root, &style).rebuild_namespace("actions").unwrap();
        assert!(read(root, "actions/index.ts").contains("export * from \"./checkout\";"));
    }
}
