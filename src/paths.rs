//! # Path Resolution
//!
//! Maps between the registry document, the project root that contains it,
//! the configurable output root, and absolute filesystem paths.
//!
//! - The **document** lives at `<project>/.action-synth/actions.<ext>`.
//! - The **output root** is `<project>/<outputDir>`, computed once and cached
//!   until the document path or `outputDir` changes.
//! - Persisted `outputPath` values are relative to the output root; internal
//!   bookkeeping uses paths relative to the document's own directory.
//!
//! All conversions are lexical: generated files may not exist yet, so paths
//! are never canonicalized through the filesystem.

use std::cell::OnceCell;
use std::path::{Component, Path, PathBuf};

use crate::defaults::{REGISTRY_DIR, REGISTRY_FILENAMES, VCS_MARKER};
use crate::error::{Error, Result};

/// Where the registry document is, and whether it already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLocation {
    pub path: PathBuf,
    pub exists: bool,
}

/// Searches upward from `start` for the registry document.
///
/// In each directory the candidates are tried in preference order inside the
/// conventional subdirectory. Reaching a directory with a version-control
/// marker stops the search and assumes the default document there. With no
/// marker at all, the default document under `start` is assumed.
pub fn locate_registry(start: &Path) -> RegistryLocation {
    let start = absolutize(start);

    for dir in start.ancestors() {
        let registry_dir = dir.join(REGISTRY_DIR);
        if let Some(found) = REGISTRY_FILENAMES
            .iter()
            .map(|name| registry_dir.join(name))
            .find(|candidate| candidate.is_file())
        {
            return RegistryLocation {
                path: found,
                exists: true,
            };
        }

        if dir.join(VCS_MARKER).exists() {
            return RegistryLocation {
                path: registry_dir.join(REGISTRY_FILENAMES[0]),
                exists: false,
            };
        }
    }

    RegistryLocation {
        path: start.join(REGISTRY_DIR).join(REGISTRY_FILENAMES[0]),
        exists: false,
    }
}

/// Lexically normalizes a path: drops `.`, folds `..` into its parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(
                    result.components().next_back(),
                    Some(Component::Normal(_))
                );
                if last_is_normal {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Makes `path` absolute against the current directory, then normalizes it.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        normalize(&cwd.join(path))
    }
}

/// Computes the `/`-separated path leading from directory `base` to `target`.
///
/// Both must be absolute. `..` segments are emitted when `target` is not
/// below `base`.
pub fn relative_path(base: &Path, target: &Path) -> Result<String> {
    if !base.is_absolute() || !target.is_absolute() {
        return Err(Error::Path {
            message: format!(
                "cannot relate '{}' to '{}': both paths must be absolute",
                target.display(),
                base.display()
            ),
        });
    }

    let base = normalize(base);
    let target = normalize(target);
    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();

    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return Err(Error::Path {
            message: format!(
                "'{}' and '{}' share no common root",
                target.display(),
                base.display()
            ),
        });
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().to_string());
    }

    Ok(segments.join("/"))
}

/// Joins a `/`-separated relative path onto `base` and normalizes the result.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    normalize(&path)
}

/// Encodes a path component to be filesystem-safe.
///
/// Separators and characters that are problematic on common filesystems are
/// replaced one for one.
pub fn encode_path_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}

/// Derived paths for one registry document.
#[derive(Debug, Clone)]
pub struct PathResolver {
    document_path: PathBuf,
    output_dir: String,
    output_root: OnceCell<PathBuf>,
}

impl PathResolver {
    pub fn new(document_path: &Path, output_dir: &str) -> Self {
        Self {
            document_path: absolutize(document_path),
            output_dir: output_dir.to_string(),
            output_root: OnceCell::new(),
        }
    }

    /// Absolute path of the registry document.
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Directory containing the registry document.
    pub fn document_dir(&self) -> &Path {
        self.document_path.parent().unwrap_or(Path::new("/"))
    }

    /// The project root: the parent of the conventional subdirectory, or the
    /// document's directory when the document lives elsewhere.
    pub fn project_root(&self) -> PathBuf {
        let dir = self.document_dir();
        if dir.file_name().is_some_and(|n| n == REGISTRY_DIR) {
            dir.parent().unwrap_or(dir).to_path_buf()
        } else {
            dir.to_path_buf()
        }
    }

    /// Absolute output root, computed on first use.
    pub fn output_root(&self) -> &Path {
        self.output_root
            .get_or_init(|| join_relative(&self.project_root(), &self.output_dir))
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    /// Points the resolver at a different document.
    pub fn set_document_path(&mut self, path: &Path) {
        self.document_path = absolutize(path);
        self.invalidate();
    }

    /// Records a new declared output directory.
    pub fn set_output_dir(&mut self, output_dir: &str) {
        if self.output_dir != output_dir {
            self.output_dir = output_dir.to_string();
        }
        self.invalidate();
    }

    /// Drops every cached derived path.
    pub fn invalidate(&mut self) {
        self.output_root = OnceCell::new();
    }

    /// Absolute path to a path relative to the output root.
    pub fn to_output_relative(&self, absolute: &Path) -> Result<String> {
        relative_path(self.output_root(), absolute)
    }

    /// Path relative to the output root to an absolute path.
    pub fn from_output_relative(&self, relative: &str) -> PathBuf {
        join_relative(self.output_root(), relative)
    }

    /// Absolute path to a path relative to the document's directory.
    pub fn to_document_relative(&self, absolute: &Path) -> Result<String> {
        relative_path(self.document_dir(), absolute)
    }

    /// Path relative to the document's directory to an absolute path.
    pub fn from_document_relative(&self, relative: &str) -> PathBuf {
        join_relative(self.document_dir(), relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative_path_below() {
        let rel = relative_path(Path::new("/p/out"), Path::new("/p/out/actions/checkout.ts")).unwrap();
        assert_eq!(rel, "actions/checkout.ts");
    }

    #[test]
    fn test_relative_path_sibling() {
        let rel = relative_path(Path::new("/p/.action-synth"), Path::new("/p/gen/a.ts")).unwrap();
        assert_eq!(rel, "../gen/a.ts");
    }

    #[test]
    fn test_relative_path_requires_absolute() {
        assert!(relative_path(Path::new("out"), Path::new("/p/a.ts")).is_err());
    }

    #[test]
    fn test_encode_path_component() {
        assert_eq!(encode_path_component("actions/checkout"), "actions-checkout");
        assert_eq!(encode_path_component("feature:x y"), "feature_x_y");
    }

    #[test]
    fn test_resolver_output_root() {
        let resolver = PathResolver::new(
            Path::new("/work/proj/.action-synth/actions.json"),
            "generated/actions",
        );
        assert_eq!(resolver.project_root(), PathBuf::from("/work/proj"));
        assert_eq!(
            resolver.output_root(),
            Path::new("/work/proj/generated/actions")
        );
    }

    #[test]
    fn test_resolver_cache_invalidation() {
        let mut resolver =
            PathResolver::new(Path::new("/work/proj/.action-synth/actions.json"), "gen");
        assert_eq!(resolver.output_root(), Path::new("/work/proj/gen"));

        resolver.set_output_dir("src/actions");
        assert_eq!(resolver.output_root(), Path::new("/work/proj/src/actions"));

        resolver.set_document_path(Path::new("/elsewhere/.action-synth/actions.yaml"));
        assert_eq!(resolver.output_root(), Path::new("/elsewhere/src/actions"));
    }

    #[test]
    fn test_resolver_document_outside_conventional_dir() {
        let resolver = PathResolver::new(Path::new("/work/registry.json"), "gen");
        assert_eq!(resolver.project_root(), PathBuf::from("/work"));
    }

    #[test]
    fn test_resolver_round_trips() {
        let resolver =
            PathResolver::new(Path::new("/work/proj/.action-synth/actions.json"), "gen");
        let file = Path::new("/work/proj/gen/actions/./checkout.ts");

        let rel = resolver.to_output_relative(file).unwrap();
        assert_eq!(rel, "actions/checkout.ts");
        assert_eq!(resolver.from_output_relative(&rel), normalize(file));

        let doc_rel = resolver.to_document_relative(file).unwrap();
        assert_eq!(doc_rel, "../gen/actions/checkout.ts");
        assert_eq!(resolver.from_document_relative(&doc_rel), normalize(file));
    }

    #[test]
    fn test_locate_registry_prefers_json() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(REGISTRY_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("actions.yaml"), "version: '1'\n").unwrap();
        fs::write(dir.join("actions.json"), "{}").unwrap();

        let found = locate_registry(temp.path());
        assert!(found.exists);
        assert_eq!(found.path, normalize(&dir.join("actions.json")));
    }

    #[test]
    fn test_locate_registry_searches_upward() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(REGISTRY_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("actions.toml"), "version = '1'\n").unwrap();
        let nested = temp.path().join("packages/app/src");
        fs::create_dir_all(&nested).unwrap();

        let found = locate_registry(&nested);
        assert!(found.exists);
        assert!(found.path.ends_with(".action-synth/actions.toml"));
    }

    #[test]
    fn test_locate_registry_stops_at_vcs_marker() {
        let temp = TempDir::new().unwrap();
        // a document above the repository must not be picked up
        let outer = temp.path().join(REGISTRY_DIR);
        fs::create_dir_all(&outer).unwrap();
        fs::write(outer.join("actions.json"), "{}").unwrap();

        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let nested = repo.join("src");
        fs::create_dir_all(&nested).unwrap();

        let found = locate_registry(&nested);
        assert!(!found.exists);
        assert_eq!(
            found.path,
            normalize(&repo.join(REGISTRY_DIR).join("actions.json"))
        );
    }
}
