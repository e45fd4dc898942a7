//! Where generated modules live under the output root.
//!
//! - A repository with one schema: `owner/repo.ts`.
//! - A repository with several: `owner/repo/<subpath>.ts`, the root schema
//!   as `owner/repo/action.ts`.
//!
//! All paths are `/`-separated and relative to the output root.

use crate::defaults::{BARREL_FILENAME, MODULE_EXTENSION, ROOT_ACTION_STEM};
use crate::reference::split_org_repo;

/// A module may never shadow an aggregation file.
fn module_stem(stem: &str) -> String {
    if format!("{}.{}", stem, MODULE_EXTENSION) == BARREL_FILENAME {
        format!("{}-action", stem)
    } else {
        stem.to_string()
    }
}

/// Output path of the module for `subpath` of `org_repo`.
pub fn module_path(org_repo: &str, subpath: &str, shared: bool) -> String {
    let (owner, repo) = split_org_repo(org_repo);
    if !shared {
        return format!("{}/{}.{}", owner, module_stem(repo), MODULE_EXTENSION);
    }

    let subpath = subpath.trim_matches('/');
    let relative = if subpath.is_empty() {
        ROOT_ACTION_STEM.to_string()
    } else {
        let mut segments: Vec<String> = subpath.split('/').map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            *last = module_stem(last);
        }
        segments.join("/")
    };
    format!("{}/{}/{}.{}", owner, repo, relative, MODULE_EXTENSION)
}

/// Directory of a multi-schema repository, relative to the output root.
pub fn repository_dir(org_repo: &str) -> String {
    let (owner, repo) = split_org_repo(org_repo);
    format!("{}/{}", owner, repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_schema_layout() {
        assert_eq!(module_path("actions/checkout", "", false), "actions/checkout.ts");
        // a lone schema below the root still sits next to its namespace
        assert_eq!(module_path("owner/tool", "sub", false), "owner/tool.ts");
    }

    #[test]
    fn test_multi_schema_layout() {
        assert_eq!(
            module_path("github/codeql-action", "init", true),
            "github/codeql-action/init.ts"
        );
        assert_eq!(
            module_path("github/codeql-action", "upload/sarif", true),
            "github/codeql-action/upload/sarif.ts"
        );
        assert_eq!(
            module_path("github/codeql-action", "", true),
            "github/codeql-action/action.ts"
        );
    }

    #[test]
    fn test_modules_never_named_like_barrels() {
        assert_eq!(module_path("owner/index", "", false), "owner/index-action.ts");
        assert_eq!(module_path("owner/repo", "index", true), "owner/repo/index-action.ts");
    }

    #[test]
    fn test_repository_dir() {
        assert_eq!(repository_dir("github/codeql-action"), "github/codeql-action");
    }
}
