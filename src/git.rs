//! Thin wrappers around the system `git` command.
//!
//! Using the system binary means SSH keys, credential helpers, and any
//! authentication in `~/.gitconfig` keep working. A bearer token, when one is
//! supplied, is embedded in the HTTPS URL as `x-access-token` credentials and
//! redacted from every error message and log line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::paths::encode_path_component;

/// Refs advertised by a remote, as reported by `git ls-remote --symref`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRefs {
    /// Branch `HEAD` points at, when the remote advertises it.
    pub default_branch: Option<String>,
    /// Branch name to commit id.
    pub heads: BTreeMap<String, String>,
    /// Tag name to commit id (peeled when the tag is annotated).
    pub tags: BTreeMap<String, String>,
}

impl RemoteRefs {
    /// Tag names, sorted by name.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// Finds a full commit id among advertised targets by prefix.
    pub fn commit_with_prefix(&self, prefix: &str) -> Option<String> {
        let prefix = prefix.to_ascii_lowercase();
        self.heads
            .values()
            .chain(self.tags.values())
            .find(|id| id.starts_with(&prefix))
            .cloned()
    }
}

/// Builds the clone URL for `owner/repo` under `base`.
pub fn repository_url(base: &str, org_repo: &str, token: Option<&str>) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    let mut url = Url::parse(&base)?.join(org_repo)?;

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        if matches!(url.scheme(), "http" | "https") {
            // set_* only fail for cannot-be-a-base URLs, which http(s) never is
            let _ = url.set_username("x-access-token");
            let _ = url.set_password(Some(token));
        }
    }

    Ok(url)
}

/// Removes credentials from a URL before it is shown anywhere.
pub fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    if !shown.username().is_empty() || shown.password().is_some() {
        let _ = shown.set_username("");
        let _ = shown.set_password(None);
    }
    shown.to_string()
}

fn run_git(args: &[&str], cwd: Option<&Path>, url: &Url) -> Result<String> {
    let shown = redact(url);
    let mut command = Command::new("git");
    command.args(args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    // only the subcommand is reported; the full argv may contain the token
    let label = args.first().copied().unwrap_or("git").to_string();
    debug!("git {} ({})", label, shown);

    let output = command.output().map_err(|e| Error::GitCommand {
        command: label.clone(),
        url: shown.clone(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let token_free = url
            .password()
            .map(|p| stderr.replace(p, "***"))
            .unwrap_or_else(|| stderr.to_string());
        return Err(Error::GitCommand {
            command: label,
            url: shown,
            stderr: token_free.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Arguments for listing `HEAD`, heads, and tags. Other namespaces such as
/// `refs/pull/*` are never requested.
fn ls_remote_args(url: &str) -> [&str; 6] {
    ["ls-remote", "--symref", url, "HEAD", "refs/heads/*", "refs/tags/*"]
}

/// Lists every head and tag of a remote in a single round trip.
pub fn ls_remote(url: &Url) -> Result<RemoteRefs> {
    let stdout = run_git(&ls_remote_args(url.as_str()), None, url)?;
    Ok(parse_ls_remote(&stdout))
}

/// Parses `git ls-remote --symref` output.
///
/// Lines look like `<id>\t<ref>`, plus `ref: refs/heads/main\tHEAD` for the
/// symbolic HEAD. Annotated tags appear twice; the peeled `^{}` line carries
/// the commit and wins.
pub fn parse_ls_remote(stdout: &str) -> RemoteRefs {
    let mut refs = RemoteRefs::default();
    let mut peeled: BTreeMap<String, String> = BTreeMap::new();

    for line in stdout.lines() {
        let Some((left, right)) = line.split_once('\t') else {
            continue;
        };
        let left = left.trim();
        let right = right.trim();

        if let Some(target) = left.strip_prefix("ref:") {
            if right == "HEAD" {
                refs.default_branch = target
                    .trim()
                    .strip_prefix("refs/heads/")
                    .map(str::to_string);
            }
            continue;
        }

        if let Some(branch) = right.strip_prefix("refs/heads/") {
            refs.heads.insert(branch.to_string(), left.to_string());
        } else if let Some(tag) = right.strip_prefix("refs/tags/") {
            match tag.strip_suffix("^{}") {
                Some(name) => {
                    peeled.insert(name.to_string(), left.to_string());
                }
                None => {
                    refs.tags.insert(tag.to_string(), left.to_string());
                }
            }
        }
    }

    for (name, id) in peeled {
        refs.tags.insert(name, id);
    }

    refs
}

/// Checks out exactly `revision` of `url` into `target_dir`.
///
/// Uses `init` + shallow `fetch` + detached `checkout` so that branch names,
/// tag names, and raw commit ids all work the same way.
pub fn checkout_revision(url: &Url, revision: &str, target_dir: &Path) -> Result<()> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    fs::create_dir_all(target_dir)?;

    let result = run_git(&["init", "--quiet"], Some(target_dir), url)
        .and_then(|_| {
            run_git(
                &["fetch", "--quiet", "--depth=1", url.as_str(), revision],
                Some(target_dir),
                url,
            )
        })
        .and_then(|_| {
            run_git(
                &["checkout", "--quiet", "--detach", "FETCH_HEAD"],
                Some(target_dir),
                url,
            )
        });

    if result.is_err() {
        // never leave a half-populated checkout that later looks cached
        let _ = fs::remove_dir_all(target_dir);
    }

    result.map(|_| ())
}

/// Convert a repository and revision to its checkout cache path
pub fn checkout_cache_path(cache_root: &Path, org_repo: &str, revision: &str) -> PathBuf {
    cache_root.join(format!(
        "{}-{}",
        encode_path_component(org_repo),
        encode_path_component(revision)
    ))
}

/// True when `id` looks like a full SHA-1 or SHA-256 object id.
pub fn is_full_commit_id(id: &str) -> bool {
    matches!(id.len(), 40 | 64) && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// True when `id` could be an abbreviated object id.
pub fn is_commit_prefix(id: &str) -> bool {
    id.len() >= 7 && id.len() <= 64 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LS_REMOTE: &str = "ref: refs/heads/main\tHEAD\n\
        1111111111111111111111111111111111111111\tHEAD\n\
        1111111111111111111111111111111111111111\trefs/heads/main\n\
        2222222222222222222222222222222222222222\trefs/heads/releases/v4\n\
        3333333333333333333333333333333333333333\trefs/pull/12/head\n\
        4444444444444444444444444444444444444444\trefs/tags/v4\n\
        5555555555555555555555555555555555555555\trefs/tags/v4.2.0\n\
        6666666666666666666666666666666666666666\trefs/tags/v4.2.0^{}\n";

    #[test]
    fn test_ls_remote_requests_only_heads_and_tags() {
        let args = ls_remote_args("https://github.com/actions/checkout.git");
        assert_eq!(
            args,
            [
                "ls-remote",
                "--symref",
                "https://github.com/actions/checkout.git",
                "HEAD",
                "refs/heads/*",
                "refs/tags/*"
            ]
        );
    }

    #[test]
    fn test_parse_ls_remote_default_branch() {
        let refs = parse_ls_remote(LS_REMOTE);
        assert_eq!(refs.default_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_parse_ls_remote_heads_and_tags() {
        let refs = parse_ls_remote(LS_REMOTE);
        assert_eq!(refs.heads.len(), 2);
        assert_eq!(
            refs.heads.get("releases/v4").map(String::as_str),
            Some("2222222222222222222222222222222222222222")
        );
        assert_eq!(refs.tag_names(), vec!["v4", "v4.2.0"]);
    }

    #[test]
    fn test_parse_ls_remote_prefers_peeled_tags() {
        let refs = parse_ls_remote(LS_REMOTE);
        assert_eq!(
            refs.tags.get("v4.2.0").map(String::as_str),
            Some("6666666666666666666666666666666666666666")
        );
    }

    #[test]
    fn test_parse_ls_remote_ignores_garbage() {
        let refs = parse_ls_remote("warning: redirecting\n\nnot a ref line\n");
        assert_eq!(refs, RemoteRefs::default());
    }

    #[test]
    fn test_commit_with_prefix() {
        let refs = parse_ls_remote(LS_REMOTE);
        assert_eq!(
            refs.commit_with_prefix("2222222").as_deref(),
            Some("2222222222222222222222222222222222222222")
        );
        assert_eq!(refs.commit_with_prefix("abcdef0"), None);
    }

    #[test]
    fn test_repository_url_with_token() {
        let url = repository_url("https://github.com", "actions/checkout", Some("s3cret")).unwrap();
        assert_eq!(url.username(), "x-access-token");
        assert_eq!(url.password(), Some("s3cret"));
        assert_eq!(url.path(), "/actions/checkout");
        assert_eq!(redact(&url), "https://github.com/actions/checkout");
    }

    #[test]
    fn test_repository_url_without_token() {
        let url = repository_url("https://github.com/", "actions/checkout", None).unwrap();
        assert_eq!(url.as_str(), "https://github.com/actions/checkout");
    }

    #[test]
    fn test_repository_url_file_base_ignores_token() {
        let url = repository_url("file:///srv/remotes", "org/repo", Some("tok")).unwrap();
        assert_eq!(url.as_str(), "file:///srv/remotes/org/repo");
    }

    #[test]
    fn test_checkout_cache_path() {
        let root = PathBuf::from("/tmp/cache");
        let path = checkout_cache_path(&root, "actions/checkout", "feature/x");
        assert!(path.starts_with(&root));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name, "actions-checkout-feature-x");
    }

    #[test]
    fn test_commit_id_shapes() {
        assert!(is_full_commit_id("0123456789abcdef0123456789abcdef01234567"));
        assert!(!is_full_commit_id("0123456"));
        assert!(is_commit_prefix("0123456"));
        assert!(!is_commit_prefix("012345"));
        assert!(!is_commit_prefix("v4.0.0"));
    }
}
