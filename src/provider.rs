//! # Repository Providers
//!
//! The revision resolver and the tree synthesizer never talk to the network
//! or to `git` directly. They go through two traits:
//!
//! - **`RevisionProvider`**: repository metadata. Lists tags, reports the
//!   default branch, and answers whether a branch, tag, or commit exists
//!   (returning its immutable id).
//! - **`WorkingCopyProvider`**: materializes a repository at an immutable
//!   revision on the local filesystem so schemas can be read from it.
//!
//! `GitRevisionProvider` and `GitWorkingCopy` are the production
//! implementations built on the system `git`. `MemoryRevisionProvider` and
//! `DirectoryWorkingCopy` are in-memory and on-disk stand-ins for embedding
//! and tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};

use crate::cache::ListingCache;
use crate::error::{Error, Result};
use crate::git::{self, RemoteRefs};

/// Repository metadata queries used for revision resolution.
pub trait RevisionProvider: Send + Sync {
    /// Every tag name of the repository.
    fn list_tags(&self, org_repo: &str) -> Result<Vec<String>>;

    /// The branch `HEAD` points at.
    fn default_branch(&self, org_repo: &str) -> Result<String>;

    /// Commit id at the head of `branch`, if the branch exists.
    fn branch_head(&self, org_repo: &str, branch: &str) -> Result<Option<String>>;

    /// Commit id `tag` points at, if the tag exists.
    fn tag_target(&self, org_repo: &str, tag: &str) -> Result<Option<String>>;

    /// Full commit id for `id`, if it names a commit.
    fn commit(&self, org_repo: &str, id: &str) -> Result<Option<String>>;
}

/// Materializes repositories on disk.
pub trait WorkingCopyProvider: Send + Sync {
    /// Returns a directory holding `org_repo` checked out at `revision`.
    fn checkout(&self, org_repo: &str, revision: &str) -> Result<PathBuf>;
}

/// `RevisionProvider` backed by `git ls-remote`.
///
/// Each repository is listed once per provider instance.
pub struct GitRevisionProvider {
    base_url: String,
    token: Option<String>,
    listings: ListingCache,
}

impl GitRevisionProvider {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            listings: ListingCache::new(),
        }
    }

    fn refs(&self, org_repo: &str) -> Result<RemoteRefs> {
        self.listings.get_or_fetch(org_repo, || {
            let url = git::repository_url(&self.base_url, org_repo, self.token.as_deref())?;
            info!("Listing refs of {}", git::redact(&url));
            git::ls_remote(&url)
        })
    }
}

impl RevisionProvider for GitRevisionProvider {
    fn list_tags(&self, org_repo: &str) -> Result<Vec<String>> {
        Ok(self.refs(org_repo)?.tag_names())
    }

    fn default_branch(&self, org_repo: &str) -> Result<String> {
        self.refs(org_repo)?
            .default_branch
            .ok_or_else(|| Error::RevisionResolutionFailed {
                org_repo: org_repo.to_string(),
                reference: "HEAD".to_string(),
                message: "the remote does not advertise a default branch".to_string(),
            })
    }

    fn branch_head(&self, org_repo: &str, branch: &str) -> Result<Option<String>> {
        Ok(self.refs(org_repo)?.heads.get(branch).cloned())
    }

    fn tag_target(&self, org_repo: &str, tag: &str) -> Result<Option<String>> {
        Ok(self.refs(org_repo)?.tags.get(tag).cloned())
    }

    fn commit(&self, org_repo: &str, id: &str) -> Result<Option<String>> {
        if git::is_full_commit_id(id) {
            return Ok(Some(id.to_ascii_lowercase()));
        }
        if git::is_commit_prefix(id) {
            return Ok(self.refs(org_repo)?.commit_with_prefix(id));
        }
        Ok(None)
    }
}

/// `WorkingCopyProvider` that fetches into an on-disk cache.
///
/// Revisions are immutable, so an existing cache directory is reused as is.
pub struct GitWorkingCopy {
    cache_root: PathBuf,
    base_url: String,
    token: Option<String>,
}

impl GitWorkingCopy {
    pub fn new(cache_root: PathBuf, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            cache_root,
            base_url: base_url.into(),
            token,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }
}

impl WorkingCopyProvider for GitWorkingCopy {
    fn checkout(&self, org_repo: &str, revision: &str) -> Result<PathBuf> {
        let target = git::checkout_cache_path(&self.cache_root, org_repo, revision);
        if target.join(".git").is_dir() {
            debug!("Reusing checkout {}", target.display());
            return Ok(target);
        }

        let url = git::repository_url(&self.base_url, org_repo, self.token.as_deref())?;
        info!("Fetching {}@{}", git::redact(&url), revision);
        git::checkout_revision(&url, revision, &target)?;
        Ok(target)
    }
}

/// In-memory `RevisionProvider`.
#[derive(Default)]
pub struct MemoryRevisionProvider {
    repos: HashMap<String, RemoteRefs>,
    commits: HashMap<String, HashSet<String>>,
    tag_listings: Mutex<usize>,
}

impl MemoryRevisionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn repo_mut(&mut self, org_repo: &str) -> &mut RemoteRefs {
        self.repos.entry(org_repo.to_string()).or_default()
    }

    pub fn with_tag(mut self, org_repo: &str, tag: &str, id: &str) -> Self {
        self.repo_mut(org_repo)
            .tags
            .insert(tag.to_string(), id.to_string());
        self
    }

    pub fn with_branch(mut self, org_repo: &str, branch: &str, id: &str) -> Self {
        self.repo_mut(org_repo)
            .heads
            .insert(branch.to_string(), id.to_string());
        self
    }

    pub fn with_default_branch(mut self, org_repo: &str, branch: &str, id: &str) -> Self {
        let refs = self.repo_mut(org_repo);
        refs.heads.insert(branch.to_string(), id.to_string());
        refs.default_branch = Some(branch.to_string());
        self
    }

    pub fn with_commit(mut self, org_repo: &str, id: &str) -> Self {
        self.repo_mut(org_repo);
        self.commits
            .entry(org_repo.to_string())
            .or_default()
            .insert(id.to_string());
        self
    }

    /// How many times tags were listed, across all repositories.
    pub fn tag_listings(&self) -> usize {
        self.tag_listings.lock().map(|n| *n).unwrap_or(0)
    }

    fn refs(&self, org_repo: &str) -> Result<&RemoteRefs> {
        self.repos.get(org_repo).ok_or_else(|| Error::GitCommand {
            command: "ls-remote".to_string(),
            url: org_repo.to_string(),
            stderr: "repository not found".to_string(),
        })
    }
}

impl RevisionProvider for MemoryRevisionProvider {
    fn list_tags(&self, org_repo: &str) -> Result<Vec<String>> {
        if let Ok(mut n) = self.tag_listings.lock() {
            *n += 1;
        }
        Ok(self.refs(org_repo)?.tag_names())
    }

    fn default_branch(&self, org_repo: &str) -> Result<String> {
        self.refs(org_repo)?
            .default_branch
            .clone()
            .ok_or_else(|| Error::RevisionResolutionFailed {
                org_repo: org_repo.to_string(),
                reference: "HEAD".to_string(),
                message: "no default branch".to_string(),
            })
    }

    fn branch_head(&self, org_repo: &str, branch: &str) -> Result<Option<String>> {
        Ok(self.refs(org_repo)?.heads.get(branch).cloned())
    }

    fn tag_target(&self, org_repo: &str, tag: &str) -> Result<Option<String>> {
        Ok(self.refs(org_repo)?.tags.get(tag).cloned())
    }

    fn commit(&self, org_repo: &str, id: &str) -> Result<Option<String>> {
        self.refs(org_repo)?;
        Ok(self
            .commits
            .get(org_repo)
            .and_then(|ids| ids.iter().find(|c| c.starts_with(id)))
            .cloned())
    }
}

/// `WorkingCopyProvider` that serves pre-populated directories.
///
/// The revision is recorded but otherwise ignored.
#[derive(Default)]
pub struct DirectoryWorkingCopy {
    roots: HashMap<String, PathBuf>,
    checkouts: Mutex<Vec<(String, String)>>,
}

impl DirectoryWorkingCopy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, org_repo: &str, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(org_repo.to_string(), root.into());
        self
    }

    /// Every `(org_repo, revision)` requested so far.
    pub fn checkouts(&self) -> Vec<(String, String)> {
        self.checkouts.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl WorkingCopyProvider for DirectoryWorkingCopy {
    fn checkout(&self, org_repo: &str, revision: &str) -> Result<PathBuf> {
        if let Ok(mut calls) = self.checkouts.lock() {
            calls.push((org_repo.to_string(), revision.to_string()));
        }
        self.roots
            .get(org_repo)
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: "fetch".to_string(),
                url: org_repo.to_string(),
                stderr: "repository not found".to_string(),
            })
    }
}
