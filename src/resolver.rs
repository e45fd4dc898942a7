//! # Revision Resolution
//!
//! Turns an [`ActionReference`] into a [`ResolvedRevision`]: a human-facing
//! label (`resolved_ref`) plus the immutable commit id it currently names.
//!
//! ## Choosing the label
//!
//! - **No ref**: the preferred tag (see [`crate::version`]); with no usable
//!   tag, or when tags cannot be listed, the default branch.
//! - **`latest`**: the preferred tag; having no usable tag is an error.
//! - **Anything else**: used verbatim.
//!
//! ## Pinning the label
//!
//! The label is tried as a branch head, then as a tag, then as a raw commit.
//! The first interpretation the provider accepts wins.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::RevisionProvider;
use crate::reference::{ActionReference, RefRequest};
use crate::version;

/// A reference resolved to a display label and an immutable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRevision {
    pub resolved_ref: String,
    pub immutable_id: String,
}

/// Which interpretation pinned the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
    Commit,
}

/// Resolves references against a [`RevisionProvider`].
pub struct RevisionResolver<'a> {
    provider: &'a dyn RevisionProvider,
}

impl<'a> RevisionResolver<'a> {
    pub fn new(provider: &'a dyn RevisionProvider) -> Self {
        Self { provider }
    }

    /// Resolves `reference` to a label and an immutable id.
    pub fn resolve(&self, reference: &ActionReference) -> Result<ResolvedRevision> {
        let org_repo = reference.org_repo.as_str();
        let resolved_ref = match reference.request() {
            RefRequest::Unspecified => self.resolve_unspecified(org_repo)?,
            RefRequest::Latest => self.resolve_latest(org_repo)?,
            RefRequest::Explicit(r) => r,
        };

        let (immutable_id, kind) = self.pin(org_repo, &resolved_ref)?;
        debug!(
            "Resolved {} to {} ({:?} {})",
            reference, immutable_id, kind, resolved_ref
        );

        Ok(ResolvedRevision {
            resolved_ref,
            immutable_id,
        })
    }

    fn resolve_unspecified(&self, org_repo: &str) -> Result<String> {
        match self.provider.list_tags(org_repo) {
            Ok(tags) => {
                if let Some((tag, kind)) = version::preferred_tag(&tags) {
                    debug!("Picked {:?} tag {} for {}", kind, tag, org_repo);
                    return Ok(tag);
                }
                debug!("{} has no version tags, using its default branch", org_repo);
            }
            Err(e) => {
                warn!(
                    "Could not list tags of {} ({}); using its default branch",
                    org_repo, e
                );
            }
        }

        self.provider
            .default_branch(org_repo)
            .map_err(|e| resolution_failed(org_repo, "(default branch)", e))
    }

    fn resolve_latest(&self, org_repo: &str) -> Result<String> {
        let tags = self
            .provider
            .list_tags(org_repo)
            .map_err(|e| resolution_failed(org_repo, "latest", e))?;

        version::preferred_tag(&tags)
            .map(|(tag, _)| tag)
            .ok_or_else(|| Error::RevisionResolutionFailed {
                org_repo: org_repo.to_string(),
                reference: "latest".to_string(),
                message: "the repository has no version tags".to_string(),
            })
    }

    /// Finds the immutable id for a label: branch, then tag, then commit.
    pub fn pin(&self, org_repo: &str, resolved_ref: &str) -> Result<(String, RefKind)> {
        let lookup = || -> Result<Option<(String, RefKind)>> {
            if let Some(id) = self.provider.branch_head(org_repo, resolved_ref)? {
                return Ok(Some((id, RefKind::Branch)));
            }
            if let Some(id) = self.provider.tag_target(org_repo, resolved_ref)? {
                return Ok(Some((id, RefKind::Tag)));
            }
            if let Some(id) = self.provider.commit(org_repo, resolved_ref)? {
                return Ok(Some((id, RefKind::Commit)));
            }
            Ok(None)
        };

        match lookup() {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(Error::RevisionResolutionFailed {
                org_repo: org_repo.to_string(),
                reference: resolved_ref.to_string(),
                message: "no branch, tag, or commit matches".to_string(),
            }),
            Err(e) => Err(resolution_failed(org_repo, resolved_ref, e)),
        }
    }
}

fn resolution_failed(org_repo: &str, reference: &str, cause: Error) -> Error {
    match cause {
        e @ Error::RevisionResolutionFailed { .. } => e,
        other => Error::RevisionResolutionFailed {
            org_repo: org_repo.to_string(),
            reference: reference.to_string(),
            message: other.to_string(),
        },
    }
}
