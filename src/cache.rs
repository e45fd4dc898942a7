//! In-process caching of remote ref listings
//!
//! A single resolution session lists each repository's refs at most once, so
//! `(orgRepo, resolvedRef)` always maps to the same immutable id within the
//! session even if the remote moves a tag concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::git::RemoteRefs;

/// In-process cache for remote ref listings, keyed by `owner/repo`
#[derive(Debug, Clone, Default)]
pub struct ListingCache {
    cache: Arc<Mutex<HashMap<String, RemoteRefs>>>,
}

impl ListingCache {
    /// Create a new empty listing cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached listing, or fetch and cache it if not present
    pub fn get_or_fetch<F>(&self, org_repo: &str, fetch: F) -> Result<RemoteRefs>
    where
        F: FnOnce() -> Result<RemoteRefs>,
    {
        {
            let cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
                context: "listing cache".to_string(),
            })?;
            if let Some(cached) = cache.get(org_repo) {
                return Ok(cached.clone());
            }
        }

        let result = fetch()?;

        {
            let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
                context: "listing cache".to_string(),
            })?;
            cache
                .entry(org_repo.to_string())
                .or_insert_with(|| result.clone());
        }

        Ok(result)
    }

    /// Number of cached repositories
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every listing, starting a new resolution session
    pub fn clear(&self) -> Result<()> {
        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "listing cache".to_string(),
        })?;
        cache.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn listing(tag: &str, id: &str) -> RemoteRefs {
        let mut refs = RemoteRefs::default();
        refs.tags.insert(tag.to_string(), id.to_string());
        refs
    }

    #[test]
    fn test_fetches_once_per_repository() {
        let cache = ListingCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let refs = cache
                .get_or_fetch("actions/checkout", || {
                    calls.set(calls.get() + 1);
                    Ok(listing("v4", "aaa"))
                })
                .unwrap();
            assert_eq!(refs.tags.get("v4").map(String::as_str), Some("aaa"));
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let cache = ListingCache::new();
        let err = cache.get_or_fetch("org/repo", || {
            Err(Error::GitCommand {
                command: "ls-remote".to_string(),
                url: "https://github.com/org/repo".to_string(),
                stderr: "not found".to_string(),
            })
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_starts_new_session() {
        let cache = ListingCache::new();
        cache
            .get_or_fetch("org/repo", || Ok(listing("v1", "old")))
            .unwrap();
        cache.clear().unwrap();
        let refs = cache
            .get_or_fetch("org/repo", || Ok(listing("v1", "new")))
            .unwrap();
        assert_eq!(refs.tags.get("v1").map(String::as_str), Some("new"));
    }
}
