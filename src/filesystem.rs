//! On-disk helpers for the registry document and the generated tree.
//!
//! Writes go through a temporary file in the destination directory followed
//! by a rename, so a crash never leaves a half-written file behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Atomically writes `data` to `path`, creating parent directories.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::filesystem(dir, e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::filesystem(dir, e))?;
    tmp.write_all(data).map_err(|e| Error::filesystem(path, e))?;
    tmp.persist(path).map_err(|e| Error::filesystem(path, e.error))?;
    Ok(())
}

/// Writes `data` unless the file already holds exactly those bytes.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, data: &[u8]) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == data => {
            debug!("Unchanged: {}", path.display());
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::filesystem(path, e)),
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Removes a file. A file that is already gone is not an error.
///
/// Returns whether something was removed.
pub fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::filesystem(path, e)),
    }
}

/// Removes `start` and then each ancestor that became empty, stopping
/// before `stop`. Failures are logged and end the walk.
pub fn prune_empty_dirs(start: &Path, stop: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let mut current = start.to_path_buf();

    while current.starts_with(stop) && current != stop {
        let is_empty = match fs::read_dir(&current) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !current.pop() {
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!("Could not inspect {}: {}", current.display(), e);
                break;
            }
        };
        if !is_empty {
            break;
        }
        if let Err(e) = fs::remove_dir(&current) {
            warn!("Could not remove empty directory {}: {}", current.display(), e);
            break;
        }
        debug!("Removed empty directory {}", current.display());
        removed.push(current.clone());
        if !current.pop() {
            break;
        }
    }

    removed
}

/// A directory entry as seen by the barrel rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Lists `dir` sorted by name. A missing directory lists as empty.
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::filesystem(dir, e)),
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| Error::filesystem(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::filesystem(dir, e))?;
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
