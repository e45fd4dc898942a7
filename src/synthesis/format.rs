//! Optional external pretty-printer run over written files.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};

/// Runs `command` with `files` appended, from `cwd`.
///
/// A formatter that is missing or exits unsuccessfully only produces a
/// warning: the generated files are already valid as written.
pub fn run_formatter(command: &[String], files: &[PathBuf], cwd: &Path) -> bool {
    let Some((program, args)) = command.split_first() else {
        return true;
    };
    if files.is_empty() {
        return true;
    }

    debug!("Formatting {} file(s) with {}", files.len(), program);
    let output = Command::new(program)
        .args(args)
        .args(files)
        .current_dir(cwd)
        .output();

    match output {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            warn!(
                "Formatter '{}' exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            warn!("Could not run formatter '{}': {}", program, e);
            false
        }
    }
}
