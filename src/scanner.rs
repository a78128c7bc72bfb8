use crate::error::Error;
use crate::model::LogFileRecord;
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lists regular files directly under `dir` whose name matches `pattern`.
/// Subdirectories and symlinks are skipped. Output is sorted by path.
pub fn scan(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::MissingDirectory(dir.to_path_buf()));
    }
    let pattern = Pattern::new(pattern)?;

    let entries = fs::read_dir(dir).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Error reading directory {}: {}", dir.display(), err),
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if !pattern.matches(&name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        // Does not follow symlinks: removing or renaming a link would leave
        // the target's bytes where they are.
        if entry.file_type()?.is_file() {
            paths.push(path);
        } else {
            debug!("Skipping non-regular file {}", path.display());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Scans and stats every match. Files that disappear before they can be
/// stat'ed are dropped with a warning.
pub fn scan_records(dir: &Path, pattern: &str) -> Result<Vec<LogFileRecord>, Error> {
    let records = scan(dir, pattern)?
        .into_iter()
        .filter_map(|path| match LogFileRecord::stat(&path) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping {}: {}", path.display(), err);
                None
            }
        })
        .collect();
    Ok(records)
}
