use chrono::{DateTime, Duration, Local};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size and modification time of one log file, as seen at stat time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub last_modified: DateTime<Local>,
}

impl LogFileRecord {
    pub fn stat(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            last_modified: DateTime::<Local>::from(metadata.modified()?),
        })
    }

    /// Age relative to `now`. Negative when the mtime is in the future.
    pub fn age(&self, now: DateTime<Local>) -> Duration {
        now.signed_duration_since(self.last_modified)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OperationSummary {
    /// Files examined by the pass.
    pub processed_count: usize,
    /// Files deleted or rotated.
    pub affected_count: usize,
    pub total_bytes_affected: u64,
}

impl OperationSummary {
    pub fn record_processed(&mut self) {
        self.processed_count += 1;
    }

    pub fn record_affected(&mut self, bytes: u64) {
        self.affected_count += 1;
        self.total_bytes_affected += bytes;
    }
}

/// The filesystem call that failed for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Stat,
    Remove,
    /// Exclusive creation of the archive name.
    Reserve,
    Rename,
    Recreate,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileOp::Stat => "stat",
            FileOp::Remove => "remove",
            FileOp::Reserve => "reserve archive",
            FileOp::Rename => "rename",
            FileOp::Recreate => "recreate",
        };
        f.write_str(name)
    }
}

/// A failure confined to a single file. Collected, never propagated.
#[derive(Error, Debug)]
#[error("{op} failed for {}: {source}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    pub op: FileOp,
    #[source]
    pub source: io::Error,
}

impl FileError {
    pub fn new(path: &Path, op: FileOp, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            op,
            source,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// Outcome of a reap or rotate pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub summary: OperationSummary,
    /// Paths that were deleted (reap) or archived (rotate), in visit order.
    pub affected: Vec<PathBuf>,
    pub failures: Vec<FileError>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
