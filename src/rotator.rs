use crate::config::AppConfig;
use crate::error::Error;
use crate::model::{FileError, FileOp, LogFileRecord, PassReport};
use crate::scanner;
use chrono::{DateTime, Local};
use indicatif::HumanBytes;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ARCHIVE_EXTENSION: &str = "archive";
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Scans the configured directory and rotates every match larger than
/// `max_size_bytes`. A scan failure fails the whole pass.
pub fn rotate(config: &AppConfig, now: DateTime<Local>) -> Result<PassReport, Error> {
    let paths = scanner::scan(&config.dir, &config.pattern)?;
    Ok(rotate_files(&paths, config.max_size_bytes, now))
}

/// Moves each oversized file to an archive next to it and leaves an empty
/// file at the original path.
pub fn rotate_files(paths: &[PathBuf], max_size_bytes: u64, now: DateTime<Local>) -> PassReport {
    let mut report = PassReport::default();

    for path in paths {
        report.summary.record_processed();
        record_outcome(&mut report, path, rotate_file(path, max_size_bytes, now));
    }

    info!("{}", summary_message(&report));
    report
}

/// A completed rename. `recreate_error` is set when the empty replacement
/// could not be created; the file is archived either way.
#[derive(Debug)]
struct Rotation {
    archive: PathBuf,
    size: u64,
    recreate_error: Option<FileError>,
}

fn record_outcome(
    report: &mut PassReport,
    path: &Path,
    outcome: Result<Option<Rotation>, FileError>,
) {
    match outcome {
        Ok(Some(rotation)) => {
            info!(
                "Rotated: {} -> {} (size: {})",
                path.display(),
                rotation.archive.display(),
                HumanBytes(rotation.size)
            );
            report.summary.record_affected(rotation.size);
            report.affected.push(path.to_path_buf());
            if let Some(err) = rotation.recreate_error {
                error!("Error rotating {}: {}", path.display(), err);
                report.failures.push(err);
            }
        }
        Ok(None) => {}
        Err(err) => {
            error!("Error rotating {}: {}", path.display(), err);
            report.failures.push(err);
        }
    }
}

fn summary_message(report: &PassReport) -> String {
    if report.summary.affected_count > 0 {
        format!(
            "Rotation complete: rotated {} large files ({})",
            report.summary.affected_count,
            HumanBytes(report.summary.total_bytes_affected),
        )
    } else {
        "No large logs to rotate".to_string()
    }
}

fn rotate_file(
    path: &Path,
    max_size_bytes: u64,
    now: DateTime<Local>,
) -> Result<Option<Rotation>, FileError> {
    let record = LogFileRecord::stat(path).map_err(|e| FileError::new(path, FileOp::Stat, e))?;
    if record.size_bytes <= max_size_bytes {
        return Ok(None);
    }

    let archive = reserve_archive(path, now).map_err(|e| FileError::new(path, FileOp::Reserve, e))?;

    // Renaming over our own placeholder is the only overwrite we allow.
    if let Err(err) = fs::rename(path, &archive) {
        let _ = fs::remove_file(&archive);
        return Err(FileError::new(path, FileOp::Rename, err));
    }

    // Append mode: a writer that already recreated the file is left alone.
    // Between the rename and this open the original path does not exist.
    let recreate_error = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .err()
        .map(|e| FileError::new(path, FileOp::Recreate, e));

    Ok(Some(Rotation {
        archive,
        size: record.size_bytes,
        recreate_error,
    }))
}

/// Archive path for `path` rotated at `now`: `<name>.<stamp>.archive`, or
/// `<name>.<stamp>.<n>.archive` for the `n`th collision.
pub fn archive_path(path: &Path, now: DateTime<Local>, attempt: u32) -> PathBuf {
    let stamp = now.format(ARCHIVE_TIMESTAMP_FORMAT);
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    if attempt == 0 {
        name.push(format!(".{}.{}", stamp, ARCHIVE_EXTENSION));
    } else {
        name.push(format!(".{}.{}.{}", stamp, attempt, ARCHIVE_EXTENSION));
    }
    path.with_file_name(name)
}

/// Claims a fresh archive name with an exclusive create so that neither an
/// older archive nor a concurrent run's archive is ever overwritten.
fn reserve_archive(path: &Path, now: DateTime<Local>) -> io::Result<PathBuf> {
    let mut attempt = 0;
    loop {
        let candidate = archive_path(path, now, attempt);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt < u32::MAX => {
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_archive_path_format() {
        let path = Path::new("/app/logs/honeypot.log");
        assert_eq!(
            archive_path(path, fixed_now(), 0),
            PathBuf::from("/app/logs/honeypot.log.20240309_140507.archive")
        );
        assert_eq!(
            archive_path(path, fixed_now(), 2),
            PathBuf::from("/app/logs/honeypot.log.20240309_140507.2.archive")
        );
    }

    #[test]
    fn test_rotate_oversized_file() {
        let dir = tempdir().unwrap();
        let big = dir.path().join("big.log");
        let small = dir.path().join("small.log");
        let content = vec![b'z'; 4096];
        fs::write(&big, &content).unwrap();
        fs::write(&small, vec![b'a'; 1024]).unwrap();

        let report = rotate_files(&[big.clone(), small.clone()], 1024, fixed_now());

        let archive = dir.path().join("big.log.20240309_140507.archive");
        assert_eq!(fs::read(&archive).unwrap(), content);
        assert_eq!(fs::metadata(&big).unwrap().len(), 0);
        assert_eq!(fs::metadata(&small).unwrap().len(), 1024);
        assert!(!dir
            .path()
            .join("small.log.20240309_140507.archive")
            .exists());

        assert_eq!(report.summary.processed_count, 2);
        assert_eq!(report.summary.affected_count, 1);
        assert_eq!(report.summary.total_bytes_affected, 4096);
        assert_eq!(report.affected, vec![big]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_rotate_never_overwrites_existing_archive() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        let taken = dir.path().join("app.log.20240309_140507.archive");
        fs::write(&taken, "earlier rotation").unwrap();
        fs::write(&log, "second rotation").unwrap();

        let report = rotate_files(&[log.clone()], 4, fixed_now());

        assert_eq!(report.summary.affected_count, 1);
        assert_eq!(fs::read_to_string(&taken).unwrap(), "earlier rotation");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.20240309_140507.1.archive")).unwrap(),
            "second rotation"
        );
        assert_eq!(fs::metadata(&log).unwrap().len(), 0);
    }

    #[test]
    fn test_rotate_vanished_file_is_isolated() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone.log");
        let big = dir.path().join("big.log");
        fs::write(&big, vec![b'q'; 32]).unwrap();

        let report = rotate_files(&[gone.clone(), big], 16, fixed_now());

        assert_eq!(report.summary.affected_count, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, FileOp::Stat);
        assert_eq!(report.failures[0].kind(), io::ErrorKind::NotFound);
        assert!(!dir.path().join("gone.log.20240309_140507.archive").exists());
    }

    #[test]
    fn test_failed_recreate_still_counts_as_rotated() {
        let mut report = PassReport::default();
        let path = Path::new("/app/logs/busy.log");
        let rotation = Rotation {
            archive: archive_path(path, fixed_now(), 0),
            size: 5000,
            recreate_error: Some(FileError::new(
                path,
                FileOp::Recreate,
                io::Error::from(io::ErrorKind::PermissionDenied),
            )),
        };

        record_outcome(&mut report, path, Ok(Some(rotation)));

        assert_eq!(report.summary.affected_count, 1);
        assert_eq!(report.summary.total_bytes_affected, 5000);
        assert_eq!(report.affected, vec![path.to_path_buf()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].op, FileOp::Recreate);
    }

    #[test]
    fn test_summary_message_is_plain_text() {
        let dir = tempdir().unwrap();
        let big = dir.path().join("big.log");
        fs::write(&big, vec![b'r'; 3072]).unwrap();

        let report = rotate_files(&[big], 1024, fixed_now());
        let message = summary_message(&report);
        assert_eq!(message, "Rotation complete: rotated 1 large files (3.00 KiB)");
        assert!(!message.contains('\x1b'));
        assert_eq!(
            summary_message(&PassReport::default()),
            "No large logs to rotate"
        );
    }

    #[test]
    fn test_rotate_at_threshold_is_untouched() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("exact.log");
        fs::write(&log, vec![b'e'; 100]).unwrap();

        let report = rotate_files(&[log.clone()], 100, fixed_now());

        assert_eq!(report.summary.affected_count, 0);
        assert_eq!(fs::metadata(&log).unwrap().len(), 100);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
