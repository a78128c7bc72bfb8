use crate::config::AppConfig;
use crate::error::Error;
use crate::model::{FileError, FileOp, LogFileRecord, PassReport};
use crate::scanner;
use chrono::{DateTime, Duration, Local};
use indicatif::HumanBytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Scans the configured directory and deletes every match older than the
/// retention window. A scan failure fails the whole pass.
pub fn reap(config: &AppConfig, now: DateTime<Local>) -> Result<PassReport, Error> {
    info!(
        "Starting cleanup - removing logs older than {} days",
        config.retention_days
    );
    let paths = scanner::scan(&config.dir, &config.pattern)?;
    Ok(reap_files(&paths, config.retention(), now))
}

/// Deletes each file whose age exceeds `retention`. Errors on one file are
/// recorded and the pass moves on to the next.
pub fn reap_files(paths: &[PathBuf], retention: Duration, now: DateTime<Local>) -> PassReport {
    let mut report = PassReport::default();

    for path in paths {
        report.summary.record_processed();
        match reap_file(path, retention, now) {
            Ok(Some(freed)) => {
                info!("Deleted: {} (size: {} bytes)", path.display(), freed);
                report.summary.record_affected(freed);
                report.affected.push(path.clone());
            }
            Ok(None) => {}
            Err(err) => {
                error!("Error processing {}: {}", path.display(), err);
                report.failures.push(err);
            }
        }
    }

    info!("{}", summary_message(&report));
    report
}

fn summary_message(report: &PassReport) -> String {
    if report.summary.affected_count > 0 {
        format!(
            "Cleanup complete: deleted {} files, freed {}",
            report.summary.affected_count,
            HumanBytes(report.summary.total_bytes_affected),
        )
    } else {
        "No old logs to delete".to_string()
    }
}

/// Returns the freed size when the file was deleted, `None` when it is
/// still within retention.
fn reap_file(
    path: &Path,
    retention: Duration,
    now: DateTime<Local>,
) -> Result<Option<u64>, FileError> {
    let record = LogFileRecord::stat(path).map_err(|e| FileError::new(path, FileOp::Stat, e))?;
    if record.age(now) <= retention {
        return Ok(None);
    }
    fs::remove_file(path).map_err(|e| FileError::new(path, FileOp::Remove, e))?;
    Ok(Some(record.size_bytes))
}
