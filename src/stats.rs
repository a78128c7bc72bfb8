use crate::error::Error;
use crate::model::LogFileRecord;
use crate::scanner;
use chrono::{DateTime, Local};
use indicatif::HumanBytes;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogStats {
    pub file_count: usize,
    pub total_bytes: u64,
    /// Earliest mtime. On ties the first file in scan order wins.
    pub oldest: Option<LogFileRecord>,
}

impl LogStats {
    pub fn from_records(records: impl IntoIterator<Item = LogFileRecord>) -> Self {
        let mut stats = LogStats::default();
        for record in records {
            stats.file_count += 1;
            stats.total_bytes += record.size_bytes;
            let is_older = stats
                .oldest
                .as_ref()
                .map_or(true, |oldest| record.last_modified < oldest.last_modified);
            if is_older {
                stats.oldest = Some(record);
            }
        }
        stats
    }

    /// Logs the stats under `label`. Age of the oldest file is relative to `now`.
    pub fn report(&self, label: &str, now: DateTime<Local>) {
        info!("{}", label);
        for line in self.summary_lines(now) {
            info!("{}", line);
        }
    }

    fn summary_lines(&self, now: DateTime<Local>) -> Vec<String> {
        let mut lines = vec![
            "Log statistics:".to_string(),
            format!("  Total files: {}", self.file_count),
            format!("  Total size: {}", HumanBytes(self.total_bytes)),
        ];
        if let Some(oldest) = &self.oldest {
            lines.push(format!(
                "  Oldest file: {} ({}, {} days old)",
                oldest.file_name(),
                oldest.last_modified.format("%Y-%m-%d %H:%M:%S"),
                oldest.age(now).num_days()
            ));
        }
        lines
    }
}

/// Read-only pass over the directory.
pub fn collect(dir: &Path, pattern: &str) -> Result<LogStats, Error> {
    Ok(LogStats::from_records(scanner::scan_records(dir, pattern)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn record(name: &str, size: u64, days_ago: i64) -> LogFileRecord {
        let base = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        LogFileRecord {
            path: PathBuf::from(name),
            size_bytes: size,
            last_modified: base - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_stats_from_records() {
        let stats = LogStats::from_records(vec![
            record("a.log", 10, 1),
            record("b.log", 20, 5),
            record("c.log", 30, 3),
        ]);
        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.total_bytes, 60);
        assert_eq!(stats.oldest.unwrap().path, PathBuf::from("b.log"));
    }

    #[test]
    fn test_oldest_tie_keeps_first_in_scan_order() {
        let stats = LogStats::from_records(vec![
            record("first.log", 1, 7),
            record("second.log", 1, 7),
        ]);
        assert_eq!(stats.oldest.unwrap().path, PathBuf::from("first.log"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = LogStats::from_records(Vec::new());
        assert_eq!(stats, LogStats::default());
        stats.report("Empty:", Local::now());
    }

    #[test]
    fn test_summary_lines_are_plain_text() {
        let stats = LogStats::from_records(vec![
            record("a.log", 1024, 2),
            record("b.log", 1024, 12),
        ]);
        let now = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let lines = stats.summary_lines(now);
        assert_eq!(
            lines,
            vec![
                "Log statistics:".to_string(),
                "  Total files: 2".to_string(),
                "  Total size: 2.00 KiB".to_string(),
                "  Oldest file: b.log (2024-05-20 12:00:00, 12 days old)".to_string(),
            ]
        );
        assert!(lines.iter().all(|line| !line.contains('\x1b')));
    }

    #[test]
    fn test_collect_is_read_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "aaaa").unwrap();
        fs::write(dir.path().join("b.log"), "bb").unwrap();
        fs::write(dir.path().join("c.txt"), "ignored").unwrap();

        let first = collect(dir.path(), "*.log").unwrap();
        let second = collect(dir.path(), "*.log").unwrap();
        assert_eq!(first.file_count, 2);
        assert_eq!(first.total_bytes, 6);
        assert_eq!(first.file_count, second.file_count);
        assert_eq!(first.total_bytes, second.total_bytes);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
