use crate::config::AppConfig;
use crate::error::Error;
use crate::model::PassReport;
use crate::reaper;
use crate::rotator;
use crate::stats::{self, LogStats};
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info};

/// Steps of a cleanup run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    VerifyDirectory,
    ReportBefore,
    Reap,
    Rotate,
    ReportAfter,
    Done,
    Failed,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Start => Stage::VerifyDirectory,
            Stage::VerifyDirectory => Stage::ReportBefore,
            Stage::ReportBefore => Stage::Reap,
            Stage::Reap => Stage::Rotate,
            Stage::Rotate => Stage::ReportAfter,
            Stage::ReportAfter | Stage::Done => Stage::Done,
            Stage::Failed => Stage::Failed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::VerifyDirectory => "directory check",
            Stage::ReportBefore => "stats before cleanup",
            Stage::Reap => "cleanup",
            Stage::Rotate => "rotation",
            Stage::ReportAfter => "stats after cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// `None` when stats could not be gathered; that never fails a run.
    pub before: Option<LogStats>,
    pub reaped: PassReport,
    pub rotated: PassReport,
    pub after: Option<LogStats>,
}

pub struct Janitor {
    config: AppConfig,
}

impl Janitor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs stats, reap, rotate and stats again, in that order.
    ///
    /// A missing directory or a pass-level error stops the run and comes back
    /// as [`Error::Stage`]. Per-file errors only show up in the pass reports.
    pub fn run(&self, now: DateTime<Local>) -> Result<RunReport, Error> {
        info!("=== Log Cleanup ===");
        let started = Instant::now();
        let mut stage = Stage::Start;

        stage = self.advance(stage);
        if !self.config.dir.is_dir() {
            return Err(self.fail(stage, Error::MissingDirectory(self.config.dir.clone())));
        }

        stage = self.advance(stage);
        let before = self.report_stats("Before cleanup:", now);

        stage = self.advance(stage);
        let reaped = reaper::reap(&self.config, now).map_err(|err| self.fail(stage, err))?;

        stage = self.advance(stage);
        let rotated = rotator::rotate(&self.config, now).map_err(|err| self.fail(stage, err))?;

        stage = self.advance(stage);
        let after = self.report_stats("After cleanup:", now);

        self.advance(stage);
        info!(
            "Cleanup completed successfully in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        Ok(RunReport {
            before,
            reaped,
            rotated,
            after,
        })
    }

    /// Read-only stats for the configured directory.
    pub fn stats(&self) -> Result<LogStats, Error> {
        stats::collect(&self.config.dir, &self.config.pattern)
    }

    fn advance(&self, stage: Stage) -> Stage {
        let next = stage.next();
        debug!("Stage: {} -> {}", stage, next);
        next
    }

    fn report_stats(&self, label: &str, now: DateTime<Local>) -> Option<LogStats> {
        match self.stats() {
            Ok(stats) => {
                stats.report(label, now);
                Some(stats)
            }
            Err(err) => {
                error!("Failed to get stats: {}", err);
                None
            }
        }
    }

    /// Moves to [`Stage::Failed`]. Logging the error is left to the caller.
    fn fail(&self, stage: Stage, err: Error) -> Error {
        debug!("Stage: {} -> {}", stage, Stage::Failed);
        Error::Stage {
            stage,
            source: Box::new(err),
        }
    }
}
