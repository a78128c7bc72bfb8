pub mod config;
pub mod error;
pub mod janitor;
pub mod model;
pub mod reaper;
pub mod rotator;
pub mod scanner;
pub mod stats;

pub use config::AppConfig;
pub use error::Error;
pub use janitor::{Janitor, RunReport, Stage};
pub use model::{FileError, FileOp, LogFileRecord, OperationSummary, PassReport};
pub use stats::LogStats;
