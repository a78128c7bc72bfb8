use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "log-janitor")]
#[command(about = "Deletes expired log files and rotates oversized ones", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report, delete expired logs, rotate large logs, report again (default)
    Run,
    /// Report log statistics without touching any file
    Stats,
    /// Print configuration values
    PrintConfig,
}
