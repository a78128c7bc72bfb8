use chrono::Duration;
use config::{Config, ConfigError, Environment, File as ConfigFile, Map};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LOG_DIR: &str = "/app/logs";
pub const DEFAULT_PATTERN: &str = "*.log";
pub const DEFAULT_RETENTION_DAYS: u64 = 30;
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Everything a run needs, resolved once at startup and passed down by value.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the log files. Only its direct children are considered.
    pub dir: PathBuf,
    /// Glob matched against file names, e.g. `*.log`.
    pub pattern: String,
    pub retention_days: u64,
    /// Files strictly larger than this are rotated.
    pub max_size_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            pattern: DEFAULT_PATTERN.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl AppConfig {
    pub fn retention(&self) -> Duration {
        i64::try_from(self.retention_days)
            .ok()
            .and_then(Duration::try_days)
            .unwrap_or(Duration::MAX)
    }
}

/// Defaults, then an optional `Config` file, then `LOG_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build_configuration(None)
}

/// Same as [`load_configuration`] but reads the environment from `vars`
/// instead of the process environment.
pub fn load_configuration_from(vars: Map<String, String>) -> Result<AppConfig, ConfigError> {
    build_configuration(Some(vars))
}

fn build_configuration(vars: Option<Map<String, String>>) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("dir", DEFAULT_LOG_DIR)?
        .set_default("pattern", DEFAULT_PATTERN)?
        .set_default("retention_days", DEFAULT_RETENTION_DAYS as i64)?
        .set_default("max_size_bytes", DEFAULT_MAX_SIZE_BYTES as i64)?
        .add_source(ConfigFile::with_name("Config").required(false))
        // LOG_RETENTION_DAYS -> retention_days, LOG_DIR -> dir, ...
        .add_source(
            Environment::with_prefix("LOG")
                .try_parsing(true)
                .source(vars),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
