//! Configuration for the process-wide logger.
//!
//! This module provides the output format, the package defaults, and the
//! [`LogOptions`] record that the factory in [`crate::initialization`]
//! turns into a logger.

use crate::error::{LogError, LogResult};
use crate::level::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the JSON format
pub const LOG_FORMAT_JSON: &str = "json";
/// Name of the console format
pub const LOG_FORMAT_CONSOLE: &str = "console";

/// Default max size of the active log file before it is rotated, in MB
pub const MAX_SIZE_MB: u64 = 1;
/// Default number of rotated backups to keep
pub const MAX_BACKUPS: usize = 5;
/// Default max age of a rotated backup before it is deleted, in days
pub const MAX_AGE_DAYS: u64 = 7;

/// Destination marker for standard output; never opens a file
pub const STDOUT_PATH: &str = "/dev/stdout";
/// Destination marker for standard error; never opens a file
pub const STDERR_PATH: &str = "/dev/stderr";

/// Output format for records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,

    /// Tab-separated, human-readable line
    Console,
}

impl LogFormat {
    /// Map a format name onto a format, falling back to `Console` for
    /// anything that is not exactly `"json"`.
    ///
    /// Returns the format and whether the name was recognized. A typo such
    /// as `"jsno"` silently selects console output; callers that want to
    /// reject typos should use [`str::parse`] instead.
    pub fn from_name_lossy(name: &str) -> (Self, bool) {
        match name {
            LOG_FORMAT_JSON => (LogFormat::Json, true),
            LOG_FORMAT_CONSOLE => (LogFormat::Console, true),
            _ => (LogFormat::Console, false),
        }
    }

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => LOG_FORMAT_JSON,
            LogFormat::Console => LOG_FORMAT_CONSOLE,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            LOG_FORMAT_JSON => Ok(LogFormat::Json),
            LOG_FORMAT_CONSOLE => Ok(LogFormat::Console),
            _ => Err(LogError::InvalidFormat(s.to_string())),
        }
    }
}

/// Options for building a logger.
///
/// Setters take `self` by value and return the updated record, so a base
/// record can be cloned and specialised without the copies affecting each
/// other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Output format
    pub format: LogFormat,

    /// Minimum severity written
    pub level: Severity,

    /// Max size of the active log file before rotation, in MB
    pub max_size_mb: u64,

    /// Rotated backups to keep; 0 keeps all of them
    pub max_backups: usize,

    /// Max age of rotated backups, in days; 0 disables age-based removal
    pub max_age_days: u64,

    /// Log file path, or one of the standard stream markers
    pub file_name: String,

    /// Gzip rotated backups
    pub compress: bool,

    /// Development mode: `dpanic` records panic after being written
    pub development: bool,

    /// Records at or above this severity carry a stack trace
    pub stacktrace_level: Option<Severity>,

    /// Root logger name, rendered under the `logger` key
    pub name: Option<String>,
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            format: LogFormat::Json,
            level: Severity::Debug,
            max_size_mb: MAX_SIZE_MB,
            max_backups: MAX_BACKUPS,
            max_age_days: MAX_AGE_DAYS,
            file_name: STDOUT_PATH.to_string(),
            compress: true,
            development: true,
            stacktrace_level: Some(Severity::DPanic),
            name: None,
        }
    }
}

impl LogOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the minimum severity
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Set the destination: a file path or one of [`STDOUT_PATH`] / [`STDERR_PATH`]
    pub fn with_destination(self, destination: impl Into<String>) -> Self {
        self.with_file_name(destination)
    }

    /// Set the log file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Set the max size of the active file in MB
    pub fn with_max_size(mut self, size_mb: u64) -> Self {
        self.max_size_mb = size_mb;
        self
    }

    /// Set the number of rotated backups to keep
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Set the max age of rotated backups in days
    pub fn with_max_age(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    /// Enable or disable gzip of rotated backups
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable development mode
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Capture stack traces at or above `level`; `None` disables them
    pub fn with_stacktrace_level(mut self, level: Option<Severity>) -> Self {
        self.stacktrace_level = level;
        self
    }

    /// Set the root logger name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults overridden by `UNILOG_*` environment variables.
    ///
    /// Recognized variables: `UNILOG_FORMAT`, `UNILOG_LEVEL`, `UNILOG_FILE`,
    /// `UNILOG_MAX_SIZE_MB`, `UNILOG_MAX_BACKUPS`, `UNILOG_MAX_AGE_DAYS`,
    /// `UNILOG_COMPRESS`, `UNILOG_DEVELOPMENT`.
    pub fn from_env() -> LogResult<Self> {
        let mut options = Self::default();
        options.apply_env_overrides()?;
        Ok(options)
    }

    /// Apply `UNILOG_*` environment overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> LogResult<()> {
        if let Ok(value) = std::env::var("UNILOG_FORMAT") {
            self.format = value.parse()?;
        }
        if let Ok(value) = std::env::var("UNILOG_LEVEL") {
            self.level = value.parse()?;
        }
        if let Ok(value) = std::env::var("UNILOG_FILE") {
            self.file_name = value;
        }
        if let Ok(value) = std::env::var("UNILOG_MAX_SIZE_MB") {
            self.max_size_mb = value.parse().map_err(|_| {
                LogError::env_var_parsing("UNILOG_MAX_SIZE_MB", &value, "expected a size in MB")
            })?;
        }
        if let Ok(value) = std::env::var("UNILOG_MAX_BACKUPS") {
            self.max_backups = value.parse().map_err(|_| {
                LogError::env_var_parsing("UNILOG_MAX_BACKUPS", &value, "expected a file count")
            })?;
        }
        if let Ok(value) = std::env::var("UNILOG_MAX_AGE_DAYS") {
            self.max_age_days = value.parse().map_err(|_| {
                LogError::env_var_parsing("UNILOG_MAX_AGE_DAYS", &value, "expected a number of days")
            })?;
        }
        if let Ok(value) = std::env::var("UNILOG_COMPRESS") {
            self.compress = parse_bool("UNILOG_COMPRESS", &value)?;
        }
        if let Ok(value) = std::env::var("UNILOG_DEVELOPMENT") {
            self.development = parse_bool("UNILOG_DEVELOPMENT", &value)?;
        }
        Ok(())
    }
}

fn parse_bool(variable_name: &str, value: &str) -> LogResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LogError::env_var_parsing(
            variable_name,
            value,
            "expected a boolean (true/false)",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("console".parse::<LogFormat>().unwrap(), LogFormat::Console);
        assert!("logfmt".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_case_insensitive() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Console".parse::<LogFormat>().unwrap(), LogFormat::Console);
    }

    #[test]
    fn test_lossy_format_falls_back_to_console() {
        assert_eq!(LogFormat::from_name_lossy("json"), (LogFormat::Json, true));
        assert_eq!(LogFormat::from_name_lossy("console"), (LogFormat::Console, true));
        // Exact match only, so even a case change is a miss
        assert_eq!(LogFormat::from_name_lossy("JSON"), (LogFormat::Console, false));
        assert_eq!(LogFormat::from_name_lossy("jsno"), (LogFormat::Console, false));
    }

    #[test]
    fn test_default_options() {
        let options = LogOptions::default();
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(options.level, Severity::Debug);
        assert_eq!(options.max_size_mb, MAX_SIZE_MB);
        assert_eq!(options.max_backups, MAX_BACKUPS);
        assert_eq!(options.max_age_days, MAX_AGE_DAYS);
        assert_eq!(options.file_name, STDOUT_PATH);
        assert!(options.compress);
        assert!(options.development);
    }

    #[test]
    fn test_options_builder() {
        let options = LogOptions::new()
            .with_format(LogFormat::Console)
            .with_level(Severity::Warn)
            .with_destination("/var/log/app.log")
            .with_max_size(64)
            .with_max_backups(2)
            .with_max_age(30);

        assert_eq!(options.format, LogFormat::Console);
        assert_eq!(options.level, Severity::Warn);
        assert_eq!(options.file_name, "/var/log/app.log");
        assert_eq!(options.max_size_mb, 64);
        assert_eq!(options.max_backups, 2);
        assert_eq!(options.max_age_days, 30);
    }

    #[test]
    fn test_setters_do_not_alias() {
        let base = LogOptions::new().with_level(Severity::Info);
        let json = base.clone().with_format(LogFormat::Json);
        let console = base.clone().with_format(LogFormat::Console);

        assert_eq!(base.format, LogFormat::Json);
        assert_eq!(json.format, LogFormat::Json);
        assert_eq!(console.format, LogFormat::Console);
        assert_eq!(console.level, Severity::Info);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "OFF").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
