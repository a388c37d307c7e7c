//! Unilog
//!
//! One-call setup of a process-wide structured logger.
//!
//! # Features
//!
//! - **Two Output Formats**: JSON objects or tab-separated console lines,
//!   with fixed keys (`time`, `level`, `logger`, `caller`, `msg`, `stacktrace`)
//! - **Fan-out Destinations**: standard output always, plus standard error
//!   or a size-rotated, age-pruned log file
//! - **Runtime Threshold**: the minimum severity can be changed while
//!   the logger is in use
//! - **Global Accessor**: the latest configured logger is available
//!   anywhere through [`get_active_logger`]
//!
//! # Example
//!
//! ```no_run
//! use unilog::{configure_simple, get_active_logger, Severity};
//!
//! configure_simple("json", "./a.log", Severity::Debug);
//! get_active_logger().debug("a log 1");
//!
//! configure_simple("console", "/dev/stderr", Severity::Debug);
//! get_active_logger().sugar().error("b error 1");
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod global;
pub mod initialization;
pub mod level;
pub mod logger;
pub mod macros;
pub mod sugar;
pub mod writer;

pub use config::{
    LogFormat, LogOptions, LOG_FORMAT_CONSOLE, LOG_FORMAT_JSON, MAX_AGE_DAYS, MAX_BACKUPS,
    MAX_SIZE_MB, STDERR_PATH, STDOUT_PATH,
};
pub use error::{LogError, LogResult};
pub use global::{get_active_logger, is_configured, replace_global};
pub use initialization::{build_logger, build_logger_with_streams, configure, configure_simple};
pub use level::{AtomicLevel, Severity};
pub use logger::{Field, Logger};
pub use sugar::SugaredLogger;
pub use writer::{ConsoleStreams, Destination};
