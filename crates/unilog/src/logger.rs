//! The logger handle.
//!
//! A [`Logger`] owns a `tracing` dispatcher wired to its encoder,
//! destinations and severity threshold. Cloning is cheap; clones, named
//! children and children with context fields share the same core.

use crate::config::LogFormat;
use crate::encoder::short_caller;
use crate::level::{AtomicLevel, Severity};
use crate::sugar::SugaredLogger;
use crate::writer::{FanOut, RotatingFile, RotationPolicy};
use serde::Serialize;
use serde_json::{Map, Value};
use std::backtrace::Backtrace;
use std::fmt;
use std::io;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};

/// Target of every event a `Logger` emits
pub const RECORD_TARGET: &str = "unilog";

/// A typed key/value pair attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    value: Value,
}

impl Field {
    /// Field holding a JSON value
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Field holding the `Display` rendering of `value`
    pub fn display(key: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(key, value.to_string())
    }

    /// Field holding any serializable value. Serialization failures are
    /// recorded as the error text.
    pub fn any(key: impl Into<String>, value: &impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| Value::String(e.to_string()));
        Self::new(key, value)
    }

    /// Field key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Field value
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Field {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

#[derive(Debug)]
pub(crate) struct LoggerCore {
    pub dispatch: Dispatch,
    pub level: AtomicLevel,
    pub format: LogFormat,
    pub development: bool,
    pub stacktrace_level: Option<Severity>,
    pub writer: Option<FanOut>,
}

/// Handle to a configured logger
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    name: Option<Arc<str>>,
    context: Arc<[Field]>,
}

impl Logger {
    pub(crate) fn from_core(core: LoggerCore, name: Option<String>) -> Self {
        Self {
            core: Arc::new(core),
            name: name.map(Arc::from),
            context: Arc::from(Vec::new()),
        }
    }

    /// A logger that writes nothing. `panic` records still panic.
    pub fn noop() -> Self {
        Self::from_core(
            LoggerCore {
                dispatch: Dispatch::none(),
                level: AtomicLevel::new(Severity::Debug),
                format: LogFormat::default(),
                development: false,
                stacktrace_level: None,
                writer: None,
            },
            None,
        )
    }

    /// Whether this is a no-op logger
    pub fn is_noop(&self) -> bool {
        self.core.writer.is_none()
    }

    /// Log at debug severity
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message, &[]);
    }

    /// Log at info severity
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message, &[]);
    }

    /// Log at warn severity
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, message, &[]);
    }

    /// Log at error severity
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message, &[]);
    }

    /// Log at dpanic severity; panics afterwards in development mode
    #[track_caller]
    pub fn dpanic(&self, message: impl fmt::Display) {
        self.log(Severity::DPanic, message, &[]);
    }

    /// Log at panic severity, then panic
    #[track_caller]
    pub fn panic(&self, message: impl fmt::Display) {
        self.log(Severity::Panic, message, &[]);
    }

    /// Log at debug severity with fields
    #[track_caller]
    pub fn debug_with(&self, message: impl fmt::Display, fields: &[Field]) {
        self.log(Severity::Debug, message, fields);
    }

    /// Log at info severity with fields
    #[track_caller]
    pub fn info_with(&self, message: impl fmt::Display, fields: &[Field]) {
        self.log(Severity::Info, message, fields);
    }

    /// Log at warn severity with fields
    #[track_caller]
    pub fn warn_with(&self, message: impl fmt::Display, fields: &[Field]) {
        self.log(Severity::Warn, message, fields);
    }

    /// Log at error severity with fields
    #[track_caller]
    pub fn error_with(&self, message: impl fmt::Display, fields: &[Field]) {
        self.log(Severity::Error, message, fields);
    }

    /// Log a record at any severity.
    ///
    /// Records below the threshold are dropped before anything is
    /// formatted. `Panic` records, and `DPanic` records in development
    /// mode, panic with the message once written.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl fmt::Display, fields: &[Field]) {
        self.log_at(severity, message, fields, Location::caller());
    }

    pub(crate) fn log_at(
        &self,
        severity: Severity,
        message: impl fmt::Display,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        if !self.enabled(severity) {
            return;
        }
        let message = message.to_string();
        self.write_record(severity, &message, fields, location);

        match severity {
            Severity::Panic => panic!("{message}"),
            Severity::DPanic if self.core.development => panic!("{message}"),
            _ => {}
        }
    }

    fn write_record(
        &self,
        severity: Severity,
        message: &str,
        fields: &[Field],
        location: &Location<'_>,
    ) {
        if self.is_noop() {
            return;
        }
        let caller = short_caller(location.file(), location.line());
        let logger = self.name.as_deref().unwrap_or_default();
        let context = self.encode_fields(fields);
        let stacktrace = if self.captures_stacktrace(severity) {
            Backtrace::force_capture().to_string()
        } else {
            String::new()
        };

        dispatcher::with_default(&self.core.dispatch, || {
            macro_rules! emit {
                ($level:expr) => {
                    tracing::event!(
                        target: RECORD_TARGET,
                        $level,
                        severity = severity.as_str(),
                        caller = caller.as_str(),
                        logger = logger,
                        fields = context.as_str(),
                        stacktrace = stacktrace.as_str(),
                        "{}",
                        message
                    )
                };
            }
            match severity {
                Severity::Debug => emit!(tracing::Level::DEBUG),
                Severity::Info => emit!(tracing::Level::INFO),
                Severity::Warn => emit!(tracing::Level::WARN),
                Severity::Error | Severity::DPanic | Severity::Panic => {
                    emit!(tracing::Level::ERROR)
                }
            }
        });
    }

    fn encode_fields(&self, fields: &[Field]) -> String {
        if self.context.is_empty() && fields.is_empty() {
            return String::new();
        }
        let mut map = Map::new();
        for field in self.context.iter().chain(fields) {
            map.insert(field.key.clone(), field.value.clone());
        }
        Value::Object(map).to_string()
    }

    fn captures_stacktrace(&self, severity: Severity) -> bool {
        self.core
            .stacktrace_level
            .is_some_and(|threshold| severity >= threshold)
    }

    /// Child logger whose records carry `fields` in addition to this
    /// logger's own context fields
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let context: Vec<Field> = self.context.iter().cloned().chain(fields).collect();
        Logger {
            core: Arc::clone(&self.core),
            name: self.name.clone(),
            context: Arc::from(context),
        }
    }

    /// Child logger with `name` appended to this logger's name, dot separated
    pub fn named(&self, name: &str) -> Logger {
        let name: Arc<str> = match &self.name {
            Some(parent) if !name.is_empty() => Arc::from(format!("{parent}.{name}")),
            Some(parent) => Arc::clone(parent),
            None => Arc::from(name),
        };
        Logger {
            core: Arc::clone(&self.core),
            name: Some(name),
            context: Arc::clone(&self.context),
        }
    }

    /// Logger name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Loosely typed view of this logger
    pub fn sugar(&self) -> SugaredLogger {
        SugaredLogger::new(self.clone())
    }

    /// Whether a record at `severity` would be written
    pub fn enabled(&self, severity: Severity) -> bool {
        self.core.level.enabled(severity)
    }

    /// Current threshold
    pub fn level(&self) -> Severity {
        self.core.level.level()
    }

    /// Change the threshold of this logger and every clone of it
    pub fn set_level(&self, severity: Severity) {
        self.core.level.set_level(severity);
    }

    /// The shared threshold
    pub fn atomic_level(&self) -> &AtomicLevel {
        &self.core.level
    }

    /// Output format
    pub fn format(&self) -> LogFormat {
        self.core.format
    }

    /// Whether development mode is on
    pub fn is_development(&self) -> bool {
        self.core.development
    }

    /// Path of the rotating log file, when one is attached
    pub fn log_file(&self) -> Option<&Path> {
        self.core
            .writer
            .as_ref()
            .and_then(FanOut::file)
            .map(|file| file.path())
    }

    /// Rotation limits of the attached log file
    pub fn rotation_policy(&self) -> Option<RotationPolicy> {
        self.core
            .writer
            .as_ref()
            .and_then(FanOut::file)
            .map(RotatingFile::policy)
    }

    /// Run `f` with this logger's dispatcher as the thread's default, so
    /// plain `tracing` macros inside it are written by this logger
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.core.dispatch, f)
    }

    /// Make this logger the current thread's `tracing` dispatcher until the
    /// guard is dropped
    pub fn set_default(&self) -> DefaultGuard {
        dispatcher::set_default(&self.core.dispatch)
    }

    /// The underlying dispatcher
    pub fn dispatch(&self) -> &Dispatch {
        &self.core.dispatch
    }

    /// Flush every destination
    pub fn sync(&self) -> io::Result<()> {
        match &self.core.writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("format", &self.core.format)
            .field("development", &self.core.development)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_constructors() {
        let field = Field::new("count", 3);
        assert_eq!(field.key(), "count");
        assert_eq!(field.value(), &json!(3));

        let field: Field = ("user", "alice").into();
        assert_eq!(field.value(), &json!("alice"));

        let field = Field::display("path", std::path::Path::new("/tmp/x").display());
        assert_eq!(field.value(), &json!("/tmp/x"));

        let field = Field::any("tags", &vec!["a", "b"]);
        assert_eq!(field.value(), &json!(["a", "b"]));
    }

    #[test]
    fn test_noop_logger_is_silent_and_inert() {
        let logger = Logger::noop();
        assert!(logger.is_noop());
        assert!(logger.log_file().is_none());
        logger.info("goes nowhere");
        logger.dpanic("does not panic outside development mode");
        assert!(logger.sync().is_ok());
    }

    #[test]
    #[should_panic(expected = "fatal condition")]
    fn test_noop_logger_panic_still_panics() {
        Logger::noop().panic("fatal condition");
    }

    #[test]
    fn test_named_children_join_with_dots() {
        let root = Logger::noop().named("api");
        let child = root.named("auth");
        assert_eq!(root.name(), Some("api"));
        assert_eq!(child.name(), Some("api.auth"));
        assert_eq!(child.named("").name(), Some("api.auth"));
    }

    #[test]
    fn test_context_fields_accumulate() {
        let logger = Logger::noop()
            .with([Field::new("service", "billing")])
            .with([Field::new("region", "eu")]);
        let encoded: Value = serde_json::from_str(&logger.encode_fields(&[Field::new("id", 7)])).unwrap();
        assert_eq!(encoded, json!({"service": "billing", "region": "eu", "id": 7}));
    }

    #[test]
    fn test_later_fields_win() {
        let logger = Logger::noop().with([Field::new("attempt", 1)]);
        let encoded: Value = serde_json::from_str(&logger.encode_fields(&[Field::new("attempt", 2)])).unwrap();
        assert_eq!(encoded, json!({"attempt": 2}));
    }

    #[test]
    fn test_level_shared_between_clones() {
        let logger = Logger::noop();
        let clone = logger.clone();
        clone.set_level(Severity::Error);
        assert!(!logger.enabled(Severity::Warn));
        assert_eq!(logger.level(), Severity::Error);
    }
}
