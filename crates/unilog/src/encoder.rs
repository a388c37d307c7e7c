//! Record encoders.
//!
//! Both formats share one set of field names and are plugged into the
//! `tracing-subscriber` fmt layer as a [`FormatEvent`] implementation.

use crate::config::LogFormat;
use crate::level::Severity;
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Key of the timestamp
pub const KEY_TIME: &str = "time";
/// Key of the severity
pub const KEY_LEVEL: &str = "level";
/// Key of the logger name
pub const KEY_NAME: &str = "logger";
/// Key of the call site
pub const KEY_CALLER: &str = "caller";
/// Key of the message
pub const KEY_MESSAGE: &str = "msg";
/// Key of the stack trace
pub const KEY_STACKTRACE: &str = "stacktrace";

/// ISO8601 with milliseconds and zone offset
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

// Event fields set by `Logger`; plain `tracing` events leave them unset
pub(crate) const FIELD_SEVERITY: &str = "severity";
pub(crate) const FIELD_CALLER: &str = "caller";
pub(crate) const FIELD_LOGGER: &str = "logger";
pub(crate) const FIELD_CONTEXT: &str = "fields";
pub(crate) const FIELD_STACKTRACE: &str = "stacktrace";
const FIELD_MESSAGE: &str = "message";

/// Field names written by the encoders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderKeys {
    pub time: &'static str,
    pub level: &'static str,
    pub name: &'static str,
    pub caller: &'static str,
    pub message: &'static str,
    pub stacktrace: &'static str,
}

impl Default for EncoderKeys {
    fn default() -> Self {
        EncoderKeys {
            time: KEY_TIME,
            level: KEY_LEVEL,
            name: KEY_NAME,
            caller: KEY_CALLER,
            message: KEY_MESSAGE,
            stacktrace: KEY_STACKTRACE,
        }
    }
}

/// A decoded event, ready to be rendered
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub time: DateTime<Local>,
    pub severity: Severity,
    pub logger: Option<String>,
    pub caller: Option<String>,
    pub message: String,
    pub fields: Map<String, Value>,
    pub stacktrace: Option<String>,
}

impl Record {
    fn from_event(event: &Event<'_>) -> Self {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| Severity::from_tracing(metadata.level()));
        let caller = visitor.caller.or_else(|| {
            metadata
                .file()
                .map(|file| short_caller(file, metadata.line().unwrap_or(0)))
        });

        Record {
            time: Local::now(),
            severity,
            logger: visitor.logger,
            caller,
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            stacktrace: visitor.stacktrace,
        }
    }
}

/// Collects event fields, splitting out the ones the encoders treat specially.
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    severity: Option<String>,
    caller: Option<String>,
    logger: Option<String>,
    stacktrace: Option<String>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);
        self.record_str(field, &buf);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            FIELD_MESSAGE => &mut self.message,
            FIELD_SEVERITY => &mut self.severity,
            FIELD_CALLER => &mut self.caller,
            FIELD_LOGGER => &mut self.logger,
            FIELD_STACKTRACE => &mut self.stacktrace,
            FIELD_CONTEXT => {
                if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(value) {
                    self.fields.extend(map);
                } else if !value.is_empty() {
                    self.insert(field, Value::String(value.to_string()));
                }
                return;
            }
            _ => {
                self.insert(field, Value::String(value.to_string()));
                return;
            }
        };
        // Logger always sets its own fields; empty means "not present"
        if !value.is_empty() || field.name() == FIELD_MESSAGE {
            *slot = Some(value.to_string());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.insert(field, Value::Number(n));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}

/// Renders records as JSON objects or console lines.
#[derive(Debug, Clone)]
pub struct RecordEncoder {
    format: LogFormat,
    keys: EncoderKeys,
}

impl RecordEncoder {
    /// Encoder for `format` using the default keys
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            keys: EncoderKeys::default(),
        }
    }

    /// Output format
    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub(crate) fn encode(&self, record: &Record) -> String {
        match self.format {
            LogFormat::Json => self.encode_json(record),
            LogFormat::Console => self.encode_console(record),
        }
    }

    fn encode_json(&self, record: &Record) -> String {
        let keys = &self.keys;
        let mut object = Map::new();
        object.insert(keys.level.to_string(), Value::from(record.severity.as_str()));
        object.insert(
            keys.time.to_string(),
            Value::from(record.time.format(TIME_FORMAT).to_string()),
        );
        if let Some(logger) = &record.logger {
            object.insert(keys.name.to_string(), Value::from(logger.as_str()));
        }
        if let Some(caller) = &record.caller {
            object.insert(keys.caller.to_string(), Value::from(caller.as_str()));
        }
        object.insert(keys.message.to_string(), Value::from(record.message.as_str()));
        for (key, value) in &record.fields {
            object.entry(key.clone()).or_insert_with(|| value.clone());
        }
        if let Some(stacktrace) = &record.stacktrace {
            object.insert(keys.stacktrace.to_string(), Value::from(stacktrace.as_str()));
        }
        Value::Object(object).to_string()
    }

    fn encode_console(&self, record: &Record) -> String {
        let mut line = format!(
            "{}\t{}",
            record.time.format(TIME_FORMAT),
            record.severity.as_str()
        );
        if let Some(logger) = &record.logger {
            line.push('\t');
            line.push_str(logger);
        }
        if let Some(caller) = &record.caller {
            line.push('\t');
            line.push_str(caller);
        }
        line.push('\t');
        line.push_str(&record.message);
        if !record.fields.is_empty() {
            line.push('\t');
            line.push_str(&Value::Object(record.fields.clone()).to_string());
        }
        if let Some(stacktrace) = &record.stacktrace {
            line.push('\n');
            line.push_str(stacktrace.trim_end());
        }
        line
    }
}

impl<S, N> FormatEvent<S, N> for RecordEncoder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = Record::from_event(event);
        writeln!(writer, "{}", self.encode(&record))
    }
}

/// Trim a source path to its last directory and file name, `dir/file.rs:42`.
pub fn short_caller(file: &str, line: u32) -> String {
    let mut parts = file.rsplit(|c| c == '/' || c == '\\');
    let name = parts.next().unwrap_or(file);
    match parts.next() {
        Some(dir) if !dir.is_empty() => format!("{dir}/{name}:{line}"),
        _ => format!("{name}:{line}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record() -> Record {
        let mut fields = Map::new();
        fields.insert("user".to_string(), Value::from("alice"));
        Record {
            time: Local::now(),
            severity: Severity::Info,
            logger: Some("api".to_string()),
            caller: Some("src/main.rs:10".to_string()),
            message: "request served".to_string(),
            fields,
            stacktrace: None,
        }
    }

    #[test]
    fn test_short_caller() {
        assert_eq!(short_caller("crates/unilog/src/lib.rs", 7), "src/lib.rs:7");
        assert_eq!(short_caller("main.rs", 3), "main.rs:3");
        assert_eq!(short_caller(r"C:\work\src\main.rs", 9), "src/main.rs:9");
    }

    #[test]
    fn test_json_keys_and_order() {
        let line = RecordEncoder::new(LogFormat::Json).encode(&record());
        let value: Value = serde_json::from_str(&line).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["level", "time", "logger", "caller", "msg", "user"]);
        assert_eq!(object["level"], "INFO");
        assert_eq!(object["msg"], "request served");
        assert_eq!(object["user"], "alice");
    }

    #[test]
    fn test_json_user_fields_do_not_override_reserved_keys() {
        let mut record = record();
        record.fields.insert("msg".to_string(), Value::from("spoofed"));
        let line = RecordEncoder::new(LogFormat::Json).encode(&record);
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["msg"], "request served");
    }

    #[test]
    fn test_json_stacktrace_is_last() {
        let mut record = record();
        record.stacktrace = Some("frame 0".to_string());
        let line = RecordEncoder::new(LogFormat::Json).encode(&record);
        let value: Value = serde_json::from_str(&line).unwrap();
        let last = value.as_object().unwrap().keys().last().cloned();
        assert_eq!(last.as_deref(), Some("stacktrace"));
    }

    #[test]
    fn test_console_line_layout() {
        let line = RecordEncoder::new(LogFormat::Console).encode(&record());
        let columns: Vec<&str> = line.split('\t').collect();

        assert_eq!(columns.len(), 6);
        assert_eq!(columns[1], "INFO");
        assert_eq!(columns[2], "api");
        assert_eq!(columns[3], "src/main.rs:10");
        assert_eq!(columns[4], "request served");
        assert_eq!(columns[5], r#"{"user":"alice"}"#);
    }

    #[test]
    fn test_console_stacktrace_on_next_line() {
        let mut record = record();
        record.fields.clear();
        record.stacktrace = Some("frame 0\nframe 1\n".to_string());
        let line = RecordEncoder::new(LogFormat::Console).encode(&record);
        let mut lines = line.lines();
        assert!(lines.next().unwrap().ends_with("request served"));
        assert_eq!(lines.next(), Some("frame 0"));
        assert_eq!(lines.next(), Some("frame 1"));
    }

    #[test]
    fn test_time_format() {
        let line = RecordEncoder::new(LogFormat::Json).encode(&record());
        let value: Value = serde_json::from_str(&line).unwrap();
        let time = value["time"].as_str().unwrap();
        assert!(DateTime::parse_from_str(time, TIME_FORMAT).is_ok());
    }
}
