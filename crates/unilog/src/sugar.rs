//! Loosely typed logging on top of [`Logger`].
//!
//! Three call shapes per severity: plain (`info`), format-style (`infof`)
//! and key/value (`infow`). Key/value arguments alternate keys and values;
//! malformed lists are reported as separate error records instead of
//! failing the call.

use crate::level::Severity;
use crate::logger::{Field, Logger};
use serde_json::{json, Value};
use std::fmt;
use std::panic::Location;

const DANGLING_KEY_MESSAGE: &str = "Ignored key without a value.";
const NON_STRING_KEYS_MESSAGE: &str = "Ignored key-value pairs with non-string keys.";

/// Sugared view of a logger
#[derive(Debug, Clone)]
pub struct SugaredLogger {
    base: Logger,
}

impl SugaredLogger {
    pub(crate) fn new(base: Logger) -> Self {
        Self { base }
    }

    /// The strongly typed logger behind this view
    pub fn desugar(&self) -> &Logger {
        &self.base
    }

    /// Child view whose records carry `keys_and_values`
    #[track_caller]
    pub fn with(&self, keys_and_values: &[Value]) -> SugaredLogger {
        let fields = self.sweeten(keys_and_values);
        SugaredLogger::new(self.base.with(fields))
    }

    /// Child view with `name` appended to the logger name
    pub fn named(&self, name: &str) -> SugaredLogger {
        SugaredLogger::new(self.base.named(name))
    }

    /// Log at debug severity
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.base.log(Severity::Debug, message, &[]);
    }

    /// Log at info severity
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.base.log(Severity::Info, message, &[]);
    }

    /// Log at warn severity
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.base.log(Severity::Warn, message, &[]);
    }

    /// Log at error severity
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.base.log(Severity::Error, message, &[]);
    }

    /// Log at dpanic severity
    #[track_caller]
    pub fn dpanic(&self, message: impl fmt::Display) {
        self.base.log(Severity::DPanic, message, &[]);
    }

    /// Log at panic severity, then panic
    #[track_caller]
    pub fn panic(&self, message: impl fmt::Display) {
        self.base.log(Severity::Panic, message, &[]);
    }

    /// `debugf(format_args!("..", ..))`
    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.base.log(Severity::Debug, args, &[]);
    }

    /// Formatted info record
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.base.log(Severity::Info, args, &[]);
    }

    /// Formatted warn record
    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.base.log(Severity::Warn, args, &[]);
    }

    /// Formatted error record
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.base.log(Severity::Error, args, &[]);
    }

    /// `debugw("msg", &[json!("key"), json!(value), ...])`
    #[track_caller]
    pub fn debugw(&self, message: impl fmt::Display, keys_and_values: &[Value]) {
        self.logw(Severity::Debug, message, keys_and_values);
    }

    /// Info record with alternating keys and values
    #[track_caller]
    pub fn infow(&self, message: impl fmt::Display, keys_and_values: &[Value]) {
        self.logw(Severity::Info, message, keys_and_values);
    }

    /// Warn record with alternating keys and values
    #[track_caller]
    pub fn warnw(&self, message: impl fmt::Display, keys_and_values: &[Value]) {
        self.logw(Severity::Warn, message, keys_and_values);
    }

    /// Error record with alternating keys and values
    #[track_caller]
    pub fn errorw(&self, message: impl fmt::Display, keys_and_values: &[Value]) {
        self.logw(Severity::Error, message, keys_and_values);
    }

    #[track_caller]
    fn logw(&self, severity: Severity, message: impl fmt::Display, keys_and_values: &[Value]) {
        if !self.base.enabled(severity) {
            return;
        }
        let fields = self.sweeten(keys_and_values);
        self.base.log(severity, message, &fields);
    }

    /// Pair up alternating keys and values.
    ///
    /// A trailing key and pairs whose key is not a string are dropped and
    /// reported through the base logger at error severity.
    #[track_caller]
    fn sweeten(&self, keys_and_values: &[Value]) -> Vec<Field> {
        let mut fields = Vec::with_capacity(keys_and_values.len() / 2);
        let mut invalid = Vec::new();
        let mut dangling = None;

        for (index, pair) in keys_and_values.chunks(2).enumerate() {
            match pair {
                [Value::String(key), value] => fields.push(Field::new(key.clone(), value.clone())),
                [key, value] => invalid.push(json!({
                    "position": index * 2,
                    "key": key,
                    "value": value,
                })),
                [key] => dangling = Some(key.clone()),
                _ => {}
            }
        }

        let caller = Location::caller();
        if let Some(key) = dangling {
            self.report(DANGLING_KEY_MESSAGE, Field::new("ignored", key), caller);
        }
        if !invalid.is_empty() {
            self.report(NON_STRING_KEYS_MESSAGE, Field::new("invalid", invalid), caller);
        }
        fields
    }

    fn report(&self, message: &str, field: Field, caller: &'static Location<'static>) {
        self.base.log_at(Severity::Error, message, &[field], caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweeten_pairs_string_keys() {
        let sugar = Logger::noop().sugar();
        let fields = sugar.sweeten(&[json!("user"), json!("alice"), json!("attempt"), json!(2)]);
        assert_eq!(
            fields,
            vec![Field::new("user", "alice"), Field::new("attempt", 2)]
        );
    }

    #[test]
    fn test_sweeten_drops_dangling_key() {
        let sugar = Logger::noop().sugar();
        let fields = sugar.sweeten(&[json!("user"), json!("alice"), json!("orphan")]);
        assert_eq!(fields, vec![Field::new("user", "alice")]);
    }

    #[test]
    fn test_sweeten_drops_non_string_keys() {
        let sugar = Logger::noop().sugar();
        let fields = sugar.sweeten(&[json!(42), json!("answer"), json!("ok"), json!(true)]);
        assert_eq!(fields, vec![Field::new("ok", true)]);
    }

    #[test]
    fn test_desugar_returns_base() {
        let logger = Logger::noop().named("jobs");
        let sugar = logger.sugar().named("cleanup");
        assert_eq!(sugar.desugar().name(), Some("jobs.cleanup"));
    }
}
