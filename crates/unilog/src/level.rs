//! Severity levels and the shared, runtime-adjustable threshold.

use crate::error::LogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::subscriber::Interest;
use tracing::Metadata;
use tracing_subscriber::layer::{Context, Filter};

/// Ordered record severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Verbose diagnostics, usually disabled in production
    #[default]
    Debug,

    /// Normal operational messages
    Info,

    /// Something unexpected that does not stop the program
    Warn,

    /// A failure the program recovered from
    Error,

    /// Development panic: panics after writing when the logger is in
    /// development mode, behaves like `Error` otherwise
    DPanic,

    /// Panics after writing the record
    Panic,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::DPanic,
        Severity::Panic,
    ];

    /// Upper-case name used by the encoders
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::DPanic => "DPANIC",
            Severity::Panic => "PANIC",
        }
    }

    /// The `tracing` level a record of this severity is emitted at.
    ///
    /// `DPanic` and `Panic` have no counterpart and share `ERROR`; the
    /// encoders render the exact severity from the record itself.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error | Severity::DPanic | Severity::Panic => tracing::Level::ERROR,
        }
    }

    /// Map a `tracing` level onto the closest severity. `TRACE` folds into `Debug`.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }

    fn from_u8(value: u8) -> Self {
        Severity::ALL
            .get(usize::from(value))
            .copied()
            .unwrap_or(Severity::Panic)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "dpanic" => Ok(Severity::DPanic),
            "panic" => Ok(Severity::Panic),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

/// A severity threshold that can be read and changed from any thread.
///
/// Clones share the same underlying value, so a logger and the filter
/// installed in its subscriber always agree on the threshold.
#[derive(Debug, Clone)]
pub struct AtomicLevel {
    inner: Arc<AtomicU8>,
}

impl AtomicLevel {
    /// Create a threshold starting at `level`
    pub fn new(level: Severity) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    /// Current threshold
    pub fn level(&self) -> Severity {
        Severity::from_u8(self.inner.load(Ordering::Relaxed))
    }

    /// Change the threshold; takes effect for the next record
    pub fn set_level(&self, level: Severity) {
        self.inner.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` passes the threshold
    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.level()
    }

    /// Whether an event at a `tracing` level passes the threshold.
    ///
    /// Compared at `tracing` granularity: with a `DPanic` or `Panic`
    /// threshold every `ERROR` event passes, since those severities are
    /// emitted at `ERROR` too.
    pub fn enabled_tracing(&self, level: &tracing::Level) -> bool {
        let threshold = Severity::from_tracing(&self.level().as_tracing());
        Severity::from_tracing(level) >= threshold
    }
}

/// Per-layer filter reading the threshold on every event.
///
/// Callsite interest is always `sometimes`, so a callsite first seen while
/// the threshold was high is re-checked once the threshold is lowered.
impl<S> Filter<S> for AtomicLevel {
    fn enabled(&self, metadata: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.enabled_tracing(metadata.level())
    }

    fn callsite_enabled(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Severity::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::DPanic);
        assert!(Severity::DPanic < Severity::Panic);
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("DPanic".parse::<Severity>().unwrap(), Severity::DPanic);
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_rendering() {
        assert_eq!(Severity::Debug.to_string(), "DEBUG");
        assert_eq!(Severity::DPanic.as_str(), "DPANIC");
    }

    #[test]
    fn test_tracing_mapping() {
        assert_eq!(Severity::Panic.as_tracing(), tracing::Level::ERROR);
        assert_eq!(Severity::from_tracing(&tracing::Level::TRACE), Severity::Debug);
        for severity in [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error] {
            assert_eq!(Severity::from_tracing(&severity.as_tracing()), severity);
        }
    }

    #[test]
    fn test_atomic_level_shared_between_clones() {
        let level = AtomicLevel::new(Severity::Info);
        let other = level.clone();

        assert!(!level.enabled(Severity::Debug));
        other.set_level(Severity::Debug);
        assert!(level.enabled(Severity::Debug));
        assert_eq!(level.level(), Severity::Debug);
    }

    #[test]
    fn test_atomic_level_threshold_is_inclusive() {
        let level = AtomicLevel::new(Severity::Warn);
        assert!(!level.enabled(Severity::Info));
        assert!(level.enabled(Severity::Warn));
        assert!(level.enabled(Severity::Panic));
    }

    #[test]
    fn test_tracing_threshold() {
        let level = AtomicLevel::new(Severity::Info);
        assert!(!level.enabled_tracing(&tracing::Level::TRACE));
        assert!(!level.enabled_tracing(&tracing::Level::DEBUG));
        assert!(level.enabled_tracing(&tracing::Level::INFO));

        level.set_level(Severity::Panic);
        assert!(level.enabled_tracing(&tracing::Level::ERROR));
        assert!(!level.enabled_tracing(&tracing::Level::WARN));
    }
}
