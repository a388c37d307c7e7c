// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Logger construction and installation.
//!
//! This module turns [`LogOptions`] into a [`Logger`]: an encoder, a
//! fan-out writer over every destination and a shared severity threshold,
//! all behind one `tracing` dispatcher.

use crate::config::{LogFormat, LogOptions};
use crate::encoder::RecordEncoder;
use crate::error::LogResult;
use crate::global::replace_global;
use crate::level::{AtomicLevel, Severity};
use crate::logger::{Field, Logger, LoggerCore};
use crate::writer::{ConsoleStreams, Destination, FanOut, RotationPolicy};
use std::sync::Once;
use tracing::dispatcher::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer, Registry};

static UNKNOWN_FORMAT_WARNING: Once = Once::new();

/// Configure the global logger from a format name, a destination and a level.
///
/// Any format name other than `"json"` selects console output. An
/// unrecognized name is reported once per process as a warning record.
///
/// # Example
///
/// ```no_run
/// use unilog::{configure_simple, get_active_logger, Severity};
///
/// configure_simple("json", "./a.log", Severity::Debug);
/// get_active_logger().debug("a log 1");
/// ```
pub fn configure_simple(format: &str, destination: &str, level: Severity) {
    let (log_format, recognized) = LogFormat::from_name_lossy(format);
    let options = LogOptions::new()
        .with_format(log_format)
        .with_destination(destination)
        .with_level(level);
    let logger = install(&options);

    if !recognized {
        warn_unknown_format(&logger, format, &UNKNOWN_FORMAT_WARNING);
    }
}

fn warn_unknown_format(logger: &Logger, format: &str, warned: &Once) {
    warned.call_once(|| {
        logger.warn_with(
            "unrecognized log format, falling back to console",
            &[Field::new("format", format)],
        );
    });
}

/// Configure the global logger from a full options record.
///
/// Never fails. When the log file cannot be opened the logger writes to
/// the standard streams only and reports the failure as an error record.
///
/// # Example
///
/// ```no_run
/// use unilog::{configure, get_active_logger, LogFormat, LogOptions, Severity};
///
/// configure(
///     &LogOptions::new()
///         .with_format(LogFormat::Console)
///         .with_destination("/var/log/app.log")
///         .with_level(Severity::Info)
///         .with_max_backups(10),
/// );
/// get_active_logger().info("Application started");
/// ```
pub fn configure(options: &LogOptions) {
    install(options);
}

fn install(options: &LogOptions) -> Logger {
    let logger = match build_logger(options) {
        Ok(logger) => logger,
        Err(error) => {
            let fallback = LogOptions {
                file_name: String::new(),
                ..options.clone()
            };
            let logger = build_logger_with_streams(&fallback, ConsoleStreams::default())
                .unwrap_or_else(|_| Logger::noop());
            logger.error_with(
                "failed to open log file, writing to standard streams only",
                &[
                    Field::new("file", options.file_name.as_str()),
                    Field::display("error", &error),
                ],
            );
            logger
        }
    };
    replace_global(logger.clone());
    logger
}

/// Build a logger writing to the process streams, without installing it
pub fn build_logger(options: &LogOptions) -> LogResult<Logger> {
    build_logger_with_streams(options, ConsoleStreams::default())
}

/// Build a logger writing to `streams` in place of the process streams
pub fn build_logger_with_streams(
    options: &LogOptions,
    streams: ConsoleStreams,
) -> LogResult<Logger> {
    let destination = Destination::from_path(&options.file_name);
    let writer = FanOut::build(destination, RotationPolicy::from(options), streams)?;
    let level = AtomicLevel::new(options.level);

    let layer = fmt::layer()
        .event_format(RecordEncoder::new(options.format))
        .with_writer(writer.clone())
        .with_filter(level.clone());
    let dispatch = Dispatch::new(Registry::default().with(layer));

    let core = LoggerCore {
        dispatch,
        level,
        format: options.format,
        development: options.development,
        stacktrace_level: options.stacktrace_level,
        writer: Some(writer),
    };
    Ok(Logger::from_core(core, options.name.clone()))
}
