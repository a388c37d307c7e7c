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
//! Errors raised while building a logger.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during logger construction
#[derive(Error, Debug)]
pub enum LogError {
    /// A severity name that is not one of the known levels
    #[error("Invalid log level: {0}. Expected one of: debug, info, warn, error, dpanic, panic")]
    InvalidLevel(String),

    /// A format name rejected by the strict parser
    #[error("Unknown log format: {0}. Expected one of: json, console")]
    InvalidFormat(String),

    /// Filesystem failure while preparing a destination
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The rotating file writer could not be created
    #[error("Failed to open rotating log file {}: {reason}", .path.display())]
    Rotation {
        /// Requested log file
        path: PathBuf,
        /// Cause reported by the writer
        reason: String,
    },

    /// A destination path without a usable file name
    #[error("Invalid log file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A `UNILOG_*` variable holding a malformed value
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsing {
        /// Name of the variable
        variable_name: String,
        /// Raw value that failed to parse
        value: String,
        /// What was expected
        reason: String,
    },

    /// Any other invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogError {
    /// Rotation failure for `path`
    pub fn rotation(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LogError::Rotation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Malformed environment variable
    pub fn env_var_parsing(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LogError::EnvVarParsing {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for logger construction
pub type LogResult<T> = Result<T, LogError>;
