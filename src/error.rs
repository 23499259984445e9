//! Unified error types for slackview.
//!
//! This module provides a single [`SlackviewError`] enum covering every error
//! a load can surface. Most problems inside an archive never reach this type:
//! missing optional fields, unresolvable mentions and unknown block kinds are
//! recovered locally with a documented default. What remains is input that
//! would silently corrupt the output if it were ignored.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | `users.json` / `channels.json` absent | [`SlackviewError::MissingFile`] |
//! | Required metadata or day file not valid JSON | [`SlackviewError::Parse`] |
//! | Metadata file with the wrong shape | [`SlackviewError::InvalidFormat`] |
//! | `groups.json` / `dms.json` / `mpims.json` absent | empty mapping, no error |

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for slackview operations.
///
/// # Example
///
/// ```rust
/// use slackview::error::Result;
///
/// fn count_channels() -> Result<usize> {
///     Ok(0)
/// }
/// ```
pub type Result<T> = std::result::Result<T, SlackviewError>;

/// The error type for all slackview operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlackviewError {
    /// An I/O error occurred while reading the archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A required archive file does not exist.
    #[error("Required archive file '{name}' not found (looked in {})", path.display())]
    MissingFile {
        /// File name inside the archive (e.g. `users.json`)
        name: String,
        /// Full path that was checked
        path: PathBuf,
    },

    /// Failed to parse a JSON file from the archive.
    #[error("Failed to parse {what}{}: {source}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Parse {
        /// What was being parsed (e.g. "user list", "day file")
        what: &'static str,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// A file parsed as JSON but does not have the expected structure.
    #[error("Invalid {what}: {message}")]
    InvalidFormat {
        /// What was being read
        what: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// Invalid date in the viewer configuration.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// JSON serialization error while writing output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl SlackviewError {
    /// Creates a missing-file error.
    pub fn missing_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SlackviewError::MissingFile {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Creates a parse error for a file in the archive.
    pub fn parse(what: &'static str, source: serde_json::Error, path: Option<PathBuf>) -> Self {
        SlackviewError::Parse { what, source, path }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(what: &'static str, message: impl Into<String>) -> Self {
        SlackviewError::InvalidFormat {
            what,
            message: message.into(),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        SlackviewError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, SlackviewError::Io(_))
    }

    /// Returns `true` if a required file was missing.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, SlackviewError::MissingFile { .. })
    }

    /// Returns `true` if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, SlackviewError::Parse { .. })
    }

    /// Returns `true` if this is an invalid format error.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, SlackviewError::InvalidFormat { .. })
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, SlackviewError::InvalidDate { .. })
    }
}
