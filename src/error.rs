//! Unified error types for tglens.
//!
//! This module provides a single [`TglensError`] enum that covers every
//! failure the pipeline can report. The variants map onto three severities:
//!
//! - **Fatal**: [`MalformedExport`](TglensError::MalformedExport): the
//!   document cannot be used at all, the analysis aborts with no output
//! - **Recoverable**: [`UnparsableMessage`](TglensError::UnparsableMessage):
//!   one raw entry could not be normalized; skipped and counted unless the
//!   normalizer runs in strict mode
//! - **Nothing to show**: [`EmptyExport`](TglensError::EmptyExport): the
//!   export is valid but contains zero chats

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A specialized [`Result`] type for tglens operations.
///
/// # Example
///
/// ```rust
/// use tglens::error::Result;
/// use tglens::export::RawExport;
///
/// fn my_function() -> Result<RawExport> {
///     // ... operations that may fail
///     Ok(RawExport::default())
/// }
/// ```
pub type Result<T> = std::result::Result<T, TglensError>;

/// The error type for all tglens operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TglensError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - The export file doesn't exist
    /// - Permission denied
    /// - Disk is full (when writing a report)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The export document cannot be analyzed at all.
    ///
    /// Raised when the file is not valid JSON, the root is not an object,
    /// the chat list is missing, or a chat object is structurally invalid.
    #[error("Malformed Telegram export{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    MalformedExport {
        /// Description of what's wrong
        message: String,
        /// The file path, if available
        path: Option<PathBuf>,
        /// The underlying JSON error, if any
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A single raw message could not be normalized.
    #[error(transparent)]
    UnparsableMessage(#[from] UnparsableMessage),

    /// The export parsed correctly but contains no chats.
    #[error("Export contains no chats: nothing to show")]
    EmptyExport,

    /// Invalid date format in filter configuration.
    ///
    /// Date filters expect YYYY-MM-DD format.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid {setting}: {message}")]
    InvalidConfig {
        /// Name of the setting (e.g. "granularity", "period")
        setting: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error while writing a report.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A single chat exceeded the streaming loader's size limit.
    #[error("Chat too large: {actual_size} bytes (maximum: {max_size} bytes)")]
    BufferOverflow {
        /// Maximum allowed size in bytes
        max_size: usize,
        /// Actual size encountered
        actual_size: usize,
    },
}

/// A raw message entry that could not be turned into a normalized record.
///
/// Carries enough context to locate the offending entry in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Unparsable message #{index} in chat {chat_id}: {reason}")]
pub struct UnparsableMessage {
    /// Identifier of the chat the entry belongs to
    pub chat_id: i64,
    /// Zero-based position of the entry in the chat's message list
    pub index: usize,
    /// What made the entry unusable
    pub reason: String,
}

impl UnparsableMessage {
    /// Creates a new unparsable-message report.
    pub fn new(chat_id: i64, index: usize, reason: impl Into<String>) -> Self {
        Self {
            chat_id,
            index,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl TglensError {
    /// Creates a malformed-export error without an underlying source.
    pub fn malformed(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        TglensError::MalformedExport {
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Creates a malformed-export error caused by a JSON parse failure.
    pub fn malformed_json(source: serde_json::Error, path: Option<PathBuf>) -> Self {
        TglensError::MalformedExport {
            message: format!("invalid JSON: {source}"),
            path,
            source: Some(source),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        TglensError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(setting: &'static str, message: impl Into<String>) -> Self {
        TglensError::InvalidConfig {
            setting,
            message: message.into(),
        }
    }

    /// Creates a buffer overflow error.
    pub fn buffer_overflow(max_size: usize, actual_size: usize) -> Self {
        TglensError::BufferOverflow {
            max_size,
            actual_size,
        }
    }

    /// Attaches a file path to a malformed-export error that has none.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            TglensError::MalformedExport {
                message,
                path: None,
                source,
            } => TglensError::MalformedExport {
                message,
                path: Some(file.into()),
                source,
            },
            other => other,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, TglensError::Io(_))
    }

    /// Returns `true` if the export document itself is unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, TglensError::MalformedExport { .. })
    }

    /// Returns `true` if the export has no chats.
    pub fn is_empty_export(&self) -> bool {
        matches!(self, TglensError::EmptyExport)
    }

    /// Returns `true` if a single message failed to normalize.
    pub fn is_unparsable_message(&self) -> bool {
        matches!(self, TglensError::UnparsableMessage(_))
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, TglensError::InvalidDate { .. })
    }

    /// Returns `true` if a configuration value was rejected.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, TglensError::InvalidConfig { .. })
    }
}

// ============================================================================
// Integration with streaming module
// ============================================================================

#[cfg(feature = "streaming")]
impl From<crate::streaming::StreamingError> for TglensError {
    fn from(err: crate::streaming::StreamingError) -> Self {
        use crate::streaming::StreamingError;

        match err {
            StreamingError::Io(e) => TglensError::Io(e),
            StreamingError::InvalidFormat { offset, message } => {
                TglensError::malformed(format!("{message} (at byte {offset})"), None)
            }
            StreamingError::InvalidChat { position, source } => TglensError::MalformedExport {
                message: format!("chat #{position} is invalid: {source}"),
                path: None,
                source: Some(source),
            },
            StreamingError::BufferOverflow {
                max_size,
                actual_size,
            } => TglensError::buffer_overflow(max_size, actual_size),
            StreamingError::UnexpectedEof => {
                TglensError::malformed("unexpected end of file while reading the chat list", None)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = TglensError::from(io_err);
        assert!(err.to_string().contains("IO error"));
        assert!(err.is_io());
    }

    #[test]
    fn test_malformed_display_with_path() {
        let err = TglensError::malformed("missing chat list", Some(PathBuf::from("result.json")));
        let display = err.to_string();
        assert!(display.contains("Malformed Telegram export"));
        assert!(display.contains("result.json"));
        assert!(display.contains("missing chat list"));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_malformed_json_keeps_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = TglensError::malformed_json(json_err, None);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_with_path_only_fills_missing() {
        let err = TglensError::malformed("bad", None).with_path("a.json");
        assert!(err.to_string().contains("a.json"));

        let err = TglensError::malformed("bad", Some(PathBuf::from("first.json")))
            .with_path("second.json");
        assert!(err.to_string().contains("first.json"));
        assert!(!err.to_string().contains("second.json"));
    }

    #[test]
    fn test_unparsable_message_display() {
        let err: TglensError = UnparsableMessage::new(42, 7, "no timestamp").into();
        let display = err.to_string();
        assert!(display.contains("#7"));
        assert!(display.contains("chat 42"));
        assert!(display.contains("no timestamp"));
        assert!(err.is_unparsable_message());
    }

    #[test]
    fn test_empty_export_display() {
        let err = TglensError::EmptyExport;
        assert!(err.to_string().contains("nothing to show"));
        assert!(err.is_empty_export());
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_invalid_date() {
        let err = TglensError::invalid_date("2024/01/01");
        assert!(err.to_string().contains("2024/01/01"));
        assert!(err.to_string().contains("YYYY-MM-DD"));
        assert!(err.is_invalid_date());
    }

    #[test]
    fn test_invalid_config() {
        let err = TglensError::invalid_config("granularity", "unknown value 'year'");
        assert_eq!(err.to_string(), "Invalid granularity: unknown value 'year'");
    }

    #[test]
    fn test_buffer_overflow_display() {
        let err = TglensError::buffer_overflow(1024, 2048);
        let display = err.to_string();
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));
    }

    #[cfg(feature = "streaming")]
    #[test]
    fn test_from_streaming_error() {
        use crate::streaming::StreamingError;

        let err: TglensError = StreamingError::InvalidFormat {
            offset: 12,
            message: "no chats".into(),
        }
        .into();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("byte 12"));

        let err: TglensError = StreamingError::BufferOverflow {
            max_size: 10,
            actual_size: 20,
        }
        .into();
        assert!(matches!(err, TglensError::BufferOverflow { max_size: 10, .. }));

        // a cut-off file is a malformed export, same as in the in-memory loader
        let err: TglensError = StreamingError::UnexpectedEof.into();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("unexpected end of file"));
        let err = err.with_path("result.json");
        assert!(err.to_string().contains("result.json"));
    }
}
