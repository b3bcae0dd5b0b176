//! Error types for the streaming loader.

use std::error::Error;
use std::fmt;
use std::io;

/// Result type for streaming operations.
pub type StreamingResult<T> = Result<T, StreamingError>;

/// Errors that can occur while streaming chats out of an export.
#[derive(Debug)]
pub enum StreamingError {
    /// IO error while reading the file
    Io(io::Error),

    /// The document does not have the expected structure
    InvalidFormat {
        /// Byte offset where the problem was detected
        offset: u64,
        message: String,
    },

    /// A chat object was found but could not be deserialized
    InvalidChat {
        /// Zero-based position in `chats.list`
        position: usize,
        source: serde_json::Error,
    },

    /// The file ended inside the chat list
    UnexpectedEof,

    /// A single chat exceeded the configured size limit
    BufferOverflow { max_size: usize, actual_size: usize },
}

impl StreamingError {
    pub(crate) fn invalid_format(offset: u64, message: impl Into<String>) -> Self {
        StreamingError::InvalidFormat {
            offset,
            message: message.into(),
        }
    }

    /// Returns `true` if the stream can continue with the next chat.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamingError::InvalidChat { .. } | StreamingError::BufferOverflow { .. }
        )
    }
}

impl fmt::Display for StreamingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamingError::Io(e) => write!(f, "IO error: {e}"),
            StreamingError::InvalidFormat { offset, message } => {
                write!(f, "Invalid export at byte {offset}: {message}")
            }
            StreamingError::InvalidChat { position, source } => {
                write!(f, "chat #{position} is invalid: {source}")
            }
            StreamingError::UnexpectedEof => write!(f, "Unexpected end of file"),
            StreamingError::BufferOverflow {
                max_size,
                actual_size,
            } => {
                write!(f, "Chat too large: {actual_size} bytes (max: {max_size})")
            }
        }
    }
}

impl Error for StreamingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StreamingError::Io(e) => Some(e),
            StreamingError::InvalidChat { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamingError {
    fn from(err: io::Error) -> Self {
        StreamingError::Io(err)
    }
}
