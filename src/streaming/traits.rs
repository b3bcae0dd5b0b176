//! Chat stream trait and streaming configuration.
//!
//! - [`ChatStream`] - iterator over chats with progress tracking
//! - [`StreamingConfig`] - buffer sizes, limits and error policy

use crate::export::ChatRecord;

use super::StreamingResult;

/// Iterator over the chats of an export with progress tracking.
///
/// Extends the standard [`Iterator`] trait with methods for monitoring
/// how far into the file the stream has got.
///
/// # Object Safety
///
/// This trait is object-safe, enabling dynamic dispatch via `Box<dyn ChatStream>`.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> tglens::Result<()> {
/// use tglens::streaming::{ChatStream, ExportStreamingParser};
///
/// let parser = ExportStreamingParser::new();
/// let mut chats = parser.stream("result.json")?;
///
/// while let Some(chat) = chats.next() {
///     let chat = chat?;
///     if let Some(pct) = chats.progress() {
///         eprintln!("{:.1}% - {}", pct, chat.display_name());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub trait ChatStream: Iterator<Item = StreamingResult<ChatRecord>> + Send {
    /// Returns approximate progress as a percentage (0.0 to 100.0).
    ///
    /// Returns `None` if the total size is unknown.
    fn progress(&self) -> Option<f64> {
        None
    }

    /// Returns the number of bytes consumed so far.
    fn bytes_processed(&self) -> u64;

    /// Returns the total input size in bytes, if known.
    fn total_bytes(&self) -> Option<u64> {
        None
    }

    /// Returns the number of chat objects read so far, including skipped ones.
    fn chats_read(&self) -> usize;
}

/// Configuration options for the streaming loader.
///
/// # Examples
///
/// ```
/// use tglens::streaming::StreamingConfig;
///
/// let config = StreamingConfig::new()
///     .with_buffer_size(128 * 1024)
///     .with_max_chat_size(64 * 1024 * 1024)
///     .with_skip_invalid(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Buffer size for file reading.
    ///
    /// Default: 64KB.
    pub buffer_size: usize,

    /// Maximum size of one chat object in bytes.
    ///
    /// Default: 256MB. Only one chat is held in memory at a time.
    pub max_chat_size: usize,

    /// Skip chats that are invalid or too large instead of failing.
    ///
    /// Default: `false`. An invalid chat makes the export malformed.
    pub skip_invalid: bool,

    /// Log progress every N chats.
    ///
    /// Default: 100.
    pub progress_interval: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            max_chat_size: 256 * 1024 * 1024,
            skip_invalid: false,
            progress_interval: 100,
        }
    }
}

impl StreamingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the maximum chat size.
    #[must_use]
    pub fn with_max_chat_size(mut self, size: usize) -> Self {
        self.max_chat_size = size;
        self
    }

    /// Sets whether to skip invalid chats.
    #[must_use]
    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    /// Sets the progress logging interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}
