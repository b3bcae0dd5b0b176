//! Streaming loader for large account exports.
//!
//! A full account export can easily reach several gigabytes. This module
//! reads `chats.list` one chat at a time instead of deserializing the whole
//! document, so peak memory is bounded by the largest single chat.
//!
//! # Architecture
//!
//! - [`ExportStreamingParser`] - opens a file and produces a chat stream
//! - [`ChatStream`] - the iterator, with progress tracking
//! - [`ChatIterator`] - the scanner behind it, usable over any [`std::io::BufRead`]
//!
//! # Example
//!
//! ```rust,no_run
//! use tglens::streaming::{ChatStream, ExportStreamingParser, StreamingConfig};
//!
//! # fn main() -> tglens::Result<()> {
//! let parser = ExportStreamingParser::with_config(
//!     StreamingConfig::new().with_max_chat_size(64 * 1024 * 1024),
//! );
//!
//! let mut total = 0;
//! for chat in parser.stream("result.json")? {
//!     total += chat?.messages.len();
//! }
//! println!("{total} raw messages");
//! # Ok(())
//! # }
//! ```
//!
//! Only full account exports are supported; single-chat exports are small
//! enough for [`crate::loader::load_export`].

mod chats;
mod error;
mod traits;

pub use chats::{ChatIterator, ExportStreamingParser};
pub use error::{StreamingError, StreamingResult};
pub use traits::{ChatStream, StreamingConfig};
