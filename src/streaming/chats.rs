//! Streaming loader for full account exports.
//!
//! A full export keeps every chat under `chats.list`, next to other lists
//! (`contacts.list`, `frequent_contacts.list`, ...) that must be ignored:
//!
//! ```json
//! {
//!   "contacts": { "list": [ ... ] },
//!   "chats": {
//!     "about": "...",
//!     "list": [
//!       { "id": 1, "name": "Alice", "type": "personal_chat", "messages": [ ... ] },
//!       { "id": 2, "name": "Team", "type": "private_supergroup", "messages": [ ... ] }
//!     ]
//!   }
//! }
//! ```
//!
//! The scanner walks the document byte by byte, tracking object keys so it
//! can find the `chats` → `list` array by path, and string state so braces
//! inside message texts never confuse it. Each chat object is buffered on
//! its own and deserialized; only one chat is in memory at a time.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::error::TglensError;
use crate::export::ChatRecord;

use super::{ChatStream, StreamingConfig, StreamingError, StreamingResult};

/// Keys longer than this are never part of the path we look for.
const MAX_KEY_LEN: usize = 64;

/// Streaming loader for full Telegram account exports.
///
/// # Example
///
/// ```rust,no_run
/// use tglens::streaming::ExportStreamingParser;
///
/// # fn main() -> tglens::Result<()> {
/// let parser = ExportStreamingParser::new();
/// for chat in parser.stream("result.json")? {
///     let chat = chat?;
///     println!("{}: {} messages", chat.display_name(), chat.messages.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExportStreamingParser {
    config: StreamingConfig,
}

impl ExportStreamingParser {
    /// Creates a new streaming loader with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new streaming loader with custom configuration.
    pub fn with_config(config: StreamingConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Opens a file and returns an iterator over its chats.
    ///
    /// # Errors
    ///
    /// - [`TglensError::Io`] if the file cannot be opened
    /// - [`TglensError::MalformedExport`] if the document has no `chats.list`
    pub fn stream(&self, path: impl AsRef<Path>) -> Result<Box<dyn ChatStream>, TglensError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let reader = BufReader::with_capacity(self.config.buffer_size, file);
        let iterator = ChatIterator::new(reader, Some(file_size), self.config)
            .map_err(|e| TglensError::from(e).with_path(path))?;

        debug!(path = %path.display(), bytes = file_size, "streaming chat list");
        Ok(Box::new(iterator))
    }
}

/// Byte reader that keeps track of its offset.
struct Scanner<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> Scanner<R> {
    fn next_byte(&mut self) -> StreamingResult<Option<u8>> {
        let byte = match self.reader.fill_buf()? {
            [] => return Ok(None),
            [first, ..] => *first,
        };
        self.reader.consume(1);
        self.offset += 1;
        Ok(Some(byte))
    }

    fn next_non_ws(&mut self) -> StreamingResult<Option<u8>> {
        while let Some(b) = self.next_byte()? {
            if !b.is_ascii_whitespace() {
                return Ok(Some(b));
            }
        }
        Ok(None)
    }

    /// Reads the rest of a string whose opening quote was consumed.
    /// Returns the raw contents when `capture` is set and the string is short.
    fn read_string(&mut self, capture: bool) -> StreamingResult<Option<Vec<u8>>> {
        let mut captured = capture.then(Vec::new);
        let mut escaped = false;
        loop {
            let b = self.next_byte()?.ok_or(StreamingError::UnexpectedEof)?;
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                return Ok(captured);
            }
            let full = captured.as_ref().is_some_and(|buf| buf.len() >= MAX_KEY_LEN);
            if full {
                captured = None;
            } else if let Some(buf) = captured.as_mut() {
                buf.push(b);
            }
        }
    }
}

/// Container being scanned while looking for the chat list.
enum Frame {
    Object {
        key: Option<Vec<u8>>,
        expect_key: bool,
    },
    Array,
}

impl Frame {
    fn object() -> Self {
        Frame::Object {
            key: None,
            expect_key: true,
        }
    }

    fn key_is(&self, name: &[u8]) -> bool {
        matches!(self, Frame::Object { key: Some(k), expect_key: false } if k == name)
    }
}

/// Iterator over the chats of a full export.
pub struct ChatIterator<R: BufRead> {
    scanner: Scanner<R>,
    file_size: Option<u64>,
    config: StreamingConfig,
    buffer: Vec<u8>,
    finished: bool,
    chats_read: usize,
}

impl<R: BufRead> ChatIterator<R> {
    /// Creates a new iterator, scanning forward to the start of `chats.list`.
    pub fn new(reader: R, file_size: Option<u64>, config: StreamingConfig) -> StreamingResult<Self> {
        let mut iterator = Self {
            scanner: Scanner { reader, offset: 0 },
            file_size,
            config,
            buffer: Vec::new(),
            finished: false,
            chats_read: 0,
        };
        iterator.locate_chat_list()?;
        Ok(iterator)
    }

    fn locate_chat_list(&mut self) -> StreamingResult<()> {
        match self.scanner.next_non_ws()? {
            Some(b'{') => {}
            Some(_) => {
                return Err(StreamingError::invalid_format(
                    self.scanner.offset,
                    "document root is not a JSON object",
                ));
            }
            None => {
                return Err(StreamingError::invalid_format(0, "document is empty"));
            }
        }

        let mut stack = vec![Frame::object()];
        while let Some(b) = self.scanner.next_byte()? {
            match b {
                b'"' => {
                    let is_key =
                        matches!(stack.last(), Some(Frame::Object { expect_key: true, .. }));
                    let text = self.scanner.read_string(is_key)?;
                    if let Some(Frame::Object { key, expect_key }) = stack.last_mut() {
                        if *expect_key {
                            *key = text;
                            *expect_key = false;
                        }
                    }
                }
                b'[' if stack.len() == 2 && stack[0].key_is(b"chats") && stack[1].key_is(b"list") => {
                    return Ok(());
                }
                b'{' => stack.push(Frame::object()),
                b'[' => stack.push(Frame::Array),
                b'}' | b']' => {
                    stack.pop();
                    if stack.is_empty() {
                        break;
                    }
                }
                b',' => {
                    if let Some(Frame::Object { key, expect_key }) = stack.last_mut() {
                        *key = None;
                        *expect_key = true;
                    }
                }
                _ => {}
            }
        }

        Err(StreamingError::invalid_format(
            self.scanner.offset,
            "`chats.list` array not found",
        ))
    }

    /// Buffers the next chat object. Returns `false` at the end of the list.
    fn read_next_chat(&mut self) -> StreamingResult<bool> {
        loop {
            match self.scanner.next_non_ws()? {
                None => return Err(StreamingError::UnexpectedEof),
                Some(b',') => {}
                Some(b']') => {
                    self.finish_document()?;
                    return Ok(false);
                }
                Some(b'{') => break,
                Some(_) => {
                    return Err(StreamingError::invalid_format(
                        self.scanner.offset,
                        format!("chat #{} is not a JSON object", self.chats_read),
                    ));
                }
            }
        }

        self.buffer.clear();
        self.buffer.push(b'{');
        let mut size = 1usize;
        let mut depth = 1usize;
        let mut in_string = false;
        let mut escaped = false;

        while depth > 0 {
            let b = self
                .scanner
                .next_byte()?
                .ok_or(StreamingError::UnexpectedEof)?;
            size += 1;
            if size <= self.config.max_chat_size {
                self.buffer.push(b);
            }

            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
            } else {
                match b {
                    b'"' => in_string = true,
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => depth -= 1,
                    _ => {}
                }
            }
        }

        if size > self.config.max_chat_size {
            self.buffer.clear();
            return Err(StreamingError::BufferOverflow {
                max_size: self.config.max_chat_size,
                actual_size: size,
            });
        }
        Ok(true)
    }

    /// Checks that the bytes after the closing `]` of `chats.list` complete
    /// the document: the rest of the `chats` object, any sibling sections,
    /// the root's closing brace, then only whitespace.
    fn finish_document(&mut self) -> StreamingResult<()> {
        let list_end = self.scanner.offset;
        let head: &[u8] = br#"{"chats":{"list":[]"#;
        let rest = head.chain(&mut self.scanner.reader);
        match serde_json::from_reader::<_, IgnoredAny>(rest) {
            Ok(_) => {
                self.scanner.offset = self.file_size.unwrap_or(list_end).max(list_end);
                Ok(())
            }
            Err(e) if e.is_eof() => Err(StreamingError::UnexpectedEof),
            Err(e) if e.is_io() => Err(StreamingError::Io(e.into())),
            Err(e) => Err(StreamingError::invalid_format(
                list_end,
                format!("invalid content after the chat list: {e}"),
            )),
        }
    }

    fn parse_chat(&self, position: usize) -> StreamingResult<ChatRecord> {
        serde_json::from_slice(&self.buffer)
            .map_err(|source| StreamingError::InvalidChat { position, source })
    }
}

impl<R: BufRead + Send> ChatStream for ChatIterator<R> {
    fn progress(&self) -> Option<f64> {
        match self.file_size {
            Some(total) if total > 0 => {
                Some((self.scanner.offset as f64 / total as f64 * 100.0).min(100.0))
            }
            _ => None,
        }
    }

    fn bytes_processed(&self) -> u64 {
        self.scanner.offset
    }

    fn total_bytes(&self) -> Option<u64> {
        self.file_size
    }

    fn chats_read(&self) -> usize {
        self.chats_read
    }
}

impl<R: BufRead> Iterator for ChatIterator<R> {
    type Item = StreamingResult<ChatRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let position = self.chats_read;
            let result = match self.read_next_chat() {
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Ok(true) => {
                    self.chats_read += 1;
                    self.parse_chat(position)
                }
                Err(e @ StreamingError::BufferOverflow { .. }) => {
                    self.chats_read += 1;
                    Err(e)
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            match result {
                Ok(chat) => return Some(Ok(chat)),
                Err(e) if self.config.skip_invalid && e.is_recoverable() => {
                    warn!(position, error = %e, "skipping chat");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn iter(json: &str, config: StreamingConfig) -> StreamingResult<ChatIterator<Cursor<Vec<u8>>>> {
        ChatIterator::new(
            Cursor::new(json.as_bytes().to_vec()),
            Some(json.len() as u64),
            config,
        )
    }

    fn full_export() -> String {
        r#"{
  "about": "Here is the data you requested.",
  "contacts": {"about": "", "list": [{"first_name": "Decoy", "id": 99}]},
  "frequent_contacts": {"list": [{"id": 98, "name": "Decoy"}]},
  "chats": {
    "about": "This page lists all chats from this export.",
    "list": [
      {"name": "Alice", "type": "personal_chat", "id": 1, "messages": [
        {"id": 1, "type": "message", "date_unixtime": "1705314600", "from": "Alice", "from_id": "user1", "text": "braces } { ] [ and \"quotes\""}
      ]},
      {"name": "Team", "type": "private_supergroup", "id": 2, "messages": []}
    ]
  },
  "left_chats": {"list": [{"id": 3, "messages": []}]}
}"#
        .to_string()
    }

    #[test]
    fn test_streams_only_chat_list() {
        let chats: Vec<ChatRecord> = iter(&full_export(), StreamingConfig::default())
            .unwrap()
            .collect::<StreamingResult<_>>()
            .unwrap();

        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, 1);
        assert_eq!(chats[0].messages.len(), 1);
        assert_eq!(chats[1].name.as_deref(), Some("Team"));
    }

    #[test]
    fn test_progress_reporting() {
        let json = full_export();
        let mut chats = iter(&json, StreamingConfig::default()).unwrap();
        let start = chats.bytes_processed();
        assert!(start > 0);

        let _: Vec<_> = chats.by_ref().collect();
        assert!(chats.bytes_processed() > start);
        assert!(chats.progress().unwrap() > 50.0);
        assert_eq!(chats.total_bytes(), Some(json.len() as u64));
        assert_eq!(chats.chats_read(), 2);
    }

    #[test]
    fn test_progress_unknown_size() {
        let json = full_export();
        let chats = ChatIterator::new(Cursor::new(json.into_bytes()), None, StreamingConfig::default()).unwrap();
        assert!(chats.progress().is_none());
    }

    #[test]
    fn test_empty_chat_list() {
        let mut chats = iter(r#"{"chats": {"list": []}}"#, StreamingConfig::default()).unwrap();
        assert!(chats.next().is_none());
        assert!(chats.next().is_none());
    }

    #[test]
    fn test_missing_chat_list() {
        for json in [
            r#"{"contacts": {"list": []}}"#,
            r#"{"list": [{"id": 1}]}"#,
            r#"{"chats": {"about": "x"}}"#,
            r#"{"name": "Single", "id": 1, "messages": []}"#,
        ] {
            let result = iter(json, StreamingConfig::default());
            assert!(
                matches!(result, Err(StreamingError::InvalidFormat { .. })),
                "{json}"
            );
        }
    }

    #[test]
    fn test_non_object_root() {
        let result = iter("[1, 2]", StreamingConfig::default());
        assert!(matches!(result, Err(StreamingError::InvalidFormat { .. })));
        let result = iter("   ", StreamingConfig::default());
        assert!(matches!(result, Err(StreamingError::InvalidFormat { .. })));
    }

    #[test]
    fn test_key_inside_string_value_is_ignored() {
        let json = r#"{"about": "\"chats\": {\"list\": [", "chats": {"list": [{"id": 5}]}}"#;
        let chats: Vec<_> = iter(json, StreamingConfig::default())
            .unwrap()
            .collect::<StreamingResult<Vec<_>>>()
            .unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, 5);
    }

    #[test]
    fn test_invalid_chat_is_error_by_default() {
        let json = r#"{"chats": {"list": [{"name": "no id"}, {"id": 2}]}}"#;
        let mut chats = iter(json, StreamingConfig::default()).unwrap();
        assert!(matches!(
            chats.next(),
            Some(Err(StreamingError::InvalidChat { position: 0, .. }))
        ));
        assert_eq!(chats.next().unwrap().unwrap().id, 2);
    }

    #[test]
    fn test_invalid_chat_skipped_when_configured() {
        let json = r#"{"chats": {"list": [{"name": "no id"}, {"id": 2, "messages": []}]}}"#;
        let config = StreamingConfig::new().with_skip_invalid(true);
        let chats: Vec<_> = iter(json, config)
            .unwrap()
            .collect::<StreamingResult<Vec<_>>>()
            .unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, 2);
    }

    #[test]
    fn test_chat_too_large() {
        let json = r#"{"chats": {"list": [{"id": 1, "messages": [{"text": "a long text here"}]}, {"id": 2}]}}"#;
        let config = StreamingConfig::new().with_max_chat_size(20);
        let mut chats = iter(json, config).unwrap();
        assert!(matches!(
            chats.next(),
            Some(Err(StreamingError::BufferOverflow { max_size: 20, .. }))
        ));
        // the stream stays aligned on the next chat
        assert_eq!(chats.next().unwrap().unwrap().id, 2);
    }

    #[test]
    fn test_truncated_file() {
        let json = r#"{"chats": {"list": [{"id": 1, "messages": [{"#;
        let mut chats = iter(json, StreamingConfig::default()).unwrap();
        assert!(matches!(chats.next(), Some(Err(StreamingError::UnexpectedEof))));
        assert!(chats.next().is_none());
    }

    #[test]
    fn test_content_after_chat_list_is_checked() {
        for json in [
            r#"{"chats": {"list": [{"id": 1}]}, garbage!!!"#,
            r#"{"chats": {"list": [{"id": 1}]}} trailing"#,
            r#"{"chats": {"list": [{"id": 1}], "about" "x"}}"#,
            r#"{"chats": {"list": [{"id": 1}]}}}"#,
        ] {
            let mut chats = iter(json, StreamingConfig::default()).unwrap();
            assert_eq!(chats.next().unwrap().unwrap().id, 1, "{json}");
            let err = chats.next().unwrap().unwrap_err();
            assert!(!err.is_recoverable(), "{json}");
            assert!(chats.next().is_none());
        }
    }

    #[test]
    fn test_document_cut_after_chat_list() {
        let json = r#"{"chats": {"list": [{"id": 1}]}, "left_chats": {"list": ["#;
        let mut chats = iter(json, StreamingConfig::default()).unwrap();
        assert!(chats.next().unwrap().is_ok());
        assert!(matches!(chats.next(), Some(Err(StreamingError::UnexpectedEof))));
    }

    #[test]
    fn test_sections_after_chat_list_are_accepted() {
        let json = r#"{"chats": {"list": [], "about": "x"}, "left_chats": {"list": [{"id": 3}]}}
"#;
        let mut chats = iter(json, StreamingConfig::default()).unwrap();
        assert!(chats.next().is_none());
        assert_eq!(chats.bytes_processed(), json.len() as u64);
    }

    #[test]
    fn test_non_object_chat_entry() {
        let json = r#"{"chats": {"list": ["oops"]}}"#;
        let mut chats = iter(json, StreamingConfig::default()).unwrap();
        assert!(matches!(chats.next(), Some(Err(StreamingError::InvalidFormat { .. }))));
        assert!(chats.next().is_none());
    }
}
