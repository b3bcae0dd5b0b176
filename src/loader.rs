//! Export loader: reads a Telegram Desktop JSON export into a [`RawExport`].
//!
//! Two document shapes are accepted:
//!
//! - a full account export, with chats under `chats.list`
//! - a single-chat export, where the root object is the chat itself
//!
//! Anything else is a [`TglensError::MalformedExport`], never an empty
//! result.
//!
//! # Example
//!
//! ```rust
//! use tglens::loader::parse_export_str;
//!
//! # fn main() -> tglens::Result<()> {
//! let json = r#"{"chats": {"list": [
//!     {"id": 1, "name": "Alice", "type": "personal_chat", "messages": []}
//! ]}}"#;
//!
//! let export = parse_export_str(json)?;
//! assert_eq!(export.chats.len(), 1);
//! assert!(parse_export_str(r#"{"contacts": {}}"#).is_err());
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TglensError};
use crate::export::{ChatRecord, RawExport};

/// Loads an export document from disk.
///
/// # Errors
///
/// - [`TglensError::Io`] if the file cannot be read
/// - [`TglensError::MalformedExport`] if it is not a valid export
pub fn load_export(path: impl AsRef<Path>) -> Result<RawExport> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read export file");
    parse_export_slice(&bytes).map_err(|e| e.with_path(path))
}

/// Parses an export document from a string.
pub fn parse_export_str(content: &str) -> Result<RawExport> {
    parse_export_slice(content.as_bytes())
}

/// Parses an export document from raw bytes.
pub fn parse_export_slice(bytes: &[u8]) -> Result<RawExport> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| TglensError::malformed_json(e, None))?;
    let export = export_from_value(root)?;
    debug!(
        chats = export.chats.len(),
        messages = export.message_count(),
        "export parsed"
    );
    Ok(export)
}

fn export_from_value(root: Value) -> Result<RawExport> {
    let Value::Object(mut root) = root else {
        return Err(TglensError::malformed(
            "document root is not a JSON object",
            None,
        ));
    };

    if let Some(chats) = root.remove("chats") {
        let list = match chats {
            Value::Object(mut section) => section.remove("list"),
            _ => None,
        };
        let Some(Value::Array(list)) = list else {
            return Err(TglensError::malformed(
                "`chats.list` is missing or is not an array",
                None,
            ));
        };

        let chats = list
            .into_iter()
            .enumerate()
            .map(|(position, value)| chat_from_value(position, value))
            .collect::<Result<Vec<_>>>()?;
        return Ok(RawExport::new(chats));
    }

    if root.contains_key("messages") {
        let chat = chat_from_value(0, Value::Object(root))?;
        return Ok(RawExport::new(vec![chat]));
    }

    Err(TglensError::malformed(
        "no chat list found: expected `chats.list` or a single chat with `messages`",
        None,
    ))
}

/// Converts one chat object into a [`ChatRecord`].
///
/// `position` is the chat's index in the chat list, used in error messages.
pub(crate) fn chat_from_value(position: usize, value: Value) -> Result<ChatRecord> {
    if !value.is_object() {
        return Err(TglensError::malformed(
            format!("chat #{position} is not a JSON object"),
            None,
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        TglensError::malformed(format!("chat #{position} is invalid: {e}"), None)
    })
}
