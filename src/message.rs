//! Normalized message record.
//!
//! This module provides [`NormalizedMessage`], the uniform representation every
//! raw export entry is mapped to by [`crate::normalize`], and [`MessageKind`],
//! its classification.
//!
//! # Examples
//!
//! ```
//! use tglens::message::{MessageKind, NormalizedMessage};
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
//! let msg = NormalizedMessage::new(42, "user1", ts, MessageKind::Text)
//!     .with_text("Hello, world!")
//!     .with_sender_name("Alice");
//!
//! assert_eq!(msg.chat_id, 42);
//! assert!(msg.has_text());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::export::ChatKind;

/// How a raw entry was classified. Every message has exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain or formatted text
    Text,
    /// Photo, file, sticker, voice/video note, poll, location, contact
    Media,
    /// Service entry (joins, pins, calls, ...)
    Service,
    /// Forwarded from another chat
    Forwarded,
    /// Recognized as an entry but of no known shape
    Unknown,
}

impl MessageKind {
    /// All kinds in display order.
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::Text,
            MessageKind::Media,
            MessageKind::Service,
            MessageKind::Forwarded,
            MessageKind::Unknown,
        ]
    }

    /// Lower-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Media => "media",
            MessageKind::Service => "service",
            MessageKind::Forwarded => "forwarded",
            MessageKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A uniform record for one chat entry, whatever its original shape.
///
/// Derived data: built once by the normalizer and never mutated afterwards.
///
/// | Field | Description |
/// |-------|-------------|
/// | `chat_id` | Chat the entry belongs to |
/// | `chat_kind` | Type of that chat |
/// | `index` | Position in the chat's raw message list |
/// | `sender_id` | Stable sender identity (`user123`, or the name if no id) |
/// | `timestamp` | When the entry was sent |
/// | `kind` | Classification |
/// | `text` | Plain text, possibly empty |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Identifier of the chat this message belongs to.
    pub chat_id: i64,

    /// Type of the owning chat.
    #[serde(default)]
    pub chat_kind: ChatKind,

    /// Zero-based position in the source chat.
    #[serde(default)]
    pub index: usize,

    /// Telegram message id.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message_id: Option<i64>,

    /// Stable sender identity.
    pub sender_id: String,

    /// Sender display name, when the export has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender_name: Option<String>,

    /// When the message was sent (UTC).
    pub timestamp: DateTime<Utc>,

    /// Classification.
    pub kind: MessageKind,

    /// Plain text content with styling removed. Empty for most
    /// service and unknown entries.
    #[serde(default)]
    pub text: String,

    /// Telegram `media_type` (`voice_message`, `sticker`, ...) or a synthetic
    /// type for photos and files. Set on media and forwarded entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub media_type: Option<String>,

    /// Service action (`phone_call`, `pin_message`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub action: Option<String>,

    /// Call or media duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub duration_seconds: Option<u64>,

    /// Id of the message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reply_to: Option<i64>,

    /// Original author of a forwarded message.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub forwarded_from: Option<String>,
}

impl NormalizedMessage {
    /// Creates a message with the required fields; everything else is empty.
    pub fn new(
        chat_id: i64,
        sender_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        kind: MessageKind,
    ) -> Self {
        Self {
            chat_id,
            chat_kind: ChatKind::Unknown,
            index: 0,
            message_id: None,
            sender_id: sender_id.into(),
            sender_name: None,
            timestamp,
            kind,
            text: String::new(),
            media_type: None,
            action: None,
            duration_seconds: None,
            reply_to: None,
            forwarded_from: None,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Sets the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the owning chat's kind.
    #[must_use]
    pub fn with_chat_kind(mut self, kind: ChatKind) -> Self {
        self.chat_kind = kind;
        self
    }

    /// Sets the position in the source chat.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Sets the Telegram message id.
    #[must_use]
    pub fn with_message_id(mut self, id: i64) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Sets the sender display name.
    #[must_use]
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the service action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the duration in seconds.
    #[must_use]
    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    // =========================================================================
    // Utility methods
    // =========================================================================

    /// Returns `true` if the message carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Length of the text in characters.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns `true` for phone-call service entries.
    pub fn is_call(&self) -> bool {
        self.kind == MessageKind::Service && self.action.as_deref() == Some("phone_call")
    }

    /// Name to show for the sender: display name if known, else the id.
    pub fn sender_label(&self) -> &str {
        self.sender_name.as_deref().unwrap_or(&self.sender_id)
    }
}
