//! In-memory model of a Telegram Desktop export.
//!
//! A full account export ("Export Telegram data" → JSON) looks like:
//!
//! ```json
//! {
//!   "about": "...",
//!   "personal_information": { ... },
//!   "contacts": { "about": "...", "list": [ ... ] },
//!   "chats": {
//!     "about": "...",
//!     "list": [
//!       {
//!         "name": "Alice",
//!         "type": "personal_chat",
//!         "id": 4470011,
//!         "messages": [ { "id": 1, "type": "message", ... } ]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! A single-chat export is just one of the chat objects at the root.
//!
//! Raw messages are kept as untyped [`Value`]s. Their shape varies wildly
//! between text, media, service and forwarded entries, and one odd entry must
//! never make the whole chat undeserializable; classification happens later
//! in [`crate::normalize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The loaded export document: every chat with its raw messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExport {
    /// Chats in source order.
    pub chats: Vec<ChatRecord>,
}

impl RawExport {
    /// Creates an export from a list of chats.
    pub fn new(chats: Vec<ChatRecord>) -> Self {
        Self { chats }
    }

    /// Returns `true` if the export contains no chats.
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Total number of raw message entries across all chats.
    pub fn message_count(&self) -> usize {
        self.chats.iter().map(|c| c.messages.len()).sum()
    }

    /// Metadata of every chat, detached from the messages.
    pub fn chat_infos(&self) -> Vec<ChatInfo> {
        self.chats.iter().map(ChatRecord::info).collect()
    }

    /// Looks up a chat by its identifier.
    pub fn chat(&self, id: i64) -> Option<&ChatRecord> {
        self.chats.iter().find(|c| c.id == id)
    }
}

/// One chat of the export with its ordered raw messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatRecord {
    /// Telegram chat identifier.
    pub id: i64,

    /// Display name. Saved Messages and deleted accounts have none.
    #[serde(default)]
    pub name: Option<String>,

    /// Chat type.
    #[serde(rename = "type", default)]
    pub kind: ChatKind,

    /// Raw message entries in source order.
    #[serde(default)]
    pub messages: Vec<Value>,
}

impl ChatRecord {
    /// Creates a chat record.
    pub fn new(id: i64, name: Option<String>, kind: ChatKind, messages: Vec<Value>) -> Self {
        Self {
            id,
            name,
            kind,
            messages,
        }
    }

    /// Display name, falling back to a placeholder for unnamed chats.
    pub fn display_name(&self) -> &str {
        display_name(self.name.as_deref(), self.kind)
    }

    /// Returns the chat metadata.
    pub fn info(&self) -> ChatInfo {
        ChatInfo {
            id: self.id,
            name: self.display_name().to_string(),
            kind: self.kind,
        }
    }
}

fn display_name(name: Option<&str>, kind: ChatKind) -> &str {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ if kind == ChatKind::SavedMessages => "Saved Messages",
        _ => "Deleted Account",
    }
}

/// Chat metadata without messages.
///
/// Kept separately so chats that end up with zero messages (after filtering,
/// or because they were empty in the export) still get a summary row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatInfo {
    /// Telegram chat identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Chat type.
    pub kind: ChatKind,
}

/// Telegram chat types.
///
/// Unrecognized type strings deserialize to [`ChatKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one conversation
    #[serde(rename = "personal_chat")]
    Personal,
    /// The account's own Saved Messages
    SavedMessages,
    /// Conversation with a bot
    #[serde(rename = "bot_chat")]
    Bot,
    /// Legacy small group
    PrivateGroup,
    /// Private supergroup
    PrivateSupergroup,
    /// Public supergroup
    PublicSupergroup,
    /// Private channel
    PrivateChannel,
    /// Public channel
    PublicChannel,
    /// Anything else
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChatKind {
    /// Returns `true` for one-to-one style chats (personal, saved, bot).
    pub fn is_personal(&self) -> bool {
        matches!(
            self,
            ChatKind::Personal | ChatKind::SavedMessages | ChatKind::Bot
        )
    }

    /// Returns `true` for group chats of any flavour.
    pub fn is_group(&self) -> bool {
        matches!(
            self,
            ChatKind::PrivateGroup | ChatKind::PrivateSupergroup | ChatKind::PublicSupergroup
        )
    }

    /// Returns `true` for broadcast channels.
    pub fn is_channel(&self) -> bool {
        matches!(self, ChatKind::PrivateChannel | ChatKind::PublicChannel)
    }

    /// The type string used in Telegram exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Personal => "personal_chat",
            ChatKind::SavedMessages => "saved_messages",
            ChatKind::Bot => "bot_chat",
            ChatKind::PrivateGroup => "private_group",
            ChatKind::PrivateSupergroup => "private_supergroup",
            ChatKind::PublicSupergroup => "public_supergroup",
            ChatKind::PrivateChannel => "private_channel",
            ChatKind::PublicChannel => "public_channel",
            ChatKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_record_deserialize() {
        let chat: ChatRecord = serde_json::from_value(json!({
            "name": "Alice",
            "type": "personal_chat",
            "id": 4470011,
            "messages": [{"id": 1, "type": "message"}]
        }))
        .unwrap();

        assert_eq!(chat.id, 4470011);
        assert_eq!(chat.name.as_deref(), Some("Alice"));
        assert_eq!(chat.kind, ChatKind::Personal);
        assert_eq!(chat.messages.len(), 1);
    }

    #[test]
    fn test_chat_record_requires_id() {
        let result = serde_json::from_value::<ChatRecord>(json!({
            "name": "No id",
            "type": "personal_chat",
            "messages": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_record_rejects_non_array_messages() {
        let result = serde_json::from_value::<ChatRecord>(json!({
            "id": 1,
            "messages": "nope"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_kind_unknown_and_missing() {
        let chat: ChatRecord =
            serde_json::from_value(json!({"id": 1, "type": "secret_chat"})).unwrap();
        assert_eq!(chat.kind, ChatKind::Unknown);
        assert!(chat.messages.is_empty());

        let chat: ChatRecord = serde_json::from_value(json!({"id": 2})).unwrap();
        assert_eq!(chat.kind, ChatKind::Unknown);
    }

    #[test]
    fn test_chat_kind_roundtrip_names() {
        for kind in [
            ChatKind::Personal,
            ChatKind::SavedMessages,
            ChatKind::Bot,
            ChatKind::PrivateGroup,
            ChatKind::PrivateSupergroup,
            ChatKind::PublicSupergroup,
            ChatKind::PrivateChannel,
            ChatKind::PublicChannel,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_chat_kind_predicates() {
        assert!(ChatKind::Personal.is_personal());
        assert!(ChatKind::SavedMessages.is_personal());
        assert!(ChatKind::PrivateSupergroup.is_group());
        assert!(!ChatKind::PublicChannel.is_group());
        assert!(ChatKind::PublicChannel.is_channel());
        assert!(!ChatKind::Unknown.is_personal());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let saved = ChatRecord::new(1, None, ChatKind::SavedMessages, vec![]);
        assert_eq!(saved.display_name(), "Saved Messages");

        let deleted = ChatRecord::new(2, Some("  ".into()), ChatKind::Personal, vec![]);
        assert_eq!(deleted.display_name(), "Deleted Account");

        let named = ChatRecord::new(3, Some("Bob".into()), ChatKind::Personal, vec![]);
        assert_eq!(named.info().name, "Bob");
    }

    #[test]
    fn test_raw_export_helpers() {
        let export = RawExport::new(vec![
            ChatRecord::new(1, Some("A".into()), ChatKind::Personal, vec![json!({}), json!({})]),
            ChatRecord::new(2, Some("B".into()), ChatKind::PrivateGroup, vec![json!({})]),
        ]);

        assert!(!export.is_empty());
        assert_eq!(export.message_count(), 3);
        assert_eq!(export.chat_infos().len(), 2);
        assert_eq!(export.chat(2).unwrap().display_name(), "B");
        assert!(export.chat(3).is_none());
        assert!(RawExport::default().is_empty());
    }
}
