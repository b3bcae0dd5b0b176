//! Message normalizer: raw Telegram entries → [`NormalizedMessage`].
//!
//! Raw entries come in many shapes:
//!
//! ```json
//! {"id": 1, "type": "message", "date": "2024-01-15T10:30:00", "date_unixtime": "1705314600",
//!  "from": "Alice", "from_id": "user1", "text": "Hello"}
//! {"id": 2, "type": "message", ..., "photo": "photos/1.jpg", "text": ""}
//! {"id": 3, "type": "message", ..., "forwarded_from": "News", "text": ["Read ", {"type": "link", "text": "this"}]}
//! {"id": 4, "type": "service", ..., "actor": "Bob", "actor_id": "user2", "action": "phone_call", "duration_seconds": 61}
//! ```
//!
//! Classification is by field presence and yields exactly one
//! [`MessageKind`] per entry, in this precedence: service, forwarded, media,
//! text, unknown. Entries of an unrecognized shape are kept as
//! [`MessageKind::Unknown`] with empty text so totals stay exact. Only
//! structurally invalid entries fail, with [`UnparsableMessage`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::NormalizeConfig;
use crate::error::{Result, UnparsableMessage};
use crate::export::{ChatRecord, RawExport};
use crate::message::{MessageKind, NormalizedMessage};

/// Sender id used when an entry names nobody.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Fields whose presence marks an entry as media, with the media type to
/// report when `media_type` itself is absent.
const MEDIA_MARKERS: &[(&str, &str)] = &[
    ("photo", "photo"),
    ("sticker_emoji", "sticker"),
    ("file", "file"),
    ("poll", "poll"),
    ("location_information", "location"),
    ("contact_information", "contact"),
];

/// Result of normalizing a set of chats.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Successfully normalized messages, chat by chat in source order.
    pub messages: Vec<NormalizedMessage>,
    /// Entries that were skipped.
    pub skipped: Vec<UnparsableMessage>,
}

impl Normalized {
    /// Folds another chat's result into this one.
    pub fn extend(&mut self, other: Normalized) {
        self.messages.extend(other.messages);
        self.skipped.extend(other.skipped);
    }
}

/// Extracts plain text from Telegram's `text` field.
///
/// The field can be:
/// - A simple string: `"Hello"`
/// - An array of strings and styled spans:
///   `["Hello ", {"type": "bold", "text": "world"}]`
/// - A lone styled span: `{"type": "link", "text": "https://..."}`
///
/// Styling is discarded and the parts are concatenated.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tglens::normalize::extract_text;
///
/// let value = json!(["Check this: ", {"type": "link", "text": "https://example.com"}]);
/// assert_eq!(extract_text(&value), "Check this: https://example.com");
/// ```
pub fn extract_text(text_value: &Value) -> String {
    match text_value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<String>(),
        Value::Object(obj) => obj
            .get("text")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Parses a Unix timestamp stored either as a string (`"1705314600"`) or a
/// number.
pub fn parse_unix_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    DateTime::from_timestamp(secs, 0)
}

/// Parses Telegram's naive `date` field (`2024-01-15T10:30:00`) as UTC.
pub fn parse_naive_date(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn message_timestamp(obj: &Map<String, Value>) -> Option<DateTime<Utc>> {
    obj.get("date_unixtime")
        .and_then(parse_unix_timestamp)
        .or_else(|| obj.get("date").and_then(parse_naive_date))
}

/// Reads an identifier that may be a string (`"user123"`) or a number.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

fn media_type(obj: &Map<String, Value>) -> Option<String> {
    if let Some(media) = non_empty_str(obj.get("media_type")) {
        return Some(media);
    }
    MEDIA_MARKERS
        .iter()
        .find(|(field, _)| obj.get(*field).is_some_and(|v| !v.is_null()))
        .map(|(_, media)| (*media).to_string())
}

fn classify(obj: &Map<String, Value>, media: Option<&str>, text: &str) -> MessageKind {
    let is_service = obj.get("type").and_then(Value::as_str) == Some("service")
        || obj.contains_key("action");

    if is_service {
        MessageKind::Service
    } else if obj.contains_key("forwarded_from") {
        // Hidden authors are exported as `"forwarded_from": null`
        MessageKind::Forwarded
    } else if media.is_some() {
        MessageKind::Media
    } else if !text.trim().is_empty() {
        MessageKind::Text
    } else {
        MessageKind::Unknown
    }
}

/// Normalizes one raw entry of `chat`.
///
/// `index` is the entry's position in `chat.messages` and is carried into
/// both the result and any error.
///
/// # Errors
///
/// Returns [`UnparsableMessage`] when the entry is not a JSON object, has
/// neither a `text` nor a `type` field, or has no usable timestamp.
pub fn normalize_message(
    chat: &ChatRecord,
    index: usize,
    raw: &Value,
) -> std::result::Result<NormalizedMessage, UnparsableMessage> {
    let fail = |reason: &str| UnparsableMessage::new(chat.id, index, reason);

    let obj = raw.as_object().ok_or_else(|| fail("entry is not an object"))?;

    if !obj.contains_key("text") && !obj.contains_key("type") {
        return Err(fail("entry has neither text nor type"));
    }

    let timestamp = message_timestamp(obj).ok_or_else(|| fail("missing or invalid date"))?;

    let text = obj.get("text").map(extract_text).unwrap_or_default();
    let media = media_type(obj);
    let kind = classify(obj, media.as_deref(), &text);

    let (id_field, name_field) = if kind == MessageKind::Service {
        ("actor_id", "actor")
    } else {
        ("from_id", "from")
    };
    let sender_name = non_empty_str(obj.get(name_field));
    let sender_id = id_string(obj.get(id_field))
        .or_else(|| sender_name.clone())
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    Ok(NormalizedMessage {
        chat_id: chat.id,
        chat_kind: chat.kind,
        index,
        message_id: obj.get("id").and_then(Value::as_i64),
        sender_id,
        sender_name,
        timestamp,
        kind,
        text: if kind == MessageKind::Unknown {
            String::new()
        } else {
            text
        },
        // a forwarded photo is still a photo
        media_type: if matches!(kind, MessageKind::Media | MessageKind::Forwarded) {
            media
        } else {
            None
        },
        action: obj.get("action").and_then(Value::as_str).map(ToString::to_string),
        duration_seconds: obj.get("duration_seconds").and_then(Value::as_u64),
        reply_to: obj.get("reply_to_message_id").and_then(Value::as_i64),
        forwarded_from: non_empty_str(obj.get("forwarded_from")),
    })
}

/// Lazily normalizes every entry of a chat, in source order.
///
/// Each item is independent: a failed entry does not stop the iterator.
pub fn normalize_chat(
    chat: &ChatRecord,
) -> impl Iterator<Item = std::result::Result<NormalizedMessage, UnparsableMessage>> + '_ {
    chat.messages
        .iter()
        .enumerate()
        .map(move |(index, raw)| normalize_message(chat, index, raw))
}

/// Normalizes a chat, applying the partial-failure policy of `config`.
///
/// With `skip_invalid` (the default) bad entries are logged and collected in
/// [`Normalized::skipped`]; otherwise the first one aborts.
pub fn normalize_chat_with(chat: &ChatRecord, config: &NormalizeConfig) -> Result<Normalized> {
    let mut out = Normalized {
        messages: Vec::with_capacity(chat.messages.len()),
        skipped: Vec::new(),
    };
    let mut last_ts: Option<DateTime<Utc>> = None;
    let mut out_of_order = 0usize;

    for result in normalize_chat(chat) {
        match result {
            Ok(msg) => {
                if last_ts.is_some_and(|prev| msg.timestamp < prev) {
                    out_of_order += 1;
                }
                last_ts = Some(msg.timestamp);
                out.messages.push(msg);
            }
            Err(err) if config.skip_invalid => {
                warn!(chat_id = err.chat_id, index = err.index, reason = %err.reason, "skipping unparsable message");
                out.skipped.push(err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if out_of_order > 0 {
        warn!(chat_id = chat.id, out_of_order, "timestamps are not in chronological order");
    }
    debug!(
        chat_id = chat.id,
        messages = out.messages.len(),
        skipped = out.skipped.len(),
        "normalized chat"
    );

    Ok(out)
}

/// Normalizes every chat of an export.
pub fn normalize_export(export: &RawExport, config: &NormalizeConfig) -> Result<Normalized> {
    let mut all = Normalized {
        messages: Vec::with_capacity(export.message_count()),
        skipped: Vec::new(),
    };
    for chat in &export.chats {
        all.extend(normalize_chat_with(chat, config)?);
    }
    Ok(all)
}
