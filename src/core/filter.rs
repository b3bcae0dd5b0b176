//! Filter chats and messages before aggregation.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] for filtering normalized message collections.
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before date |
//! | Period | [`with_period`](FilterConfig::with_period) | Trailing window ending at the newest message |
//! | Scope | [`with_scope`](FilterConfig::with_scope) | Personal chats or groups only |
//! | Chat | [`with_chat`](FilterConfig::with_chat) | Specific chat ids |
//! | Sender | [`with_sender`](FilterConfig::with_sender) | Messages from specific sender |
//!
//! # Examples
//!
//! ```
//! use tglens::core::filter::{FilterConfig, Period, apply_filters};
//! use tglens::message::{MessageKind, NormalizedMessage};
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> tglens::Result<()> {
//! let messages = vec![
//!     NormalizedMessage::new(1, "user1", Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(), MessageKind::Text),
//!     NormalizedMessage::new(1, "user1", Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(), MessageKind::Text),
//! ];
//!
//! let config = FilterConfig::new().with_period(Period::Days30);
//! let filtered = apply_filters(messages, &config);
//! assert_eq!(filtered.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - The period window is anchored at the newest message that survives the
//!   other filters, so results do not depend on the wall clock
//! - Sender matching is case-insensitive and accepts the id or display name
//! - Multiple filters are combined with AND logic

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TglensError;
use crate::export::{ChatInfo, ChatKind};
use crate::message::NormalizedMessage;

/// Trailing time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    /// Last 7 days
    #[serde(rename = "7d")]
    Days7,
    /// Last 30 days
    #[serde(rename = "30d")]
    Days30,
    /// Last 90 days
    #[serde(rename = "90d")]
    Days90,
    /// Last 365 days
    #[serde(rename = "1y")]
    Year,
    /// Everything (default)
    #[default]
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Length of the window, `None` for [`Period::All`].
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Period::Days7 => Some(Duration::days(7)),
            Period::Days30 => Some(Duration::days(30)),
            Period::Days90 => Some(Duration::days(90)),
            Period::Year => Some(Duration::days(365)),
            Period::All => None,
        }
    }

    /// Short name as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Days7 => "7d",
            Period::Days30 => "30d",
            Period::Days90 => "90d",
            Period::Year => "1y",
            Period::All => "all",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" | "week" => Ok(Period::Days7),
            "30d" | "month" => Ok(Period::Days30),
            "90d" | "quarter" => Ok(Period::Days90),
            "1y" | "365d" | "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            _ => Err(format!(
                "Unknown period: '{s}'. Expected one of: 7d, 30d, 90d, 1y, all"
            )),
        }
    }
}

/// Which kinds of chats take part in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    /// Every chat (default)
    #[default]
    All,
    /// Personal, saved-messages and bot chats
    Personal,
    /// Groups and supergroups
    Group,
}

impl ChatScope {
    /// Returns `true` if chats of `kind` are in scope.
    pub fn includes(&self, kind: ChatKind) -> bool {
        match self {
            ChatScope::All => true,
            ChatScope::Personal => kind.is_personal(),
            ChatScope::Group => kind.is_group(),
        }
    }
}

impl std::fmt::Display for ChatScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatScope::All => write!(f, "all"),
            ChatScope::Personal => write!(f, "personal"),
            ChatScope::Group => write!(f, "group"),
        }
    }
}

impl std::str::FromStr for ChatScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ChatScope::All),
            "personal" | "private" => Ok(ChatScope::Personal),
            "group" | "groups" => Ok(ChatScope::Group),
            _ => Err(format!(
                "Unknown scope: '{s}'. Expected one of: all, personal, group"
            )),
        }
    }
}

/// Configuration for filtering chats and messages.
///
/// Filters are combined with AND logic: a message must match all active
/// filters to be included in the result.
///
/// # Examples
///
/// ```
/// use tglens::core::filter::{ChatScope, FilterConfig};
///
/// # fn main() -> tglens::Result<()> {
/// let config = FilterConfig::new()
///     .with_scope(ChatScope::Personal)
///     .with_date_from("2024-01-01")?
///     .with_date_to("2024-12-31")?;
///
/// assert!(config.has_date_filter());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Include only messages on or after this timestamp.
    pub after: Option<DateTime<Utc>>,

    /// Include only messages on or before this timestamp.
    pub before: Option<DateTime<Utc>>,

    /// Trailing window ending at the newest remaining message.
    pub period: Period,

    /// Chat kinds to include.
    pub scope: ChatScope,

    /// Include only these chats. Empty means all.
    pub chat_ids: BTreeSet<i64>,

    /// Include only messages from this sender (id or name, case-insensitive).
    pub from: Option<String>,
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    ///
    /// No filters are active by default; everything passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start date filter (inclusive). Date format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`TglensError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self, TglensError> {
        let date = parse_date(date_str)?;
        self.after = Some(date.and_time(chrono::NaiveTime::MIN).and_utc());
        Ok(self)
    }

    /// Sets the end date filter (inclusive). Date format: `YYYY-MM-DD`.
    ///
    /// The whole day is included.
    ///
    /// # Errors
    ///
    /// Returns [`TglensError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self, TglensError> {
        let date = parse_date(date_str)?;
        let end_of_day = date
            .succ_opt()
            .map(|next| next.and_time(chrono::NaiveTime::MIN).and_utc() - Duration::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.before = Some(end_of_day);
        Ok(self)
    }

    /// Sets the start timestamp directly.
    #[must_use]
    pub fn with_after(mut self, dt: DateTime<Utc>) -> Self {
        self.after = Some(dt);
        self
    }

    /// Sets the end timestamp directly.
    #[must_use]
    pub fn with_before(mut self, dt: DateTime<Utc>) -> Self {
        self.before = Some(dt);
        self
    }

    /// Sets the trailing period.
    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    /// Sets the chat scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ChatScope) -> Self {
        self.scope = scope;
        self
    }

    /// Adds a chat id to the chat filter.
    #[must_use]
    pub fn with_chat(mut self, chat_id: i64) -> Self {
        self.chat_ids.insert(chat_id);
        self
    }

    /// Sets the sender filter.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.has_date_filter() || self.has_chat_filter() || self.from.is_some()
    }

    /// Returns `true` if date or period filters are active.
    pub fn has_date_filter(&self) -> bool {
        self.after.is_some() || self.before.is_some() || self.period != Period::All
    }

    /// Returns `true` if scope or chat-id filters are active.
    pub fn has_chat_filter(&self) -> bool {
        self.scope != ChatScope::All || !self.chat_ids.is_empty()
    }

    /// Returns `true` if the chat passes the scope and chat-id filters.
    pub fn accepts_chat(&self, chat: &ChatInfo) -> bool {
        self.scope.includes(chat.kind)
            && (self.chat_ids.is_empty() || self.chat_ids.contains(&chat.id))
    }

    /// Returns `true` if the message passes every filter except the period.
    fn accepts_message(&self, msg: &NormalizedMessage) -> bool {
        if !self.scope.includes(msg.chat_kind) {
            return false;
        }
        if !self.chat_ids.is_empty() && !self.chat_ids.contains(&msg.chat_id) {
            return false;
        }
        if let Some(ref from) = self.from {
            let matches_id = msg.sender_id.to_lowercase() == from.to_lowercase();
            let matches_name = msg
                .sender_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase() == from.to_lowercase());
            if !matches_id && !matches_name {
                return false;
            }
        }
        if self.after.is_some_and(|after| msg.timestamp < after) {
            return false;
        }
        if self.before.is_some_and(|before| msg.timestamp > before) {
            return false;
        }
        true
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, TglensError> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| TglensError::invalid_date(date_str))
}

/// Filters chat metadata by scope and chat id.
pub fn filter_chats(chats: Vec<ChatInfo>, config: &FilterConfig) -> Vec<ChatInfo> {
    if !config.has_chat_filter() {
        return chats;
    }
    chats
        .into_iter()
        .filter(|chat| config.accepts_chat(chat))
        .collect()
}

/// Filters a collection of messages based on the provided configuration.
///
/// Returns a new vector containing only messages that match all active
/// filters, in input order. The period window is applied last and is
/// anchored at the newest timestamp among the messages that passed the
/// other filters.
pub fn apply_filters(
    messages: Vec<NormalizedMessage>,
    config: &FilterConfig,
) -> Vec<NormalizedMessage> {
    if !config.is_active() {
        return messages;
    }

    let mut kept: Vec<NormalizedMessage> = messages
        .into_iter()
        .filter(|msg| config.accepts_message(msg))
        .collect();

    if let Some(window) = config.period.duration() {
        if let Some(newest) = kept.iter().map(|m| m.timestamp).max() {
            // a window reaching past the earliest date keeps everything
            if let Some(start) = newest.checked_sub_signed(window) {
                kept.retain(|m| m.timestamp >= start);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn make_msg(chat_id: i64, sender: &str, date: &str) -> NormalizedMessage {
        let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let ts = naive.and_hms_opt(12, 0, 0).unwrap().and_utc();
        NormalizedMessage::new(chat_id, sender, ts, MessageKind::Text)
    }

    #[test]
    fn test_no_filters_passthrough() {
        let messages = vec![make_msg(1, "user1", "2024-01-01")];
        let filtered = apply_filters(messages.clone(), &FilterConfig::new());
        assert_eq!(filtered, messages);
    }

    #[test]
    fn test_filter_by_sender_id_or_name() {
        let messages = vec![
            make_msg(1, "user1", "2024-01-01").with_sender_name("Alice"),
            make_msg(1, "user2", "2024-01-01").with_sender_name("Bob"),
            make_msg(1, "USER1", "2024-01-02"),
        ];

        let by_name = apply_filters(messages.clone(), &FilterConfig::new().with_sender("alice"));
        assert_eq!(by_name.len(), 1);

        let by_id = apply_filters(messages, &FilterConfig::new().with_sender("user1"));
        assert_eq!(by_id.len(), 2);
    }

    #[test]
    fn test_filter_by_date_range() {
        let messages = vec![
            make_msg(1, "u", "2024-01-01"),
            make_msg(1, "u", "2024-06-15"),
            make_msg(1, "u", "2024-12-31"),
        ];

        let config = FilterConfig::new()
            .with_date_from("2024-06-01")
            .unwrap()
            .with_date_to("2024-06-30")
            .unwrap();
        let filtered = apply_filters(messages, &config);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].timestamp.date_naive().to_string(), "2024-06-15");
    }

    #[test]
    fn test_date_to_includes_whole_day() {
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
        let msg = NormalizedMessage::new(1, "u", late, MessageKind::Text);
        let config = FilterConfig::new().with_date_to("2024-03-01").unwrap();
        assert_eq!(apply_filters(vec![msg], &config).len(), 1);
    }

    #[test]
    fn test_invalid_date_format() {
        let result = FilterConfig::new().with_date_from("01-01-2024");
        assert!(matches!(result, Err(TglensError::InvalidDate { .. })));
    }

    #[test]
    fn test_period_anchored_at_newest_message() {
        let messages = vec![
            make_msg(1, "u", "2023-01-01"),
            make_msg(1, "u", "2023-03-01"),
            make_msg(1, "u", "2023-03-05"),
        ];
        let filtered = apply_filters(messages, &FilterConfig::new().with_period(Period::Days7));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_period_on_empty_input() {
        let filtered = apply_filters(vec![], &FilterConfig::new().with_period(Period::Year));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_period_near_earliest_representable_date() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        let messages = vec![
            NormalizedMessage::new(1, "u", earliest, MessageKind::Text),
            NormalizedMessage::new(1, "u", earliest + Duration::days(2), MessageKind::Text),
        ];

        let filtered = apply_filters(messages.clone(), &FilterConfig::new().with_period(Period::Year));
        assert_eq!(filtered, messages);

        let filtered = apply_filters(messages, &FilterConfig::new().with_period(Period::Days7));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_scope_and_chat_filters() {
        let messages = vec![
            make_msg(1, "u", "2024-01-01").with_chat_kind(ChatKind::Personal),
            make_msg(2, "u", "2024-01-01").with_chat_kind(ChatKind::PrivateSupergroup),
            make_msg(3, "u", "2024-01-01").with_chat_kind(ChatKind::PublicChannel),
        ];

        let personal = apply_filters(messages.clone(), &FilterConfig::new().with_scope(ChatScope::Personal));
        assert_eq!(personal.len(), 1);
        assert_eq!(personal[0].chat_id, 1);

        let groups = apply_filters(messages.clone(), &FilterConfig::new().with_scope(ChatScope::Group));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].chat_id, 2);

        let by_id = apply_filters(messages, &FilterConfig::new().with_chat(3).with_chat(1));
        assert_eq!(by_id.len(), 2);
    }

    #[test]
    fn test_filter_chats() {
        let chats = vec![
            ChatInfo { id: 1, name: "A".into(), kind: ChatKind::Personal },
            ChatInfo { id: 2, name: "B".into(), kind: ChatKind::PrivateGroup },
        ];
        let kept = filter_chats(chats, &FilterConfig::new().with_scope(ChatScope::Group));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 2);
    }

    #[test]
    fn test_period_and_scope_parse() {
        assert_eq!(Period::from_str("30d").unwrap(), Period::Days30);
        assert_eq!(Period::from_str("1Y").unwrap(), Period::Year);
        assert!(Period::from_str("2w").is_err());
        assert_eq!(ChatScope::from_str("groups").unwrap(), ChatScope::Group);
        assert!(ChatScope::from_str("channels").is_err());
        assert_eq!(Period::Days90.to_string(), "90d");
    }

    #[test]
    fn test_is_active() {
        assert!(!FilterConfig::new().is_active());
        assert!(FilterConfig::new().with_sender("Alice").is_active());
        assert!(FilterConfig::new().with_period(Period::Days7).is_active());
        assert!(FilterConfig::new().with_scope(ChatScope::Group).is_active());
        assert!(!FilterConfig::new().with_period(Period::All).is_active());
    }
}
