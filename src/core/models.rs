//! Result tables produced by the aggregator.
//!
//! Every tuple-keyed table is a [`CountTable`]: an ordered map from a small
//! key struct to a count. Tables serialize as a list of rows with the key
//! fields flattened next to the count, in key order:
//!
//! ```json
//! [
//!   { "bucket": "2024-01-01", "chat_id": 42, "count": 2 },
//!   { "bucket": "2024-01-02", "chat_id": 42, "count": 5 }
//! ]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::export::{ChatInfo, ChatKind};
use crate::message::MessageKind;

/// Ordered count table keyed by `K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for CountTable<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> CountTable<K> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the count of `key`.
    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Adds `n` to the count of `key`.
    pub fn add(&mut self, key: K, n: u64) {
        *self.counts.entry(key).or_insert(0) += n;
    }

    /// Count of `key`, zero if absent.
    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterates in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, c)| (k, *c))
    }
}

impl<K: Ord> FromIterator<K> for CountTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = CountTable::new();
        for key in iter {
            table.increment(key);
        }
        table
    }
}

#[derive(Serialize)]
struct RowRef<'a, K> {
    #[serde(flatten)]
    key: &'a K,
    count: u64,
}

#[derive(Deserialize)]
struct Row<K> {
    #[serde(flatten)]
    key: K,
    count: u64,
}

impl<K: Ord + Serialize> Serialize for CountTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.counts.len()))?;
        for (key, count) in &self.counts {
            seq.serialize_element(&RowRef { key, count: *count })?;
        }
        seq.end()
    }
}

impl<'de, K> Deserialize<'de> for CountTable<K>
where
    K: Ord + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowsVisitor<K>(PhantomData<K>);

        impl<'de, K: Ord + Deserialize<'de>> Visitor<'de> for RowsVisitor<K> {
            type Value = CountTable<K>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of count rows")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut table = CountTable::new();
                while let Some(row) = seq.next_element::<Row<K>>()? {
                    table.add(row.key, row.count);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_seq(RowsVisitor(PhantomData))
    }
}

// =========================================================================
// Table keys
// =========================================================================

/// Per-chat time bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    /// First day of the bucket.
    pub bucket: NaiveDate,
    pub chat_id: i64,
}

/// Time bucket across all chats.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey {
    /// First day of the bucket.
    pub bucket: NaiveDate,
}

/// Sender within a chat.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SenderKey {
    pub chat_id: i64,
    pub sender_id: String,
}

/// Cell of the weekly activity heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeatmapKey {
    /// Day of week, 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    /// Hour of day (UTC), 0..=23
    pub hour: u8,
}

/// Media type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediaKey {
    pub media_type: String,
}

// =========================================================================
// Summaries
// =========================================================================

/// Message counts per [`MessageKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub text: u64,
    pub media: u64,
    pub service: u64,
    pub forwarded: u64,
    pub unknown: u64,
}

impl KindCounts {
    /// Counts one message of `kind`.
    pub fn increment(&mut self, kind: MessageKind) {
        match kind {
            MessageKind::Text => self.text += 1,
            MessageKind::Media => self.media += 1,
            MessageKind::Service => self.service += 1,
            MessageKind::Forwarded => self.forwarded += 1,
            MessageKind::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, kind: MessageKind) -> u64 {
        match kind {
            MessageKind::Text => self.text,
            MessageKind::Media => self.media,
            MessageKind::Service => self.service,
            MessageKind::Forwarded => self.forwarded,
            MessageKind::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        self.text + self.media + self.service + self.forwarded + self.unknown
    }
}

/// Summary of one chat.
///
/// Chats without messages (empty in the export or emptied by filters) keep
/// a row with zero counts and no date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: i64,
    pub name: String,
    pub kind: ChatKind,
    /// Messages counted for this chat.
    pub total: u64,
    /// Earliest message timestamp.
    pub first: Option<DateTime<Utc>>,
    /// Latest message timestamp.
    pub last: Option<DateTime<Utc>>,
    pub kinds: KindCounts,
    pub unique_senders: usize,
    /// Total text length in characters.
    pub text_length: u64,
    pub avg_text_length: f64,
    pub media_count: u64,
    pub calls: u64,
    /// Calendar days from first to last message, inclusive.
    pub days_active: i64,
    pub messages_per_day: f64,
}

impl ChatSummary {
    /// Creates an empty summary for `chat`.
    pub fn empty(chat: &ChatInfo) -> Self {
        Self {
            chat_id: chat.id,
            name: chat.name.clone(),
            kind: chat.kind,
            total: 0,
            first: None,
            last: None,
            kinds: KindCounts::default(),
            unique_senders: 0,
            text_length: 0,
            avg_text_length: 0.0,
            media_count: 0,
            calls: 0,
            days_active: 0,
            messages_per_day: 0.0,
        }
    }
}

/// Phone call statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    /// Number of phone-call service entries.
    pub count: u64,
    /// Sum of known call durations in seconds.
    pub total_duration_seconds: u64,
    /// Mean over calls with a known duration; zero when none.
    pub average_duration_seconds: f64,
}

/// Word statistics of the token table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStats {
    pub total_tokens: u64,
    pub unique_tokens: usize,
}

/// Export-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_messages: u64,
    pub total_chats: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    /// Calendar days from first to last message, inclusive.
    pub total_days: i64,
    pub total_text_length: u64,
    pub media_messages: u64,
    pub calls: CallStats,
}

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
