//! Aggregation of normalized messages into count tables and summaries.
//!
//! [`aggregate`] makes a single pass over the messages and fills every
//! table of [`Aggregates`]. The global time series is built from
//! [`merge_timeline`], the deterministic cross-chat ordering.
//!
//! # Example
//!
//! ```rust
//! use tglens::config::AggregateConfig;
//! use tglens::core::aggregate::aggregate;
//! use tglens::core::tokenizer::Tokenizer;
//! use tglens::export::{ChatInfo, ChatKind};
//! use tglens::message::{MessageKind, NormalizedMessage};
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> tglens::Result<()> {
//! let chats = vec![ChatInfo { id: 1, name: "Alice".into(), kind: ChatKind::Personal }];
//! let messages = vec![
//!     NormalizedMessage::new(1, "user1", Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap(), MessageKind::Text)
//!         .with_text("good morning"),
//!     NormalizedMessage::new(1, "user2", Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap(), MessageKind::Text)
//!         .with_text("good night"),
//! ];
//!
//! let result = aggregate(&chats, &messages, &AggregateConfig::default(), &Tokenizer::with_defaults()?);
//! assert_eq!(result.time_series.len(), 1);
//! assert_eq!(result.time_series.total(), 2);
//! assert_eq!(result.tokens.get("good"), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{
    BucketKey, CallStats, ChatSummary, CountTable, DateKey, HeatmapKey, MediaKey, Overview,
    SenderKey, WordStats, round2,
};
use super::tokenizer::{TokenFrequency, Tokenizer};
use crate::config::{AggregateConfig, Granularity};
use crate::export::ChatInfo;
use crate::message::NormalizedMessage;

/// All tables computed from one set of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Bucket width used by the time-series tables.
    pub granularity: Granularity,
    /// Export-wide totals.
    pub overview: Overview,
    /// Per-chat summaries ordered by chat id.
    pub chats: Vec<ChatSummary>,
    /// Count per (bucket, chat).
    pub time_series: CountTable<BucketKey>,
    /// Count per bucket across all chats.
    pub global_time_series: CountTable<DateKey>,
    /// Count per (chat, sender).
    pub sender_counts: CountTable<SenderKey>,
    /// Count per (weekday, hour).
    pub activity: CountTable<HeatmapKey>,
    /// Count per media type.
    pub media_types: CountTable<MediaKey>,
    /// Phone call statistics.
    pub calls: CallStats,
    /// Token totals.
    pub words: WordStats,
    /// Token frequencies.
    pub tokens: TokenFrequency,
}

impl Aggregates {
    /// Tables with no rows, for the given granularity.
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            overview: Overview::default(),
            chats: Vec::new(),
            time_series: CountTable::new(),
            global_time_series: CountTable::new(),
            sender_counts: CountTable::new(),
            activity: CountTable::new(),
            media_types: CountTable::new(),
            calls: CallStats::default(),
            words: WordStats::default(),
            tokens: TokenFrequency::new(),
        }
    }

    /// Summary of the chat with `chat_id`.
    pub fn chat(&self, chat_id: i64) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.chat_id == chat_id)
    }

    /// Sum of sender counts for one chat.
    pub fn sender_total(&self, chat_id: i64) -> u64 {
        self.sender_counts
            .iter()
            .filter(|(key, _)| key.chat_id == chat_id)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Running totals for one chat.
struct ChatAccumulator<'a> {
    summary: ChatSummary,
    senders: BTreeSet<&'a str>,
}

impl<'a> ChatAccumulator<'a> {
    fn new(info: &ChatInfo) -> Self {
        Self {
            summary: ChatSummary::empty(info),
            senders: BTreeSet::new(),
        }
    }

    fn add(&mut self, msg: &'a NormalizedMessage) {
        let s = &mut self.summary;
        s.total += 1;
        s.first = Some(s.first.map_or(msg.timestamp, |f| f.min(msg.timestamp)));
        s.last = Some(s.last.map_or(msg.timestamp, |l| l.max(msg.timestamp)));
        s.kinds.increment(msg.kind);
        s.text_length += msg.text_len() as u64;
        if msg.media_type.is_some() {
            s.media_count += 1;
        }
        if msg.is_call() {
            s.calls += 1;
        }
        self.senders.insert(msg.sender_id.as_str());
    }

    fn finish(self) -> ChatSummary {
        let mut summary = self.summary;
        summary.unique_senders = self.senders.len();
        if summary.total > 0 {
            summary.avg_text_length = round2(summary.text_length as f64 / summary.total as f64);
        }
        if let (Some(first), Some(last)) = (summary.first, summary.last) {
            summary.days_active = days_inclusive(first, last);
            summary.messages_per_day =
                round2(summary.total as f64 / summary.days_active.max(1) as f64);
        }
        summary
    }
}

#[derive(Default)]
struct CallAccumulator {
    count: u64,
    timed: u64,
    total_duration: u64,
}

impl CallAccumulator {
    fn add(&mut self, msg: &NormalizedMessage) {
        self.count += 1;
        if let Some(seconds) = msg.duration_seconds {
            self.timed += 1;
            self.total_duration += seconds;
        }
    }

    fn finish(&self) -> CallStats {
        let average = if self.timed > 0 {
            round2(self.total_duration as f64 / self.timed as f64)
        } else {
            0.0
        };
        CallStats {
            count: self.count,
            total_duration_seconds: self.total_duration,
            average_duration_seconds: average,
        }
    }
}

/// Calendar days from `first` to `last`, both included.
fn days_inclusive(first: DateTime<Utc>, last: DateTime<Utc>) -> i64 {
    (last.date_naive() - first.date_naive()).num_days() + 1
}

/// Orders messages from all chats into one timeline.
///
/// Sorted by timestamp; ties are broken by chat id, then by position in the
/// source chat. The result is the same for any input order.
pub fn merge_timeline(messages: &[NormalizedMessage]) -> Vec<&NormalizedMessage> {
    let mut timeline: Vec<&NormalizedMessage> = messages.iter().collect();
    timeline.sort_by_key(|m| (m.timestamp, m.chat_id, m.index));
    timeline
}

/// Computes every table from the chats and their messages.
///
/// `chats` provides names and kinds for the summaries; a chat listed there
/// gets a summary row even when it has no messages. Messages of chats that
/// are not listed get a summary with a placeholder name.
pub fn aggregate(
    chats: &[ChatInfo],
    messages: &[NormalizedMessage],
    config: &AggregateConfig,
    tokenizer: &Tokenizer,
) -> Aggregates {
    let granularity = config.granularity;
    let mut result = Aggregates::empty(granularity);

    let mut accumulators: BTreeMap<i64, ChatAccumulator<'_>> = BTreeMap::new();
    for chat in chats {
        accumulators
            .entry(chat.id)
            .or_insert_with(|| ChatAccumulator::new(chat));
    }

    let mut calls = CallAccumulator::default();

    for msg in messages {
        let bucket = granularity.bucket_start(msg.timestamp);

        result.time_series.increment(BucketKey {
            bucket,
            chat_id: msg.chat_id,
        });
        result.sender_counts.increment(SenderKey {
            chat_id: msg.chat_id,
            sender_id: msg.sender_id.clone(),
        });
        result.activity.increment(HeatmapKey {
            weekday: msg.timestamp.weekday().num_days_from_monday() as u8,
            hour: msg.timestamp.hour() as u8,
        });
        if let Some(ref media_type) = msg.media_type {
            result.media_types.increment(MediaKey {
                media_type: media_type.clone(),
            });
        }
        if msg.is_call() {
            calls.add(msg);
        }
        if msg.has_text() {
            result.tokens.add_text(tokenizer, &msg.text);
        }

        accumulators
            .entry(msg.chat_id)
            .or_insert_with(|| {
                ChatAccumulator::new(&ChatInfo {
                    id: msg.chat_id,
                    name: format!("Chat {}", msg.chat_id),
                    kind: msg.chat_kind,
                })
            })
            .add(msg);
    }

    for msg in merge_timeline(messages) {
        result.global_time_series.increment(DateKey {
            bucket: granularity.bucket_start(msg.timestamp),
        });
    }

    result.chats = accumulators.into_values().map(ChatAccumulator::finish).collect();
    result.calls = calls.finish();
    result.words = WordStats {
        total_tokens: result.tokens.total(),
        unique_tokens: result.tokens.unique(),
    };
    result.overview = overview(&result.chats, result.calls);

    debug!(
        chats = result.chats.len(),
        messages = messages.len(),
        buckets = result.global_time_series.len(),
        tokens = result.words.unique_tokens,
        "aggregation finished"
    );

    result
}

fn overview(chats: &[ChatSummary], calls: CallStats) -> Overview {
    let first = chats.iter().filter_map(|c| c.first).min();
    let last = chats.iter().filter_map(|c| c.last).max();
    let total_days = match (first, last) {
        (Some(first), Some(last)) => days_inclusive(first, last),
        _ => 0,
    };

    Overview {
        total_messages: chats.iter().map(|c| c.total).sum(),
        total_chats: chats.len(),
        first,
        last,
        total_days,
        total_text_length: chats.iter().map(|c| c.text_length).sum(),
        media_messages: chats.iter().map(|c| c.media_count).sum(),
        calls,
    }
}
