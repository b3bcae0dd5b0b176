//! Report writers.
//!
//! This module turns an [`Analysis`] into a file for the presentation layer:
//! - [`write_json`] / [`to_json`] - the whole report as one pretty JSON document - requires `json-output` feature
//! - [`write_jsonl`] / [`to_jsonl`] - one JSON row per table entry, tagged with `table` - requires `json-output` feature
//! - [`write_csv`] / [`to_csv`] - long format `Table;Key;Subkey;Count` - requires `csv-output` feature
//!
//! # Choosing a Format
//!
//! | Format | Use Case |
//! |--------|----------|
//! | JSON | Dashboards that load the whole report at once |
//! | JSONL | Loading single tables, `grep`/`jq` pipelines |
//! | CSV | Spreadsheets, pivot tables |
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn main() -> tglens::Result<()> {
//! use tglens::analysis::analyze_file;
//! use tglens::config::AnalysisConfig;
//! use tglens::core::output::{to_csv, write_json, write_jsonl};
//!
//! let analysis = analyze_file("result.json", &AnalysisConfig::default())?;
//!
//! write_json(&analysis, "report.json")?;
//! write_jsonl(&analysis, "report.jsonl")?;
//!
//! let csv_string = to_csv(&analysis)?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "csv-output", feature = "json-output")))]
//! # fn main() {}
//! ```

#[cfg(feature = "csv-output")]
mod csv_writer;
#[cfg(feature = "json-output")]
mod json_writer;
#[cfg(feature = "json-output")]
mod jsonl_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use json_writer::{to_json, write_json};
#[cfg(feature = "json-output")]
pub use jsonl_writer::{to_jsonl, write_jsonl};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::{Analysis, AnalysisStats};
use crate::core::models::{CallStats, ChatSummary, Overview, WordStats};
use crate::error::UnparsableMessage;

/// One entry of a report table, as written by the row-oriented formats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ReportRow<'a> {
    Stats(&'a AnalysisStats),
    Overview(&'a Overview),
    Chat(&'a ChatSummary),
    TimeSeries {
        bucket: NaiveDate,
        chat_id: i64,
        count: u64,
    },
    GlobalTimeSeries {
        bucket: NaiveDate,
        count: u64,
    },
    Sender {
        chat_id: i64,
        sender_id: &'a str,
        count: u64,
    },
    Activity {
        weekday: u8,
        hour: u8,
        count: u64,
    },
    MediaType {
        media_type: &'a str,
        count: u64,
    },
    Calls(&'a CallStats),
    Words(&'a WordStats),
    Token {
        token: &'a str,
        count: u64,
    },
    Skipped(&'a UnparsableMessage),
}

impl ReportRow<'_> {
    /// Name written to the `table` column.
    pub fn table(&self) -> &'static str {
        match self {
            ReportRow::Stats(_) => "stats",
            ReportRow::Overview(_) => "overview",
            ReportRow::Chat(_) => "chat",
            ReportRow::TimeSeries { .. } => "time_series",
            ReportRow::GlobalTimeSeries { .. } => "global_time_series",
            ReportRow::Sender { .. } => "sender",
            ReportRow::Activity { .. } => "activity",
            ReportRow::MediaType { .. } => "media_type",
            ReportRow::Calls(_) => "calls",
            ReportRow::Words(_) => "words",
            ReportRow::Token { .. } => "token",
            ReportRow::Skipped(_) => "skipped",
        }
    }
}

/// Flattens a report into rows, table by table, each table in key order.
pub fn report_rows(analysis: &Analysis) -> Vec<ReportRow<'_>> {
    let agg = &analysis.aggregates;
    let mut rows = Vec::with_capacity(
        4 + agg.chats.len()
            + agg.time_series.len()
            + agg.global_time_series.len()
            + agg.sender_counts.len()
            + agg.activity.len()
            + agg.media_types.len()
            + agg.tokens.unique()
            + analysis.skipped.len(),
    );

    rows.push(ReportRow::Stats(&analysis.stats));
    rows.push(ReportRow::Overview(&agg.overview));
    rows.extend(agg.chats.iter().map(ReportRow::Chat));
    rows.extend(agg.time_series.iter().map(|(key, count)| ReportRow::TimeSeries {
        bucket: key.bucket,
        chat_id: key.chat_id,
        count,
    }));
    rows.extend(
        agg.global_time_series
            .iter()
            .map(|(key, count)| ReportRow::GlobalTimeSeries {
                bucket: key.bucket,
                count,
            }),
    );
    rows.extend(agg.sender_counts.iter().map(|(key, count)| ReportRow::Sender {
        chat_id: key.chat_id,
        sender_id: &key.sender_id,
        count,
    }));
    rows.extend(agg.activity.iter().map(|(key, count)| ReportRow::Activity {
        weekday: key.weekday,
        hour: key.hour,
        count,
    }));
    rows.extend(agg.media_types.iter().map(|(key, count)| ReportRow::MediaType {
        media_type: &key.media_type,
        count,
    }));
    rows.push(ReportRow::Calls(&agg.calls));
    rows.push(ReportRow::Words(&agg.words));
    rows.extend(
        agg.tokens
            .iter()
            .map(|(token, count)| ReportRow::Token { token, count }),
    );
    rows.extend(analysis.skipped.iter().map(ReportRow::Skipped));
    rows
}
