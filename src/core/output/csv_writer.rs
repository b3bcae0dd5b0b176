//! CSV output writer.

use std::fs::File;
use std::io::Write;

use super::{ReportRow, report_rows};
use crate::analysis::Analysis;
use crate::error::Result;

const HEADER: [&str; 4] = ["Table", "Key", "Subkey", "Count"];

/// Writes the report to CSV in long format with semicolon delimiter.
///
/// # Format
/// - Delimiter: `;`
/// - Columns: `Table`, `Key`, `Subkey`, `Count`
/// - Summary rows put the metric name in `Key`, per-chat metrics put the
///   chat id in `Key` and the metric in `Subkey`
/// - Encoding: UTF-8
pub fn write_csv(analysis: &Analysis, output_path: &str) -> Result<()> {
    let file = File::create(output_path)?;
    write_records(analysis, file)
}

/// Converts the report to a CSV string.
///
/// Same format as `write_csv`, but returns a String instead of writing to file.
pub fn to_csv(analysis: &Analysis) -> Result<String> {
    let mut buffer = Vec::new();
    write_records(analysis, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_records<W: Write>(analysis: &Analysis, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);

    writer.write_record(HEADER)?;
    for row in report_rows(analysis) {
        for record in long_records(&row) {
            writer.write_record(&record)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Expands one report row into `Table;Key;Subkey;Count` records.
///
/// Only integer measures are written; averages are left to the JSON formats.
fn long_records(row: &ReportRow<'_>) -> Vec<[String; 4]> {
    let table = row.table();
    let record = |key: String, subkey: String, count: u64| {
        [table.to_string(), key, subkey, count.to_string()]
    };
    let metric = |name: &str, count: u64| record(name.to_string(), String::new(), count);

    match row {
        ReportRow::Stats(stats) => vec![
            metric("chats", stats.chats as u64),
            metric("raw_messages", stats.raw_messages as u64),
            metric("normalized_messages", stats.normalized_messages as u64),
            metric("analyzed_messages", stats.analyzed_messages as u64),
            metric("skipped_messages", stats.skipped_messages as u64),
        ],
        ReportRow::Overview(overview) => vec![
            metric("total_messages", overview.total_messages),
            metric("total_chats", overview.total_chats as u64),
            metric("total_days", overview.total_days.max(0) as u64),
            metric("total_text_length", overview.total_text_length),
            metric("media_messages", overview.media_messages),
        ],
        ReportRow::Chat(chat) => {
            let id = chat.chat_id.to_string();
            let per_chat = |name: &str, count: u64| record(id.clone(), name.to_string(), count);
            vec![
                per_chat("total", chat.total),
                per_chat("text", chat.kinds.text),
                per_chat("media", chat.kinds.media),
                per_chat("service", chat.kinds.service),
                per_chat("forwarded", chat.kinds.forwarded),
                per_chat("unique_senders", chat.unique_senders as u64),
                per_chat("text_length", chat.text_length),
                per_chat("calls", chat.calls),
                per_chat("days_active", chat.days_active.max(0) as u64),
            ]
        }
        ReportRow::TimeSeries {
            bucket,
            chat_id,
            count,
        } => vec![record(bucket.to_string(), chat_id.to_string(), *count)],
        ReportRow::GlobalTimeSeries { bucket, count } => {
            vec![record(bucket.to_string(), String::new(), *count)]
        }
        ReportRow::Sender {
            chat_id,
            sender_id,
            count,
        } => vec![record(chat_id.to_string(), sender_id.to_string(), *count)],
        ReportRow::Activity {
            weekday,
            hour,
            count,
        } => vec![record(weekday.to_string(), hour.to_string(), *count)],
        ReportRow::MediaType { media_type, count } => {
            vec![record(media_type.to_string(), String::new(), *count)]
        }
        ReportRow::Calls(calls) => vec![
            metric("count", calls.count),
            metric("total_duration_seconds", calls.total_duration_seconds),
        ],
        ReportRow::Words(words) => vec![
            metric("total_tokens", words.total_tokens),
            metric("unique_tokens", words.unique_tokens as u64),
        ],
        ReportRow::Token { token, count } => {
            vec![record(token.to_string(), String::new(), *count)]
        }
        ReportRow::Skipped(skipped) => vec![record(
            skipped.chat_id.to_string(),
            skipped.index.to_string(),
            1,
        )],
    }
}
