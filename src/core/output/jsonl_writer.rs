//! JSON Lines (JSONL) output writer.
//!
//! Every table entry becomes one line, tagged with the table it belongs to,
//! so a single table can be pulled out with a line filter.

use std::fs::File;
use std::io::{BufWriter, Write};

use super::report_rows;
use crate::analysis::Analysis;
use crate::error::Result;

/// Writes the report in JSONL (JSON Lines) format.
///
/// Each line is a valid JSON object:
/// ```jsonl
/// {"table":"time_series","bucket":"2024-01-01","chat_id":1,"count":2}
/// {"table":"sender","chat_id":1,"sender_id":"user1","count":2}
/// {"table":"token","token":"hello","count":1}
/// ```
pub fn write_jsonl(analysis: &Analysis, output_path: &str) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);

    for row in report_rows(analysis) {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

/// Converts the report to a JSONL string.
pub fn to_jsonl(analysis: &Analysis) -> Result<String> {
    let mut output = String::new();
    for row in report_rows(analysis) {
        output.push_str(&serde_json::to_string(&row)?);
        output.push('\n');
    }
    Ok(output)
}
