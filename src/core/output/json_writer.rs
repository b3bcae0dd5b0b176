//! JSON output writer.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::analysis::Analysis;
use crate::error::Result;

/// Writes the whole report to a JSON file.
///
/// # Format
/// ```json
/// {
///   "stats": {"chats": 1, "raw_messages": 2, ...},
///   "granularity": "day",
///   "overview": {...},
///   "chats": [...],
///   "time_series": [{"bucket": "2024-01-01", "chat_id": 1, "count": 2}],
///   ...
///   "tokens": {"hello": 1},
///   "skipped": []
/// }
/// ```
pub fn write_json(analysis: &Analysis, output_path: &str) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, analysis)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Converts the report to a pretty JSON string.
///
/// Same format as `write_json`, but returns a String instead of writing to file.
pub fn to_json(analysis: &Analysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::AnalysisConfig;
    use crate::loader::parse_export_str;
    use tempfile::NamedTempFile;

    fn sample() -> Analysis {
        let export = parse_export_str(
            r#"{"chats": {"list": [{"id": 1, "name": "Alice", "type": "personal_chat", "messages": [
                {"id": 1, "type": "message", "date_unixtime": "1704067260", "from": "Alice", "from_id": "user1", "text": "hello"}
            ]}]}}"#,
        )
        .unwrap();
        analyze(&export, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_to_json_shape() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["granularity"], "day");
        assert_eq!(value["stats"]["raw_messages"], 1);
        assert_eq!(value["time_series"][0]["bucket"], "2024-01-01");
        assert_eq!(value["time_series"][0]["count"], 1);
        assert_eq!(value["tokens"]["hello"], 1);
        assert!(value["skipped"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_json_round_trips() {
        let analysis = sample();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        write_json(&analysis, path).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let parsed: Analysis = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, analysis);
    }
}
