//! Integration tests for the streaming loader.

#![cfg(feature = "streaming")]

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::{NamedTempFile, TempDir, tempdir};

use tglens::analysis::{analyze_file, analyze_streaming};
use tglens::config::AnalysisConfig;
use tglens::streaming::{ChatStream, ExportStreamingParser, StreamingConfig};

fn write_export(content: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("result.json");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// A full export with `chats` chats of `per_chat` messages each.
fn generated_export(chats: usize, per_chat: usize) -> String {
    let mut list = Vec::new();
    for c in 0..chats {
        let messages: Vec<String> = (0..per_chat)
            .map(|i| {
                format!(
                    r#"{{"id": {i}, "type": "message", "date_unixtime": "{}", "from": "User {}", "from_id": "user{}", "text": "message {{{i}}} in [chat] {c}"}}"#,
                    1_704_067_200 + (c * per_chat + i) * 3600,
                    i % 3,
                    i % 3
                )
            })
            .collect();
        list.push(format!(
            r#"{{"name": "Chat {c}", "type": "personal_chat", "id": {c}, "messages": [{}]}}"#,
            messages.join(",\n")
        ));
    }
    format!(
        r#"{{"about": "x", "contacts": {{"list": [{{"id": 0}}]}}, "chats": {{"about": "y", "list": [
{}
]}}}}"#,
        list.join(",\n")
    )
}

#[test]
fn test_stream_counts_every_chat() {
    let (_dir, path) = write_export(&generated_export(25, 10));
    let parser = ExportStreamingParser::new();

    let mut total = 0;
    let mut chats = 0;
    for chat in parser.stream(&path).unwrap() {
        let chat = chat.unwrap();
        total += chat.messages.len();
        chats += 1;
    }
    assert_eq!(chats, 25);
    assert_eq!(total, 250);
}

#[test]
fn test_stream_progress_reaches_the_end() {
    let content = generated_export(5, 5);
    let (_dir, path) = write_export(&content);

    let mut stream = ExportStreamingParser::new().stream(&path).unwrap();
    assert_eq!(stream.total_bytes(), Some(content.len() as u64));

    let mut last = 0.0;
    while let Some(chat) = stream.next() {
        chat.unwrap();
        let progress = stream.progress().unwrap();
        assert!(progress >= last);
        last = progress;
    }
    assert_eq!(stream.chats_read(), 5);
    assert!(last > 90.0);
}

#[test]
fn test_small_buffer_gives_same_chats() {
    let (_dir, path) = write_export(&generated_export(3, 4));

    let big: Vec<_> = ExportStreamingParser::new()
        .stream(&path)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    let small: Vec<_> = ExportStreamingParser::with_config(StreamingConfig::new().with_buffer_size(7))
        .stream(&path)
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(big, small);
}

#[test]
fn test_stream_single_chat_export_is_malformed() {
    let (_dir, path) = write_export(r#"{"name": "Alice", "type": "personal_chat", "id": 1, "messages": []}"#);
    let err = ExportStreamingParser::new().stream(&path).err().unwrap();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("result.json"));
}

#[test]
fn test_stream_missing_file() {
    let err = ExportStreamingParser::new()
        .stream("/no/such/export.json")
        .err()
        .unwrap();
    assert!(err.is_io());
}

#[test]
fn test_analyze_streaming_matches_in_memory() {
    let (_dir, path) = write_export(&generated_export(8, 12));
    let config = AnalysisConfig::default();

    let in_memory = analyze_file(&path, &config).unwrap();
    let streamed = analyze_streaming(&path, &config, StreamingConfig::default()).unwrap();

    assert_eq!(in_memory, streamed);
    assert_eq!(
        serde_json::to_string(&in_memory).unwrap(),
        serde_json::to_string(&streamed).unwrap()
    );
}

#[test]
fn test_analyze_streaming_empty_list() {
    let (_dir, path) = write_export(r#"{"chats": {"list": []}}"#);
    let err = analyze_streaming(&path, &AnalysisConfig::default(), StreamingConfig::default())
        .unwrap_err();
    assert!(err.is_empty_export());
}

#[test]
fn test_analyze_streaming_invalid_chat() {
    let (_dir, path) = write_export(
        r#"{"chats": {"list": [
            {"name": "no id", "messages": []},
            {"id": 2, "name": "Ok", "type": "personal_chat", "messages": [
                {"id": 1, "type": "message", "date_unixtime": "1704067200", "from": "A", "from_id": "user1", "text": "hi there"}
            ]}
        ]}}"#,
    );

    // strict: the invalid chat makes the export malformed
    let err = analyze_streaming(&path, &AnalysisConfig::default(), StreamingConfig::default())
        .unwrap_err();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("chat #0"));

    // lenient: the chat is skipped
    let analysis = analyze_streaming(
        &path,
        &AnalysisConfig::default(),
        StreamingConfig::new().with_skip_invalid(true),
    )
    .unwrap();
    assert_eq!(analysis.stats.chats, 1);
    assert_eq!(analysis.aggregates.overview.total_messages, 1);
}

#[test]
fn test_analyze_streaming_oversized_chat() {
    let (_dir, path) = write_export(&generated_export(3, 50));
    let config = StreamingConfig::new().with_max_chat_size(512);

    let err = analyze_streaming(&path, &AnalysisConfig::default(), config).unwrap_err();
    assert!(matches!(err, tglens::TglensError::BufferOverflow { max_size: 512, .. }));
}

#[test]
fn test_analyze_streaming_truncated_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"chats": {"list": [{"id": 1, "messages": [{"text": "cut"#)
        .unwrap();

    let err = analyze_streaming(file.path(), &AnalysisConfig::default(), StreamingConfig::default())
        .unwrap_err();
    assert!(err.is_malformed());
    assert!(err.to_string().contains("unexpected end of file"));
}

// ============================================================================
// Agreement with the in-memory loader on broken documents
// ============================================================================

const VALID_CHAT: &str = r#"{"id": 1, "name": "Alice", "type": "personal_chat", "messages": [
    {"id": 1, "type": "message", "date_unixtime": "1704067200", "from": "Alice", "from_id": "user1", "text": "hello"}
]}"#;

fn assert_both_malformed(content: &str) {
    let (_dir, path) = write_export(content);
    let config = AnalysisConfig::default();

    let in_memory = analyze_file(&path, &config).unwrap_err();
    assert!(in_memory.is_malformed(), "in-memory: {in_memory}");

    let streamed = analyze_streaming(&path, &config, StreamingConfig::default()).unwrap_err();
    assert!(streamed.is_malformed(), "streaming: {streamed}");
    assert!(streamed.to_string().contains("result.json"), "{streamed}");
}

#[test]
fn test_truncated_file_is_malformed_in_both_loaders() {
    assert_both_malformed(&format!(r#"{{"chats": {{"list": [{VALID_CHAT}, {{"id": 2, "messages": [{{"text": "cu"#));
}

#[test]
fn test_file_cut_after_chat_list_is_malformed_in_both_loaders() {
    assert_both_malformed(&format!(r#"{{"chats": {{"list": [{VALID_CHAT}]}}, "left_chats": {{"list": ["#));
}

#[test]
fn test_trailing_garbage_is_malformed_in_both_loaders() {
    assert_both_malformed(&format!(r#"{{"chats": {{"list": [{VALID_CHAT}]}}, garbage!!!"#));
    assert_both_malformed(&format!(r#"{{"chats": {{"list": [{VALID_CHAT}]}}}} and more"#));
}

#[test]
fn test_sections_after_chat_list_stream_cleanly() {
    let content = format!(
        r#"{{"chats": {{"list": [{VALID_CHAT}], "about": "x"}}, "left_chats": {{"list": [{{"id": 9, "messages": []}}]}}}}"#
    );
    let (_dir, path) = write_export(&content);
    let config = AnalysisConfig::default();

    let in_memory = analyze_file(&path, &config).unwrap();
    let streamed = analyze_streaming(&path, &config, StreamingConfig::default()).unwrap();
    assert_eq!(in_memory, streamed);
    assert_eq!(streamed.stats.chats, 1);
}
