//! The whole pipeline: load, normalize, filter, aggregate.
//!
//! [`analyze`] runs on an already loaded [`RawExport`]; [`analyze_file`]
//! and [`analyze_streaming`] start from a path.
//!
//! # Example
//!
//! ```rust
//! use tglens::analysis::analyze;
//! use tglens::config::{AnalysisConfig, Granularity};
//! use tglens::loader::parse_export_str;
//!
//! # fn main() -> tglens::Result<()> {
//! let export = parse_export_str(r#"{"chats": {"list": [
//!     {"id": 1, "name": "Alice", "type": "personal_chat", "messages": [
//!         {"id": 1, "type": "message", "date_unixtime": "1704067260", "from": "Alice", "from_id": "user1", "text": "Happy new year"},
//!         {"id": 2, "type": "message", "date_unixtime": "1704153540", "from": "Bob", "from_id": "user2", "text": "Same to you"}
//!     ]}
//! ]}}"#)?;
//!
//! let analysis = analyze(&export, &AnalysisConfig::new().with_granularity(Granularity::Month))?;
//! assert_eq!(analysis.aggregates.overview.total_messages, 2);
//! assert_eq!(analysis.aggregates.global_time_series.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::core::aggregate::{Aggregates, aggregate};
use crate::core::filter::{apply_filters, filter_chats};
use crate::core::tokenizer::Tokenizer;
use crate::error::{Result, TglensError, UnparsableMessage};
use crate::export::{ChatInfo, RawExport};
use crate::loader::load_export;
use crate::normalize::{Normalized, normalize_export};

/// Counters describing how many messages made it through each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Chats in the export.
    pub chats: usize,
    /// Raw message entries in the export.
    pub raw_messages: usize,
    /// Entries that normalized successfully.
    pub normalized_messages: usize,
    /// Messages left after filtering.
    pub analyzed_messages: usize,
    /// Entries that could not be normalized.
    pub skipped_messages: usize,
}

impl AnalysisStats {
    /// Share of normalized messages removed by the filters, in percent.
    pub fn filtered_ratio(&self) -> f64 {
        if self.normalized_messages == 0 {
            return 0.0;
        }
        (1.0 - (self.analyzed_messages as f64 / self.normalized_messages as f64)) * 100.0
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Stage counters.
    pub stats: AnalysisStats,
    /// All tables.
    #[serde(flatten)]
    pub aggregates: Aggregates,
    /// Entries that were skipped during normalization.
    pub skipped: Vec<UnparsableMessage>,
}

impl Analysis {
    /// Human-readable summary of skipped entries, if any.
    pub fn skipped_summary(&self) -> Option<String> {
        match self.skipped.len() {
            0 => None,
            1 => Some("1 message skipped".to_string()),
            n => Some(format!("{n} messages skipped")),
        }
    }
}

/// Analyzes a loaded export.
///
/// # Errors
///
/// - [`TglensError::EmptyExport`] if the export has no chats
/// - [`TglensError::UnparsableMessage`] in strict mode
/// - [`TglensError::InvalidConfig`] for an unusable tokenizer configuration
pub fn analyze(export: &RawExport, config: &AnalysisConfig) -> Result<Analysis> {
    if export.is_empty() {
        return Err(TglensError::EmptyExport);
    }
    let tokenizer = Tokenizer::new(&config.tokenizer)?;

    let normalized = normalize_export(export, &config.normalize)?;
    debug!(
        normalized = normalized.messages.len(),
        skipped = normalized.skipped.len(),
        "normalization finished"
    );

    finish(
        export.chat_infos(),
        export.message_count(),
        normalized,
        config,
        &tokenizer,
    )
}

/// Loads and analyzes an export file.
pub fn analyze_file(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Analysis> {
    let export = load_export(path)?;
    analyze(&export, config)
}

/// Analyzes a full account export without loading the whole document.
///
/// Chats are read and normalized one at a time; only the normalized
/// messages are kept.
#[cfg(feature = "streaming")]
pub fn analyze_streaming(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
    streaming: crate::streaming::StreamingConfig,
) -> Result<Analysis> {
    use crate::normalize::normalize_chat_with;
    use crate::streaming::ExportStreamingParser;

    let path = path.as_ref();
    let tokenizer = Tokenizer::new(&config.tokenizer)?;
    let mut stream = ExportStreamingParser::with_config(streaming).stream(path)?;

    let mut chats: Vec<ChatInfo> = Vec::new();
    let mut raw_messages = 0usize;
    let mut normalized = Normalized::default();

    while let Some(chat) = stream.next() {
        let chat = chat.map_err(|e| TglensError::from(e).with_path(path))?;
        raw_messages += chat.messages.len();
        normalized.extend(normalize_chat_with(&chat, &config.normalize)?);
        chats.push(chat.info());

        if streaming.progress_interval > 0 && chats.len() % streaming.progress_interval == 0 {
            info!(
                chats = chats.len(),
                progress = stream.progress().unwrap_or(0.0),
                "streaming progress"
            );
        }
    }

    if chats.is_empty() {
        return Err(TglensError::EmptyExport);
    }

    finish(chats, raw_messages, normalized, config, &tokenizer)
}

fn finish(
    chats: Vec<ChatInfo>,
    raw_messages: usize,
    normalized: Normalized,
    config: &AnalysisConfig,
    tokenizer: &Tokenizer,
) -> Result<Analysis> {
    let chat_count = chats.len();
    let normalized_messages = normalized.messages.len();

    let chats = filter_chats(chats, &config.filter);
    let messages = apply_filters(normalized.messages, &config.filter);
    debug!(
        chats = chats.len(),
        messages = messages.len(),
        "filters applied"
    );

    let aggregates = aggregate(&chats, &messages, &config.aggregate, tokenizer);

    let analysis = Analysis {
        stats: AnalysisStats {
            chats: chat_count,
            raw_messages,
            normalized_messages,
            analyzed_messages: messages.len(),
            skipped_messages: normalized.skipped.len(),
        },
        aggregates,
        skipped: normalized.skipped,
    };

    if let Some(summary) = analysis.skipped_summary() {
        info!("{summary}");
    }
    Ok(analysis)
}
