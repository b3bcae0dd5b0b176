//! # tglens
//!
//! Descriptive analytics for Telegram Desktop JSON exports.
//!
//! ## Overview
//!
//! tglens takes the `result.json` produced by Telegram Desktop's
//! "Export chat history" (a single chat or a full account export) and turns
//! it into deterministic tables:
//! - message counts per time bucket, per chat and across chats
//! - message counts per sender in every chat
//! - a weekday × hour activity heatmap
//! - per-chat summaries (kinds, senders, text length, media, calls)
//! - token frequencies with stop-word filtering
//!
//! The pipeline is load → normalize → filter → aggregate. Every stage is a
//! plain function, so each can be used on its own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tglens::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = AnalysisConfig::new().with_granularity(Granularity::Week);
//!     let analysis = analyze_file("result.json", &config)?;
//!
//!     for (token, count) in analysis.aggregates.tokens.top(10) {
//!         println!("{token}: {count}");
//!     }
//!
//!     write_json(&analysis, "report.json")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming for Large Files
//!
//! Full account exports can be several gigabytes. The streaming loader reads
//! one chat at a time:
//!
//! ```rust,no_run
//! use tglens::analysis::analyze_streaming;
//! use tglens::config::AnalysisConfig;
//! use tglens::streaming::StreamingConfig;
//!
//! let analysis = analyze_streaming(
//!     "huge_export.json",
//!     &AnalysisConfig::default(),
//!     StreamingConfig::new(),
//! )?;
//! println!("{} messages", analysis.aggregates.overview.total_messages);
//! # Ok::<(), tglens::TglensError>(())
//! ```
//!
//! ## Module Structure
//!
//! - [`loader`] - reads an export into a [`RawExport`](export::RawExport)
//! - [`export`] - raw export model ([`ChatRecord`](export::ChatRecord), [`ChatKind`](export::ChatKind))
//! - [`normalize`] - raw entries → [`NormalizedMessage`](message::NormalizedMessage)
//! - [`message`] - the normalized record and [`MessageKind`](message::MessageKind)
//! - [`config`] - pipeline configuration
//! - [`core`] - filtering, tokenization, aggregation and report writers
//!   - [`core::filter`] - [`FilterConfig`](core::filter::FilterConfig), [`apply_filters`](core::filter::apply_filters)
//!   - [`core::tokenizer`] - [`Tokenizer`](core::tokenizer::Tokenizer), [`TokenFrequency`](core::tokenizer::TokenFrequency)
//!   - [`core::aggregate`] - [`aggregate`](core::aggregate::aggregate), [`Aggregates`](core::aggregate::Aggregates)
//!   - [`core::output`] - JSON, JSONL and CSV writers
//! - [`analysis`] - the whole pipeline in one call
//! - [`streaming`] - chat-by-chat loader for large exports
//! - [`format`] - [`OutputFormat`](format::OutputFormat)
//! - [`cli`] - CLI arguments (requires `cli` feature)
//! - [`error`] - [`TglensError`], [`Result`]
//! - [`prelude`] - Convenient re-exports

pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod format;
pub mod loader;
pub mod message;
pub mod normalize;
#[cfg(feature = "streaming")]
pub mod streaming;

// Re-export the main types at the crate root for convenience
pub use error::{Result, TglensError, UnparsableMessage};
pub use message::{MessageKind, NormalizedMessage};

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use tglens::prelude::*;
/// ```
pub mod prelude {
    // Records
    pub use crate::export::{ChatInfo, ChatKind, ChatRecord, RawExport};
    pub use crate::message::{MessageKind, NormalizedMessage};

    // Error types
    pub use crate::error::{Result, TglensError, UnparsableMessage};

    // Configuration
    pub use crate::config::{
        AggregateConfig, AnalysisConfig, Granularity, NormalizeConfig, TokenizerConfig,
    };

    // Pipeline stages
    pub use crate::analysis::{Analysis, AnalysisStats, analyze, analyze_file};
    pub use crate::core::aggregate::{Aggregates, aggregate, merge_timeline};
    pub use crate::core::filter::{ChatScope, FilterConfig, Period, apply_filters, filter_chats};
    pub use crate::core::tokenizer::{TokenFrequency, Tokenizer};
    pub use crate::loader::{load_export, parse_export_str};
    pub use crate::normalize::{normalize_chat, normalize_export};

    // Output (file writers and string converters)
    #[cfg(feature = "csv-output")]
    pub use crate::core::output::{to_csv, write_csv};
    #[cfg(feature = "json-output")]
    pub use crate::core::output::{to_json, to_jsonl, write_json, write_jsonl};

    pub use crate::format::OutputFormat;
}
