//! Core analysis logic for tglens.
//!
//! This module contains:
//! - [`models`] - Table keys, count tables and summaries
//! - [`filter`] - Chat and message filtering by date, period, scope and sender
//! - [`tokenizer`] - Text tokenization and token frequencies
//! - [`aggregate`] - The single-pass aggregator
//! - [`output`] - Report writers (CSV, JSON, JSONL)
//!
//! # Quick Start
//!
//! ```rust
//! use tglens::config::AggregateConfig;
//! use tglens::core::{Tokenizer, aggregate, apply_filters, FilterConfig};
//! use tglens::message::NormalizedMessage;
//!
//! # fn main() -> tglens::Result<()> {
//! let tokenizer = Tokenizer::with_defaults()?;
//! let messages: Vec<NormalizedMessage> = Vec::new();
//! let messages = apply_filters(messages, &FilterConfig::new());
//! let aggregates = aggregate(&[], &messages, &AggregateConfig::default(), &tokenizer);
//! assert_eq!(aggregates.overview.total_messages, 0);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod filter;
pub mod models;
pub mod output;
pub mod tokenizer;

// Re-export main types for convenience
pub use aggregate::{Aggregates, aggregate, merge_timeline};
pub use filter::{ChatScope, FilterConfig, Period, apply_filters, filter_chats};
pub use models::{ChatSummary, CountTable};
pub use tokenizer::{TokenFrequency, Tokenizer};

// Conditionally re-export output writers
#[cfg(feature = "csv-output")]
pub use output::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use output::{to_json, to_jsonl, write_json, write_jsonl};
