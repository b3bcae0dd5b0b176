//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`OutputFormat`] - Report format options
//!
//! [`Args::analysis_config`] turns the parsed arguments into the library's
//! [`AnalysisConfig`], so everything the binary does is reachable from code:
//!
//! ```rust
//! use clap::Parser;
//! use tglens::cli::Args;
//! use tglens::config::Granularity;
//!
//! let args = Args::parse_from(["tglens", "result.json", "-g", "week", "--period", "30d"]);
//! let config = args.analysis_config().unwrap();
//! assert_eq!(config.aggregate.granularity, Granularity::Week);
//! ```

use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, Granularity, TokenizerConfig};
use crate::core::filter::{ChatScope, FilterConfig, Period};
use crate::error::Result;

/// Descriptive analytics for Telegram Desktop JSON exports:
/// activity timelines, participants, word frequencies.
#[derive(Parser, Debug, Clone)]
#[command(name = "tglens")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    tglens result.json
    tglens result.json -o report.csv -f csv
    tglens result.json -g week --period 90d --scope personal
    tglens result.json --after 2024-01-01 --before 2024-06-30 --from Alice
    tglens huge_export.json --streaming -v")]
pub struct Args {
    /// Path to the export file (result.json)
    pub input: String,

    /// Path to the report file
    #[arg(short, long, default_value = "tglens_report.json")]
    pub output: String,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Time bucket width: day, week or month
    #[arg(
        short,
        long,
        value_name = "GRANULARITY",
        env = "TGLENS_GRANULARITY",
        default_value = "day"
    )]
    pub granularity: Granularity,

    /// Keep only the most recent period: 7d, 30d, 90d, 1y or all
    #[arg(long, default_value = "all")]
    pub period: Period,

    /// Keep messages on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Keep messages on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Chat kinds to analyze: all, personal or group
    #[arg(long, default_value = "all")]
    pub scope: ChatScope,

    /// Analyze only these chats (repeatable)
    #[arg(long = "chat", value_name = "ID")]
    pub chats: Vec<i64>,

    /// Keep only messages from this sender (name or id)
    #[arg(long, value_name = "SENDER")]
    pub from: Option<String>,

    /// File with extra stop words, one per line
    #[arg(long, value_name = "PATH")]
    pub stop_words_file: Option<String>,

    /// Extra stop words, comma separated
    #[arg(long, value_name = "WORDS", env = "TGLENS_STOP_WORDS")]
    pub stop_words: Option<String>,

    /// Minimum token length in characters
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub min_token_len: usize,

    /// Number of top tokens and senders to print
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub top: usize,

    /// Fail on the first message that cannot be parsed
    #[arg(long)]
    pub strict: bool,

    /// Read the export chat by chat (full account exports only)
    #[arg(long)]
    pub streaming: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Builds the library configuration from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed dates, an unreadable stop-word file
    /// or a zero minimum token length.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut filter = FilterConfig::new()
            .with_period(self.period)
            .with_scope(self.scope);
        if let Some(ref after) = self.after {
            filter = filter.with_date_from(after)?;
        }
        if let Some(ref before) = self.before {
            filter = filter.with_date_to(before)?;
        }
        for &chat in &self.chats {
            filter = filter.with_chat(chat);
        }
        if let Some(ref from) = self.from {
            filter = filter.with_sender(from.clone());
        }

        let mut tokenizer = TokenizerConfig::new().with_min_token_len(self.min_token_len);
        if let Some(ref list) = self.stop_words {
            tokenizer = tokenizer.with_stop_word_list(list);
        }
        if let Some(ref path) = self.stop_words_file {
            tokenizer = tokenizer.with_stop_words_file(path)?;
        }
        tokenizer.validate()?;

        Ok(AnalysisConfig::new()
            .with_skip_invalid(!self.strict)
            .with_filter(filter)
            .with_granularity(self.granularity)
            .with_tokenizer(tokenizer))
    }

    /// Default log filter for the `-v` count; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Report format options.
///
/// # Example
///
/// ```rust
/// use tglens::cli::OutputFormat;
///
/// let format = OutputFormat::Jsonl;
/// println!("Extension: {}", format.extension()); // "jsonl"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Whole report as one JSON document (default)
    #[default]
    Json,

    /// One JSON object per table entry
    #[value(alias = "ndjson")]
    Jsonl,

    /// Long-format CSV with semicolon delimiter
    Csv,
}

impl OutputFormat {
    /// Returns the file extension for this format (without dot).
    pub fn extension(&self) -> &'static str {
        crate::format::OutputFormat::from(*self).extension()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::format::OutputFormat::from(*self))
    }
}

// Conversion to library format type
impl From<OutputFormat> for crate::format::OutputFormat {
    fn from(format: OutputFormat) -> crate::format::OutputFormat {
        match format {
            OutputFormat::Csv => crate::format::OutputFormat::Csv,
            OutputFormat::Json => crate::format::OutputFormat::Json,
            OutputFormat::Jsonl => crate::format::OutputFormat::Jsonl,
        }
    }
}
