//! Configuration types for the analysis pipeline.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies. Every struct has a `Default`,
//! a `new()` and builder-style `with_*` methods.
//!
//! - [`NormalizeConfig`] - partial-failure policy of the normalizer
//! - [`AggregateConfig`] - time-bucket [`Granularity`]
//! - [`TokenizerConfig`] - stop words, minimum token length, URL stripping
//! - [`AnalysisConfig`] - all of the above plus a [`FilterConfig`]
//!
//! # Example
//!
//! ```rust
//! use tglens::config::{AnalysisConfig, Granularity, TokenizerConfig};
//!
//! let config = AnalysisConfig::new()
//!     .with_granularity(Granularity::Week)
//!     .with_tokenizer(TokenizerConfig::new().with_min_token_len(3));
//!
//! assert_eq!(config.aggregate.granularity, Granularity::Week);
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::filter::FilterConfig;
use crate::error::{Result, TglensError};

/// Width of the time buckets used by the time-series tables.
///
/// Every bucket is identified by its first day:
/// - `Day`: the date itself
/// - `Week`: the Monday of the ISO week
/// - `Month`: the first day of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar day (default)
    #[default]
    Day,
    /// One bucket per ISO week, starting Monday
    Week,
    /// One bucket per calendar month
    Month,
}

impl Granularity {
    /// Returns the start date of the bucket containing `ts`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tglens::config::Granularity;
    /// use chrono::{NaiveDate, TimeZone, Utc};
    ///
    /// let ts = Utc.with_ymd_and_hms(2024, 1, 18, 23, 59, 0).unwrap(); // Thursday
    /// assert_eq!(Granularity::Day.bucket_start(ts), NaiveDate::from_ymd_opt(2024, 1, 18).unwrap());
    /// assert_eq!(Granularity::Week.bucket_start(ts), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    /// assert_eq!(Granularity::Month.bucket_start(ts), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    /// ```
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        match self {
            Granularity::Day => date,
            // the first week of the calendar starts before its Monday
            Granularity::Week => date
                .checked_sub_signed(Duration::days(i64::from(
                    date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(NaiveDate::MIN),
            Granularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Returns all supported granularity names.
    pub fn all_names() -> &'static [&'static str] {
        &["day", "week", "month"]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Granularity::Day),
            "week" | "weekly" | "w" => Ok(Granularity::Week),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            _ => Err(format!(
                "Unknown granularity: '{}'. Expected one of: {}",
                s,
                Granularity::all_names().join(", ")
            )),
        }
    }
}

/// Partial-failure policy of the message normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Skip unparsable messages instead of aborting (default: true)
    pub skip_invalid: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { skip_invalid: true }
    }
}

impl NormalizeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to skip unparsable messages.
    #[must_use]
    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }
}

/// Aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Bucket width of the time-series tables (default: day)
    pub granularity: Granularity,
}

impl AggregateConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bucket granularity.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// Tokenizer settings.
///
/// # Example
///
/// ```rust
/// use tglens::config::TokenizerConfig;
///
/// let config = TokenizerConfig::new()
///     .with_min_token_len(3)
///     .with_stop_words(["lol", "haha"]);
///
/// assert_eq!(config.min_token_len, 3);
/// assert_eq!(config.extra_stop_words.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Drop tokens shorter than this many characters (default: 2)
    pub min_token_len: usize,

    /// Include the built-in English and Russian stop-word list (default: true)
    pub default_stop_words: bool,

    /// Additional stop words, matched case-insensitively
    pub extra_stop_words: Vec<String>,

    /// Drop URLs before splitting into words (default: true)
    pub strip_urls: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            default_stop_words: true,
            extra_stop_words: Vec::new(),
            strip_urls: true,
        }
    }
}

impl TokenizerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum token length in characters.
    #[must_use]
    pub fn with_min_token_len(mut self, len: usize) -> Self {
        self.min_token_len = len;
        self
    }

    /// Enables or disables the built-in stop-word list.
    #[must_use]
    pub fn with_default_stop_words(mut self, enabled: bool) -> Self {
        self.default_stop_words = enabled;
        self
    }

    /// Adds stop words.
    #[must_use]
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_stop_words
            .extend(words.into_iter().map(Into::into).filter(|w| !w.trim().is_empty()));
        self
    }

    /// Adds stop words from a comma-separated list (`"lol, haha"`).
    #[must_use]
    pub fn with_stop_word_list(self, list: &str) -> Self {
        self.with_stop_words(list.split(',').map(str::trim))
    }

    /// Adds stop words from a file: one word per line, blank lines and
    /// lines starting with `#` are ignored.
    pub fn with_stop_words_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let words: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        Ok(self.with_stop_words(words))
    }

    /// Enables or disables URL stripping.
    #[must_use]
    pub fn with_strip_urls(mut self, strip: bool) -> Self {
        self.strip_urls = strip;
        self
    }

    /// Checks the settings for values the tokenizer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.min_token_len == 0 {
            return Err(TglensError::invalid_config(
                "min_token_len",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Settings for one whole analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    /// Normalizer policy
    pub normalize: NormalizeConfig,
    /// Message filters applied before aggregation
    pub filter: FilterConfig,
    /// Aggregator settings
    pub aggregate: AggregateConfig,
    /// Tokenizer settings
    pub tokenizer: TokenizerConfig,
}

impl AnalysisConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the normalizer policy.
    #[must_use]
    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    /// Sets whether unparsable messages are skipped.
    #[must_use]
    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.normalize.skip_invalid = skip;
        self
    }

    /// Sets the message filters.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the bucket granularity.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.aggregate.granularity = granularity;
        self
    }

    /// Sets the tokenizer settings.
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bucket_start_at_earliest_representable_date() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        for g in [Granularity::Day, Granularity::Week, Granularity::Month] {
            let start = g.bucket_start(earliest);
            assert!(start <= earliest.date_naive(), "{g}");
        }
        assert_eq!(Granularity::Week.bucket_start(earliest), NaiveDate::MIN);
    }

    #[test]
    fn test_granularity_day_bucket() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        assert_eq!(Granularity::Day.bucket_start(early), date(2024, 1, 1));
        assert_eq!(Granularity::Day.bucket_start(late), date(2024, 1, 1));
    }

    #[test]
    fn test_granularity_week_starts_monday() {
        // 2024-01-07 is a Sunday, 2024-01-08 a Monday
        let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(Granularity::Week.bucket_start(sunday), date(2024, 1, 1));
        assert_eq!(Granularity::Week.bucket_start(monday), date(2024, 1, 8));
    }

    #[test]
    fn test_granularity_week_crosses_year() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(); // Wednesday
        assert_eq!(Granularity::Week.bucket_start(ts), date(2024, 12, 30));
    }

    #[test]
    fn test_granularity_month_bucket() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap();
        assert_eq!(Granularity::Month.bucket_start(ts), date(2024, 2, 1));
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!(Granularity::from_str("day").unwrap(), Granularity::Day);
        assert_eq!(Granularity::from_str("WEEK").unwrap(), Granularity::Week);
        assert_eq!(Granularity::from_str("monthly").unwrap(), Granularity::Month);
        assert!(Granularity::from_str("year").is_err());
    }

    #[test]
    fn test_granularity_serde() {
        assert_eq!(serde_json::to_string(&Granularity::Week).unwrap(), "\"week\"");
        let parsed: Granularity = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(parsed, Granularity::Month);
    }

    #[test]
    fn test_normalize_config_default() {
        assert!(NormalizeConfig::default().skip_invalid);
        assert!(!NormalizeConfig::new().with_skip_invalid(false).skip_invalid);
    }

    #[test]
    fn test_tokenizer_config_default() {
        let config = TokenizerConfig::default();
        assert_eq!(config.min_token_len, 2);
        assert!(config.default_stop_words);
        assert!(config.strip_urls);
        assert!(config.extra_stop_words.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tokenizer_config_stop_word_list() {
        let config = TokenizerConfig::new().with_stop_word_list("lol, haha,, ");
        assert_eq!(config.extra_stop_words, vec!["lol", "haha"]);
    }

    #[test]
    fn test_tokenizer_config_stop_words_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# chat noise").unwrap();
        writeln!(file, "lol").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  kek  ").unwrap();

        let config = TokenizerConfig::new().with_stop_words_file(file.path()).unwrap();
        assert_eq!(config.extra_stop_words, vec!["lol", "kek"]);
    }

    #[test]
    fn test_tokenizer_config_missing_file() {
        let result = TokenizerConfig::new().with_stop_words_file("/nonexistent/stop.txt");
        assert!(matches!(result, Err(TglensError::Io(_))));
    }

    #[test]
    fn test_tokenizer_config_rejects_zero_length() {
        let config = TokenizerConfig::new().with_min_token_len(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analysis_config_builder() {
        let config = AnalysisConfig::new()
            .with_granularity(Granularity::Month)
            .with_skip_invalid(false);
        assert_eq!(config.aggregate.granularity, Granularity::Month);
        assert!(!config.normalize.skip_invalid);
        assert!(!config.filter.is_active());
    }
}
