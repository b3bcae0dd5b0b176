//! Report format types for the tglens library.
//!
//! These types don't depend on CLI frameworks, so library users can pick a
//! format without enabling the `cli` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn example() -> tglens::Result<()> {
//! use tglens::analysis::analyze_file;
//! use tglens::config::AnalysisConfig;
//! use tglens::format::{OutputFormat, write_to_format};
//!
//! let analysis = analyze_file("result.json", &AnalysisConfig::default())?;
//!
//! // Write using format enum
//! write_to_format(&analysis, "report.csv", OutputFormat::Csv)?;
//!
//! // Or use format detection from extension
//! let format = OutputFormat::from_path("report.jsonl")?;
//! assert_eq!(format, OutputFormat::Jsonl);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::error::TglensError;

/// Report format.
///
/// - [`Json`](OutputFormat::Json) - the whole report as one document
/// - [`Jsonl`](OutputFormat::Jsonl) - one tagged row per table entry
/// - [`Csv`](OutputFormat::Csv) - long format, one row per measure
///
/// # Example
///
/// ```rust
/// use tglens::format::OutputFormat;
/// use std::str::FromStr;
///
/// let format = OutputFormat::from_str("jsonl").unwrap();
/// assert_eq!(format, OutputFormat::Jsonl);
/// assert_eq!(format.extension(), "jsonl");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    /// Pretty JSON document (default)
    #[default]
    Json,

    /// JSON Lines - one JSON object per table entry
    Jsonl,

    /// CSV with semicolon delimiter, `Table;Key;Subkey;Count`
    Csv,
}

impl OutputFormat {
    /// Returns the file extension for this format (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    /// Returns all supported format names.
    pub fn all_names() -> &'static [&'static str] {
        &["json", "jsonl", "ndjson", "csv"]
    }

    /// Returns all available formats.
    pub fn all() -> &'static [OutputFormat] {
        &[OutputFormat::Json, OutputFormat::Jsonl, OutputFormat::Csv]
    }

    /// Returns the feature that enables the writer for this format.
    pub fn required_feature(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv-output",
            OutputFormat::Json | OutputFormat::Jsonl => "json-output",
        }
    }

    /// Detects format from a file path based on extension.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tglens::format::OutputFormat;
    ///
    /// let format = OutputFormat::from_path("report.jsonl").unwrap();
    /// assert_eq!(format, OutputFormat::Jsonl);
    /// ```
    pub fn from_path(path: &str) -> Result<Self, TglensError> {
        let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();

        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(TglensError::invalid_config(
                "output format",
                format!("Unknown file extension: '.{ext}'. Expected one of: json, jsonl, csv"),
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                OutputFormat::all_names().join(", ")
            )),
        }
    }
}

/// Writes a report to a file in the specified format.
///
/// # Errors
///
/// Returns an error if:
/// - The required feature for the format is not enabled
/// - The file cannot be written
#[allow(unused_variables)]
pub fn write_to_format(
    analysis: &Analysis,
    path: &str,
    format: OutputFormat,
) -> Result<(), TglensError> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::write_csv(analysis, path),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::core::output::write_json(analysis, path),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::core::output::write_jsonl(analysis, path),
        #[allow(unreachable_patterns)]
        _ => Err(feature_disabled(format)),
    }
}

/// Converts a report to a string in the specified format.
#[allow(unused_variables)]
pub fn to_format_string(analysis: &Analysis, format: OutputFormat) -> Result<String, TglensError> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::to_csv(analysis),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::core::output::to_json(analysis),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::core::output::to_jsonl(analysis),
        #[allow(unreachable_patterns)]
        _ => Err(feature_disabled(format)),
    }
}

#[allow(dead_code)]
fn feature_disabled(format: OutputFormat) -> TglensError {
    TglensError::invalid_config(
        "output format",
        format!(
            "{format} reports require the '{}' feature to be enabled",
            format.required_feature()
        ),
    )
}

/// Formats a count compactly: `950`, `1.2K`, `3.4M`.
///
/// # Example
///
/// ```rust
/// use tglens::format::format_count;
///
/// assert_eq!(format_count(950), "950");
/// assert_eq!(format_count(1_234), "1.2K");
/// assert_eq!(format_count(3_400_000), "3.4M");
/// ```
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("ndjson").unwrap(),
            OutputFormat::Jsonl
        );
        assert_eq!(OutputFormat::from_str("CSV").unwrap(), OutputFormat::Csv);
        assert!(OutputFormat::from_str("xlsx").is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::Csv.to_string(), "CSV");
        assert_eq!(OutputFormat::Jsonl.to_string(), "JSONL");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            OutputFormat::from_path("report.csv").unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(
            OutputFormat::from_path("/tmp/out/report.JSON").unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::from_path("report.ndjson").unwrap(),
            OutputFormat::Jsonl
        );
        let err = OutputFormat::from_path("report.txt").unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn test_format_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        assert_eq!(OutputFormat::all().len(), 3);
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Jsonl).unwrap();
        assert_eq!(json, "\"jsonl\"");

        let parsed: OutputFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(parsed, OutputFormat::Csv);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.0K");
        assert_eq!(format_count(15_500), "15.5K");
        assert_eq!(format_count(2_000_000), "2.0M");
    }
}
