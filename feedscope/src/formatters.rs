//! Report rendering.
//!
//! This module provides formatters that turn a [`Report`] into text: CSV for
//! spreadsheets and downstream tooling, a box-drawn table for the terminal,
//! and JSON for programmatic consumption.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//!
//! use feedscope::config::ProfilerConfig;
//! use feedscope::formatters::{ReportFormatter, TableFormatter};
//! use feedscope::profiler::Profiler;
//! use feedscope::report::{Report, ReportMetadata};
//! use feedscope::value::Value;
//!
//! let mut profiler = Profiler::new(ProfilerConfig::default()).unwrap();
//! let records = vec![Ok(Value::from(serde_json::json!({"name": "Ann"})))];
//! profiler.run(records, &AtomicBool::new(false)).unwrap();
//!
//! let metadata = ReportMetadata::new(&profiler, vec!["people.json".into()], "json");
//! let report = Report::profile(&profiler, metadata);
//! let table = TableFormatter::new().format(&report).unwrap();
//! assert!(table.contains("Ann (1)"));
//! ```

use std::fmt::Write;
use std::str::FromStr;

use crate::error::{ProfileError, Result};
use crate::report::Report;

/// Line rendered instead of an empty enumeration report.
pub const EMPTY_ENUMERATION: &str = "No enumeration data available";

/// Renders a report as text.
///
/// # Examples
///
/// ```rust
/// use feedscope::error::Result;
/// use feedscope::formatters::ReportFormatter;
/// use feedscope::report::Report;
///
/// struct RowCount;
///
/// impl ReportFormatter for RowCount {
///     fn format(&self, report: &Report) -> Result<String> {
///         Ok(format!("{} rows", report.rows().len()))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats a report into its string representation.
    fn format(&self, report: &Report) -> Result<String>;
}

/// Output format selector used by command-line front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn formatter(self) -> Box<dyn ReportFormatter> {
        match self {
            Self::Table => Box::new(TableFormatter::new()),
            Self::Csv => Box::new(CsvFormatter::new()),
            Self::Json => Box::new(JsonFormatter::new()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ProfileError::invalid_config(format!(
                "unknown output format '{other}' (expected table, csv or json)"
            ))),
        }
    }
}

fn is_empty_enumeration(report: &Report) -> bool {
    !report.is_profile() && report.is_empty()
}

/// Formats reports as CSV.
///
/// Profile reports start with `file_name` and `file_type` rows ahead of the
/// header, so the output records where it came from.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    delimiter: u8,
    include_metadata: bool,
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            include_metadata: true,
        }
    }

    /// Sets the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether profile reports carry the metadata rows.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for CsvFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        if is_empty_enumeration(report) {
            return Ok(format!("{EMPTY_ENUMERATION}\n"));
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(Vec::new());

        if self.include_metadata && report.is_profile() {
            writer.write_record(["file_name", report.metadata.sources.join(",").as_str()])?;
            writer.write_record(["file_type", report.metadata.file_type.as_str()])?;
        }
        writer.write_record(report.header())?;
        for row in report.rows() {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ProfileError::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| ProfileError::data_source("csv", format!("invalid UTF-8 in output: {e}")))
    }
}

/// Formats reports as a box-drawn text table.
///
/// Count and percentage columns (`*_cnt`, `*_pct`) are right-aligned.
#[derive(Debug, Clone, Default)]
pub struct TableFormatter {
    max_cell_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cuts cells longer than `width` characters.
    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = Some(width);
        self
    }

    fn cell(&self, text: &str) -> String {
        match self.max_cell_width {
            Some(max) if text.chars().count() > max => {
                let cut: String = text.chars().take(max.saturating_sub(1)).collect();
                format!("{cut}…")
            }
            _ => text.to_string(),
        }
    }
}

fn right_aligned(column: &str) -> bool {
    column.ends_with("_cnt") || column.ends_with("_pct")
}

fn rule(out: &mut String, widths: &[usize], left: char, mid: char, right: char) {
    out.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(mid);
        }
        out.push_str(&"─".repeat(width + 2));
    }
    out.push(right);
    out.push('\n');
}

impl ReportFormatter for TableFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        if is_empty_enumeration(report) {
            return Ok(format!("{EMPTY_ENUMERATION}\n"));
        }

        let header: Vec<String> = report.header().iter().map(|h| self.cell(h)).collect();
        let rows: Vec<Vec<String>> = report
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| self.cell(c)).collect())
            .collect();
        let align: Vec<bool> = report.header().iter().map(|h| right_aligned(h)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let write_row = |out: &mut String, cells: &[String]| {
            out.push('│');
            for ((cell, &width), &right) in cells.iter().zip(&widths).zip(&align) {
                let _ = if right {
                    write!(out, " {cell:>width$} │")
                } else {
                    write!(out, " {cell:<width$} │")
                };
            }
            out.push('\n');
        };

        if report.is_profile() {
            let _ = writeln!(
                out,
                "{} ({})",
                report.metadata.sources.join(", "),
                report.metadata.file_type
            );
        }
        rule(&mut out, &widths, '┌', '┬', '┐');
        write_row(&mut out, &header);
        rule(&mut out, &widths, '├', '┼', '┤');
        for row in &rows {
            write_row(&mut out, row);
        }
        rule(&mut out, &widths, '└', '┴', '┘');
        Ok(out)
    }
}

/// Formats reports as JSON: metadata plus typed rows.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfilerConfig;
    use crate::profiler::Profiler;
    use crate::report::ReportMetadata;
    use crate::value::Value;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    fn profile_report(config: ProfilerConfig, raw: Vec<serde_json::Value>) -> (Profiler, Report) {
        let mut profiler = Profiler::new(config).unwrap();
        let records = raw.into_iter().map(|r| Ok(Value::from(r)));
        profiler.run(records, &AtomicBool::new(false)).unwrap();
        let metadata = ReportMetadata::new(&profiler, vec!["people.json".into()], "json");
        let report = Report::profile(&profiler, metadata);
        (profiler, report)
    }

    #[test]
    fn test_csv_formatter_profile() {
        let config = ProfilerConfig::builder().top_values(2).build();
        let (_, report) = profile_report(
            config,
            vec![json!({"name": "Ann"}), json!({"name": "Bob"}), json!({"name": "Ann"})],
        );
        let output = CsvFormatter::new().format(&report).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "file_name,people.json");
        assert_eq!(lines[1], "file_type,json");
        assert_eq!(
            lines[2],
            "attribute,type,record_cnt,record_pct,unique_cnt,unique_pct,top_value1,top_value2"
        );
        assert_eq!(lines[3], "name,string,3,100,2,66.67,Ann (2),Bob (1)");
    }

    #[test]
    fn test_csv_formatter_without_metadata() {
        let (_, report) = profile_report(ProfilerConfig::default(), vec![json!({"a": 1})]);
        let output = CsvFormatter::new().with_metadata(false).format(&report).unwrap();
        assert!(output.starts_with("attribute,"));
    }

    #[test]
    fn test_empty_enumeration_message() {
        let config = ProfilerConfig::builder()
            .enumerate("missing".parse().unwrap())
            .build();
        let (profiler, _) = profile_report(config, vec![json!({"a": 1})]);
        let metadata = ReportMetadata::new(&profiler, Vec::new(), "json");
        let report = Report::enumeration(&profiler, metadata);

        let csv = CsvFormatter::new().format(&report).unwrap();
        assert_eq!(csv.trim(), EMPTY_ENUMERATION);
        let table = TableFormatter::new().format(&report).unwrap();
        assert_eq!(table.trim(), EMPTY_ENUMERATION);
    }

    #[test]
    fn test_table_formatter_alignment() {
        let (_, report) = profile_report(
            ProfilerConfig::builder().top_values(1).build(),
            vec![json!({"name": "Ann"})],
        );
        let output = TableFormatter::new().format(&report).unwrap();
        assert!(output.starts_with("people.json (json)\n┌"));
        assert!(output.contains("│ attribute │ type   │ record_cnt │"));
        assert!(output.contains("│ name      │ string │          1 │"));
        assert!(output.trim_end().ends_with('┘'));
    }

    #[test]
    fn test_table_cell_width_limit() {
        let formatter = TableFormatter::new().with_max_cell_width(4);
        assert_eq!(formatter.cell("abcdefgh"), "abc…");
        assert_eq!(formatter.cell("abc"), "abc");
    }

    #[test]
    fn test_json_formatter() {
        let (_, report) = profile_report(ProfilerConfig::default(), vec![json!({"name": "Ann"})]);
        let output = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["body"]["kind"], "profile");
        assert_eq!(parsed["body"]["rows"][0]["attribute"], "name");
        assert_eq!(parsed["metadata"]["status"], "complete");
        assert_eq!(parsed["metadata"]["stats"]["records_read"], 1);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
