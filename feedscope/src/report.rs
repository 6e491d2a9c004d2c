//! Report rows built from a finished profiling run.
//!
//! Rows are plain serializable structs. [`Report`] bundles one kind of rows
//! with run metadata and can flatten itself into a header plus string cells
//! for the tabular formatters.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::{BucketSummary, SchemaNode};
use crate::profiler::{Profiler, RunStats, RunStatus};

/// Longest stringified value shown in a top-values cell.
pub const TOP_VALUE_WIDTH: usize = 50;

/// One attribute path of the schema profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub attribute: String,
    pub data_type: String,
    pub population_count: u64,
    pub population_pct: f64,
    pub unique_count: usize,
    pub unique_pct: f64,
    pub top_values: Vec<String>,
}

/// One distinct value of an enumerated attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerationRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub attribute: String,
    pub value: String,
    pub occurrence_count: u64,
    /// Share of all occurrences at this attribute.
    pub occurrence_pct: f64,
    pub contributor_count: usize,
    /// Share of admitted records.
    pub contributor_pct: f64,
    pub sample_contributors: Vec<String>,
}

/// One dimension combination of a pivot enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub dimensions: Vec<String>,
    pub occurrence_count: u64,
    /// Occurrences relative to admitted records.
    pub occurrence_pct: f64,
    pub distinct_value_count: usize,
    /// Distinct values relative to occurrences.
    pub unique_pct: f64,
    pub top_values: Vec<String>,
}

/// `part / whole` as a percentage rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

/// Formats a top-value cell as `value (count)`, cutting the value to
/// [`TOP_VALUE_WIDTH`] characters.
pub fn format_top_value(value: &str, count: u64) -> String {
    let cut: String = value.chars().take(TOP_VALUE_WIDTH).collect();
    format!("{cut} ({count})")
}

fn profile_row(group: Option<&str>, node: &SchemaNode, admitted: u64, top: usize) -> ProfileRow {
    let population = node.population_count();
    let unique = node.unique_count();
    ProfileRow {
        group: group.map(str::to_string),
        attribute: node.display_path().to_string(),
        data_type: node.node_type().to_string(),
        population_count: population,
        population_pct: percentage(population, admitted),
        unique_count: unique,
        unique_pct: percentage(unique as u64, population),
        top_values: node
            .top_values(top)
            .into_iter()
            .map(|(value, count)| format_top_value(value, count))
            .collect(),
    }
}

/// Schema profile rows: groups in sorted order, nodes depth first.
pub fn profile_rows(profiler: &Profiler) -> Vec<ProfileRow> {
    let top = profiler.config().top_values;
    profiler
        .schema()
        .trees()
        .partitions()
        .into_iter()
        .flat_map(|(group, tree)| {
            let admitted = tree.record_count();
            tree.preorder()
                .into_iter()
                .map(move |node| profile_row(group, node, admitted, top))
        })
        .collect()
}

/// Standard enumeration rows: attributes in configured order, values by
/// descending count. Empty when standard enumeration is not active.
pub fn enumeration_rows(profiler: &Profiler) -> Vec<EnumerationRow> {
    let Some(enumeration) = profiler.enumeration() else {
        return Vec::new();
    };
    let width = profiler.config().enumeration_width();

    let mut rows = Vec::new();
    for (group, state) in enumeration.state().partitions() {
        let admitted = profiler.schema().record_count(group);
        for attribute in state.paths() {
            let total = state.total_occurrences(attribute);
            for (value, stats) in state.ranked(attribute) {
                rows.push(EnumerationRow {
                    group: group.map(str::to_string),
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                    occurrence_count: stats.occurrence_count(),
                    occurrence_pct: percentage(stats.occurrence_count(), total),
                    contributor_count: stats.contributor_count(),
                    contributor_pct: percentage(stats.contributor_count() as u64, admitted),
                    sample_contributors: stats
                        .sample_contributors(width)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                });
            }
        }
    }
    rows
}

/// Pivot rows ordered by (group, dimension tuple). Empty when pivot
/// enumeration is not active.
pub fn pivot_rows(profiler: &Profiler) -> Vec<PivotRow> {
    let Some(pivot) = profiler.pivot() else {
        return Vec::new();
    };
    let width = profiler.config().enumeration_width();

    let mut rows = Vec::new();
    for (group, table) in pivot.tables().partitions() {
        let admitted = profiler.schema().record_count(group);
        for (key, bucket) in table.sorted_buckets() {
            let summary = BucketSummary::of(bucket);
            rows.push(PivotRow {
                group: group.map(str::to_string),
                dimensions: key.clone(),
                occurrence_count: summary.occurrence_count,
                occurrence_pct: percentage(summary.occurrence_count, admitted),
                distinct_value_count: summary.distinct_values,
                unique_pct: percentage(summary.distinct_values as u64, summary.occurrence_count),
                top_values: summary
                    .ranked
                    .iter()
                    .take(width)
                    .map(|(value, count)| format_top_value(value, *count))
                    .collect(),
            });
        }
    }
    rows
}

/// Where the rows came from and how the run went.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub sources: Vec<String>,
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_attribute: Option<String>,
    pub status: Option<RunStatus>,
    pub stats: RunStats,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReportMetadata {
    pub fn new(profiler: &Profiler, sources: Vec<String>, file_type: impl Into<String>) -> Self {
        Self {
            sources,
            file_type: file_type.into(),
            group_attribute: profiler
                .config()
                .grouping
                .as_ref()
                .map(|g| g.attribute.clone()),
            status: profiler.status(),
            stats: profiler.stats(),
            started_at: profiler.started_at(),
            finished_at: profiler.finished_at(),
        }
    }
}

/// Rows of one report kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ReportBody {
    Profile(Vec<ProfileRow>),
    Enumeration(Vec<EnumerationRow>),
    Pivot {
        dimension_labels: Vec<String>,
        rows: Vec<PivotRow>,
    },
}

/// A complete report: metadata plus rows.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub body: ReportBody,
    /// Number of top-value columns in tabular output.
    #[serde(skip)]
    pub top_columns: usize,
}

impl Report {
    /// Schema profile report.
    pub fn profile(profiler: &Profiler, metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            body: ReportBody::Profile(profile_rows(profiler)),
            top_columns: profiler.config().top_values,
        }
    }

    /// Enumeration report for whichever enumeration mode is active.
    pub fn enumeration(profiler: &Profiler, metadata: ReportMetadata) -> Self {
        let body = match profiler.pivot() {
            Some(pivot) => ReportBody::Pivot {
                dimension_labels: pivot.spec().dimension_labels(),
                rows: pivot_rows(profiler),
            },
            None => ReportBody::Enumeration(enumeration_rows(profiler)),
        };
        Self {
            metadata,
            body,
            top_columns: profiler.config().enumeration_width(),
        }
    }

    pub fn is_profile(&self) -> bool {
        matches!(self.body, ReportBody::Profile(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            ReportBody::Profile(rows) => rows.is_empty(),
            ReportBody::Enumeration(rows) => rows.is_empty(),
            ReportBody::Pivot { rows, .. } => rows.is_empty(),
        }
    }

    /// Column names of the tabular form.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = self.metadata.group_attribute.iter().cloned().collect();
        let (fixed, top_prefix): (Vec<String>, &str) = match &self.body {
            ReportBody::Profile(_) => (
                columns(&[
                    "attribute",
                    "type",
                    "record_cnt",
                    "record_pct",
                    "unique_cnt",
                    "unique_pct",
                ]),
                "top_value",
            ),
            ReportBody::Enumeration(_) => (
                columns(&[
                    "attribute",
                    "code_value",
                    "record_cnt",
                    "record_pct",
                    "unique_records",
                    "unique_pct",
                ]),
                "top_record",
            ),
            ReportBody::Pivot {
                dimension_labels, ..
            } => {
                let mut fixed = dimension_labels.clone();
                fixed.extend(columns(&["record_cnt", "record_pct", "unique_values", "unique_pct"]));
                (fixed, "top_value")
            }
        };
        header.extend(fixed);
        header.extend((1..=self.top_columns).map(|i| format!("{top_prefix}{i}")));
        header
    }

    /// Data rows of the tabular form, padded to the header width.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let grouped = self.metadata.group_attribute.is_some();
        let lead = |group: &Option<String>| -> Vec<String> {
            if grouped {
                vec![group.clone().unwrap_or_default()]
            } else {
                Vec::new()
            }
        };

        match &self.body {
            ReportBody::Profile(rows) => rows
                .iter()
                .map(|row| {
                    let mut cells = lead(&row.group);
                    cells.extend([
                        row.attribute.clone(),
                        row.data_type.clone(),
                        row.population_count.to_string(),
                        row.population_pct.to_string(),
                        row.unique_count.to_string(),
                        row.unique_pct.to_string(),
                    ]);
                    self.pad(cells, &row.top_values)
                })
                .collect(),
            ReportBody::Enumeration(rows) => rows
                .iter()
                .map(|row| {
                    let mut cells = lead(&row.group);
                    cells.extend([
                        row.attribute.clone(),
                        row.value.clone(),
                        row.occurrence_count.to_string(),
                        row.occurrence_pct.to_string(),
                        row.contributor_count.to_string(),
                        row.contributor_pct.to_string(),
                    ]);
                    self.pad(cells, &row.sample_contributors)
                })
                .collect(),
            ReportBody::Pivot { rows, .. } => rows
                .iter()
                .map(|row| {
                    let mut cells = lead(&row.group);
                    cells.extend(row.dimensions.iter().cloned());
                    cells.extend([
                        row.occurrence_count.to_string(),
                        row.occurrence_pct.to_string(),
                        row.distinct_value_count.to_string(),
                        row.unique_pct.to_string(),
                    ]);
                    self.pad(cells, &row.top_values)
                })
                .collect(),
        }
    }

    fn pad(&self, mut cells: Vec<String>, tail: &[String]) -> Vec<String> {
        cells.extend(
            (0..self.top_columns).map(|i| tail.get(i).cloned().unwrap_or_default()),
        );
        cells
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfilerConfig;
    use crate::value::Value;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    fn run(config: ProfilerConfig, raw: Vec<serde_json::Value>) -> Profiler {
        let mut profiler = Profiler::new(config).unwrap();
        let records = raw.into_iter().map(|r| Ok(Value::from(r)));
        profiler.run(records, &AtomicBool::new(false)).unwrap();
        profiler
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(3, 3), 100.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_top_value_truncation() {
        let long = "x".repeat(80);
        let cell = format_top_value(&long, 4);
        assert_eq!(cell, format!("{} (4)", "x".repeat(50)));
        assert_eq!(format_top_value("Ann", 2), "Ann (2)");
    }

    #[test]
    fn test_profile_rows() {
        let profiler = run(
            ProfilerConfig::default(),
            vec![
                json!({"id": 1, "name": "Ann"}),
                json!({"id": 2, "name": "Bob"}),
                json!({"id": 3, "name": "Ann"}),
            ],
        );
        let rows = profile_rows(&profiler);
        let name = rows.iter().find(|r| r.attribute == "name").unwrap();
        assert_eq!(name.data_type, "string");
        assert_eq!(name.population_count, 3);
        assert_eq!(name.population_pct, 100.0);
        assert_eq!(name.unique_count, 2);
        assert_eq!(name.unique_pct, 66.67);
        assert_eq!(name.top_values, vec!["Ann (2)", "Bob (1)"]);
    }

    #[test]
    fn test_profile_report_tabular_shape() {
        let config = ProfilerConfig::builder().top_values(3).build();
        let profiler = run(config, vec![json!({"a": "x"})]);
        let metadata = ReportMetadata::new(&profiler, vec!["in.json".into()], "json");
        let report = Report::profile(&profiler, metadata);

        let header = report.header();
        assert_eq!(header.len(), 9);
        assert_eq!(header[0], "attribute");
        assert_eq!(header[8], "top_value3");

        let rows = report.rows();
        assert_eq!(rows, vec![vec!["a", "string", "1", "100", "1", "100", "x (1)", "", ""]]);
    }

    #[test]
    fn test_enumeration_rows_grouped() {
        let config = ProfilerConfig::builder()
            .group_by("kind".parse().unwrap())
            .enumerate("color".parse().unwrap())
            .build();
        let profiler = run(
            config,
            vec![
                json!({"id": "a", "kind": "k1", "color": "red"}),
                json!({"id": "b", "kind": "k1", "color": "red"}),
                json!({"id": "c", "kind": "k2", "color": "blue"}),
            ],
        );
        let rows = enumeration_rows(&profiler);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group.as_deref(), Some("k1"));
        assert_eq!(rows[0].occurrence_count, 2);
        assert_eq!(rows[0].contributor_pct, 100.0);
        assert_eq!(rows[0].sample_contributors, vec!["a", "b"]);

        let metadata = ReportMetadata::new(&profiler, Vec::new(), "json");
        let report = Report::enumeration(&profiler, metadata);
        assert_eq!(report.header()[0], "kind");
        assert_eq!(report.header()[2], "code_value");
        assert_eq!(report.header().last().unwrap(), "top_record5");
    }

    #[test]
    fn test_pivot_rows() {
        let config = ProfilerConfig::builder()
            .enumerate("root:type:number".parse().unwrap())
            .build();
        let profiler = run(
            config,
            vec![
                json!({"type": "A", "number": 1}),
                json!({"type": "A", "number": 2}),
                json!({"type": "B", "number": 3}),
                json!({"other": true}),
            ],
        );
        let rows = pivot_rows(&profiler);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dimensions, vec!["A"]);
        assert_eq!(rows[0].occurrence_count, 2);
        assert_eq!(rows[0].occurrence_pct, 50.0);
        assert_eq!(rows[0].distinct_value_count, 2);
        assert_eq!(rows[0].unique_pct, 100.0);
        assert_eq!(rows[0].top_values, vec!["1 (1)", "2 (1)"]);

        let metadata = ReportMetadata::new(&profiler, Vec::new(), "json");
        let report = Report::enumeration(&profiler, metadata);
        assert_eq!(&report.header()[..2], &["type", "record_cnt"]);
    }
}
