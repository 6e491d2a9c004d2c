//! Pivot enumeration: value distributions cross-tabulated by dimensions.
//!
//! For a base object (the record itself or a nested object found by plain
//! lookup) the aggregator extracts one list per dimension and one list of
//! values. Lists are aligned element-wise: a list with a single entry is
//! broadcast across every position, an empty dimension contributes
//! `"unknown"`, and any other length mismatch drops the record.
//!
//! # Example
//!
//! ```rust
//! use feedscope::analyzers::{AdmittedRecord, PivotAggregator, RecordAggregator};
//! use feedscope::config::PivotSpec;
//! use feedscope::value::Value;
//!
//! let spec = PivotSpec::new(
//!     "properties",
//!     vec!["type".to_string(), "country".to_string()],
//!     "number",
//! )
//! .unwrap();
//! let mut pivot = PivotAggregator::new(spec, false);
//!
//! let value = Value::from(serde_json::json!({
//!     "properties": {"type": ["X", "Y"], "country": ["US"], "number": ["10", "20"]}
//! }));
//! let record = AdmittedRecord { value: &value, id: "r1", ordinal: 1, group: None };
//! pivot.consume(&record).unwrap();
//!
//! let table = pivot.tables().get(None).unwrap();
//! let key = vec!["X".to_string(), "US".to_string()];
//! assert_eq!(table.bucket(&key).unwrap()["10"].occurrence_count(), 1);
//! ```

use indexmap::IndexMap;
use tracing::debug;

use super::enumeration::{rank_values, ValueStats};
use super::grouped::Partitioned;
use super::traits::{AdmittedRecord, RecordAggregator};
use crate::config::{PivotSpec, UNKNOWN_GROUP};
use crate::error::{ProfileError, Result};
use crate::extract::{extract, lookup};
use crate::value::Value;

/// Stringified dimension values identifying one bucket.
pub type PivotKey = Vec<String>;

/// Value distribution of one bucket.
pub type PivotBucket = IndexMap<String, ValueStats>;

/// Buckets of one partition.
#[derive(Debug, Clone, Default)]
pub struct PivotTable {
    buckets: IndexMap<PivotKey, PivotBucket>,
}

impl PivotTable {
    pub fn bucket(&self, key: &PivotKey) -> Option<&PivotBucket> {
        self.buckets.get(key)
    }

    /// Buckets ordered by their dimension tuple.
    pub fn sorted_buckets(&self) -> Vec<(&PivotKey, &PivotBucket)> {
        let mut buckets: Vec<_> = self.buckets.iter().collect();
        buckets.sort_by(|a, b| a.0.cmp(b.0));
        buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Summary of one bucket used by reports.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary<'a> {
    /// Occurrences across every value in the bucket.
    pub occurrence_count: u64,
    pub distinct_values: usize,
    /// Values by descending occurrence count.
    pub ranked: Vec<(&'a str, u64)>,
}

impl<'a> BucketSummary<'a> {
    pub fn of(bucket: &'a PivotBucket) -> Self {
        Self {
            occurrence_count: bucket.values().map(ValueStats::occurrence_count).sum(),
            distinct_values: bucket.len(),
            ranked: rank_values(bucket)
                .into_iter()
                .map(|(value, stats)| (value, stats.occurrence_count()))
                .collect(),
        }
    }
}

/// A bucket update staged before any state is touched. `value` is `None`
/// when the position holds an empty value: the bucket exists but nothing is
/// counted.
#[derive(Debug, PartialEq)]
struct StagedUpdate {
    key: PivotKey,
    value: Option<String>,
}

/// Cross-tabulates a value attribute against dimension attributes.
#[derive(Debug, Clone)]
pub struct PivotAggregator {
    spec: PivotSpec,
    tables: Partitioned<PivotTable>,
}

impl PivotAggregator {
    pub fn new(spec: PivotSpec, grouped: bool) -> Self {
        Self {
            spec,
            tables: Partitioned::new(grouped),
        }
    }

    pub fn spec(&self) -> &PivotSpec {
        &self.spec
    }

    pub fn tables(&self) -> &Partitioned<PivotTable> {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables
            .partitions()
            .into_iter()
            .all(|(_, table)| table.is_empty())
    }

    fn base<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        let base = if self.spec.is_root_level() {
            Some(record)
        } else {
            lookup(record, &self.spec.level)
        };
        base.filter(|value| !value.is_empty())
    }

    /// Works out every bucket update for one record. `None` means the record
    /// contributes nothing.
    fn plan(&self, record: &AdmittedRecord<'_>) -> Result<Option<Vec<StagedUpdate>>> {
        if record.value.as_mapping().is_none() {
            return Err(ProfileError::malformed_record(
                record.id,
                format!("expected an object, found {:?}", record.value.kind()),
            ));
        }

        let Some(base) = self.base(record.value) else {
            return Ok(None);
        };

        let dimensions: Vec<Vec<&Value>> = self
            .spec
            .dimensions
            .iter()
            .map(|path| extract(base, path))
            .collect();
        let values = extract(base, &self.spec.value);

        let max_length = dimensions
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(values.len()))
            .max()
            .unwrap_or(0);

        let aligned = |len: usize| len == 0 || len == 1 || len == max_length;
        if !dimensions.iter().all(|list| aligned(list.len())) || !aligned(values.len()) {
            debug!(
                record_id = %record.id,
                max_length,
                "Skipping record with misaligned pivot attributes"
            );
            return Ok(None);
        }
        if values.is_empty() {
            return Ok(None);
        }

        let updates = (0..max_length)
            .map(|i| {
                let key = dimensions
                    .iter()
                    .map(|list| match list.as_slice() {
                        [] => UNKNOWN_GROUP.to_string(),
                        [only] => only.to_string(),
                        many => many[i].to_string(),
                    })
                    .collect();
                let value = if values.len() == 1 { values[0] } else { values[i] };
                StagedUpdate {
                    key,
                    value: (!value.is_empty()).then(|| value.to_string()),
                }
            })
            .collect();
        Ok(Some(updates))
    }
}

impl RecordAggregator for PivotAggregator {
    fn name(&self) -> &str {
        "pivot"
    }

    fn consume(&mut self, record: &AdmittedRecord<'_>) -> Result<()> {
        let Some(updates) = self.plan(record)? else {
            return Ok(());
        };

        let table = self
            .tables
            .get_or_insert_with(record.group, PivotTable::default);
        for update in updates {
            let bucket = table.buckets.entry(update.key).or_default();
            if let Some(value) = update.value {
                bucket.entry(value).or_default().record(record.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(level: &str, dims: &[&str], value: &str) -> PivotSpec {
        PivotSpec::new(level, dims.iter().map(|d| d.to_string()).collect(), value).unwrap()
    }

    fn key(parts: &[&str]) -> PivotKey {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn consume(pivot: &mut PivotAggregator, raw: serde_json::Value, id: &str) -> Result<()> {
        let value = Value::from(raw);
        let record = AdmittedRecord {
            value: &value,
            id,
            ordinal: 1,
            group: None,
        };
        pivot.consume(&record)
    }

    fn table(pivot: &PivotAggregator) -> &PivotTable {
        pivot.tables().get(None).unwrap()
    }

    #[test]
    fn test_broadcast_alignment() {
        let mut pivot = PivotAggregator::new(spec("root", &["type", "country"], "number"), false);
        consume(
            &mut pivot,
            json!({"type": ["X", "Y"], "country": ["US"], "number": ["10", "20"]}),
            "r1",
        )
        .unwrap();

        let table = table(&pivot);
        assert_eq!(table.len(), 2);
        let x = table.bucket(&key(&["X", "US"])).unwrap();
        assert_eq!(x.len(), 1);
        assert_eq!(x["10"].occurrence_count(), 1);
        let y = table.bucket(&key(&["Y", "US"])).unwrap();
        assert_eq!(y["20"].occurrence_count(), 1);
    }

    #[test]
    fn test_misaligned_record_is_skipped() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), false);
        consume(
            &mut pivot,
            json!({"type": ["X", "Y", "Z"], "number": ["1", "2"]}),
            "r1",
        )
        .unwrap();
        assert!(pivot.is_empty());
    }

    #[test]
    fn test_missing_dimension_is_unknown() {
        let mut pivot = PivotAggregator::new(spec("root", &["type", "country"], "number"), false);
        consume(&mut pivot, json!({"type": "X", "number": 7}), "r1").unwrap();
        let bucket = table(&pivot).bucket(&key(&["X", "unknown"])).unwrap();
        assert_eq!(bucket["7"].occurrence_count(), 1);
    }

    #[test]
    fn test_missing_value_skips_record() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), false);
        consume(&mut pivot, json!({"type": "X"}), "r1").unwrap();
        assert!(pivot.is_empty());
    }

    #[test]
    fn test_empty_value_creates_bucket_only() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), false);
        consume(&mut pivot, json!({"type": ["X", "Y"], "number": ["", "5"]}), "r1").unwrap();

        let table = table(&pivot);
        assert!(table.bucket(&key(&["X"])).unwrap().is_empty());
        assert_eq!(table.bucket(&key(&["Y"])).unwrap()["5"].occurrence_count(), 1);
    }

    #[test]
    fn test_absent_level_skips_record() {
        let mut pivot = PivotAggregator::new(spec("properties", &["type"], "number"), false);
        consume(&mut pivot, json!({"other": {}}), "r1").unwrap();
        consume(&mut pivot, json!({"properties": null}), "r2").unwrap();
        assert!(pivot.is_empty());
    }

    #[test]
    fn test_nested_level() {
        let mut pivot = PivotAggregator::new(spec("properties", &["type"], "number"), false);
        consume(&mut pivot, json!({"properties": {"type": "A", "number": 1}}), "r1").unwrap();
        consume(&mut pivot, json!({"properties": {"type": "A", "number": 1}}), "r2").unwrap();

        let stats = &table(&pivot).bucket(&key(&["A"])).unwrap()["1"];
        assert_eq!(stats.occurrence_count(), 2);
        assert_eq!(stats.sample_contributors(5), vec!["r1", "r2"]);
    }

    #[test]
    fn test_non_object_record_leaves_no_state() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), false);
        let err = consume(&mut pivot, json!("scalar"), "r1").unwrap_err();
        assert!(matches!(err, ProfileError::MalformedRecord { .. }));
        assert!(pivot.is_empty());
    }

    #[test]
    fn test_sorted_buckets_and_summary() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), false);
        consume(&mut pivot, json!({"type": "b", "number": 1}), "r1").unwrap();
        consume(&mut pivot, json!({"type": "a", "number": 2}), "r2").unwrap();
        consume(&mut pivot, json!({"type": "a", "number": 3}), "r3").unwrap();
        consume(&mut pivot, json!({"type": "a", "number": 3}), "r4").unwrap();

        let buckets = table(&pivot).sorted_buckets();
        assert_eq!(buckets[0].0, &key(&["a"]));
        assert_eq!(buckets[1].0, &key(&["b"]));

        let summary = BucketSummary::of(buckets[0].1);
        assert_eq!(summary.occurrence_count, 3);
        assert_eq!(summary.distinct_values, 2);
        assert_eq!(summary.ranked, vec![("3", 2), ("2", 1)]);
    }

    #[test]
    fn test_grouped_buckets_stay_per_group() {
        let mut pivot = PivotAggregator::new(spec("root", &["type"], "number"), true);
        let rows = [
            ("a", json!({"type": "X", "number": 1}), "r1"),
            ("b", json!({"type": "X", "number": 2}), "r2"),
            ("a", json!({"type": "X", "number": 1}), "r3"),
        ];
        for (group, raw, id) in rows {
            let value = Value::from(raw);
            let record = AdmittedRecord {
                value: &value,
                id,
                ordinal: 1,
                group: Some(group),
            };
            pivot.consume(&record).unwrap();
        }

        assert!(pivot.tables().get(None).is_none());
        assert_eq!(pivot.tables().groups(), vec!["a", "b"]);

        let a = pivot.tables().get(Some("a")).unwrap();
        let bucket = a.bucket(&key(&["X"])).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket["1"].occurrence_count(), 2);
        assert_eq!(bucket["1"].contributor_count(), 2);

        let b = pivot.tables().get(Some("b")).unwrap();
        let bucket = b.bucket(&key(&["X"])).unwrap();
        assert_eq!(bucket["2"].occurrence_count(), 1);
        assert!(bucket.get("1").is_none());
    }
}
