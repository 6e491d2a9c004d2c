//! Standard value enumeration.
//!
//! For each configured attribute path the aggregator counts how often every
//! concrete value occurs and which records contributed it. Values are resolved
//! with the list-aware [`extract`], so a path crossing a list counts every
//! element.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::grouped::Partitioned;
use super::traits::{AdmittedRecord, RecordAggregator};
use crate::error::{ProfileError, Result};
use crate::extract::extract;

/// Occurrences of one distinct value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValueStats {
    occurrence_count: u64,
    contributors: BTreeSet<String>,
}

impl ValueStats {
    /// Counts one occurrence contributed by record `id`.
    pub fn record(&mut self, id: &str) {
        self.occurrence_count += 1;
        if !self.contributors.contains(id) {
            self.contributors.insert(id.to_string());
        }
    }

    pub fn occurrence_count(&self) -> u64 {
        self.occurrence_count
    }

    /// Number of distinct records that contributed this value.
    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }

    pub fn contributors(&self) -> &BTreeSet<String> {
        &self.contributors
    }

    /// The first `n` contributors in sorted order.
    pub fn sample_contributors(&self, n: usize) -> Vec<&str> {
        self.contributors.iter().take(n).map(String::as_str).collect()
    }
}

/// Ranks value statistics by descending occurrence count, ties in first-seen
/// order.
pub(crate) fn rank_values(values: &IndexMap<String, ValueStats>) -> Vec<(&str, &ValueStats)> {
    let mut ranked: Vec<(&str, &ValueStats)> =
        values.iter().map(|(value, stats)| (value.as_str(), stats)).collect();
    ranked.sort_by(|a, b| b.1.occurrence_count.cmp(&a.1.occurrence_count));
    ranked
}

/// Value frequencies for every enumerated path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnumerationState {
    paths: IndexMap<String, IndexMap<String, ValueStats>>,
}

impl EnumerationState {
    /// Creates a state with one (empty) entry per path, in caller order.
    pub fn new(paths: &[String]) -> Self {
        Self {
            paths: paths
                .iter()
                .map(|path| (path.clone(), IndexMap::new()))
                .collect(),
        }
    }

    /// Paths in caller order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Statistics for one value at one path.
    pub fn get(&self, path: &str, value: &str) -> Option<&ValueStats> {
        self.paths.get(path).and_then(|values| values.get(value))
    }

    /// Values at `path` in report order.
    pub fn ranked(&self, path: &str) -> Vec<(&str, &ValueStats)> {
        self.paths.get(path).map(rank_values).unwrap_or_default()
    }

    /// Total occurrences of all values at `path`.
    pub fn total_occurrences(&self, path: &str) -> u64 {
        self.paths
            .get(path)
            .map_or(0, |values| values.values().map(|s| s.occurrence_count).sum())
    }

    /// True when no value has been recorded at any path.
    pub fn is_empty(&self) -> bool {
        self.paths.values().all(IndexMap::is_empty)
    }

    fn record(&mut self, path: &str, value: String, id: &str) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .entry(value)
            .or_default()
            .record(id);
    }
}

/// Counts concrete values at a fixed list of attribute paths.
#[derive(Debug, Clone)]
pub struct EnumerationAggregator {
    attributes: Vec<String>,
    state: Partitioned<EnumerationState>,
}

impl EnumerationAggregator {
    pub fn new(attributes: Vec<String>, grouped: bool) -> Self {
        let state = if grouped {
            Partitioned::Grouped(Default::default())
        } else {
            Partitioned::Single(EnumerationState::new(&attributes))
        };
        Self { attributes, state }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn state(&self) -> &Partitioned<EnumerationState> {
        &self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state
            .partitions()
            .into_iter()
            .all(|(_, state)| state.is_empty())
    }
}

impl RecordAggregator for EnumerationAggregator {
    fn name(&self) -> &str {
        "enumeration"
    }

    fn consume(&mut self, record: &AdmittedRecord<'_>) -> Result<()> {
        if record.value.as_mapping().is_none() {
            return Err(ProfileError::malformed_record(
                record.id,
                format!("expected an object, found {:?}", record.value.kind()),
            ));
        }

        let staged: Vec<(&str, String)> = self
            .attributes
            .iter()
            .flat_map(|path| {
                extract(record.value, path)
                    .into_iter()
                    .filter(|value| !value.is_empty())
                    .map(move |value| (path.as_str(), value.to_string()))
            })
            .collect();

        let attributes = &self.attributes;
        let state = self
            .state
            .get_or_insert_with(record.group, || EnumerationState::new(attributes));
        for (path, value) in staged {
            state.record(path, value, record.id);
        }
        Ok(())
    }
}
