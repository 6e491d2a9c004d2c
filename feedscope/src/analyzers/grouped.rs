//! Grouped profiling: per-group partitioning of aggregator state.
//!
//! When a discriminator attribute is configured every aggregator keeps one
//! independent state per distinct group value. [`Partitioned`] holds either a
//! single state or a sorted map of group states, created lazily the first time
//! a group is seen. Iteration order is ascending lexical group order, which is
//! also the order groups are reported in.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::schema_tree::SchemaTree;
use super::traits::{AdmittedRecord, RecordAggregator};
use crate::config::{GroupingConfig, UNKNOWN_GROUP};
use crate::error::Result;

/// Aggregator state, either global or split by group value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Partitioned<T> {
    /// No grouping configured.
    Single(T),
    /// One state per group value, sorted by group.
    Grouped(BTreeMap<String, T>),
}

impl<T: Default> Partitioned<T> {
    /// Creates an empty partitioning, grouped or not.
    pub fn new(grouped: bool) -> Self {
        if grouped {
            Self::Grouped(BTreeMap::new())
        } else {
            Self::Single(T::default())
        }
    }
}

impl<T> Partitioned<T> {
    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped(_))
    }

    /// Returns the state for `group`, creating it with `init` on first use.
    ///
    /// A single partition ignores the group. A grouped partition files a
    /// record without a group under `"unknown"`.
    pub fn get_or_insert_with(&mut self, group: Option<&str>, init: impl FnOnce() -> T) -> &mut T {
        match self {
            Self::Single(state) => state,
            Self::Grouped(groups) => {
                let group = group.unwrap_or(UNKNOWN_GROUP);
                groups.entry(group.to_string()).or_insert_with(|| {
                    debug!(group = %group, "Creating group partition");
                    init()
                })
            }
        }
    }

    /// Returns the state for `group`, if it exists.
    pub fn get(&self, group: Option<&str>) -> Option<&T> {
        match self {
            Self::Single(state) => Some(state),
            Self::Grouped(groups) => groups.get(group.unwrap_or(UNKNOWN_GROUP)),
        }
    }

    /// Every partition with its group value, in report order.
    pub fn partitions(&self) -> Vec<(Option<&str>, &T)> {
        match self {
            Self::Single(state) => vec![(None, state)],
            Self::Grouped(groups) => groups
                .iter()
                .map(|(group, state)| (Some(group.as_str()), state))
                .collect(),
        }
    }

    /// Group values seen so far; empty when ungrouped.
    pub fn groups(&self) -> Vec<&str> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::Grouped(groups) => groups.keys().map(String::as_str).collect(),
        }
    }

    /// Number of partitions holding state.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Grouped(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Schema discovery over every admitted record, one tree per group.
#[derive(Debug, Clone)]
pub struct SchemaProfile {
    discriminator: Option<String>,
    trees: Partitioned<SchemaTree>,
}

impl SchemaProfile {
    /// Creates the profile. With grouping, the discriminator path is left out
    /// of every group tree.
    pub fn new(grouping: Option<&GroupingConfig>) -> Self {
        Self {
            discriminator: grouping.map(|g| g.attribute.clone()),
            trees: Partitioned::new(grouping.is_some()),
        }
    }

    pub fn trees(&self) -> &Partitioned<SchemaTree> {
        &self.trees
    }

    pub fn tree(&self, group: Option<&str>) -> Option<&SchemaTree> {
        self.trees.get(group)
    }

    /// Admitted record count for one partition.
    pub fn record_count(&self, group: Option<&str>) -> u64 {
        self.tree(group).map_or(0, SchemaTree::record_count)
    }

    /// Admitted record count across every partition.
    pub fn total_records(&self) -> u64 {
        self.trees
            .partitions()
            .into_iter()
            .map(|(_, tree)| tree.record_count())
            .sum()
    }
}

impl RecordAggregator for SchemaProfile {
    fn name(&self) -> &str {
        "schema"
    }

    fn consume(&mut self, record: &AdmittedRecord<'_>) -> Result<()> {
        let discriminator = self.discriminator.as_deref();
        let tree = self.trees.get_or_insert_with(record.group, || match discriminator {
            Some(path) => SchemaTree::excluding(path),
            None => SchemaTree::new(),
        });
        tree.ingest(record.value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn feed(
        profile: &mut SchemaProfile,
        grouping: Option<&GroupingConfig>,
        records: &[serde_json::Value],
    ) {
        for (i, raw) in records.iter().enumerate() {
            let value = Value::from(raw.clone());
            let group = grouping.map(|g| g.group_of(&value));
            let id = AdmittedRecord::identify(&value, i as u64 + 1);
            let record = AdmittedRecord {
                value: &value,
                id: &id,
                ordinal: i as u64 + 1,
                group: group.as_deref(),
            };
            profile.consume(&record).unwrap();
        }
    }

    #[test]
    fn test_partitioned_single_ignores_group() {
        let mut single: Partitioned<u32> = Partitioned::new(false);
        *single.get_or_insert_with(Some("a"), || 0) += 1;
        *single.get_or_insert_with(Some("b"), || 0) += 1;
        assert_eq!(single.get(None), Some(&2));
        assert!(single.groups().is_empty());
    }

    #[test]
    fn test_partitioned_groups_sorted() {
        let mut grouped: Partitioned<u32> = Partitioned::new(true);
        assert!(grouped.is_empty());
        *grouped.get_or_insert_with(Some("zeta"), || 0) += 1;
        *grouped.get_or_insert_with(Some("alpha"), || 0) += 1;
        *grouped.get_or_insert_with(None, || 0) += 1;
        assert_eq!(grouped.groups(), vec!["alpha", "unknown", "zeta"]);
        assert_eq!(grouped.get(Some("missing")), None);
    }

    #[test]
    fn test_grouped_profile_sums_to_admitted() {
        let grouping = GroupingConfig::new("schema");
        let mut profile = SchemaProfile::new(Some(&grouping));
        feed(
            &mut profile,
            Some(&grouping),
            &[
                json!({"schema": "Person", "name": "Ann"}),
                json!({"schema": "Company", "name": "Acme"}),
                json!({"schema": "Person", "name": "Bob"}),
                json!({"name": "Nobody"}),
            ],
        );

        assert_eq!(profile.trees().groups(), vec!["Company", "Person", "unknown"]);
        assert_eq!(profile.record_count(Some("Person")), 2);
        assert_eq!(profile.total_records(), 4);
    }

    #[test]
    fn test_discriminator_excluded_from_group_tree() {
        let grouping = GroupingConfig::new("schema");
        let mut profile = SchemaProfile::new(Some(&grouping));
        feed(
            &mut profile,
            Some(&grouping),
            &[json!({"schema": "Person", "name": "Ann", "nested": {"schema": "x"}})],
        );

        let tree = profile.tree(Some("Person")).unwrap();
        assert!(tree.get("root.schema").is_none());
        assert!(tree.get("root.name").is_some());
        // only the exact discriminator path is excluded
        assert!(tree.get("root.nested.schema").is_some());
    }

    #[test]
    fn test_ungrouped_profile() {
        let mut profile = SchemaProfile::new(None);
        feed(&mut profile, None, &[json!({"a": 1}), json!({"a": 2})]);
        assert!(!profile.trees().is_grouped());
        assert_eq!(profile.record_count(None), 2);
        assert_eq!(profile.tree(None).unwrap().get("root.a").unwrap().unique_count(), 2);
    }
}
