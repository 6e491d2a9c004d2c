//! Profiling run configuration.
//!
//! [`ProfilerConfig`] selects which aggregators are active for a run. The
//! component specs parse from the compact command-line syntaxes:
//!
//! | Spec               | Syntax                         | Example                         |
//! |--------------------|--------------------------------|---------------------------------|
//! | [`GroupingConfig`] | `attr` or `attr=value`         | `schema=Person`                 |
//! | [`RecordFilter`]   | `attr=value`                   | `status=active`                 |
//! | [`EnumerationSpec`]| `a,b` or `level:dims:value`    | `properties:type,country:number`|
//!
//! # Example
//!
//! ```rust
//! use feedscope::config::{EnumerationSpec, ProfilerConfig};
//!
//! let config = ProfilerConfig::builder()
//!     .group_by("schema".parse().unwrap())
//!     .enumerate("properties:type,country:number".parse().unwrap())
//!     .top_values(8)
//!     .build();
//!
//! assert!(matches!(config.enumeration, Some(EnumerationSpec::Pivot(_))));
//! assert_eq!(config.enumeration_width(), 5);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::extract::lookup;
use crate::logging::LogConfig;
use crate::value::Value;

/// Group value used when a record lacks the discriminator attribute.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Partitioning of profiling state by a discriminator attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Dotted path of the discriminator attribute.
    pub attribute: String,
    /// When set, only records whose group equals this literal are processed.
    pub filter: Option<String>,
}

impl GroupingConfig {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            filter: None,
        }
    }

    /// Restricts processing to one group value.
    pub fn with_filter(mut self, value: impl Into<String>) -> Self {
        self.filter = Some(value.into());
        self
    }

    /// Reads the group value of a record, `"unknown"` when absent or null.
    pub fn group_of(&self, record: &Value) -> String {
        match lookup(record, &self.attribute) {
            Some(Value::Null) | None => UNKNOWN_GROUP.to_string(),
            Some(value) => value.to_string(),
        }
    }

    /// Whether records of `group` pass the group filter.
    pub fn admits(&self, group: &str) -> bool {
        self.filter.as_deref().map_or(true, |wanted| wanted == group)
    }
}

impl FromStr for GroupingConfig {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        let (attribute, filter) = match s.split_once('=') {
            Some((attribute, filter)) => (attribute.trim(), Some(filter.to_string())),
            None => (s.trim(), None),
        };
        if attribute.is_empty() {
            return Err(ProfileError::invalid_config(format!(
                "group-by specification '{s}' has no attribute"
            )));
        }
        Ok(Self {
            attribute: attribute.to_string(),
            filter,
        })
    }
}

/// Equality filter applied to every record before ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub attribute: String,
    pub value: String,
}

impl RecordFilter {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// True when the attribute exists (plain lookup) and stringifies to the
    /// filter literal.
    pub fn matches(&self, record: &Value) -> bool {
        lookup(record, &self.attribute).is_some_and(|found| found.to_string() == self.value)
    }
}

impl FromStr for RecordFilter {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        let (attribute, value) = s.split_once('=').ok_or_else(|| {
            ProfileError::invalid_config(format!("filter '{s}' must have the form attr=value"))
        })?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(ProfileError::invalid_config(format!(
                "filter '{s}' has no attribute"
            )));
        }
        Ok(Self::new(attribute, value))
    }
}

/// Cross-tabulation of dimension attributes against one value attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// Base object path; `root` or empty means the record itself.
    pub level: String,
    /// Dimension paths, relative to the level.
    pub dimensions: Vec<String>,
    /// Value path, relative to the level.
    pub value: String,
}

impl PivotSpec {
    pub fn new(
        level: impl Into<String>,
        dimensions: Vec<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let spec = Self {
            level: level.into(),
            dimensions,
            value: value.into(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn is_root_level(&self) -> bool {
        self.level.is_empty() || self.level == "root"
    }

    /// Column labels for the dimensions, prefixed by the level unless it is
    /// the record root.
    pub fn dimension_labels(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .map(|dim| {
                if self.is_root_level() {
                    dim.clone()
                } else {
                    format!("{}.{dim}", self.level)
                }
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.value.trim().is_empty() {
            return Err(ProfileError::invalid_config("pivot value attribute is empty"));
        }
        if self.dimensions.is_empty() {
            return Err(ProfileError::invalid_config(
                "pivot needs at least one dimension attribute",
            ));
        }
        if let Some(blank) = self.dimensions.iter().find(|d| d.trim().is_empty()) {
            return Err(ProfileError::invalid_config(format!(
                "pivot dimension '{blank}' is empty"
            )));
        }
        Ok(())
    }
}

/// Which enumeration aggregator to run, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EnumerationSpec {
    /// Frequency of concrete values at each listed path.
    Standard { attributes: Vec<String> },
    /// Pivot cross-tabulation.
    Pivot(PivotSpec),
}

impl FromStr for EnumerationSpec {
    type Err = ProfileError;

    /// Exactly two colons select the pivot form `level:dim1,dim2:value`;
    /// anything else is a comma-separated attribute list.
    fn from_str(s: &str) -> Result<Self> {
        if s.matches(':').count() == 2 {
            let mut parts = s.split(':');
            let level = parts.next().unwrap_or_default().trim();
            let dimensions = parts
                .next()
                .unwrap_or_default()
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
            let value = parts.next().unwrap_or_default().trim();
            return PivotSpec::new(level, dimensions, value).map(Self::Pivot);
        }

        let attributes: Vec<String> = s
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if attributes.is_empty() {
            return Err(ProfileError::invalid_config(format!(
                "enumeration specification '{s}' names no attributes"
            )));
        }
        Ok(Self::Standard { attributes })
    }
}

/// Configuration for a profiling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// Optional partitioning by a discriminator attribute.
    pub grouping: Option<GroupingConfig>,
    /// Optional pre-ingestion equality filter.
    pub filter: Option<RecordFilter>,
    /// Optional enumeration aggregator.
    pub enumeration: Option<EnumerationSpec>,
    /// Width of the top-values list in profile reports.
    pub top_values: usize,
    /// Records between progress log lines; 0 disables progress logging.
    pub progress_interval: u64,
    #[serde(skip)]
    pub log: LogConfig,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            grouping: None,
            filter: None,
            enumeration: None,
            top_values: 10,
            progress_interval: 10_000,
            log: LogConfig::default(),
        }
    }
}

impl ProfilerConfig {
    pub fn builder() -> ProfilerConfigBuilder {
        ProfilerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Width of the top-values and sample-contributor lists in enumeration
    /// reports.
    pub fn enumeration_width(&self) -> usize {
        self.top_values.min(5)
    }

    /// Checks cross-field consistency. Component specs validate themselves
    /// while parsing, so this only catches hand-built values.
    pub fn validate(&self) -> Result<()> {
        if let Some(grouping) = &self.grouping {
            if grouping.attribute.trim().is_empty() {
                return Err(ProfileError::invalid_config("grouping attribute is empty"));
            }
        }
        if let Some(filter) = &self.filter {
            if filter.attribute.trim().is_empty() {
                return Err(ProfileError::invalid_config("filter attribute is empty"));
            }
        }
        match &self.enumeration {
            Some(EnumerationSpec::Pivot(spec)) => spec.validate(),
            Some(EnumerationSpec::Standard { attributes }) if attributes.is_empty() => Err(
                ProfileError::invalid_config("enumeration names no attributes"),
            ),
            _ => Ok(()),
        }
    }
}

/// Builder for [`ProfilerConfig`].
pub struct ProfilerConfigBuilder {
    config: ProfilerConfig,
}

impl ProfilerConfigBuilder {
    /// Partition all statistics by a discriminator attribute.
    pub fn group_by(mut self, grouping: GroupingConfig) -> Self {
        self.config.grouping = Some(grouping);
        self
    }

    /// Drop records that do not match the filter before ingestion.
    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.config.filter = Some(filter);
        self
    }

    /// Enable the standard or pivot enumeration aggregator.
    pub fn enumerate(mut self, spec: EnumerationSpec) -> Self {
        self.config.enumeration = Some(spec);
        self
    }

    /// Set the top-values width for profile reports.
    pub fn top_values(mut self, n: usize) -> Self {
        self.config.top_values = n;
        self
    }

    /// Set how often progress is logged.
    pub fn progress_interval(mut self, records: u64) -> Self {
        self.config.progress_interval = records;
        self
    }

    /// Set the logging behaviour of the run.
    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    pub fn build(self) -> ProfilerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_grouping() {
        let plain: GroupingConfig = "schema".parse().unwrap();
        assert_eq!(plain, GroupingConfig::new("schema"));

        let filtered: GroupingConfig = "schema=Person".parse().unwrap();
        assert_eq!(filtered.filter.as_deref(), Some("Person"));
        assert!(filtered.admits("Person"));
        assert!(!filtered.admits("Company"));

        assert!("=Person".parse::<GroupingConfig>().is_err());
    }

    #[test]
    fn test_group_of_defaults_to_unknown() {
        let grouping = GroupingConfig::new("schema");
        assert_eq!(grouping.group_of(&Value::from(json!({"schema": "Person"}))), "Person");
        assert_eq!(grouping.group_of(&Value::from(json!({"name": "Ann"}))), "unknown");
        assert_eq!(grouping.group_of(&Value::from(json!({"schema": null}))), "unknown");
    }

    #[test]
    fn test_parse_filter() {
        let filter: RecordFilter = "name=Ann".parse().unwrap();
        assert_eq!(filter, RecordFilter::new("name", "Ann"));
        assert!(filter.matches(&Value::from(json!({"name": "Ann"}))));
        assert!(!filter.matches(&Value::from(json!({"name": "Bob"}))));
        assert!(!filter.matches(&Value::from(json!({"other": "Ann"}))));

        let with_equals: RecordFilter = "expr=a=b".parse().unwrap();
        assert_eq!(with_equals.value, "a=b");

        assert!("name".parse::<RecordFilter>().is_err());
    }

    #[test]
    fn test_filter_on_nested_number() {
        let filter: RecordFilter = "meta.version=2".parse().unwrap();
        assert!(filter.matches(&Value::from(json!({"meta": {"version": 2}}))));
    }

    #[test]
    fn test_parse_standard_enumeration() {
        let spec: EnumerationSpec = "properties.type, country ,".parse().unwrap();
        assert_eq!(
            spec,
            EnumerationSpec::Standard {
                attributes: vec!["properties.type".into(), "country".into()]
            }
        );
        assert!(" , ".parse::<EnumerationSpec>().is_err());
    }

    #[test]
    fn test_parse_pivot_enumeration() {
        let spec: EnumerationSpec = "properties:type,country:number".parse().unwrap();
        let EnumerationSpec::Pivot(pivot) = spec else {
            panic!("expected pivot");
        };
        assert_eq!(pivot.level, "properties");
        assert_eq!(pivot.dimensions, vec!["type", "country"]);
        assert_eq!(pivot.value, "number");
        assert_eq!(
            pivot.dimension_labels(),
            vec!["properties.type", "properties.country"]
        );
    }

    #[test]
    fn test_invalid_pivot() {
        assert!("properties:type:".parse::<EnumerationSpec>().is_err());
        assert!("properties::number".parse::<EnumerationSpec>().is_err());
    }

    #[test]
    fn test_root_level_labels() {
        let spec = PivotSpec::new("root", vec!["type".into()], "number").unwrap();
        assert!(spec.is_root_level());
        assert_eq!(spec.dimension_labels(), vec!["type"]);
    }

    #[test]
    fn test_builder_defaults() {
        let config = ProfilerConfig::builder().build();
        assert_eq!(config.top_values, 10);
        assert_eq!(config.enumeration_width(), 5);
        assert_eq!(config.progress_interval, 10_000);
        assert!(config.validate().is_ok());

        let narrow = ProfilerConfig::builder().top_values(3).build();
        assert_eq!(narrow.enumeration_width(), 3);
    }
}
