//! Core aggregator trait shared by every profiling component.

use std::fmt::Debug;

use crate::error::Result;
use crate::value::Value;

/// A record that passed every filter, with the context aggregators need.
#[derive(Debug, Clone, Copy)]
pub struct AdmittedRecord<'a> {
    /// The decoded record.
    pub value: &'a Value,
    /// Contributor identifier: the record's `id` field, or `record_<ordinal>`.
    pub id: &'a str,
    /// 1-based position of the record in the input stream.
    pub ordinal: u64,
    /// Group value when grouping is configured.
    pub group: Option<&'a str>,
}

impl<'a> AdmittedRecord<'a> {
    /// Derives the contributor identifier for a record.
    ///
    /// Uses the top-level `id` attribute when present and non-empty, else a
    /// synthetic `record_<ordinal>`.
    pub fn identify(value: &Value, ordinal: u64) -> String {
        match value.get("id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("record_{ordinal}"),
        }
    }
}

/// Accumulates statistics from admitted records.
///
/// The profiler holds a set of active aggregators chosen by configuration and
/// calls [`consume`](RecordAggregator::consume) on each of them once per
/// admitted record. State is append-only: nothing is ever decremented.
///
/// # Example
///
/// ```rust
/// use feedscope::analyzers::{AdmittedRecord, RecordAggregator};
/// use feedscope::error::Result;
///
/// #[derive(Debug, Default)]
/// struct Counter {
///     seen: u64,
/// }
///
/// impl RecordAggregator for Counter {
///     fn name(&self) -> &str {
///         "counter"
///     }
///
///     fn consume(&mut self, _record: &AdmittedRecord<'_>) -> Result<()> {
///         self.seen += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait RecordAggregator: Debug {
    /// Returns the name of this aggregator, used in log output.
    fn name(&self) -> &str;

    /// Folds one record into the aggregator's state.
    ///
    /// An error means this record was rejected as a whole; implementations
    /// must not leave partial updates behind when they fail.
    fn consume(&mut self, record: &AdmittedRecord<'_>) -> Result<()>;
}
