//! Profiling orchestration.
//!
//! The [`Profiler`] consumes a forward-only record stream. Each record passes
//! the pre-ingestion filter and the group filter, receives a contributor id,
//! and is then handed to every active aggregator exactly once. Statistics only
//! ever grow, so a run that stops early (interrupt or decode error) still
//! leaves consistent, reportable state.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//!
//! use feedscope::config::ProfilerConfig;
//! use feedscope::profiler::{Profiler, RunStatus};
//! use feedscope::value::Value;
//!
//! let mut profiler = Profiler::new(ProfilerConfig::default()).unwrap();
//! let records = vec![
//!     Ok(Value::from(serde_json::json!({"id": 1, "name": "Ann"}))),
//!     Ok(Value::from(serde_json::json!({"id": 2, "name": "Bob"}))),
//! ];
//!
//! let status = profiler.run(records, &AtomicBool::new(false)).unwrap();
//! assert_eq!(status, RunStatus::Complete);
//! assert_eq!(profiler.stats().records_admitted, 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analyzers::{
    AdmittedRecord, EnumerationAggregator, PivotAggregator, RecordAggregator, SchemaProfile,
};
use crate::config::{EnumerationSpec, ProfilerConfig};
use crate::error::Result;
use crate::logging::truncate_field;
use crate::value::Value;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The stream was read to the end.
    Complete,
    /// The interrupt flag was raised before the stream ended.
    Interrupted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Record counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Records pulled from the stream.
    pub records_read: u64,
    /// Records that passed both filters.
    pub records_admitted: u64,
    /// Records dropped by the pre-ingestion filter or the group filter.
    pub filtered_out: u64,
    /// Aggregator rejections (one record may be rejected by several).
    pub record_errors: u64,
}

/// Drives the active aggregators over a record stream.
#[derive(Debug)]
pub struct Profiler {
    config: ProfilerConfig,
    schema: SchemaProfile,
    enumeration: Option<EnumerationAggregator>,
    pivot: Option<PivotAggregator>,
    stats: RunStats,
    status: Option<RunStatus>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Profiler {
    /// Creates a profiler with the aggregators selected by `config`.
    pub fn new(config: ProfilerConfig) -> Result<Self> {
        config.validate()?;

        let grouped = config.grouping.is_some();
        let (enumeration, pivot) = match &config.enumeration {
            Some(EnumerationSpec::Standard { attributes }) => (
                Some(EnumerationAggregator::new(attributes.clone(), grouped)),
                None,
            ),
            Some(EnumerationSpec::Pivot(spec)) => {
                (None, Some(PivotAggregator::new(spec.clone(), grouped)))
            }
            None => (None, None),
        };

        Ok(Self {
            schema: SchemaProfile::new(config.grouping.as_ref()),
            config,
            enumeration,
            pivot,
            stats: RunStats::default(),
            status: None,
            started_at: None,
            finished_at: None,
        })
    }

    /// Processes one record. Returns whether it was admitted.
    pub fn process(&mut self, record: &Value) -> bool {
        self.stats.records_read += 1;
        let ordinal = self.stats.records_read;
        self.log_progress();

        if let Some(filter) = &self.config.filter {
            if !filter.matches(record) {
                self.stats.filtered_out += 1;
                return false;
            }
        }

        let group = match &self.config.grouping {
            Some(grouping) => {
                let group = grouping.group_of(record);
                if !grouping.admits(&group) {
                    self.stats.filtered_out += 1;
                    return false;
                }
                Some(group)
            }
            None => None,
        };

        let id = AdmittedRecord::identify(record, ordinal);
        let admitted = AdmittedRecord {
            value: record,
            id: &id,
            ordinal,
            group: group.as_deref(),
        };
        self.stats.records_admitted += 1;

        let Self {
            config,
            schema,
            enumeration,
            pivot,
            stats,
            ..
        } = self;

        let mut aggregators: Vec<&mut dyn RecordAggregator> = Vec::with_capacity(3);
        aggregators.push(schema);
        if let Some(enumeration) = enumeration {
            aggregators.push(enumeration);
        }
        if let Some(pivot) = pivot {
            aggregators.push(pivot);
        }

        for aggregator in aggregators {
            if let Err(error) = aggregator.consume(&admitted) {
                stats.record_errors += 1;
                if config.log.log_record_errors {
                    warn!(
                        aggregator = aggregator.name(),
                        record_id = %truncate_field(&id, config.log.max_field_length),
                        error = %error,
                        "Skipping record"
                    );
                }
            }
        }
        true
    }

    fn log_progress(&self) {
        let interval = self.config.progress_interval;
        if self.config.log.log_progress && interval > 0 && self.stats.records_read % interval == 0
        {
            info!(
                records_read = self.stats.records_read,
                records_admitted = self.stats.records_admitted,
                "Profiling progress"
            );
        }
    }

    /// Consumes a record stream until it ends or `interrupt` is raised.
    ///
    /// The flag is checked before each record is pulled. A decode error ends
    /// the run with that error; everything consumed before it stays in place.
    /// A profiler may run several streams in turn (one per input file); the
    /// counters and record ordinals continue across them.
    #[instrument(skip_all)]
    pub fn run<I>(&mut self, records: I, interrupt: &AtomicBool) -> Result<RunStatus>
    where
        I: IntoIterator<Item = Result<Value>>,
    {
        self.started_at.get_or_insert_with(Utc::now);
        let read_before = self.stats.records_read;
        info!(
            grouped = self.config.grouping.is_some(),
            enumeration = self.enumeration.is_some(),
            pivot = self.pivot.is_some(),
            "Starting profiling run"
        );

        let mut records = records.into_iter();
        let status = loop {
            if interrupt.load(Ordering::Relaxed) {
                break RunStatus::Interrupted;
            }
            match records.next() {
                Some(Ok(record)) => {
                    self.process(&record);
                }
                Some(Err(error)) => {
                    self.finished_at = Some(Utc::now());
                    return Err(error);
                }
                None => break RunStatus::Complete,
            }
        };

        self.status = Some(status);
        self.finished_at = Some(Utc::now());
        info!(
            records_read = self.stats.records_read - read_before,
            records_admitted = self.stats.records_admitted,
            record_errors = self.stats.record_errors,
            status = %status,
            "Finished profiling run"
        );
        Ok(status)
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaProfile {
        &self.schema
    }

    pub fn enumeration(&self) -> Option<&EnumerationAggregator> {
        self.enumeration.as_ref()
    }

    pub fn pivot(&self) -> Option<&PivotAggregator> {
        self.pivot.as_ref()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Status of the latest run, `None` before any run finished.
    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }
}
