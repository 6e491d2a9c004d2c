//! Prelude for commonly used types and traits in feedscope.

pub use crate::analyzers::{RecordAggregator, SchemaTree};
pub use crate::config::{
    EnumerationSpec, GroupingConfig, PivotSpec, ProfilerConfig, RecordFilter,
};
pub use crate::error::{ErrorContext, ProfileError, Result};
pub use crate::formatters::{CsvFormatter, JsonFormatter, ReportFormatter, TableFormatter};
pub use crate::logging::LogConfig;
pub use crate::profiler::{Profiler, RunStatus};
pub use crate::report::{Report, ReportMetadata};
pub use crate::sources::{
    expand_inputs, open_records, open_records_with, FileType, SourceOptions,
};
pub use crate::value::Value;
