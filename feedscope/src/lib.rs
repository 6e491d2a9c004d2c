//! # feedscope - Structure discovery for unknown data feeds
//!
//! feedscope reverse-engineers the structure of a semi-structured feed
//! (CSV, JSON, JSON lines, XML or parquet) by walking every record, finding
//! every attribute path that occurs and keeping statistics per path:
//! population, cardinality and value frequency. Statistics can be partitioned
//! by a discriminator attribute, and value distributions can be enumerated or
//! cross-tabulated against other attributes.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//!
//! use feedscope::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let config = ProfilerConfig::builder()
//!     .group_by("kind".parse()?)
//!     .top_values(5)
//!     .build();
//! let mut profiler = Profiler::new(config)?;
//!
//! let records = vec![
//!     Ok(Value::from(serde_json::json!({"kind": "person", "name": "Ann"}))),
//!     Ok(Value::from(serde_json::json!({"kind": "company", "name": "Acme"}))),
//! ];
//! profiler.run(records, &AtomicBool::new(false))?;
//!
//! let metadata = ReportMetadata::new(&profiler, vec!["inline".into()], "json");
//! let report = Report::profile(&profiler, metadata);
//! println!("{}", CsvFormatter::new().format(&report)?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Key Features
//!
//! ### Schema discovery
//!
//! Every record is folded into a [`SchemaTree`](analyzers::SchemaTree): one node
//! per attribute path with its type, population count and value frequencies.
//! Paths collapse across lists, so `people.name` covers every element of a
//! `people` array.
//!
//! ### Grouping and filtering
//!
//! - **Group by** an attribute (`schema`) to keep one independent tree per
//!   group value, optionally restricted to one group (`schema=Person`)
//! - **Filter** records before ingestion on an attribute value
//!   (`status=active`)
//!
//! ### Enumeration
//!
//! - **Standard** (`a,b.c`): frequency of every concrete value at each path,
//!   with the records that contributed it
//! - **Pivot** (`level:dim1,dim2:value`): value distributions cross-tabulated
//!   by dimension attributes of a nested object
//!
//! ### Interruptible runs
//!
//! [`Profiler::run`](profiler::Profiler::run) polls an interrupt flag before
//! each record; statistics gathered up to that point stay reportable.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod extract;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod profiler;
pub mod report;
pub mod sources;
pub mod value;
