//! Record aggregators for structure discovery.
//!
//! Every aggregator implements [`RecordAggregator`] and is fed one
//! [`AdmittedRecord`] at a time by the [`Profiler`](crate::profiler::Profiler).
//!
//! ## Available Aggregators
//!
//! - **Schema profile** (`grouped`): builds a [`SchemaTree`] per group with
//!   type, population and value frequency for every attribute path
//! - **Enumeration** (`enumeration`): value frequencies and contributing records
//!   for a list of attribute paths
//! - **Pivot** (`pivot`): value distributions cross-tabulated by dimension
//!   attributes
//!
//! State of every aggregator is held in a [`Partitioned`] container so that a
//! grouped run keeps fully independent statistics per group value.

pub mod enumeration;
pub mod grouped;
pub mod pivot;
pub mod schema_tree;
pub mod traits;

pub use enumeration::{EnumerationAggregator, EnumerationState, ValueStats};
pub use grouped::{Partitioned, SchemaProfile};
pub use pivot::{BucketSummary, PivotAggregator, PivotBucket, PivotKey, PivotTable};
pub use schema_tree::{NodeId, NodeType, SchemaNode, SchemaTree, ROOT_PATH};
pub use traits::{AdmittedRecord, RecordAggregator};
