//! Error types for the feedscope profiling library.
//!
//! All fallible operations return [`ProfileError`] through the crate-wide
//! [`Result`] alias. Errors fall into three families:
//!
//! - configuration errors, raised before any record is read;
//! - data source errors, raised while opening or decoding an input file;
//! - malformed record errors, which the profiler treats as recoverable and
//!   logs without aborting the run.

use thiserror::Error;

/// The main error type for feedscope.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// An enumeration, filter or grouping specification could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A data source could not be opened or decoded.
    #[error("Data source error ({source_type}): {message}")]
    DataSource {
        /// Kind of source (e.g. "CSV", "JSON", "XML")
        source_type: String,
        /// Detailed error message
        message: String,
    },

    /// A single record could not be processed by an aggregator.
    #[error("Malformed record '{record_id}': {message}")]
    MalformedRecord {
        /// Identifier of the offending record
        record_id: String,
        /// What was wrong with it
        message: String,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON decoding or report serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the XML reader.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error from the parquet reader.
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Another error with a message describing where it happened.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProfileError>,
    },
}

/// A type alias for `Result<T, ProfileError>`.
pub type Result<T> = std::result::Result<T, ProfileError>;

impl ProfileError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed record error.
    pub fn malformed_record(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors raised while validating configuration.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::InvalidConfiguration(_) => true,
            Self::Context { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ProfileError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| ProfileError::Context {
            context: msg.to_string(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ProfileError::Context {
            context: f(),
            source: Box::new(e.into()),
        })
    }
}
