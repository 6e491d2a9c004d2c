//! Parquet file source, read row by row.

use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::file::reader::{FileReader, SerializedFileReader};
use tracing::debug;

use super::{FileType, RecordSource, RecordStream};
use crate::error::Result;
use crate::value::Value;

/// A parquet file whose rows are converted to nested records through the
/// row API's JSON conversion.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for ParquetSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn file_type(&self) -> FileType {
        FileType::Parquet
    }

    fn records(&self) -> Result<RecordStream> {
        let reader = SerializedFileReader::new(File::open(&self.path)?)?;
        debug!(
            path = %self.path.display(),
            rows = reader.metadata().file_metadata().num_rows(),
            "Opened parquet file"
        );
        let rows = reader
            .into_iter()
            .map(|row| -> Result<Value> { Ok(Value::from(row?.to_json_value())) });
        Ok(Box::new(rows))
    }
}
