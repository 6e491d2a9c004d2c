//! Record sources for the supported file formats.
//!
//! Every source decodes one file into a lazy stream of [`Value`] records:
//! CSV and JSON are read line by line, XML is parsed as a stream of events,
//! and parquet (behind the `parquet` feature) goes through the row API.
//!
//! CSV and JSON text is transcoded to UTF-8 from the encoding named in
//! [`SourceOptions`]. A byte order mark wins over the configured encoding.
//!
//! # Examples
//!
//! ```rust,no_run
//! use feedscope::sources::{expand_inputs, open_records, FileType};
//!
//! # fn example() -> feedscope::error::Result<()> {
//! for path in expand_inputs("data/*.jsonl")? {
//!     let file_type = FileType::from_path(&path);
//!     for record in open_records(&path, file_type)? {
//!         println!("{}", record?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt::{self, Debug};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use tracing::debug;

use crate::error::{ErrorContext, ProfileError, Result};
use crate::value::Value;

mod csv;
mod json;
#[cfg(feature = "parquet")]
mod parquet;
mod xml;

pub use self::csv::{CsvOptions, CsvSource};
pub use self::json::JsonSource;
#[cfg(feature = "parquet")]
pub use self::parquet::ParquetSource;
pub use self::xml::XmlSource;

/// Lazy stream of decoded records.
pub type RecordStream = Box<dyn Iterator<Item = Result<Value>>>;

/// A text file transcoded to UTF-8 on the fly.
pub type TextReader = DecodeReaderBytes<File, Vec<u8>>;

/// Options shared by every text source.
#[derive(Debug, Clone, Copy)]
pub struct SourceOptions {
    /// Character encoding of CSV and JSON input.
    pub encoding: &'static Encoding,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self { encoding: UTF_8 }
    }
}

impl SourceOptions {
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Resolves a WHATWG encoding label such as `utf-8`, `latin1` or
/// `windows-1252`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        ProfileError::invalid_config(format!("unknown encoding '{label}'"))
    })
}

/// Opens `path` as text in `encoding`. UTF-8 input passes through untouched
/// so invalid bytes still surface as decode errors.
pub(crate) fn open_text(path: &Path, encoding: &'static Encoding) -> Result<TextReader> {
    let file = File::open(path)?;
    let transcode = (encoding != UTF_8).then_some(encoding);
    Ok(DecodeReaderBytesBuilder::new()
        .encoding(transcode)
        .build(file))
}

/// Buffered variant of [`open_text`].
pub(crate) fn open_text_buffered(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<BufReader<TextReader>> {
    open_text(path, encoding).map(BufReader::new)
}

/// Input file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Csv,
    /// A JSON document; a top-level array yields one record per element.
    Json,
    /// One JSON value per line.
    JsonLines,
    Xml,
    Parquet,
}

impl FileType {
    /// Detects the format from the file extension. Unknown extensions are
    /// read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::Json,
            Some("jsonl" | "ndjson") => Self::JsonLines,
            Some("xml" | "xmls") => Self::Xml,
            Some("parquet") => Self::Parquet,
            _ => Self::Csv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Xml => "xml",
            Self::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "xml" | "xmls" => Ok(Self::Xml),
            "parquet" => Ok(Self::Parquet),
            other => Err(ProfileError::invalid_config(format!(
                "unknown file type '{other}' (expected csv, json, jsonl, xml or parquet)"
            ))),
        }
    }
}

/// A file that decodes into records.
pub trait RecordSource: Debug {
    /// Path of the underlying file.
    fn path(&self) -> &Path;

    fn file_type(&self) -> FileType;

    /// Opens the file and returns its records as a lazy stream.
    fn records(&self) -> Result<RecordStream>;
}

/// Creates the source for `path` read as `file_type`.
pub fn source_for(
    path: &Path,
    file_type: FileType,
    options: &SourceOptions,
) -> Result<Box<dyn RecordSource>> {
    let source: Box<dyn RecordSource> = match file_type {
        FileType::Csv => Box::new(CsvSource::with_options(
            path,
            CsvOptions::default().with_encoding(options.encoding),
        )),
        FileType::Json => Box::new(JsonSource::document(path).with_encoding(options.encoding)),
        FileType::JsonLines => Box::new(JsonSource::lines(path).with_encoding(options.encoding)),
        FileType::Xml => Box::new(XmlSource::new(path)),
        #[cfg(feature = "parquet")]
        FileType::Parquet => Box::new(ParquetSource::new(path)),
        #[cfg(not(feature = "parquet"))]
        FileType::Parquet => {
            return Err(ProfileError::invalid_config(
                "parquet input requires building with the `parquet` feature",
            ))
        }
    };
    Ok(source)
}

/// Opens `path` as UTF-8 `file_type`. Open errors carry the file path.
pub fn open_records(path: &Path, file_type: FileType) -> Result<RecordStream> {
    open_records_with(path, file_type, &SourceOptions::default())
}

/// Opens `path` as `file_type` with explicit source options.
pub fn open_records_with(
    path: &Path,
    file_type: FileType,
    options: &SourceOptions,
) -> Result<RecordStream> {
    debug!(
        path = %path.display(),
        file_type = %file_type,
        encoding = options.encoding.name(),
        "Opening record source"
    );
    source_for(path, file_type, options)?
        .records()
        .with_context(|| format!("failed to open {}", path.display()))
}

/// Expands a glob pattern into the sorted list of matching files.
pub fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| {
        ProfileError::invalid_config(format!("invalid input pattern '{pattern}': {e}"))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(ProfileError::invalid_config(format!(
            "no input files match '{pattern}'"
        )));
    }
    Ok(paths)
}
