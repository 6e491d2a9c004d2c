//! CSV file source with delimiter sniffing.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use super::{open_text, open_text_buffered, FileType, RecordSource, RecordStream};
use crate::error::Result;
use crate::value::{Mapping, Value};

/// Delimiters considered when sniffing, in order of preference.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'|', b'\t'];

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; sniffed from the header line when `None`
    pub delimiter: Option<u8>,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Text encoding of the file (default: UTF-8)
    pub encoding: &'static Encoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            encoding: UTF_8,
        }
    }
}

impl CsvOptions {
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A CSV file read as one mapping per row, keyed by the header row.
///
/// Every field becomes a string scalar. Rows shorter than the header yield
/// null for the missing trailing fields; extra fields are ignored.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, CsvOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

/// Picks the candidate delimiter occurring most often outside quotes in
/// `line`. Ties go to the earlier candidate; no candidate at all means tab.
pub fn sniff_delimiter(line: &str, quote: u8) -> u8 {
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut quoted = false;
    for byte in line.bytes() {
        if byte == quote {
            quoted = !quoted;
        } else if !quoted {
            if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|&d| d == byte) {
                counts[i] += 1;
            }
        }
    }

    let mut best = (b'\t', 0);
    for (&delimiter, &count) in CANDIDATE_DELIMITERS.iter().zip(&counts) {
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn read_header_line(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut line = String::new();
    open_text_buffered(path, encoding)?.read_line(&mut line)?;
    Ok(line)
}

impl RecordSource for CsvSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn file_type(&self) -> FileType {
        FileType::Csv
    }

    fn records(&self) -> Result<RecordStream> {
        let delimiter = match self.options.delimiter {
            Some(delimiter) => delimiter,
            None => {
                let header = read_header_line(&self.path, self.options.encoding)?;
                let sniffed = sniff_delimiter(&header, self.options.quote);
                debug!(
                    path = %self.path.display(),
                    delimiter = %char::from(sniffed).escape_default(),
                    "Sniffed CSV delimiter"
                );
                sniffed
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.options.quote)
            .flexible(true)
            .from_reader(open_text(&self.path, self.options.encoding)?);
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let rows = reader.into_records().map(move |row| -> Result<Value> {
            let row = row?;
            let mapping: Mapping = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let field = row.get(i).map_or(Value::Null, Value::string);
                    (header.clone(), field)
                })
                .collect();
            Ok(Value::Mapping(mapping))
        });
        Ok(Box::new(rows))
    }
}
