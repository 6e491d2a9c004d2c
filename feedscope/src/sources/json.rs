//! JSON and JSON lines file source.

use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};

use super::{open_text_buffered, FileType, RecordSource, RecordStream};
use crate::error::{ProfileError, Result};
use crate::value::Value;

/// Layout of a JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonLayout {
    /// One JSON value per line; blank lines are skipped.
    Lines,
    /// One or more concatenated JSON values; a top-level array is unrolled
    /// into its elements.
    Document,
}

/// A JSON file source.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
    layout: JsonLayout,
    encoding: &'static Encoding,
}

impl JsonSource {
    /// Line-delimited JSON (`.jsonl`, `.ndjson`).
    pub fn lines(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: JsonLayout::Lines,
            encoding: UTF_8,
        }
    }

    /// A JSON document (`.json`).
    pub fn document(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: JsonLayout::Document,
            encoding: UTF_8,
        }
    }

    /// Reads the file as `encoding` instead of UTF-8.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

fn read_lines(reader: impl BufRead + 'static) -> RecordStream {
    let records = reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str::<serde_json::Value>(&line)
                    .map(Value::from)
                    .map_err(|e| {
                        ProfileError::data_source("jsonl", format!("line {}: {e}", index + 1))
                    }),
            ),
            Err(e) => Some(Err(e.into())),
        });
    Box::new(records)
}

fn read_document(reader: impl Read + 'static) -> RecordStream {
    let values = serde_json::Deserializer::from_reader(reader).into_iter::<serde_json::Value>();
    let records = values.flat_map(|value| -> Vec<Result<Value>> {
        match value {
            Ok(serde_json::Value::Array(items)) => {
                items.into_iter().map(|item| Ok(Value::from(item))).collect()
            }
            Ok(other) => vec![Ok(Value::from(other))],
            Err(e) => vec![Err(ProfileError::data_source("json", e.to_string()))],
        }
    });
    Box::new(records)
}

impl RecordSource for JsonSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn file_type(&self) -> FileType {
        match self.layout {
            JsonLayout::Lines => FileType::JsonLines,
            JsonLayout::Document => FileType::Json,
        }
    }

    fn records(&self) -> Result<RecordStream> {
        let reader = open_text_buffered(&self.path, self.encoding)?;
        Ok(match self.layout {
            JsonLayout::Lines => read_lines(reader),
            JsonLayout::Document => read_document(reader),
        })
    }
}
