//! XML file source.
//!
//! Each child element of the document root is one record. An element becomes
//! a mapping of its attributes, then `text` for non-blank character data,
//! then its child elements by local name; a name that repeats turns into a
//! sequence. Namespace prefixes are stripped and `xmlns` declarations dropped.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{FileType, RecordSource, RecordStream};
use crate::error::Result;
use crate::value::{Mapping, Value};

/// An XML file source.
#[derive(Debug, Clone)]
pub struct XmlSource {
    path: PathBuf,
}

impl XmlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for XmlSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn file_type(&self) -> FileType {
        FileType::Xml
    }

    fn records(&self) -> Result<RecordStream> {
        let mut reader = Reader::from_file(&self.path)?;
        reader.config_mut().trim_text(true);
        Ok(Box::new(XmlRecords {
            reader,
            buf: Vec::new(),
            depth: 0,
            stack: Vec::new(),
            finished: false,
        }))
    }
}

/// An element under construction.
struct Frame {
    name: String,
    attributes: Mapping,
    text: String,
    children: Mapping,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Mapping::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.insert(key, Value::string(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Mapping::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let mut mapping = self.attributes;
        let text = self.text.trim();
        if !text.is_empty() {
            mapping.insert("text".to_string(), Value::string(text));
        }
        for (key, child) in self.children {
            mapping.insert(key, child);
        }
        (self.name, Value::Mapping(mapping))
    }

    fn adopt(&mut self, name: String, child: Value) {
        match self.children.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(child);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Sequence(items) => items.push(child),
                existing => {
                    let first = std::mem::take(existing);
                    *existing = Value::Sequence(vec![first, child]);
                }
            },
        }
    }
}

struct XmlRecords {
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
    /// Depth of the element being read; the document root is depth 1.
    depth: usize,
    stack: Vec<Frame>,
    finished: bool,
}

impl XmlRecords {
    /// Reads events until a record element closes or the document ends.
    fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            self.buf.clear();
            let closed = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => {
                    self.depth += 1;
                    if self.depth >= 2 {
                        self.stack.push(Frame::open(&start)?);
                    }
                    None
                }
                Event::Empty(start) if self.depth >= 1 => Some(Frame::open(&start)?),
                Event::Text(text) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.text.push_str(&text.unescape()?);
                    }
                    None
                }
                Event::CData(data) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data));
                    }
                    None
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.stack.pop()
                }
                Event::Eof => return Ok(None),
                _ => None,
            };

            if let Some(record) = closed.and_then(|frame| self.finish(frame)) {
                return Ok(Some(record));
            }
        }
    }

    /// Attaches a closed element to its parent, or returns it when it is a
    /// record (a direct child of the document root).
    fn finish(&mut self, frame: Frame) -> Option<Value> {
        let (name, value) = frame.close();
        match self.stack.last_mut() {
            Some(parent) => {
                parent.adopt(name, value);
                None
            }
            None => Some(value),
        }
    }
}

impl Iterator for XmlRecords {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
