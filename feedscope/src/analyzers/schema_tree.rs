//! Schema tree induction over irregular nested records.
//!
//! A [`SchemaTree`] keeps one [`SchemaNode`] per attribute path ever observed.
//! Nodes live in an arena (`Vec<SchemaNode>`) addressed by [`NodeId`], with a
//! path index for fetch-or-create, so per-group trees are just independent
//! arenas and no parent/child ownership cycles exist.
//!
//! Paths start at the synthetic root segment `root`. Walking a mapping adds
//! one segment per key; walking a sequence adds none, so every element of a
//! list contributes to the same path:
//!
//! ```text
//! {"name": "Ann", "tags": ["a", "b"], "addr": [{"city": "Oslo"}]}
//!
//! root
//! ├── name        (string)
//! ├── tags        (sequence)   population 3: "2 items", "a", "b"
//! └── addr        (sequence)
//!     └── city    (string)
//! ```
//!
//! # Example
//!
//! ```rust
//! use feedscope::analyzers::SchemaTree;
//! use feedscope::value::Value;
//!
//! let mut tree = SchemaTree::new();
//! tree.ingest(&Value::from(serde_json::json!({"name": "Ann"})));
//! tree.ingest(&Value::from(serde_json::json!({"name": ""})));
//!
//! let node = tree.get("root.name").unwrap();
//! assert_eq!(node.population_count(), 1);
//! assert_eq!(tree.record_count(), 2);
//! ```

use std::collections::HashMap;
use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueKind};

/// Path of the synthetic root node.
pub const ROOT_PATH: &str = "root";

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

const ROOT_ID: NodeId = 0;

/// Type tag of a schema node, fixed by its first non-empty observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Unknown,
    String,
    Number,
    Boolean,
    Mapping,
    Sequence,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ValueKind> for NodeType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Null => Self::Unknown,
            ValueKind::String => Self::String,
            ValueKind::Number => Self::Number,
            ValueKind::Boolean => Self::Boolean,
            ValueKind::Mapping => Self::Mapping,
            ValueKind::Sequence => Self::Sequence,
        }
    }
}

/// Statistics accumulated for one attribute path.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaNode {
    path: String,
    node_type: NodeType,
    population_count: u64,
    unique_values: IndexMap<String, u64>,
    #[serde(skip)]
    parent: Option<NodeId>,
    #[serde(skip)]
    children: Vec<NodeId>,
}

impl SchemaNode {
    fn new(path: String, parent: Option<NodeId>) -> Self {
        Self {
            path,
            node_type: NodeType::Unknown,
            population_count: 0,
            unique_values: IndexMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Full path including the `root` segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path as shown in reports, without the leading `root.`.
    pub fn display_path(&self) -> &str {
        self.path
            .strip_prefix(ROOT_PATH)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.path)
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn population_count(&self) -> u64 {
        self.population_count
    }

    /// Stringified value → occurrences, in first-seen order.
    pub fn unique_values(&self) -> &IndexMap<String, u64> {
        &self.unique_values
    }

    pub fn unique_count(&self) -> usize {
        self.unique_values.len()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The `n` most frequent values, ties kept in first-seen order.
    pub fn top_values(&self, n: usize) -> Vec<(&str, u64)> {
        top_counts(&self.unique_values, n)
    }

    fn observe(&mut self, value: &Value) {
        if value.is_empty() {
            return;
        }
        if self.node_type == NodeType::Unknown {
            self.node_type = value.kind().into();
        }
        let key = value.size_descriptor().unwrap_or_else(|| value.to_string());
        self.population_count += 1;
        *self.unique_values.entry(key).or_insert(0) += 1;
    }
}

/// Sorts a frequency table by descending count; the sort is stable so ties
/// keep insertion order.
pub(crate) fn top_counts(counts: &IndexMap<String, u64>, n: usize) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}

/// Arena-backed forest of schema nodes under one synthetic root.
#[derive(Debug, Clone)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
    index: HashMap<String, NodeId>,
    excluded_path: Option<String>,
    /// Records ingested; kept apart from node populations.
    records: u64,
}

impl Default for SchemaTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaTree {
    /// Creates a tree holding only the root node.
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(ROOT_PATH.to_string(), ROOT_ID);
        Self {
            nodes: vec![SchemaNode::new(ROOT_PATH.to_string(), None)],
            index,
            excluded_path: None,
            records: 0,
        }
    }

    /// Creates a tree that never records the attribute at `path` (relative to
    /// the record, e.g. `"schema"`). Used to leave a grouping discriminator
    /// out of its own group's tree.
    pub fn excluding(path: &str) -> Self {
        Self {
            excluded_path: Some(format!("{ROOT_PATH}.{path}")),
            ..Self::new()
        }
    }

    /// Walks one record, creating nodes for new paths and updating statistics.
    pub fn ingest(&mut self, record: &Value) {
        self.records += 1;
        let root = &mut self.nodes[ROOT_ID];
        root.population_count += 1;
        if root.node_type == NodeType::Unknown && !record.is_empty() {
            root.node_type = record.kind().into();
        }
        self.walk(ROOT_ID, record);
    }

    fn walk(&mut self, parent: NodeId, value: &Value) {
        match value {
            Value::Mapping(map) => {
                for (key, child_value) in map {
                    if key.trim().is_empty() {
                        continue;
                    }
                    let Some(child) = self.child(parent, key) else {
                        continue;
                    };
                    self.nodes[child].observe(child_value);
                    if child_value.is_container() {
                        self.walk(child, child_value);
                    }
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    if item.is_container() {
                        self.walk(parent, item);
                    } else if let Some(target) = self.element_target(parent) {
                        self.nodes[target].observe(item);
                    }
                }
            }
            Value::Null | Value::Scalar(_) => {}
        }
    }

    /// Node receiving scalar list elements found under `parent`. The root only
    /// counts records, so elements of a top-level list go to `root.root`.
    fn element_target(&mut self, parent: NodeId) -> Option<NodeId> {
        if parent == ROOT_ID {
            self.child(ROOT_ID, ROOT_PATH)
        } else {
            Some(parent)
        }
    }

    /// Fetches or creates the child of `parent` named `key`. Returns `None`
    /// for the excluded path.
    fn child(&mut self, parent: NodeId, key: &str) -> Option<NodeId> {
        let path = format!("{}.{key}", self.nodes[parent].path);
        if self.excluded_path.as_deref() == Some(path.as_str()) {
            return None;
        }
        if let Some(&id) = self.index.get(&path) {
            return Some(id);
        }
        let id = self.nodes.len();
        self.nodes.push(SchemaNode::new(path.clone(), Some(parent)));
        self.nodes[parent].children.push(id);
        self.index.insert(path, id);
        Some(id)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.nodes[ROOT_ID]
    }

    /// Number of records ingested.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Looks up a node by full path (`root.a.b`).
    pub fn get(&self, path: &str) -> Option<&SchemaNode> {
        self.index.get(path).map(|&id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Nodes in report order: depth first, children in first-seen order,
    /// root excluded.
    pub fn preorder(&self) -> Vec<&SchemaNode> {
        let mut ordered = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeId> = self.nodes[ROOT_ID].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            ordered.push(node);
            stack.extend(node.children.iter().rev());
        }
        ordered
    }

    /// Renders the forest as an indented outline, one `name (type)` per line.
    pub fn render_tree(&self, root_label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{root_label} ({})", self.root().node_type);
        self.render_children(ROOT_ID, "", &mut out);
        out
    }

    fn render_children(&self, id: NodeId, prefix: &str, out: &mut String) {
        let children = &self.nodes[id].children;
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let node = &self.nodes[child];
            let branch = if last { "└── " } else { "├── " };
            let _ = writeln!(out, "{prefix}{branch}{} ({})", node.name(), node.node_type);
            let next_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            self.render_children(child, &next_prefix, out);
        }
    }
}
