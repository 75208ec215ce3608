use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single flat record. Fields vary per store key; no field is guaranteed.
pub type Record = Map<String, Value>;

/// Pre-loaded records grouped by store key, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    entries: Vec<(String, Vec<Record>)>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the records for `key`. Replacing keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, records: Vec<Record>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = records,
            None => self.entries.push((key, records)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, records)| records.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Edge identifier. Serializes untagged: integers as numbers, labels as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Index(u32),
    Label(String),
}

impl NodeId {
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "#{n}"),
            Self::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for NodeId {
    fn from(n: u32) -> Self {
        Self::Index(n)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Name of the layer that emitted this node.
    pub layer: String,
}

/// Why a link carries no usable weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightIssue {
    /// None of the weight fields were present on the record.
    Absent { fields: Vec<String> },
    /// The weight field was present but not a JSON number.
    NonNumeric { field: String, value: String },
    /// The weight resolved to a negative number.
    Negative { field: String, value: f64 },
}

impl fmt::Display for WeightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent { fields } => write!(f, "no weight field present (tried {})", fields.join(", ")),
            Self::NonNumeric { field, value } => write!(f, "field '{field}' is not numeric: {value}"),
            Self::Negative { field, value } => write!(f, "field '{field}' is negative: {value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    /// `None` when the weight could not be resolved; see `issue`.
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<WeightIssue>,
}

impl Link {
    pub fn weighted(source: NodeId, target: NodeId, weight: f64) -> Self {
        Self {
            source,
            target,
            weight: Some(weight),
            issue: None,
        }
    }

    pub fn invalid(source: NodeId, target: NodeId, issue: WeightIssue) -> Self {
        Self {
            source,
            target,
            weight: None,
            issue: Some(issue),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.issue.is_none() && self.weight.is_some_and(|w| w.is_finite() && w >= 0.0)
    }
}

/// The assembled flow graph for one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn nodes_in_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.layer == layer)
    }

    pub fn links_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| &l.source == id)
    }

    pub fn links_to<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| &l.target == id)
    }
}
