//! Core type definitions for the property graph

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a graph element (vertex, edge, multi-edge or hyperedge)
///
/// Ids are either numeric or textual (GUID-backed ids are textual). The total
/// order compares an encoding discriminator first (numeric before text), then
/// the length of the encoded form, then the raw value, so a graph holding a
/// mix of both representations still iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Numeric(u64),
    Text(String),
}

impl ElementId {
    pub fn numeric(id: u64) -> Self {
        ElementId::Numeric(id)
    }

    pub fn text(id: impl Into<String>) -> Self {
        ElementId::Text(id.into())
    }

    /// A fresh random GUID rendered as text
    pub fn guid() -> Self {
        ElementId::Text(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ElementId::Numeric(id) => Some(*id),
            ElementId::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ElementId::Text(id) => Some(id),
            ElementId::Numeric(_) => None,
        }
    }

    fn discriminator(&self) -> (u8, usize) {
        match self {
            ElementId::Numeric(_) => (0, 0),
            ElementId::Text(s) => (1, s.len()),
        }
    }
}

impl Ord for ElementId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.discriminator()
            .cmp(&other.discriminator())
            .then_with(|| match (self, other) {
                (ElementId::Numeric(a), ElementId::Numeric(b)) => a.cmp(b),
                (ElementId::Text(a), ElementId::Text(b)) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for ElementId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Numeric(id) => write!(f, "{}", id),
            ElementId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        ElementId::Numeric(id)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        ElementId::Text(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        ElementId::Text(id)
    }
}

/// Revision of an element; bumped on every accepted property mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RevisionId(pub u64);

impl RevisionId {
    /// Revision assigned to a freshly created element
    pub fn initial() -> Self {
        RevisionId(1)
    }

    pub fn next(&self) -> Self {
        RevisionId(self.0 + 1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevId({})", self.0)
    }
}

/// Element label (e.g., "Person", "knows")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

impl From<&Label> for Label {
    fn from(l: &Label) -> Self {
        l.clone()
    }
}

/// The four kinds of graph element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
    MultiEdge,
    HyperEdge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Edge => "edge",
            ElementKind::MultiEdge => "multi-edge",
            ElementKind::HyperEdge => "hyperedge",
        };
        write!(f, "{}", name)
    }
}
