//! Dynamically typed values recorded in traversal paths
//!
//! Pipes are statically typed end to end, but a path mixes vertices, edges
//! and plain values, so each step converts its output into a `Value` when a
//! path is requested.

use crate::graph::{
    Edge, ElementId, HasProperties, HyperEdge, Label, MultiEdge, PropertyValue, RevisionId, Vertex,
};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Value types that can appear in a path
///
/// Elements compare and hash by id, like the elements themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Vertex(Arc<Vertex>),
    Edge(Arc<Edge>),
    MultiEdge(Arc<MultiEdge>),
    HyperEdge(Arc<HyperEdge>),
    Id(ElementId),
    Label(Label),
    RevId(RevisionId),
    Property(PropertyValue),
    Null,
}

/// Provenance of a traversal output, start value first
pub type Path = Vec<Value>;

impl Value {
    pub fn as_vertex(&self) -> Option<&Arc<Vertex>> {
        match self {
            Value::Vertex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Arc<Edge>> {
        match self {
            Value::Edge(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            Value::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Element id for graph elements
    pub fn element_id(&self) -> Option<&ElementId> {
        match self {
            Value::Vertex(v) => Some(v.id()),
            Value::Edge(e) => Some(e.id()),
            Value::MultiEdge(m) => Some(m.id()),
            Value::HyperEdge(h) => Some(h.id()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.element_id().is_some()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Property(PropertyValue::Null))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Vertex(v) => write!(f, "v[{}]", v.id()),
            Value::Edge(e) => write!(
                f,
                "e[{}][{}-{}->{}]",
                e.id(),
                e.out_vertex_id(),
                e.label(),
                e.in_vertex_id()
            ),
            Value::MultiEdge(m) => write!(f, "m[{}]", m.id()),
            Value::HyperEdge(h) => write!(f, "h[{}]", h.id()),
            Value::Id(id) => write!(f, "{}", id),
            Value::Label(label) => write!(f, "{}", label),
            Value::RevId(rev) => write!(f, "{}", rev),
            Value::Property(p) => write!(f, "{}", p),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Elements serialize as point-in-time snapshots
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Vertex(v) => v.snapshot().serialize(serializer),
            Value::Edge(e) => e.snapshot().serialize(serializer),
            Value::MultiEdge(m) => m.snapshot().serialize(serializer),
            Value::HyperEdge(h) => h.snapshot().serialize(serializer),
            Value::Id(id) => id.serialize(serializer),
            Value::Label(label) => label.serialize(serializer),
            Value::RevId(rev) => rev.serialize(serializer),
            Value::Property(p) => p.serialize(serializer),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl From<Arc<Vertex>> for Value {
    fn from(v: Arc<Vertex>) -> Self {
        Value::Vertex(v)
    }
}

impl From<Arc<Edge>> for Value {
    fn from(e: Arc<Edge>) -> Self {
        Value::Edge(e)
    }
}

impl From<Arc<MultiEdge>> for Value {
    fn from(m: Arc<MultiEdge>) -> Self {
        Value::MultiEdge(m)
    }
}

impl From<Arc<HyperEdge>> for Value {
    fn from(h: Arc<HyperEdge>) -> Self {
        Value::HyperEdge(h)
    }
}

impl From<ElementId> for Value {
    fn from(id: ElementId) -> Self {
        Value::Id(id)
    }
}

impl From<Label> for Value {
    fn from(label: Label) -> Self {
        Value::Label(label)
    }
}

impl From<RevisionId> for Value {
    fn from(rev: RevisionId) -> Self {
        Value::RevId(rev)
    }
}

impl From<PropertyValue> for Value {
    fn from(p: PropertyValue) -> Self {
        Value::Property(p)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Property(PropertyValue::String(s))
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::Property(PropertyValue::String(s.to_string()))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Property(PropertyValue::Integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Property(PropertyValue::Integer(i as i64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Property(PropertyValue::Float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Property(PropertyValue::Boolean(b))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
