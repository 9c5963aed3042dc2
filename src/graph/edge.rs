//! Edge implementation for the property graph
//!
//! Edges are directed and may be parallel: any number of edges, with equal or
//! different labels, can connect the same pair of vertices.

use super::element::HasProperties;
use super::property::{Properties, ReservedKeys};
use super::types::{ElementId, ElementKind, Label};
use parking_lot::RwLock;
use std::sync::Arc;

/// A directed edge in the property graph
///
/// Edges have:
/// - A unique ID
/// - An out vertex (tail; the edge goes FROM it)
/// - An in vertex (head; the edge goes TO it)
/// - A label (relationship type)
/// - Properties (key-value pairs)
#[derive(Debug)]
pub struct Edge {
    id: ElementId,
    label: Label,
    out_vertex: ElementId,
    in_vertex: ElementId,
    properties: RwLock<Properties>,
}

impl Edge {
    /// Create a new directed edge
    pub fn new(
        id: ElementId,
        out_vertex: ElementId,
        in_vertex: ElementId,
        label: impl Into<Label>,
        keys: Arc<ReservedKeys>,
    ) -> Self {
        let properties = Properties::new(keys, &id);
        Edge {
            id,
            label: label.into(),
            out_vertex,
            in_vertex,
            properties: RwLock::new(properties),
        }
    }

    /// Tail vertex id
    pub fn out_vertex_id(&self) -> &ElementId {
        &self.out_vertex
    }

    /// Head vertex id
    pub fn in_vertex_id(&self) -> &ElementId {
        &self.in_vertex
    }

    /// Check if this edge connects two specific vertices (in either direction)
    pub fn connects(&self, a: &ElementId, b: &ElementId) -> bool {
        (&self.out_vertex == a && &self.in_vertex == b)
            || (&self.out_vertex == b && &self.in_vertex == a)
    }

    /// Check if this edge goes FROM a specific vertex
    pub fn starts_from(&self, vertex: &ElementId) -> bool {
        &self.out_vertex == vertex
    }

    /// Check if this edge goes TO a specific vertex
    pub fn ends_at(&self, vertex: &ElementId) -> bool {
        &self.in_vertex == vertex
    }

    /// The endpoint opposite to `vertex`, if `vertex` is an endpoint
    pub fn other_end(&self, vertex: &ElementId) -> Option<&ElementId> {
        if &self.out_vertex == vertex {
            Some(&self.in_vertex)
        } else if &self.in_vertex == vertex {
            Some(&self.out_vertex)
        } else {
            None
        }
    }

    pub fn is_loop(&self) -> bool {
        self.out_vertex == self.in_vertex
    }
}

impl HasProperties for Edge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn properties(&self) -> &RwLock<Properties> {
        &self.properties
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: u64, out_v: u64, in_v: u64, label: &str) -> Edge {
        Edge::new(
            ElementId::numeric(id),
            ElementId::numeric(out_v),
            ElementId::numeric(in_v),
            label,
            Arc::new(ReservedKeys::default()),
        )
    }

    #[test]
    fn test_create_edge() {
        let e = edge(7, 1, 2, "knows");

        assert_eq!(e.id(), &ElementId::numeric(7));
        assert_eq!(e.out_vertex_id(), &ElementId::numeric(1));
        assert_eq!(e.in_vertex_id(), &ElementId::numeric(2));
        assert_eq!(e.label().as_str(), "knows");
        assert_eq!(e.kind(), ElementKind::Edge);
    }

    #[test]
    fn test_edge_direction() {
        let e = edge(2, 10, 20, "follows");
        let (a, b) = (ElementId::numeric(10), ElementId::numeric(20));

        assert!(e.starts_from(&a));
        assert!(e.ends_at(&b));
        assert!(!e.starts_from(&b));
        assert!(!e.ends_at(&a));
        assert_eq!(e.other_end(&a), Some(&b));
        assert_eq!(e.other_end(&ElementId::numeric(30)), None);
        assert!(!e.is_loop());
    }

    #[test]
    fn test_edge_properties() {
        let e = edge(3, 1, 2, "knows");

        e.set_property("since", 2020i64).unwrap();
        e.set_property("weight", 0.5).unwrap();

        assert_eq!(e.property("since").as_integer(), Some(2020));
        assert_eq!(e.property("weight").as_float(), Some(0.5));
        assert_eq!(e.rev_id().as_u64(), 3);
        assert!(e.set_property("RevId", 1i64).is_err());
    }

    #[test]
    fn test_parallel_edges_are_distinct() {
        let e1 = edge(1, 100, 200, "knows");
        let e2 = edge(2, 100, 200, "works_with");
        let e3 = edge(3, 100, 200, "knows");

        assert_ne!(e1, e2);
        assert_ne!(e1, e3);

        let (a, b) = (ElementId::numeric(100), ElementId::numeric(200));
        assert!(e1.connects(&a, &b));
        assert!(e2.connects(&b, &a));
        assert!(e3.connects(&a, &b));
    }
}
