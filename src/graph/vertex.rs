//! Vertex implementation for the property graph

use super::element::HasProperties;
use super::property::{Properties, ReservedKeys};
use super::types::{ElementId, ElementKind, Label};
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// A vertex in the property graph
///
/// Vertices have:
/// - A unique ID
/// - A label
/// - Properties (key-value pairs, plus the reserved id/revision entries)
/// - The ids of their outgoing and incoming edges
///
/// Adjacency is kept as edge ids; the owning graph resolves them. The graph
/// keeps both sets consistent with each edge's own endpoints.
#[derive(Debug)]
pub struct Vertex {
    id: ElementId,
    label: Label,
    properties: RwLock<Properties>,
    out_edges: RwLock<IndexSet<ElementId>>,
    in_edges: RwLock<IndexSet<ElementId>>,
}

impl Vertex {
    /// Create a detached vertex with empty adjacency
    pub fn new(id: ElementId, label: impl Into<Label>, keys: Arc<ReservedKeys>) -> Self {
        let properties = Properties::new(keys, &id);
        Vertex {
            id,
            label: label.into(),
            properties: RwLock::new(properties),
            out_edges: RwLock::new(IndexSet::new()),
            in_edges: RwLock::new(IndexSet::new()),
        }
    }

    /// Ids of outgoing edges, in attachment order
    pub fn out_edge_ids(&self) -> Vec<ElementId> {
        self.out_edges.read().iter().cloned().collect()
    }

    /// Ids of incoming edges, in attachment order
    pub fn in_edge_ids(&self) -> Vec<ElementId> {
        self.in_edges.read().iter().cloned().collect()
    }

    pub fn has_out_edge(&self, edge: &ElementId) -> bool {
        self.out_edges.read().contains(edge)
    }

    pub fn has_in_edge(&self, edge: &ElementId) -> bool {
        self.in_edges.read().contains(edge)
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.read().len()
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.read().len()
    }

    pub(crate) fn attach_out_edge(&self, edge: ElementId) {
        self.out_edges.write().insert(edge);
    }

    pub(crate) fn attach_in_edge(&self, edge: ElementId) {
        self.in_edges.write().insert(edge);
    }

    pub(crate) fn detach_out_edge(&self, edge: &ElementId) -> bool {
        self.out_edges.write().shift_remove(edge)
    }

    pub(crate) fn detach_in_edge(&self, edge: &ElementId) -> bool {
        self.in_edges.write().shift_remove(edge)
    }

    /// Empty both adjacency sets, returning (outgoing, incoming)
    pub(crate) fn take_edges(&self) -> (Vec<ElementId>, Vec<ElementId>) {
        let out = std::mem::take(&mut *self.out_edges.write());
        let inc = std::mem::take(&mut *self.in_edges.write());
        (out.into_iter().collect(), inc.into_iter().collect())
    }
}

impl HasProperties for Vertex {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn properties(&self) -> &RwLock<Properties> {
        &self.properties
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;

    fn vertex(id: u64, label: &str) -> Vertex {
        Vertex::new(ElementId::numeric(id), label, Arc::new(ReservedKeys::default()))
    }

    #[test]
    fn test_create_vertex() {
        let v = vertex(1, "Person");
        assert_eq!(v.id(), &ElementId::numeric(1));
        assert_eq!(v.label().as_str(), "Person");
        assert_eq!(v.kind(), ElementKind::Vertex);
        assert_eq!(v.out_degree(), 0);
        assert_eq!(v.in_degree(), 0);
    }

    #[test]
    fn test_vertex_properties() {
        let v = vertex(4, "Person");

        v.set_property("name", "Alice").unwrap();
        v.set_property("age", 30i64).unwrap();
        v.set_property("active", true).unwrap();

        assert_eq!(v.property("name").as_string(), Some("Alice"));
        assert_eq!(v.try_get_property("age"), Some(PropertyValue::Integer(30)));
        assert_eq!(v.property("active").as_boolean(), Some(true));
        assert!(v.property("missing").is_null());
        // name, age, active plus Id and RevId
        assert_eq!(v.property_count(), 5);
        assert_eq!(v.rev_id().as_u64(), 4);

        let removed = v.remove_property("age").unwrap();
        assert!(removed.is_some());
        assert!(!v.has_property("age"));
    }

    #[test]
    fn test_id_property_is_read_only() {
        let v = vertex(9, "Person");
        assert!(v.set_property("Id", 10i64).is_err());
        assert_eq!(v.id(), &ElementId::numeric(9));
        assert_eq!(v.property("Id"), PropertyValue::Integer(9));
        assert_eq!(v.rev_id().as_u64(), 1);
    }

    #[test]
    fn test_adjacency() {
        let v = vertex(1, "Person");
        v.attach_out_edge(ElementId::numeric(7));
        v.attach_out_edge(ElementId::numeric(8));
        v.attach_in_edge(ElementId::numeric(9));

        assert_eq!(v.out_edge_ids(), vec![ElementId::numeric(7), ElementId::numeric(8)]);
        assert!(v.has_in_edge(&ElementId::numeric(9)));

        assert!(v.detach_out_edge(&ElementId::numeric(7)));
        assert!(!v.detach_out_edge(&ElementId::numeric(7)));
        assert_eq!(v.out_degree(), 1);

        let (out, inc) = v.take_edges();
        assert_eq!(out.len(), 1);
        assert_eq!(inc.len(), 1);
        assert_eq!(v.out_degree() + v.in_degree(), 0);
    }

    #[test]
    fn test_vertex_equality() {
        let v1 = vertex(7, "Person");
        let v2 = vertex(7, "Software");
        let v3 = vertex(8, "Person");

        assert_eq!(v1, v2); // Same ID
        assert_ne!(v1, v3); // Different ID
    }

    #[test]
    fn test_snapshot() {
        let v = vertex(1, "Person");
        v.set_property("name", "marko").unwrap();
        let snap = v.snapshot();
        assert_eq!(snap.kind, ElementKind::Vertex);
        assert_eq!(snap.properties.len(), 3);
        assert_eq!(snap.rev_id.as_u64(), 2);
    }
}
