//! Hyperedges: one tail vertex fanning out to a set of head vertices

use super::element::HasProperties;
use super::property::{Properties, ReservedKeys};
use super::types::{ElementId, ElementKind, Label};
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// A hyperedge connecting one tail vertex to many head vertices
///
/// Besides its vertices a hyperedge may group constituent edges. The graph
/// drops a hyperedge whose tail is removed and prunes removed heads and edges
/// from the member sets.
#[derive(Debug)]
pub struct HyperEdge {
    id: ElementId,
    label: Label,
    tail: ElementId,
    heads: RwLock<IndexSet<ElementId>>,
    edges: RwLock<IndexSet<ElementId>>,
    properties: RwLock<Properties>,
}

impl HyperEdge {
    pub fn new(
        id: ElementId,
        label: impl Into<Label>,
        tail: ElementId,
        heads: impl IntoIterator<Item = ElementId>,
        edges: impl IntoIterator<Item = ElementId>,
        keys: Arc<ReservedKeys>,
    ) -> Self {
        let properties = Properties::new(keys, &id);
        HyperEdge {
            id,
            label: label.into(),
            tail,
            heads: RwLock::new(heads.into_iter().collect()),
            edges: RwLock::new(edges.into_iter().collect()),
            properties: RwLock::new(properties),
        }
    }

    pub fn tail_id(&self) -> &ElementId {
        &self.tail
    }

    pub fn head_ids(&self) -> Vec<ElementId> {
        self.heads.read().iter().cloned().collect()
    }

    pub fn edge_ids(&self) -> Vec<ElementId> {
        self.edges.read().iter().cloned().collect()
    }

    pub fn has_head(&self, vertex: &ElementId) -> bool {
        self.heads.read().contains(vertex)
    }

    pub fn contains_edge(&self, edge: &ElementId) -> bool {
        self.edges.read().contains(edge)
    }

    /// Tail followed by heads
    pub fn vertex_ids(&self) -> Vec<ElementId> {
        let mut ids = vec![self.tail.clone()];
        ids.extend(self.heads.read().iter().filter(|h| **h != self.tail).cloned());
        ids
    }

    pub(crate) fn detach_head(&self, vertex: &ElementId) -> bool {
        self.heads.write().shift_remove(vertex)
    }

    pub(crate) fn detach_edge(&self, edge: &ElementId) -> bool {
        self.edges.write().shift_remove(edge)
    }
}

impl HasProperties for HyperEdge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::HyperEdge
    }

    fn properties(&self) -> &RwLock<Properties> {
        &self.properties
    }
}

impl PartialEq for HyperEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HyperEdge {}

impl std::hash::Hash for HyperEdge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
