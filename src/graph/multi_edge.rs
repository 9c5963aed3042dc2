//! Multi-edges: a labelled grouping of ordinary edges

use super::element::HasProperties;
use super::property::{Properties, ReservedKeys};
use super::types::{ElementId, ElementKind, Label};
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// A set of edges treated as one element
///
/// The vertices of a multi-edge are the endpoints of its member edges; the
/// graph resolves them on demand. Removing a member edge from the graph
/// removes it from every multi-edge holding it.
#[derive(Debug)]
pub struct MultiEdge {
    id: ElementId,
    label: Label,
    edges: RwLock<IndexSet<ElementId>>,
    properties: RwLock<Properties>,
}

impl MultiEdge {
    pub fn new(
        id: ElementId,
        label: impl Into<Label>,
        edges: impl IntoIterator<Item = ElementId>,
        keys: Arc<ReservedKeys>,
    ) -> Self {
        let properties = Properties::new(keys, &id);
        MultiEdge {
            id,
            label: label.into(),
            edges: RwLock::new(edges.into_iter().collect()),
            properties: RwLock::new(properties),
        }
    }

    /// Member edge ids in insertion order
    pub fn edge_ids(&self) -> Vec<ElementId> {
        self.edges.read().iter().cloned().collect()
    }

    pub fn contains_edge(&self, edge: &ElementId) -> bool {
        self.edges.read().contains(edge)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.read().len()
    }

    pub(crate) fn detach_edge(&self, edge: &ElementId) -> bool {
        self.edges.write().shift_remove(edge)
    }
}

impl HasProperties for MultiEdge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn kind(&self) -> ElementKind {
        ElementKind::MultiEdge
    }

    fn properties(&self) -> &RwLock<Properties> {
        &self.properties
    }
}

impl PartialEq for MultiEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MultiEdge {}

impl std::hash::Hash for MultiEdge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
