//! Graph events for external consumers
//!
//! Captures structural changes to the graph so an indexer or serializer can
//! follow along on its own task.

use super::types::{ElementId, ElementKind, Label};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    ElementAdded {
        kind: ElementKind,
        id: ElementId,
        label: Label,
    },
    ElementRemoved {
        kind: ElementKind,
        id: ElementId,
        label: Label,
    },
    Cleared,
}

impl GraphEvent {
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            GraphEvent::ElementAdded { kind, .. } | GraphEvent::ElementRemoved { kind, .. } => {
                Some(*kind)
            }
            GraphEvent::Cleared => None,
        }
    }
}
