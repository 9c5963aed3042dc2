//! Pipegraph
//!
//! An in-memory property graph with two ways to compute over it: lazy,
//! pull-based pipes and push-based arrows.
//!
//! # Architecture
//!
//! - [`graph`]: vertices, edges, multi-edges and hyperedges in a thread-safe
//!   [`PropertyGraph`]. Every element carries an id and a revision id under
//!   reserved property keys that callers cannot overwrite.
//! - [`pipes`]: single-step traversal operators composed into a [`Pipeline`].
//!   Nothing is computed until the last pipe is advanced, and every output
//!   can report the path that produced it.
//! - [`arrows`]: receivers and emitters wired into a push graph, plus
//!   sensors that feed readings in on demand or on a timer.
//!
//! ## Example Usage
//!
//! ```rust
//! use pipegraph::graph::{ElementId, HasProperties, PropertyGraph};
//! use pipegraph::pipes::{Counter, Pipeline};
//! use std::sync::Arc;
//!
//! let graph = Arc::new(PropertyGraph::new());
//! let marko = graph.add_vertex(Some(ElementId::numeric(1))).unwrap();
//! let josh = graph.add_vertex(Some(ElementId::numeric(4))).unwrap();
//! let lop = graph.add_vertex(Some(ElementId::numeric(3))).unwrap();
//! graph.add_edge(&marko, &josh, None, "knows").unwrap();
//! graph.add_edge(&marko, &lop, None, "created").unwrap();
//!
//! // Ids of everything marko points at
//! let counter = Counter::new();
//! let ids: Vec<ElementId> = Pipeline::new(vec![marko])
//!     .out(&graph, &[])
//!     .count_into(&counter)
//!     .id()
//!     .collect();
//!
//! assert_eq!(ids, vec![ElementId::numeric(4), ElementId::numeric(3)]);
//! assert_eq!(counter.count(), 2);
//! assert_eq!(josh.rev_id().as_u64(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod arrows;
pub mod graph;
pub mod pipes;

// Re-export main types for convenience
pub use graph::{
    Edge, ElementId, ElementKind, GraphConfig, GraphError, GraphEvent, GraphResult,
    HasProperties, HyperEdge, Label, MultiEdge, PropertyGraph, PropertyValue, RevisionId,
    Vertex,
};

pub use pipes::{Path, Pipe, PipeError, PipeResult, PipeState, Pipeline, Value};

pub use arrows::{Arrow, ArrowError, ArrowResult, Emitter, Receiver};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
