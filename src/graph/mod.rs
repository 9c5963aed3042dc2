//! Core property graph implementation
//!
//! This module implements the graph data model with:
//! - Element identifiers, labels and per-element revision ids
//! - Property containers with reserved, read-only Id and RevId entries
//! - Vertices and directed edges, plus multi-edges and hyperedges
//! - In-memory storage with id uniqueness and adjacency consistency

pub mod config;
pub mod edge;
pub mod element;
pub mod event;
pub mod hyper_edge;
pub mod id_creator;
pub mod multi_edge;
pub mod ontology;
pub mod property;
pub mod store;
pub mod types;
pub mod vertex;

// Re-export main types
pub use config::{ConfigError, ConfigResult, GraphConfig, IdStrategy};
pub use edge::Edge;
pub use element::{ElementSnapshot, HasProperties};
pub use event::GraphEvent;
pub use hyper_edge::HyperEdge;
pub use id_creator::{GuidIdCreator, IdCreator, SequentialIdCreator};
pub use multi_edge::MultiEdge;
pub use property::{
    Properties, PropertyError, PropertyMap, PropertyResult, PropertyValue, ReservedKeys,
};
pub use store::{GraphError, GraphResult, PropertyGraph, SchemaValidator};
pub use types::{ElementId, ElementKind, Label, RevisionId};
pub use vertex::Vertex;
