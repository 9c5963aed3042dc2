//! Expansion pipes: from an element to its adjacent elements
//!
//! Each source element is expanded into a buffer holding a snapshot of its
//! adjacency at that moment; the next source element is pulled only once the
//! buffer is drained. Elements removed from the graph in the meantime are
//! skipped when the snapshot is resolved.

use super::{Path, Pipe, PipeBox, PipeItem, PipeState, Starts};
use crate::graph::{Edge, HasProperties, HyperEdge, Label, MultiEdge, PropertyGraph, Vertex};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Direction of expansion relative to the source element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

type Expander<I, O> = fn(&PropertyGraph, &I) -> Vec<Arc<O>>;

/// Flat-maps each input element to its adjacent elements of type `O`
pub struct ExpandPipe<S, I, O> {
    upstream: PipeBox<S, Arc<I>>,
    graph: Arc<PropertyGraph>,
    expander: Expander<I, O>,
    /// Restrict outputs to these labels; empty means all
    labels: Vec<Label>,
    buffer: VecDeque<Arc<O>>,
    current: Option<Arc<O>>,
    state: PipeState,
}

impl<S, I, O> ExpandPipe<S, I, O>
where
    S: PipeItem,
    I: HasProperties + Send + Sync + 'static,
    O: HasProperties + Send + Sync + 'static,
    Arc<I>: PipeItem,
    Arc<O>: PipeItem,
{
    fn with_expander(
        upstream: PipeBox<S, Arc<I>>,
        graph: Arc<PropertyGraph>,
        expander: Expander<I, O>,
        labels: &[&str],
    ) -> Self {
        Self {
            upstream,
            graph,
            expander,
            labels: labels.iter().map(|l| Label::new(*l)).collect(),
            buffer: VecDeque::new(),
            current: None,
            state: PipeState::NotStarted,
        }
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.current = None;
        self.state = PipeState::NotStarted;
    }
}

impl<S, I, O> Pipe for ExpandPipe<S, I, O>
where
    S: PipeItem,
    I: HasProperties + Send + Sync + 'static,
    O: HasProperties + Send + Sync + 'static,
    Arc<I>: PipeItem,
    Arc<O>: PipeItem,
{
    type Start = S;
    type End = Arc<O>;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.upstream.set_starts(starts);
        self.clear();
    }

    fn advance(&mut self) -> bool {
        if self.state == PipeState::Exhausted {
            return false;
        }
        loop {
            if let Some(next) = self.buffer.pop_front() {
                self.current = Some(next);
                self.state = PipeState::Advancing;
                return true;
            }
            if !self.upstream.advance() {
                self.current = None;
                self.state = PipeState::Exhausted;
                return false;
            }
            if let Some(source) = self.upstream.current() {
                let labels = &self.labels;
                let adjacent = (self.expander)(&self.graph, source);
                self.buffer = adjacent
                    .into_iter()
                    .filter(|o| labels.is_empty() || labels.contains(o.label()))
                    .collect();
                trace!("Expanded {} into {} elements", source.id(), self.buffer.len());
            }
        }
    }

    fn current(&self) -> Option<&Arc<O>> {
        self.current.as_ref()
    }

    fn path(&self) -> Path {
        let mut path = self.upstream.path();
        if let Some(current) = &self.current {
            path.push(Arc::clone(current).into());
        }
        path
    }

    fn reset(&mut self) {
        self.upstream.reset();
        self.clear();
    }

    fn state(&self) -> PipeState {
        self.state
    }
}

fn both_edges(graph: &PropertyGraph, vertex: &Vertex) -> Vec<Arc<Edge>> {
    let mut edges = graph.out_edges(vertex);
    edges.extend(graph.in_edges(vertex));
    edges
}

fn out_vertex(graph: &PropertyGraph, edge: &Edge) -> Vec<Arc<Vertex>> {
    graph.out_vertex(edge).into_iter().collect()
}

fn in_vertex(graph: &PropertyGraph, edge: &Edge) -> Vec<Arc<Vertex>> {
    graph.in_vertex(edge).into_iter().collect()
}

fn both_vertices(graph: &PropertyGraph, edge: &Edge) -> Vec<Arc<Vertex>> {
    graph
        .out_vertex(edge)
        .into_iter()
        .chain(graph.in_vertex(edge))
        .collect()
}

/// Vertex to incident edges
pub type EdgesPipe<S> = ExpandPipe<S, Vertex, Edge>;
/// Edge to endpoint vertices
pub type VerticesPipe<S> = ExpandPipe<S, Edge, Vertex>;
/// Multi-edge to member edges
pub type MultiEdgeEdgesPipe<S> = ExpandPipe<S, MultiEdge, Edge>;
/// Hyperedge to tail and head vertices
pub type HyperEdgeVerticesPipe<S> = ExpandPipe<S, HyperEdge, Vertex>;

impl<S: PipeItem> EdgesPipe<S> {
    pub fn new(
        upstream: PipeBox<S, Arc<Vertex>>,
        graph: Arc<PropertyGraph>,
        direction: Direction,
        labels: &[&str],
    ) -> Self {
        let expander: Expander<Vertex, Edge> = match direction {
            Direction::Out => PropertyGraph::out_edges,
            Direction::In => PropertyGraph::in_edges,
            Direction::Both => both_edges,
        };
        Self::with_expander(upstream, graph, expander, labels)
    }

    pub fn out_edges(
        upstream: PipeBox<S, Arc<Vertex>>,
        graph: Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Self {
        Self::new(upstream, graph, Direction::Out, labels)
    }

    pub fn in_edges(
        upstream: PipeBox<S, Arc<Vertex>>,
        graph: Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Self {
        Self::new(upstream, graph, Direction::In, labels)
    }

    pub fn both_edges(
        upstream: PipeBox<S, Arc<Vertex>>,
        graph: Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Self {
        Self::new(upstream, graph, Direction::Both, labels)
    }
}

impl<S: PipeItem> VerticesPipe<S> {
    /// `Out` yields the tail, `In` the head, `Both` tail then head
    pub fn new(
        upstream: PipeBox<S, Arc<Edge>>,
        graph: Arc<PropertyGraph>,
        direction: Direction,
    ) -> Self {
        let expander: Expander<Edge, Vertex> = match direction {
            Direction::Out => out_vertex,
            Direction::In => in_vertex,
            Direction::Both => both_vertices,
        };
        Self::with_expander(upstream, graph, expander, &[])
    }

    pub fn out_vertex(upstream: PipeBox<S, Arc<Edge>>, graph: Arc<PropertyGraph>) -> Self {
        Self::new(upstream, graph, Direction::Out)
    }

    pub fn in_vertex(upstream: PipeBox<S, Arc<Edge>>, graph: Arc<PropertyGraph>) -> Self {
        Self::new(upstream, graph, Direction::In)
    }

    pub fn both_vertices(upstream: PipeBox<S, Arc<Edge>>, graph: Arc<PropertyGraph>) -> Self {
        Self::new(upstream, graph, Direction::Both)
    }
}

impl<S: PipeItem> MultiEdgeEdgesPipe<S> {
    pub fn new(
        upstream: PipeBox<S, Arc<MultiEdge>>,
        graph: Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Self {
        Self::with_expander(upstream, graph, PropertyGraph::multi_edge_edges, labels)
    }
}

impl<S: PipeItem> HyperEdgeVerticesPipe<S> {
    pub fn new(
        upstream: PipeBox<S, Arc<HyperEdge>>,
        graph: Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Self {
        Self::with_expander(upstream, graph, PropertyGraph::hyper_edge_vertices, labels)
    }
}
