//! In-memory property graph storage
//!
//! Elements live in id-keyed maps behind one graph-level lock. Edges refer to
//! their endpoints by id and vertices hold edge-id sets, so there are no
//! reference cycles between elements; the graph resolves ids on demand.
//!
//! Lock order is graph maps first, element state second.

use super::config::GraphConfig;
use super::edge::Edge;
use super::element::HasProperties;
use super::event::GraphEvent;
use super::hyper_edge::HyperEdge;
use super::id_creator::IdCreator;
use super::multi_edge::MultiEdge;
use super::property::{PropertyError, ReservedKeys};
use super::types::{ElementId, ElementKind, Label};
use super::vertex::Vertex;
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Attempts made to draw an unused id from the id creator
const MAX_ID_ATTEMPTS: usize = 1024;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Vertex {0} already exists")]
    DuplicateVertexId(ElementId),

    #[error("Edge {0} already exists")]
    DuplicateEdgeId(ElementId),

    #[error("Multi-edge {0} already exists")]
    DuplicateMultiEdgeId(ElementId),

    #[error("Hyperedge {0} already exists")]
    DuplicateHyperEdgeId(ElementId),

    #[error("Vertex {0} not found")]
    VertexNotFound(ElementId),

    #[error("Edge {0} not found")]
    EdgeNotFound(ElementId),

    #[error("Invalid edge: out vertex {0} is not part of this graph")]
    InvalidEdgeSource(ElementId),

    #[error("Invalid edge: in vertex {0} is not part of this graph")]
    InvalidEdgeTarget(ElementId),

    #[error("Id creator produced no unused {0} id")]
    IdCreationFailed(ElementKind),

    #[error("Schema violation on {kind} {id}: {reason}")]
    SchemaViolation {
        kind: ElementKind,
        id: ElementId,
        reason: String,
    },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Pre-insert validation hook for schema-aware graphs
///
/// Consulted after an element's initializer ran and before it becomes
/// visible. Returning `Err(reason)` aborts the insert.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, element: &dyn HasProperties) -> Result<(), String>;
}

impl<F> SchemaValidator for F
where
    F: Fn(&dyn HasProperties) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, element: &dyn HasProperties) -> Result<(), String> {
        self(element)
    }
}

#[derive(Default)]
struct GraphMaps {
    vertices: IndexMap<ElementId, Arc<Vertex>>,
    edges: IndexMap<ElementId, Arc<Edge>>,
    multi_edges: IndexMap<ElementId, Arc<MultiEdge>>,
    hyper_edges: IndexMap<ElementId, Arc<HyperEdge>>,
    /// Ids claimed by adds whose initializer is still running
    reserved: FxHashSet<(ElementKind, ElementId)>,
}

impl GraphMaps {
    fn is_taken(&self, kind: ElementKind, id: &ElementId) -> bool {
        let present = match kind {
            ElementKind::Vertex => self.vertices.contains_key(id),
            ElementKind::Edge => self.edges.contains_key(id),
            ElementKind::MultiEdge => self.multi_edges.contains_key(id),
            ElementKind::HyperEdge => self.hyper_edges.contains_key(id),
        };
        present || self.reserved.contains(&(kind, id.clone()))
    }

    fn has_vertex(&self, vertex: &Vertex) -> bool {
        self.vertices
            .get(vertex.id())
            .map_or(false, |v| std::ptr::eq(Arc::as_ptr(v), vertex))
    }

    fn has_edge(&self, edge: &Edge) -> bool {
        self.edges
            .get(edge.id())
            .map_or(false, |e| std::ptr::eq(Arc::as_ptr(e), edge))
    }
}

/// An id claimed for an add in progress; released on commit or drop
struct Reservation<'g> {
    graph: &'g PropertyGraph,
    kind: ElementKind,
    id: ElementId,
    active: bool,
}

impl Reservation<'_> {
    fn release(&mut self, maps: &mut GraphMaps) {
        maps.reserved.remove(&(self.kind, self.id.clone()));
        self.active = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.active {
            self.graph
                .maps
                .write()
                .reserved
                .remove(&(self.kind, self.id.clone()));
        }
    }
}

/// In-memory property graph
///
/// Holds vertices, edges, multi-edges and hyperedges in id-keyed maps:
/// - vertices: ElementId -> Vertex (each with out/in edge-id sets)
/// - edges: ElementId -> Edge (each with out/in vertex ids)
/// - multi_edges / hyper_edges: ElementId -> grouping elements
///
/// All methods take `&self`; share the graph as `Arc<PropertyGraph>`.
/// Id uniqueness is checked and claimed inside a single critical section,
/// so concurrent adds with the same explicit id cannot both succeed.
pub struct PropertyGraph {
    config: GraphConfig,
    keys: Arc<ReservedKeys>,
    id_creator: Box<dyn IdCreator>,
    validator: Option<Box<dyn SchemaValidator>>,
    event_sender: Option<UnboundedSender<GraphEvent>>,
    maps: RwLock<GraphMaps>,
    vertex_count: AtomicUsize,
    edge_count: AtomicUsize,
    multi_edge_count: AtomicUsize,
    hyper_edge_count: AtomicUsize,
}

impl PropertyGraph {
    /// Create a new empty graph with the default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create a graph using the configured key names and id strategy
    pub fn with_config(config: GraphConfig) -> Self {
        let id_creator = config.id_creator();
        Self::with_id_creator(config, id_creator)
    }

    /// Create a graph with a caller-supplied id strategy
    pub fn with_id_creator(config: GraphConfig, id_creator: Box<dyn IdCreator>) -> Self {
        info!(
            "Creating property graph (id key '{}', revision key '{}')",
            config.id_key, config.rev_id_key
        );
        PropertyGraph {
            keys: Arc::new(config.reserved_keys()),
            config,
            id_creator,
            validator: None,
            event_sender: None,
            maps: RwLock::new(GraphMaps::default()),
            vertex_count: AtomicUsize::new(0),
            edge_count: AtomicUsize::new(0),
            multi_edge_count: AtomicUsize::new(0),
            hyper_edge_count: AtomicUsize::new(0),
        }
    }

    /// Create a graph that reports structural changes on a channel
    pub fn with_events(config: GraphConfig) -> (Self, UnboundedReceiver<GraphEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut graph = Self::with_config(config);
        graph.event_sender = Some(tx);
        (graph, rx)
    }

    /// Install a pre-insert schema validator
    pub fn with_schema_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn reserved_keys(&self) -> &ReservedKeys {
        &self.keys
    }

    // ============================================================
    // Id reservation
    // ============================================================

    fn duplicate(kind: ElementKind, id: ElementId) -> GraphError {
        match kind {
            ElementKind::Vertex => GraphError::DuplicateVertexId(id),
            ElementKind::Edge => GraphError::DuplicateEdgeId(id),
            ElementKind::MultiEdge => GraphError::DuplicateMultiEdgeId(id),
            ElementKind::HyperEdge => GraphError::DuplicateHyperEdgeId(id),
        }
    }

    fn reserve(&self, kind: ElementKind, id: Option<ElementId>) -> GraphResult<Reservation<'_>> {
        let mut maps = self.maps.write();
        let id = match id {
            Some(id) => {
                if maps.is_taken(kind, &id) {
                    warn!("Rejected duplicate {} id {}", kind, id);
                    return Err(Self::duplicate(kind, id));
                }
                id
            }
            None => self.fresh_id(&maps, kind)?,
        };
        maps.reserved.insert((kind, id.clone()));
        Ok(Reservation {
            graph: self,
            kind,
            id,
            active: true,
        })
    }

    fn fresh_id(&self, maps: &GraphMaps, kind: ElementKind) -> GraphResult<ElementId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.id_creator.next_id(kind);
            if !maps.is_taken(kind, &candidate) {
                return Ok(candidate);
            }
        }
        Err(GraphError::IdCreationFailed(kind))
    }

    fn validate(&self, element: &dyn HasProperties) -> GraphResult<()> {
        if let Some(validator) = &self.validator {
            validator
                .validate(element)
                .map_err(|reason| GraphError::SchemaViolation {
                    kind: element.kind(),
                    id: element.id().clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    fn emit(&self, event: GraphEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }

    fn added(element: &dyn HasProperties) -> GraphEvent {
        GraphEvent::ElementAdded {
            kind: element.kind(),
            id: element.id().clone(),
            label: element.label().clone(),
        }
    }

    fn removed(element: &dyn HasProperties) -> GraphEvent {
        GraphEvent::ElementRemoved {
            kind: element.kind(),
            id: element.id().clone(),
            label: element.label().clone(),
        }
    }

    // ============================================================
    // Vertices
    // ============================================================

    /// Add a vertex with the default vertex label
    pub fn add_vertex(&self, id: Option<ElementId>) -> GraphResult<Arc<Vertex>> {
        let label = self.config.default_vertex_label.clone();
        self.add_vertex_with(id, label, |_| Ok(()))
    }

    /// Add a vertex, running `init` on it before it becomes visible
    ///
    /// The id is claimed up front; `init` runs outside the graph lock and may
    /// read the graph. If `init` or the schema validator fails, nothing is
    /// inserted and the id is released.
    pub fn add_vertex_with<F>(
        &self,
        id: Option<ElementId>,
        label: impl Into<Label>,
        init: F,
    ) -> GraphResult<Arc<Vertex>>
    where
        F: FnOnce(&Vertex) -> GraphResult<()>,
    {
        let mut reservation = self.reserve(ElementKind::Vertex, id)?;
        let vertex = Arc::new(Vertex::new(
            reservation.id.clone(),
            label,
            Arc::clone(&self.keys),
        ));
        init(&vertex)?;
        self.validate(&*vertex)?;

        {
            let mut maps = self.maps.write();
            reservation.release(&mut maps);
            maps.vertices.insert(vertex.id().clone(), Arc::clone(&vertex));
            self.vertex_count.fetch_add(1, Ordering::SeqCst);
        }

        debug!("Added vertex {} ({})", vertex.id(), vertex.label());
        self.emit(Self::added(&*vertex));
        Ok(vertex)
    }

    pub fn vertex_by_id(&self, id: &ElementId) -> Option<Arc<Vertex>> {
        self.maps.read().vertices.get(id).cloned()
    }

    pub fn has_vertex(&self, id: &ElementId) -> bool {
        self.maps.read().vertices.contains_key(id)
    }

    /// Check that this exact vertex instance belongs to the graph
    pub fn contains_vertex(&self, vertex: &Vertex) -> bool {
        self.maps.read().has_vertex(vertex)
    }

    /// All vertices, iterated over a snapshot taken now
    pub fn vertices(&self) -> impl Iterator<Item = Arc<Vertex>> {
        let snapshot: Vec<Arc<Vertex>> = self.maps.read().vertices.values().cloned().collect();
        snapshot.into_iter()
    }

    pub fn vertices_by_label(&self, label: impl Into<Label>) -> impl Iterator<Item = Arc<Vertex>> {
        let label = label.into();
        self.vertices().filter(move |v| v.label() == &label)
    }

    /// Remove a vertex together with every incident edge
    ///
    /// Hyperedges whose tail is the vertex go too; other hyperedges drop it
    /// from their heads. Returns `false` without touching anything when the
    /// vertex is not a member of this graph.
    pub fn remove_vertex(&self, vertex: &Vertex) -> bool {
        let mut events = Vec::new();
        {
            let mut maps = self.maps.write();
            if !maps.has_vertex(vertex) {
                debug!("Ignoring removal of foreign vertex {}", vertex.id());
                return false;
            }

            let (outgoing, incoming) = vertex.take_edges();
            for edge_id in outgoing.iter().chain(incoming.iter()) {
                if let Some(edge) = self.remove_edge_locked(&mut maps, edge_id) {
                    events.push(Self::removed(&*edge));
                }
            }

            let doomed: Vec<ElementId> = maps
                .hyper_edges
                .values()
                .filter(|h| h.tail_id() == vertex.id())
                .map(|h| h.id().clone())
                .collect();
            for id in doomed {
                if let Some(hyper) = maps.hyper_edges.shift_remove(&id) {
                    self.hyper_edge_count.fetch_sub(1, Ordering::SeqCst);
                    events.push(Self::removed(&*hyper));
                }
            }
            for hyper in maps.hyper_edges.values() {
                hyper.detach_head(vertex.id());
            }

            maps.vertices.shift_remove(vertex.id());
            self.vertex_count.fetch_sub(1, Ordering::SeqCst);
            events.push(Self::removed(vertex));
        }

        debug!("Removed vertex {} and {} dependent elements", vertex.id(), events.len() - 1);
        for event in events {
            self.emit(event);
        }
        true
    }

    // ============================================================
    // Edges
    // ============================================================

    /// Add an edge between two member vertices
    pub fn add_edge(
        &self,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
        id: Option<ElementId>,
        label: impl Into<Label>,
    ) -> GraphResult<Arc<Edge>> {
        self.add_edge_with(out_vertex, in_vertex, id, label, |_| Ok(()))
    }

    /// Add an edge with the default edge label
    pub fn add_unlabeled_edge(
        &self,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
        id: Option<ElementId>,
    ) -> GraphResult<Arc<Edge>> {
        let label = self.config.default_edge_label.clone();
        self.add_edge(out_vertex, in_vertex, id, label)
    }

    /// Add an edge, running `init` on it before it becomes visible
    pub fn add_edge_with<F>(
        &self,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
        id: Option<ElementId>,
        label: impl Into<Label>,
        init: F,
    ) -> GraphResult<Arc<Edge>>
    where
        F: FnOnce(&Edge) -> GraphResult<()>,
    {
        self.check_endpoints(&self.maps.read(), out_vertex, in_vertex)?;

        let mut reservation = self.reserve(ElementKind::Edge, id)?;
        let edge = Arc::new(Edge::new(
            reservation.id.clone(),
            out_vertex.id().clone(),
            in_vertex.id().clone(),
            label,
            Arc::clone(&self.keys),
        ));
        init(&edge)?;
        self.validate(&*edge)?;

        {
            let mut maps = self.maps.write();
            self.check_endpoints(&maps, out_vertex, in_vertex)?;
            reservation.release(&mut maps);
            out_vertex.attach_out_edge(edge.id().clone());
            in_vertex.attach_in_edge(edge.id().clone());
            maps.edges.insert(edge.id().clone(), Arc::clone(&edge));
            self.edge_count.fetch_add(1, Ordering::SeqCst);
        }

        debug!(
            "Added edge {} ({}): {} -> {}",
            edge.id(),
            edge.label(),
            out_vertex.id(),
            in_vertex.id()
        );
        self.emit(Self::added(&*edge));
        Ok(edge)
    }

    fn check_endpoints(
        &self,
        maps: &GraphMaps,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
    ) -> GraphResult<()> {
        if !maps.has_vertex(out_vertex) {
            return Err(GraphError::InvalidEdgeSource(out_vertex.id().clone()));
        }
        if !maps.has_vertex(in_vertex) {
            return Err(GraphError::InvalidEdgeTarget(in_vertex.id().clone()));
        }
        Ok(())
    }

    pub fn edge_by_id(&self, id: &ElementId) -> Option<Arc<Edge>> {
        self.maps.read().edges.get(id).cloned()
    }

    pub fn has_edge(&self, id: &ElementId) -> bool {
        self.maps.read().edges.contains_key(id)
    }

    /// All edges, iterated over a snapshot taken now
    pub fn edges(&self) -> impl Iterator<Item = Arc<Edge>> {
        let snapshot: Vec<Arc<Edge>> = self.maps.read().edges.values().cloned().collect();
        snapshot.into_iter()
    }

    pub fn edges_by_label(&self, label: impl Into<Label>) -> impl Iterator<Item = Arc<Edge>> {
        let label = label.into();
        self.edges().filter(move |e| e.label() == &label)
    }

    /// Remove an edge; `false` when it is not a member of this graph
    pub fn remove_edge(&self, edge: &Edge) -> bool {
        let removed = {
            let mut maps = self.maps.write();
            if !maps.has_edge(edge) {
                return false;
            }
            self.remove_edge_locked(&mut maps, edge.id())
        };
        match removed {
            Some(edge) => {
                debug!("Removed edge {}", edge.id());
                self.emit(Self::removed(&*edge));
                true
            }
            None => false,
        }
    }

    fn remove_edge_locked(
        &self,
        maps: &mut RwLockWriteGuard<'_, GraphMaps>,
        id: &ElementId,
    ) -> Option<Arc<Edge>> {
        let edge = maps.edges.shift_remove(id)?;
        if let Some(v) = maps.vertices.get(edge.out_vertex_id()) {
            v.detach_out_edge(id);
        }
        if let Some(v) = maps.vertices.get(edge.in_vertex_id()) {
            v.detach_in_edge(id);
        }
        for multi in maps.multi_edges.values() {
            multi.detach_edge(id);
        }
        for hyper in maps.hyper_edges.values() {
            hyper.detach_edge(id);
        }
        self.edge_count.fetch_sub(1, Ordering::SeqCst);
        Some(edge)
    }

    /// Outgoing edges of a vertex
    pub fn out_edges(&self, vertex: &Vertex) -> Vec<Arc<Edge>> {
        self.resolve_edges(vertex.out_edge_ids())
    }

    /// Incoming edges of a vertex
    pub fn in_edges(&self, vertex: &Vertex) -> Vec<Arc<Edge>> {
        self.resolve_edges(vertex.in_edge_ids())
    }

    fn resolve_edges(&self, ids: Vec<ElementId>) -> Vec<Arc<Edge>> {
        let maps = self.maps.read();
        ids.iter().filter_map(|id| maps.edges.get(id).cloned()).collect()
    }

    fn resolve_vertices(&self, ids: &[ElementId]) -> Vec<Arc<Vertex>> {
        let maps = self.maps.read();
        ids.iter().filter_map(|id| maps.vertices.get(id).cloned()).collect()
    }

    /// Tail vertex of an edge
    pub fn out_vertex(&self, edge: &Edge) -> Option<Arc<Vertex>> {
        self.vertex_by_id(edge.out_vertex_id())
    }

    /// Head vertex of an edge
    pub fn in_vertex(&self, edge: &Edge) -> Option<Arc<Vertex>> {
        self.vertex_by_id(edge.in_vertex_id())
    }

    // ============================================================
    // Multi-edges
    // ============================================================

    /// Group existing edges into a multi-edge
    pub fn add_multi_edge(
        &self,
        id: Option<ElementId>,
        label: impl Into<Label>,
        edges: &[Arc<Edge>],
    ) -> GraphResult<Arc<MultiEdge>> {
        self.add_multi_edge_with(id, label, edges, |_| Ok(()))
    }

    /// Group existing edges under the default multi-edge label
    pub fn add_unlabeled_multi_edge(
        &self,
        id: Option<ElementId>,
        edges: &[Arc<Edge>],
    ) -> GraphResult<Arc<MultiEdge>> {
        let label = self.config.default_multi_edge_label.clone();
        self.add_multi_edge(id, label, edges)
    }

    pub fn add_multi_edge_with<F>(
        &self,
        id: Option<ElementId>,
        label: impl Into<Label>,
        edges: &[Arc<Edge>],
        init: F,
    ) -> GraphResult<Arc<MultiEdge>>
    where
        F: FnOnce(&MultiEdge) -> GraphResult<()>,
    {
        self.check_edges(&self.maps.read(), edges)?;

        let mut reservation = self.reserve(ElementKind::MultiEdge, id)?;
        let multi = Arc::new(MultiEdge::new(
            reservation.id.clone(),
            label,
            edges.iter().map(|e| e.id().clone()),
            Arc::clone(&self.keys),
        ));
        init(&multi)?;
        self.validate(&*multi)?;

        {
            let mut maps = self.maps.write();
            self.check_edges(&maps, edges)?;
            reservation.release(&mut maps);
            maps.multi_edges.insert(multi.id().clone(), Arc::clone(&multi));
            self.multi_edge_count.fetch_add(1, Ordering::SeqCst);
        }

        debug!("Added multi-edge {} over {} edges", multi.id(), multi.edge_count());
        self.emit(Self::added(&*multi));
        Ok(multi)
    }

    fn check_edges(&self, maps: &GraphMaps, edges: &[Arc<Edge>]) -> GraphResult<()> {
        match edges.iter().find(|e| !maps.has_edge(e)) {
            Some(missing) => Err(GraphError::EdgeNotFound(missing.id().clone())),
            None => Ok(()),
        }
    }

    pub fn multi_edge_by_id(&self, id: &ElementId) -> Option<Arc<MultiEdge>> {
        self.maps.read().multi_edges.get(id).cloned()
    }

    pub fn multi_edges(&self) -> impl Iterator<Item = Arc<MultiEdge>> {
        let snapshot: Vec<Arc<MultiEdge>> =
            self.maps.read().multi_edges.values().cloned().collect();
        snapshot.into_iter()
    }

    pub fn remove_multi_edge(&self, multi: &MultiEdge) -> bool {
        let removed = {
            let mut maps = self.maps.write();
            let member = maps
                .multi_edges
                .get(multi.id())
                .map_or(false, |m| std::ptr::eq(Arc::as_ptr(m), multi));
            if !member {
                return false;
            }
            self.multi_edge_count.fetch_sub(1, Ordering::SeqCst);
            maps.multi_edges.shift_remove(multi.id())
        };
        if let Some(multi) = removed {
            self.emit(Self::removed(&*multi));
        }
        true
    }

    /// Member edges still present in the graph
    pub fn multi_edge_edges(&self, multi: &MultiEdge) -> Vec<Arc<Edge>> {
        self.resolve_edges(multi.edge_ids())
    }

    /// Distinct endpoints of the member edges, in first-seen order
    pub fn multi_edge_vertices(&self, multi: &MultiEdge) -> Vec<Arc<Vertex>> {
        let mut ids: Vec<ElementId> = Vec::new();
        for edge in self.multi_edge_edges(multi) {
            for id in [edge.out_vertex_id(), edge.in_vertex_id()] {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }
        self.resolve_vertices(&ids)
    }

    // ============================================================
    // Hyperedges
    // ============================================================

    /// Add a hyperedge from `tail` to every vertex in `heads`
    pub fn add_hyper_edge(
        &self,
        id: Option<ElementId>,
        label: impl Into<Label>,
        tail: &Vertex,
        heads: &[Arc<Vertex>],
        edges: &[Arc<Edge>],
    ) -> GraphResult<Arc<HyperEdge>> {
        self.add_hyper_edge_with(id, label, tail, heads, edges, |_| Ok(()))
    }

    /// Add a hyperedge with the default hyperedge label
    pub fn add_unlabeled_hyper_edge(
        &self,
        id: Option<ElementId>,
        tail: &Vertex,
        heads: &[Arc<Vertex>],
        edges: &[Arc<Edge>],
    ) -> GraphResult<Arc<HyperEdge>> {
        let label = self.config.default_hyper_edge_label.clone();
        self.add_hyper_edge(id, label, tail, heads, edges)
    }

    pub fn add_hyper_edge_with<F>(
        &self,
        id: Option<ElementId>,
        label: impl Into<Label>,
        tail: &Vertex,
        heads: &[Arc<Vertex>],
        edges: &[Arc<Edge>],
        init: F,
    ) -> GraphResult<Arc<HyperEdge>>
    where
        F: FnOnce(&HyperEdge) -> GraphResult<()>,
    {
        self.check_hyper_members(&self.maps.read(), tail, heads, edges)?;

        let mut reservation = self.reserve(ElementKind::HyperEdge, id)?;
        let hyper = Arc::new(HyperEdge::new(
            reservation.id.clone(),
            label,
            tail.id().clone(),
            heads.iter().map(|v| v.id().clone()),
            edges.iter().map(|e| e.id().clone()),
            Arc::clone(&self.keys),
        ));
        init(&hyper)?;
        self.validate(&*hyper)?;

        {
            let mut maps = self.maps.write();
            self.check_hyper_members(&maps, tail, heads, edges)?;
            reservation.release(&mut maps);
            maps.hyper_edges.insert(hyper.id().clone(), Arc::clone(&hyper));
            self.hyper_edge_count.fetch_add(1, Ordering::SeqCst);
        }

        debug!("Added hyperedge {} from {} to {} heads", hyper.id(), tail.id(), heads.len());
        self.emit(Self::added(&*hyper));
        Ok(hyper)
    }

    fn check_hyper_members(
        &self,
        maps: &GraphMaps,
        tail: &Vertex,
        heads: &[Arc<Vertex>],
        edges: &[Arc<Edge>],
    ) -> GraphResult<()> {
        if !maps.has_vertex(tail) {
            return Err(GraphError::VertexNotFound(tail.id().clone()));
        }
        if let Some(missing) = heads.iter().find(|v| !maps.has_vertex(v)) {
            return Err(GraphError::VertexNotFound(missing.id().clone()));
        }
        self.check_edges(maps, edges)
    }

    pub fn hyper_edge_by_id(&self, id: &ElementId) -> Option<Arc<HyperEdge>> {
        self.maps.read().hyper_edges.get(id).cloned()
    }

    pub fn hyper_edges(&self) -> impl Iterator<Item = Arc<HyperEdge>> {
        let snapshot: Vec<Arc<HyperEdge>> =
            self.maps.read().hyper_edges.values().cloned().collect();
        snapshot.into_iter()
    }

    pub fn remove_hyper_edge(&self, hyper: &HyperEdge) -> bool {
        let removed = {
            let mut maps = self.maps.write();
            let member = maps
                .hyper_edges
                .get(hyper.id())
                .map_or(false, |h| std::ptr::eq(Arc::as_ptr(h), hyper));
            if !member {
                return false;
            }
            self.hyper_edge_count.fetch_sub(1, Ordering::SeqCst);
            maps.hyper_edges.shift_remove(hyper.id())
        };
        if let Some(hyper) = removed {
            self.emit(Self::removed(&*hyper));
        }
        true
    }

    /// Tail followed by the heads still present in the graph
    pub fn hyper_edge_vertices(&self, hyper: &HyperEdge) -> Vec<Arc<Vertex>> {
        self.resolve_vertices(&hyper.vertex_ids())
    }

    pub fn hyper_edge_edges(&self, hyper: &HyperEdge) -> Vec<Arc<Edge>> {
        self.resolve_edges(hyper.edge_ids())
    }

    // ============================================================
    // Counts
    // ============================================================

    pub fn number_of_vertices(&self) -> usize {
        self.vertex_count.load(Ordering::SeqCst)
    }

    pub fn number_of_edges(&self) -> usize {
        self.edge_count.load(Ordering::SeqCst)
    }

    pub fn number_of_multi_edges(&self) -> usize {
        self.multi_edge_count.load(Ordering::SeqCst)
    }

    pub fn number_of_hyper_edges(&self) -> usize {
        self.hyper_edge_count.load(Ordering::SeqCst)
    }

    /// Clear all elements; ids claimed by adds in flight stay claimed
    pub fn clear(&self) {
        {
            let mut maps = self.maps.write();
            let reserved = std::mem::take(&mut maps.reserved);
            *maps = GraphMaps::default();
            maps.reserved = reserved;
            self.vertex_count.store(0, Ordering::SeqCst);
            self.edge_count.store(0, Ordering::SeqCst);
            self.multi_edge_count.store(0, Ordering::SeqCst);
            self.hyper_edge_count.store(0, Ordering::SeqCst);
        }
        info!("Cleared property graph");
        self.emit(GraphEvent::Cleared);
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyGraph")
            .field("vertices", &self.number_of_vertices())
            .field("edges", &self.number_of_edges())
            .field("multi_edges", &self.number_of_multi_edges())
            .field("hyper_edges", &self.number_of_hyper_edges())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;

    fn vid(id: u64) -> Option<ElementId> {
        Some(ElementId::numeric(id))
    }

    #[test]
    fn test_add_and_get_vertex() {
        let graph = PropertyGraph::new();
        let v = graph.add_vertex(None).unwrap();

        assert_eq!(graph.number_of_vertices(), 1);
        let found = graph.vertex_by_id(v.id()).unwrap();
        assert!(Arc::ptr_eq(&v, &found));
        assert_eq!(found.label().as_str(), "Vertex");
    }

    #[test]
    fn test_add_vertex_with_init() {
        let graph = PropertyGraph::new();
        let v = graph
            .add_vertex_with(vid(1), "Person", |v| {
                v.set_property("name", "marko")?;
                v.set_property("age", 29i64)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(v.property("name").as_string(), Some("marko"));
        assert_eq!(v.property("age").as_integer(), Some(29));
        assert_eq!(v.property("Id"), PropertyValue::Integer(1));
    }

    #[test]
    fn test_duplicate_vertex_id() {
        let graph = PropertyGraph::new();
        graph.add_vertex(vid(1)).unwrap();

        let err = graph.add_vertex(vid(1)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateVertexId(ElementId::numeric(1)));
        assert_eq!(graph.number_of_vertices(), 1);
    }

    #[test]
    fn test_failed_init_rolls_back() {
        let graph = PropertyGraph::new();
        let err = graph
            .add_vertex_with(vid(5), "Person", |v| {
                v.set_property("Id", 6i64)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, GraphError::Property(PropertyError::IdentificationChange(_))));
        assert_eq!(graph.number_of_vertices(), 0);

        // The id was released and can be used again
        assert!(graph.add_vertex(vid(5)).is_ok());
    }

    #[test]
    fn test_generated_ids_skip_taken() {
        let graph = PropertyGraph::new();
        graph.add_vertex(vid(1)).unwrap();
        graph.add_vertex(vid(2)).unwrap();

        let v = graph.add_vertex(None).unwrap();
        assert_eq!(v.id(), &ElementId::numeric(3));
    }

    #[test]
    fn test_constant_id_creator_exhausts() {
        let creator = |_kind: ElementKind| ElementId::numeric(1);
        let graph = PropertyGraph::with_id_creator(GraphConfig::default(), Box::new(creator));
        graph.add_vertex(None).unwrap();
        let err = graph.add_vertex(None).unwrap_err();
        assert_eq!(err, GraphError::IdCreationFailed(ElementKind::Vertex));
    }

    #[test]
    fn test_add_and_get_edge() {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();

        let e = graph.add_edge(&a, &b, None, "knows").unwrap();

        assert_eq!(graph.number_of_edges(), 1);
        let found = graph.edge_by_id(e.id()).unwrap();
        assert_eq!(found.out_vertex_id(), a.id());
        assert_eq!(found.in_vertex_id(), b.id());
        assert!(a.has_out_edge(e.id()));
        assert!(b.has_in_edge(e.id()));
        assert_eq!(graph.out_vertex(&e).unwrap().id(), a.id());
        assert_eq!(graph.in_vertex(&e).unwrap().id(), b.id());
    }

    #[test]
    fn test_edge_validation() {
        let graph = PropertyGraph::new();
        let other = PropertyGraph::new();
        let a = graph.add_vertex(vid(1)).unwrap();
        let foreign = other.add_vertex(vid(1)).unwrap();

        let err = graph.add_edge(&foreign, &a, None, "knows").unwrap_err();
        assert_eq!(err, GraphError::InvalidEdgeSource(ElementId::numeric(1)));

        let err = graph.add_edge(&a, &foreign, None, "knows").unwrap_err();
        assert_eq!(err, GraphError::InvalidEdgeTarget(ElementId::numeric(1)));
        assert_eq!(graph.number_of_edges(), 0);
    }

    #[test]
    fn test_duplicate_edge_id() {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        graph.add_edge(&a, &b, vid(7), "knows").unwrap();

        let err = graph.add_edge(&b, &a, vid(7), "knows").unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdgeId(ElementId::numeric(7)));
        assert_eq!(graph.number_of_edges(), 1);
        assert_eq!(b.out_degree(), 0);
    }

    #[test]
    fn test_adjacency_lists() {
        let graph = PropertyGraph::new();
        let v1 = graph.add_vertex(None).unwrap();
        let v2 = graph.add_vertex(None).unwrap();
        let v3 = graph.add_vertex(None).unwrap();

        graph.add_edge(&v1, &v2, None, "knows").unwrap();
        graph.add_edge(&v1, &v3, None, "knows").unwrap();
        graph.add_edge(&v2, &v3, None, "follows").unwrap();

        assert_eq!(graph.out_edges(&v1).len(), 2);
        assert_eq!(graph.out_edges(&v2).len(), 1);
        assert_eq!(graph.in_edges(&v2).len(), 1);
        assert_eq!(graph.out_edges(&v3).len(), 0);
        assert_eq!(graph.in_edges(&v3).len(), 2);
    }

    #[test]
    fn test_label_filtered_accessors() {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex_with(None, "Person", |_| Ok(())).unwrap();
        let b = graph.add_vertex_with(None, "Person", |_| Ok(())).unwrap();
        let c = graph.add_vertex_with(None, "Software", |_| Ok(())).unwrap();
        graph.add_edge(&a, &b, None, "knows").unwrap();
        graph.add_edge(&a, &c, None, "created").unwrap();

        assert_eq!(graph.vertices_by_label("Person").count(), 2);
        assert_eq!(graph.vertices_by_label("Software").count(), 1);
        assert_eq!(graph.edges_by_label("knows").count(), 1);
        assert_eq!(graph.vertices().count(), 3);
    }

    #[test]
    fn test_unlabeled_adds_use_configured_labels() {
        let graph = PropertyGraph::with_config(GraphConfig {
            default_edge_label: "link".to_string(),
            default_multi_edge_label: "bundle".to_string(),
            default_hyper_edge_label: "fan".to_string(),
            ..GraphConfig::default()
        });
        let a = graph.add_vertex(vid(1)).unwrap();
        let b = graph.add_vertex(vid(2)).unwrap();

        let e = graph.add_unlabeled_edge(&a, &b, None).unwrap();
        assert_eq!(e.label().as_str(), "link");

        let multi = graph.add_unlabeled_multi_edge(None, &[Arc::clone(&e)]).unwrap();
        assert_eq!(multi.label().as_str(), "bundle");

        let hyper = graph
            .add_unlabeled_hyper_edge(None, &a, &[Arc::clone(&b)], &[])
            .unwrap();
        assert_eq!(hyper.label().as_str(), "fan");
        assert_eq!(graph.edges_by_label("link").count(), 1);
    }

    #[test]
    fn test_default_labels() {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let e = graph.add_unlabeled_edge(&a, &a, None).unwrap();
        assert_eq!(e.label().as_str(), "Edge");
    }

    #[test]
    fn test_remove_vertex() {
        let graph = PropertyGraph::new();
        let v1 = graph.add_vertex(None).unwrap();
        let v2 = graph.add_vertex(None).unwrap();
        let v3 = graph.add_vertex(None).unwrap();
        let e12 = graph.add_edge(&v1, &v2, None, "knows").unwrap();
        let e31 = graph.add_edge(&v3, &v1, None, "knows").unwrap();
        let e23 = graph.add_edge(&v2, &v3, None, "knows").unwrap();

        assert!(graph.remove_vertex(&v1));
        assert_eq!(graph.number_of_vertices(), 2);
        assert_eq!(graph.number_of_edges(), 1);
        assert!(!graph.has_edge(e12.id()));
        assert!(!graph.has_edge(e31.id()));
        assert!(!v2.has_in_edge(e12.id()));
        assert!(!v3.has_out_edge(e31.id()));
        assert!(v2.has_out_edge(e23.id()));

        // Second removal is a no-op
        assert!(!graph.remove_vertex(&v1));
        assert_eq!(graph.number_of_vertices(), 2);
    }

    #[test]
    fn test_remove_vertex_with_self_loop() {
        let graph = PropertyGraph::new();
        let v = graph.add_vertex(None).unwrap();
        graph.add_edge(&v, &v, None, "self").unwrap();
        assert!(graph.remove_vertex(&v));
        assert_eq!(graph.number_of_edges(), 0);
        assert_eq!(graph.number_of_vertices(), 0);
    }

    #[test]
    fn test_remove_foreign_vertex_is_noop() {
        let graph = PropertyGraph::new();
        let other = PropertyGraph::new();
        graph.add_vertex(vid(1)).unwrap();
        let foreign = other.add_vertex(vid(1)).unwrap();

        assert!(!graph.remove_vertex(&foreign));
        assert_eq!(graph.number_of_vertices(), 1);
    }

    #[test]
    fn test_remove_edge() {
        let graph = PropertyGraph::new();
        let v1 = graph.add_vertex(None).unwrap();
        let v2 = graph.add_vertex(None).unwrap();
        let e = graph.add_edge(&v1, &v2, None, "knows").unwrap();

        assert!(graph.remove_edge(&e));
        assert_eq!(graph.number_of_edges(), 0);
        assert_eq!(graph.out_edges(&v1).len(), 0);
        assert_eq!(graph.in_edges(&v2).len(), 0);
        assert!(!graph.remove_edge(&e));
    }

    #[test]
    fn test_multiple_edges_between_vertices() {
        let graph = PropertyGraph::new();
        let v1 = graph.add_vertex(None).unwrap();
        let v2 = graph.add_vertex(None).unwrap();

        let e1 = graph.add_edge(&v1, &v2, None, "knows").unwrap();
        let e2 = graph.add_edge(&v1, &v2, None, "knows").unwrap();
        let e3 = graph.add_edge(&v1, &v2, None, "works_with").unwrap();

        assert_ne!(e1.id(), e2.id());
        assert_ne!(e2.id(), e3.id());
        assert_eq!(graph.out_edges(&v1).len(), 3);
    }

    #[test]
    fn test_multi_edge_lifecycle() {
        let graph = PropertyGraph::new();
        let v1 = graph.add_vertex(None).unwrap();
        let v2 = graph.add_vertex(None).unwrap();
        let v3 = graph.add_vertex(None).unwrap();
        let e1 = graph.add_edge(&v1, &v2, None, "knows").unwrap();
        let e2 = graph.add_edge(&v1, &v3, None, "knows").unwrap();

        let m = graph
            .add_multi_edge(vid(100), "acquaintances", &[Arc::clone(&e1), Arc::clone(&e2)])
            .unwrap();
        assert_eq!(graph.number_of_multi_edges(), 1);
        assert_eq!(graph.multi_edge_edges(&m).len(), 2);
        assert_eq!(graph.multi_edge_vertices(&m).len(), 3);

        let err = graph.add_multi_edge(vid(100), "again", &[]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateMultiEdgeId(ElementId::numeric(100)));

        graph.remove_edge(&e1);
        assert_eq!(m.edge_ids(), vec![e2.id().clone()]);

        assert!(graph.remove_multi_edge(&m));
        assert_eq!(graph.number_of_multi_edges(), 0);
    }

    #[test]
    fn test_multi_edge_requires_member_edges() {
        let graph = PropertyGraph::new();
        let other = PropertyGraph::new();
        let a = other.add_vertex(None).unwrap();
        let b = other.add_vertex(None).unwrap();
        let foreign = other.add_edge(&a, &b, vid(9), "knows").unwrap();

        let err = graph.add_multi_edge(None, "m", &[foreign]).unwrap_err();
        assert_eq!(err, GraphError::EdgeNotFound(ElementId::numeric(9)));
    }

    #[test]
    fn test_hyper_edge_lifecycle() {
        let graph = PropertyGraph::new();
        let tail = graph.add_vertex(None).unwrap();
        let h1 = graph.add_vertex(None).unwrap();
        let h2 = graph.add_vertex(None).unwrap();

        let hyper = graph
            .add_hyper_edge(None, "created", &tail, &[Arc::clone(&h1), Arc::clone(&h2)], &[])
            .unwrap();
        assert_eq!(graph.hyper_edge_vertices(&hyper).len(), 3);

        graph.remove_vertex(&h1);
        assert_eq!(hyper.head_ids(), vec![h2.id().clone()]);
        assert_eq!(graph.number_of_hyper_edges(), 1);

        graph.remove_vertex(&tail);
        assert_eq!(graph.number_of_hyper_edges(), 0);
        assert!(graph.hyper_edge_by_id(hyper.id()).is_none());
    }

    #[test]
    fn test_clear() {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        graph.add_edge(&a, &b, None, "knows").unwrap();

        graph.clear();
        assert_eq!(graph.number_of_vertices(), 0);
        assert_eq!(graph.number_of_edges(), 0);
        assert_eq!(graph.vertices().count(), 0);
    }

    #[test]
    fn test_schema_validator() {
        let graph = PropertyGraph::new().with_schema_validator(|e: &dyn HasProperties| {
            if e.kind() == ElementKind::Vertex && !e.has_property("name") {
                Err("vertices need a name".to_string())
            } else {
                Ok(())
            }
        });

        let err = graph.add_vertex(vid(1)).unwrap_err();
        assert!(matches!(err, GraphError::SchemaViolation { kind: ElementKind::Vertex, .. }));
        assert_eq!(graph.number_of_vertices(), 0);

        let ok = graph.add_vertex_with(vid(1), "Person", |v| {
            v.set_property("name", "josh")?;
            Ok(())
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn test_events() {
        let (graph, mut rx) = PropertyGraph::with_events(GraphConfig::default());
        let a = graph.add_vertex(vid(1)).unwrap();
        let b = graph.add_vertex(vid(2)).unwrap();
        graph.add_edge(&a, &b, vid(3), "knows").unwrap();
        graph.remove_vertex(&a);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[3],
            GraphEvent::ElementRemoved {
                kind: ElementKind::Edge,
                id: ElementId::numeric(3),
                label: Label::new("knows"),
            }
        );
        assert_eq!(events[4].kind(), Some(ElementKind::Vertex));
    }

    #[test]
    fn test_concurrent_duplicate_ids() {
        let graph = PropertyGraph::new();
        let successes = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    if graph.add_vertex(vid(42)).is_ok() {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(graph.number_of_vertices(), 1);
    }

    #[test]
    fn test_custom_key_names() {
        let config = GraphConfig {
            id_key: "_id".to_string(),
            rev_id_key: "_rev".to_string(),
            ..GraphConfig::default()
        };
        let graph = PropertyGraph::with_config(config);
        let v = graph.add_vertex(vid(3)).unwrap();
        assert_eq!(v.property("_id"), PropertyValue::Integer(3));
        assert!(v.set_property("_rev", 1i64).is_err());
        assert!(v.set_property("Id", 1i64).is_ok());
    }
}
