//! Fluent pipeline composition
//!
//! A `Pipeline` wraps the last pipe of a chain. Each builder method appends
//! one pipe, so the chain reads in traversal order:
//!
//! ```rust
//! use pipegraph::graph::{ElementId, HasProperties, PropertyGraph, PropertyValue};
//! use pipegraph::pipes::Pipeline;
//! use std::sync::Arc;
//!
//! let graph = Arc::new(PropertyGraph::new());
//! let marko = graph.add_vertex_with(Some(ElementId::numeric(1)), "Person", |v| {
//!     v.set_property("name", "marko")?;
//!     Ok(())
//! }).unwrap();
//! let vadas = graph.add_vertex_with(Some(ElementId::numeric(2)), "Person", |v| {
//!     v.set_property("name", "vadas")?;
//!     Ok(())
//! }).unwrap();
//! graph.add_edge(&marko, &vadas, None, "knows").unwrap();
//!
//! let names: Vec<_> = Pipeline::new(vec![marko])
//!     .out_edges(&graph, &["knows"])
//!     .in_vertex(&graph)
//!     .property("name")
//!     .collect();
//! assert_eq!(names, vec![PropertyValue::from("vadas")]);
//! ```

use super::expand::{EdgesPipe, HyperEdgeVerticesPipe, MultiEdgeEdgesPipe, VerticesPipe};
use super::filter::{
    CollectionFilterPipe, ComparisonFilterPipe, ComparisonOp, DuplicateFilterPipe,
    LabelFilterPipe, ObjectFilterPipe, PropertyFilterPipe, RandomFilterPipe, RangeFilterPipe,
    UniquePathFilterPipe,
};
use super::side_effect::{Aggregate, Counter, GroupCounts, SideEffect, SideEffectPipe};
use super::transform::{IdPipe, IdentityPipe, LabelPipe, PropertyPipe, RevIdPipe, SelectPipe};
use super::{Path, Pipe, PipeBox, PipeItem, PipeResult, PipeState, StartPipe, Starts};
use crate::graph::{
    Edge, ElementId, HasProperties, HyperEdge, Label, MultiEdge, PropertyGraph, PropertyValue,
    RevisionId, Vertex,
};
use std::hash::Hash;
use std::sync::Arc;

/// An ordered chain of pipes behaving as one pipe
///
/// `set_starts` binds the first pipe; `advance` drives the last, which pulls
/// upstream transitively. A pipeline is also an `Iterator` over its outputs.
pub struct Pipeline<S, E> {
    pipe: PipeBox<S, E>,
}

impl<T: PipeItem> Pipeline<T, T> {
    /// Start a pipeline over the given values
    pub fn new<I>(starts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            pipe: Box::new(StartPipe::over(starts)),
        }
    }

    /// Start a pipeline with no source bound yet
    pub fn unbound() -> Self {
        Self {
            pipe: Box::new(StartPipe::new()),
        }
    }
}

impl Pipeline<Arc<Vertex>, Arc<Vertex>> {
    /// Start from every vertex of the graph, as of now
    pub fn vertices(graph: &PropertyGraph) -> Self {
        Self::new(graph.vertices())
    }
}

impl Pipeline<Arc<Edge>, Arc<Edge>> {
    /// Start from every edge of the graph, as of now
    pub fn edges(graph: &PropertyGraph) -> Self {
        Self::new(graph.edges())
    }
}

impl<S: PipeItem, E: PipeItem> Pipeline<S, E> {
    pub fn from_pipe(pipe: PipeBox<S, E>) -> Self {
        Self { pipe }
    }

    pub fn into_pipe(self) -> PipeBox<S, E> {
        self.pipe
    }

    /// Append an arbitrary pipe built from the current chain
    pub fn then<O, F>(self, build: F) -> Pipeline<S, O>
    where
        O: PipeItem,
        F: FnOnce(PipeBox<S, E>) -> PipeBox<S, O>,
    {
        Pipeline {
            pipe: build(self.pipe),
        }
    }

    /// Rebind the source of the first pipe
    pub fn set_starts<I>(&mut self, starts: I)
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: Send + 'static,
    {
        self.pipe.set_starts(Box::new(starts.into_iter()));
    }

    /// Drain the pipeline, pairing each output with its path
    pub fn paths(mut self) -> Vec<(E, Path)> {
        let mut out = Vec::new();
        while let Some(item) = self.pipe.next_item() {
            out.push((item, self.pipe.path()));
        }
        out
    }

    // ============================================================
    // Transforms
    // ============================================================

    pub fn identity(self) -> Self {
        self.then(|p| Box::new(IdentityPipe::new(p)))
    }

    pub fn select<O: PipeItem>(self, f: impl FnMut(&E) -> O + Send + 'static) -> Pipeline<S, O> {
        self.then(|p| Box::new(SelectPipe::new(p, f)))
    }

    // ============================================================
    // Filters
    // ============================================================

    pub fn filter(self, f: impl FnMut(&E) -> bool + Send + 'static) -> Self {
        self.then(|p| Box::new(ObjectFilterPipe::new(p, f)))
    }

    pub fn compare(self, op: ComparisonOp, value: E) -> Self
    where
        E: PartialOrd,
    {
        self.then(|p| Box::new(ComparisonFilterPipe::new(p, op, value)))
    }

    pub fn retain(self, items: impl IntoIterator<Item = E>) -> Self
    where
        E: Eq + Hash,
    {
        self.then(|p| Box::new(CollectionFilterPipe::retain(p, items)))
    }

    pub fn exclude(self, items: impl IntoIterator<Item = E>) -> Self
    where
        E: Eq + Hash,
    {
        self.then(|p| Box::new(CollectionFilterPipe::exclude(p, items)))
    }

    pub fn dedup(self) -> Self
    where
        E: Eq + Hash,
    {
        self.then(|p| Box::new(DuplicateFilterPipe::new(p)))
    }

    pub fn unique_path(self) -> Self {
        self.then(|p| Box::new(UniquePathFilterPipe::new(p)))
    }

    pub fn random(self, probability: f64) -> PipeResult<Self> {
        let pipe = RandomFilterPipe::new(self.pipe, probability)?;
        Ok(Self::from_pipe(Box::new(pipe)))
    }

    pub fn range(self, low: usize, high: Option<usize>) -> PipeResult<Self> {
        let pipe = RangeFilterPipe::new(self.pipe, low, high)?;
        Ok(Self::from_pipe(Box::new(pipe)))
    }

    // ============================================================
    // Side effects
    // ============================================================

    /// Feed every output into `sink`, passing outputs through unchanged
    pub fn side_effect<K>(self, sink: K) -> Self
    where
        K: SideEffect<E> + 'static,
    {
        self.then(|p| Box::new(SideEffectPipe::with_sink(p, sink)))
    }

    pub fn count_into(self, counter: &Counter) -> Self {
        self.side_effect(counter.clone())
    }

    pub fn aggregate_into(self, aggregate: &Aggregate<E>) -> Self {
        self.side_effect(aggregate.clone())
    }

    pub fn group_count_into(self, groups: &GroupCounts<E>) -> Self
    where
        E: Eq + Hash,
    {
        self.side_effect(groups.clone())
    }
}

impl<S, T> Pipeline<S, Arc<T>>
where
    S: PipeItem,
    T: HasProperties + Send + Sync + 'static,
    Arc<T>: PipeItem,
{
    pub fn id(self) -> Pipeline<S, ElementId> {
        self.then(|p| Box::new(IdPipe::new(p)))
    }

    pub fn label(self) -> Pipeline<S, Label> {
        self.then(|p| Box::new(LabelPipe::new(p)))
    }

    pub fn rev_id(self) -> Pipeline<S, RevisionId> {
        self.then(|p| Box::new(RevIdPipe::new(p)))
    }

    pub fn property(self, key: impl Into<String>) -> Pipeline<S, PropertyValue> {
        self.then(|p| Box::new(PropertyPipe::new(p, key)))
    }

    pub fn has_label(self, label: impl Into<Label>) -> Self {
        self.then(|p| Box::new(LabelFilterPipe::new(p, ComparisonOp::Equal, label)))
    }

    pub fn has(
        self,
        key: impl Into<String>,
        op: ComparisonOp,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.then(|p| Box::new(PropertyFilterPipe::new(p, key, op, value)))
    }
}

impl<S: PipeItem> Pipeline<S, Arc<Vertex>> {
    pub fn out_edges(self, graph: &Arc<PropertyGraph>, labels: &[&str]) -> Pipeline<S, Arc<Edge>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(EdgesPipe::out_edges(p, graph, labels)))
    }

    pub fn in_edges(self, graph: &Arc<PropertyGraph>, labels: &[&str]) -> Pipeline<S, Arc<Edge>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(EdgesPipe::in_edges(p, graph, labels)))
    }

    pub fn both_edges(
        self,
        graph: &Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Pipeline<S, Arc<Edge>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(EdgesPipe::both_edges(p, graph, labels)))
    }

    /// Adjacent vertices over outgoing edges
    pub fn out(self, graph: &Arc<PropertyGraph>, labels: &[&str]) -> Pipeline<S, Arc<Vertex>> {
        self.out_edges(graph, labels).in_vertex(graph)
    }

    /// Adjacent vertices over incoming edges
    pub fn in_(self, graph: &Arc<PropertyGraph>, labels: &[&str]) -> Pipeline<S, Arc<Vertex>> {
        self.in_edges(graph, labels).out_vertex(graph)
    }
}

impl<S: PipeItem> Pipeline<S, Arc<Edge>> {
    pub fn out_vertex(self, graph: &Arc<PropertyGraph>) -> Pipeline<S, Arc<Vertex>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(VerticesPipe::out_vertex(p, graph)))
    }

    pub fn in_vertex(self, graph: &Arc<PropertyGraph>) -> Pipeline<S, Arc<Vertex>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(VerticesPipe::in_vertex(p, graph)))
    }

    pub fn both_vertices(self, graph: &Arc<PropertyGraph>) -> Pipeline<S, Arc<Vertex>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(VerticesPipe::both_vertices(p, graph)))
    }
}

impl<S: PipeItem> Pipeline<S, Arc<MultiEdge>> {
    pub fn multi_edge_edges(
        self,
        graph: &Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Pipeline<S, Arc<Edge>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(MultiEdgeEdgesPipe::new(p, graph, labels)))
    }
}

impl<S: PipeItem> Pipeline<S, Arc<HyperEdge>> {
    pub fn hyper_edge_vertices(
        self,
        graph: &Arc<PropertyGraph>,
        labels: &[&str],
    ) -> Pipeline<S, Arc<Vertex>> {
        let graph = Arc::clone(graph);
        self.then(|p| Box::new(HyperEdgeVerticesPipe::new(p, graph, labels)))
    }
}

impl<S: PipeItem, E: PipeItem> Pipe for Pipeline<S, E> {
    type Start = S;
    type End = E;

    fn set_starts(&mut self, starts: Starts<S>) {
        self.pipe.set_starts(starts);
    }

    fn advance(&mut self) -> bool {
        self.pipe.advance()
    }

    fn current(&self) -> Option<&E> {
        self.pipe.current()
    }

    fn path(&self) -> Path {
        self.pipe.path()
    }

    fn reset(&mut self) {
        self.pipe.reset();
    }

    fn state(&self) -> PipeState {
        self.pipe.state()
    }
}

impl<S: PipeItem, E: PipeItem> Iterator for Pipeline<S, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.pipe.next_item()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipes::{RunningStats, Value};

    #[test]
    fn test_select_and_filter_chain() {
        let out: Vec<i64> = Pipeline::new(vec![1i64, 2, 3, 4, 5])
            .select(|n| n * n)
            .filter(|n| n % 2 == 1)
            .collect();
        assert_eq!(out, vec![1, 9, 25]);
    }

    #[test]
    fn test_rebinding_starts() {
        let mut pipeline = Pipeline::unbound().select(|n: &i64| n + 1);
        assert!(!pipeline.advance());

        pipeline.set_starts(vec![10i64, 20]);
        assert_eq!(pipeline.state(), PipeState::NotStarted);
        assert_eq!(pipeline.by_ref().collect::<Vec<_>>(), vec![11, 21]);
        assert!(!pipeline.advance());
        assert!(!pipeline.advance());
    }

    #[test]
    fn test_paths_through_filters() {
        let paths = Pipeline::new(vec![1i64, 2])
            .select(|n| n * 10)
            .compare(ComparisonOp::GreaterThan, 10)
            .paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].0, 20);
        assert_eq!(paths[0].1, vec![Value::from(2i64), Value::from(20i64)]);
    }

    #[test]
    fn test_dedup_and_range() {
        let out: Vec<i64> = Pipeline::new(vec![3i64, 1, 3, 2, 1, 4])
            .dedup()
            .range(1, Some(3))
            .unwrap()
            .collect();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_side_effects_in_chain() {
        let counter = Counter::new();
        let stats = RunningStats::new();
        let total: Vec<i64> = Pipeline::new(vec![2i64, 4, 6])
            .count_into(&counter)
            .side_effect(stats.clone())
            .collect();

        assert_eq!(total.len(), 3);
        assert_eq!(counter.count(), 3);
        assert_eq!(stats.mean(), Some(4.0));
    }

    #[test]
    fn test_random_rejects_bad_probability() {
        assert!(Pipeline::new(vec![1i64]).random(2.0).is_err());
        let all: Vec<i64> = Pipeline::new(vec![1i64, 2]).random(1.0).unwrap().collect();
        assert_eq!(all, vec![1, 2]);
    }
}
