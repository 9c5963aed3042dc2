//! Shared fixture: six vertices and six edges
//!
//! ```text
//! marko(1) -knows(7)-> vadas(2)      josh(4) -created(10)-> ripple(5)
//! marko(1) -knows(8)-> josh(4)       josh(4) -created(11)-> lop(3)
//! marko(1) -created(9)-> lop(3)      peter(6) -created(12)-> lop(3)
//! ```

#![allow(dead_code)]

use pipegraph::graph::{Edge, ElementId, HasProperties, PropertyGraph, Vertex};
use std::sync::Arc;

pub fn classic_graph() -> Arc<PropertyGraph> {
    let graph = Arc::new(PropertyGraph::new());

    let people = [(1, "marko", 29), (2, "vadas", 27), (4, "josh", 32), (6, "peter", 35)];
    for (id, name, age) in people {
        graph
            .add_vertex_with(Some(ElementId::numeric(id)), "person", |v| {
                v.set_property("name", name)?;
                v.set_property("age", age as i64)?;
                Ok(())
            })
            .unwrap();
    }
    for (id, name) in [(3, "lop"), (5, "ripple")] {
        graph
            .add_vertex_with(Some(ElementId::numeric(id)), "software", |v| {
                v.set_property("name", name)?;
                Ok(())
            })
            .unwrap();
    }

    let edges = [
        (7, 1, 2, "knows", 0.5),
        (8, 1, 4, "knows", 1.0),
        (9, 1, 3, "created", 0.4),
        (10, 4, 5, "created", 1.0),
        (11, 4, 3, "created", 0.4),
        (12, 6, 3, "created", 0.2),
    ];
    for (id, from, to, label, weight) in edges {
        let from = vertex(&graph, from);
        let to = vertex(&graph, to);
        graph
            .add_edge_with(&from, &to, Some(ElementId::numeric(id)), label, |e| {
                e.set_property("weight", weight)?;
                Ok(())
            })
            .unwrap();
    }

    graph
}

pub fn vertex(graph: &PropertyGraph, id: u64) -> Arc<Vertex> {
    graph.vertex_by_id(&ElementId::numeric(id)).unwrap()
}

pub fn edge(graph: &PropertyGraph, id: u64) -> Arc<Edge> {
    graph.edge_by_id(&ElementId::numeric(id)).unwrap()
}

pub fn ids<T: HasProperties>(elements: &[Arc<T>]) -> Vec<u64> {
    elements.iter().filter_map(|e| e.id().as_u64()).collect()
}
