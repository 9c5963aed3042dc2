use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pipegraph::arrows::{FilterArrow, MapArrow, SideEffectArrow};
use pipegraph::graph::{ElementId, HasProperties, PropertyGraph, Vertex};
use pipegraph::pipes::{ComparisonOp, Counter, Pipeline};
use pipegraph::{Arrow, Receiver};
use std::sync::Arc;

fn person_graph(size: usize) -> Arc<PropertyGraph> {
    let graph = Arc::new(PropertyGraph::new());
    for i in 0..size {
        graph
            .add_vertex_with(Some(ElementId::numeric(i as u64)), "Person", |v| {
                v.set_property("name", format!("Person{}", i))?;
                v.set_property("age", (i % 100) as i64)?;
                Ok(())
            })
            .unwrap();
    }
    graph
}

/// Chain n0 -> n1 -> ... -> n(len - 1) over KNOWS edges
fn chain_graph(len: usize) -> (Arc<PropertyGraph>, Arc<Vertex>) {
    let graph = person_graph(len);
    let vertices: Vec<_> = (0..len as u64)
        .map(|i| graph.vertex_by_id(&ElementId::numeric(i)).unwrap())
        .collect();
    for pair in vertices.windows(2) {
        graph.add_edge(&pair[0], &pair[1], None, "KNOWS").unwrap();
    }
    let head = Arc::clone(&vertices[0]);
    (graph, head)
}

/// Benchmark vertex insertion throughput
fn bench_vertex_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_insertion");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let graph = person_graph(size);
                criterion::black_box(graph.number_of_vertices());
            });
        });
    }
    group.finish();
}

/// Benchmark label scan performance
fn bench_label_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_scan");

    for size in [100, 1000, 10_000].iter() {
        let graph = person_graph(*size);
        // Also add some noise vertices
        for _ in 0..(*size / 2) {
            graph.add_vertex(None).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let count = Pipeline::vertices(&graph).has_label("Person").count();
                criterion::black_box(count);
            });
        });
    }
    group.finish();
}

/// Benchmark multi-hop traversal latency
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let (graph, head) = chain_graph(100);

    group.bench_function("1_hop", |b| {
        b.iter(|| {
            let names: Vec<_> = Pipeline::new(vec![Arc::clone(&head)])
                .out(&graph, &["KNOWS"])
                .property("name")
                .collect();
            criterion::black_box(names.len());
        });
    });

    group.bench_function("10_hop_with_paths", |b| {
        b.iter(|| {
            let mut pipeline = Pipeline::new(vec![Arc::clone(&head)]);
            for _ in 0..10 {
                pipeline = pipeline.out(&graph, &["KNOWS"]);
            }
            criterion::black_box(pipeline.paths().len());
        });
    });

    group.finish();
}

/// Benchmark property filtering speed
fn bench_property_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_filter");
    let graph = person_graph(1000);

    group.bench_function("equality", |b| {
        b.iter(|| {
            let count = Pipeline::vertices(&graph)
                .has("age", ComparisonOp::Equal, 25_i64)
                .count();
            criterion::black_box(count);
        });
    });

    group.bench_function("range_then_dedup", |b| {
        b.iter(|| {
            let count = Pipeline::vertices(&graph)
                .has("age", ComparisonOp::GreaterThan, 20_i64)
                .has("age", ComparisonOp::LessThan, 40_i64)
                .property("age")
                .dedup()
                .count();
            criterion::black_box(count);
        });
    });

    group.finish();
}

/// Benchmark push delivery through a chain of arrows
fn bench_arrow_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrow_chain");

    let counter = Counter::new();
    let double = Arc::new(MapArrow::new(|n: u64| n * 2));
    let small = Arc::new(FilterArrow::new(|n: &u64| *n < 1000));
    small.subscribe(Arc::new(SideEffectArrow::<u64, _>::new(counter.clone())));
    double.subscribe(small.clone());

    group.bench_function("map_filter_count", |b| {
        b.iter(|| {
            for n in 0..1000_u64 {
                double.receive(n);
            }
            criterion::black_box(counter.count());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_vertex_insertion,
    bench_label_scan,
    bench_traversal,
    bench_property_filter,
    bench_arrow_chain,
);
criterion_main!(benches);
