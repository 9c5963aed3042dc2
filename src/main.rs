use anyhow::Result;
use pipegraph::arrows::{ActiveSensor, ChannelReceiver, FilterArrow, MapArrow};
use pipegraph::graph::{ElementId, GraphConfig, HasProperties, PropertyGraph, Vertex};
use pipegraph::pipes::{ComparisonOp, Counter, GroupCounts, Pipeline, RunningStats};
use pipegraph::Arrow;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Pipegraph v{}", pipegraph::version());
    println!("==========================================");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => GraphConfig::from_file(path)?,
        None => GraphConfig::default(),
    };
    let graph = Arc::new(PropertyGraph::with_config(config));
    build_classic_graph(&graph)?;

    // Demo 1: Lazy traversals
    demo_pipes(&graph)?;

    // Demo 2: Push-based arrows
    demo_arrows().await?;

    Ok(())
}

/// The six-person, six-edge graph used throughout the demos
fn build_classic_graph(graph: &PropertyGraph) -> Result<()> {
    let person = |id: u64, name: &str, age: i64| -> Result<Arc<Vertex>> {
        Ok(graph.add_vertex_with(Some(ElementId::numeric(id)), "person", |v| {
            v.set_property("name", name)?;
            v.set_property("age", age)?;
            Ok(())
        })?)
    };
    let software = |id: u64, name: &str| -> Result<Arc<Vertex>> {
        Ok(graph.add_vertex_with(Some(ElementId::numeric(id)), "software", |v| {
            v.set_property("name", name)?;
            v.set_property("lang", "java")?;
            Ok(())
        })?)
    };

    let marko = person(1, "marko", 29)?;
    let vadas = person(2, "vadas", 27)?;
    let lop = software(3, "lop")?;
    let josh = person(4, "josh", 32)?;
    let ripple = software(5, "ripple")?;
    let peter = person(6, "peter", 35)?;

    let edges = [
        (7, &marko, &vadas, "knows", 0.5),
        (8, &marko, &josh, "knows", 1.0),
        (9, &marko, &lop, "created", 0.4),
        (10, &josh, &ripple, "created", 1.0),
        (11, &josh, &lop, "created", 0.4),
        (12, &peter, &lop, "created", 0.2),
    ];
    for (id, from, to, label, weight) in edges {
        graph.add_edge_with(from, to, Some(ElementId::numeric(id)), label, |e| {
            e.set_property("weight", weight)?;
            Ok(())
        })?;
    }

    println!(
        "✓ Loaded {} vertices and {} edges",
        graph.number_of_vertices(),
        graph.number_of_edges()
    );
    Ok(())
}

fn demo_pipes(graph: &Arc<PropertyGraph>) -> Result<()> {
    println!("\n=== Demo 1: Pipes ===");

    let marko = graph
        .vertex_by_id(&ElementId::numeric(1))
        .ok_or_else(|| anyhow::anyhow!("vertex 1 missing"))?;

    let names: Vec<String> = Pipeline::new(vec![Arc::clone(&marko)])
        .out(graph, &["knows"])
        .property("name")
        .map(|name| name.to_string())
        .collect();
    println!("marko knows: {}", names.join(", "));

    let older = Pipeline::vertices(graph)
        .has_label("person")
        .has("age", ComparisonOp::GreaterThan, 30_i64)
        .property("name");
    for name in older {
        println!("  over 30: {}", name);
    }

    // Path of the first co-creator reached through lop
    let paths = Pipeline::new(vec![Arc::clone(&marko)])
        .out(graph, &["created"])
        .in_(graph, &["created"])
        .exclude(vec![Arc::clone(&marko)])
        .property("name")
        .paths();
    if let Some((name, path)) = paths.first() {
        println!("first co-creator: {}", name);
        println!("path: {}", serde_json::to_string(path)?);
    }

    let counter = Counter::new();
    let stats = RunningStats::new();
    let weights: Vec<f64> = Pipeline::edges(graph)
        .count_into(&counter)
        .property("weight")
        .side_effect(stats.clone())
        .filter_map(|w| w.as_float())
        .collect();
    println!(
        "{} edges, weights {:?}, mean {:.2}, std dev {:.3}",
        counter.count(),
        weights,
        stats.mean().unwrap_or(0.0),
        stats.std_dev().unwrap_or(0.0)
    );

    let labels = GroupCounts::new();
    Pipeline::edges(graph)
        .label()
        .group_count_into(&labels)
        .for_each(drop);
    for (label, count) in labels.counts() {
        println!("  {}: {}", label, count);
    }

    Ok(())
}

async fn demo_arrows() -> Result<()> {
    println!("\n=== Demo 2: Arrows ===");

    let ticks = Arc::new(std::sync::atomic::AtomicI64::new(0));
    let source = Arc::clone(&ticks);
    let sensor = ActiveSensor::new(Duration::from_millis(10), move || {
        source.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    });

    let squares = Arc::new(MapArrow::new(|n: i64| n * n));
    let even = Arc::new(FilterArrow::new(|n: &i64| n % 2 == 0));
    let (receiver, mut rx) = ChannelReceiver::<i64>::channel();
    even.subscribe(receiver);
    squares.subscribe(even.clone());
    sensor.subscribe(squares.clone());

    sensor.start()?;
    let mut seen = Vec::new();
    while seen.len() < 5 {
        match rx.recv().await {
            Some(value) => seen.push(value),
            None => break,
        }
    }
    sensor.stop();
    sensor.join().await;

    println!("even squares from the sensor: {:?}", seen);
    Ok(())
}
