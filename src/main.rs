use samyama_wrappers::graph::{Direction, Element, GraphResult, MemoryGraph, PropertyGraph};
use samyama_wrappers::{BatchGraph, EventGraph, Features, LoggingListener, WrapperConfig};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Samyama Graph Wrappers v{}", samyama_wrappers::version());
    println!("==========================================");
    println!();

    // Optional YAML config as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => match WrapperConfig::from_yaml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => WrapperConfig::default(),
    };

    if let Err(e) = demo_bulk_load(&config) {
        eprintln!("Bulk load failed: {}", e);
        std::process::exit(1);
    }
}

fn demo_bulk_load(config: &WrapperConfig) -> GraphResult<()> {
    println!("=== Bulk load through the decorator stack ===");

    // Native IDs only, with transactions, so every layer has work to do
    let base = MemoryGraph::with_features(Features {
        supports_vertex_ids: false,
        supports_edge_ids: false,
        supports_transactions: true,
    });
    let mut events = EventGraph::with_config(base, &config.events)?;
    events.add_listener(LoggingListener);

    let mut loader = BatchGraph::with_config(events, config.batch.clone())?;

    let triples = [
        ("http://example.org/people/alice", "knows", "http://example.org/people/bob"),
        ("http://example.org/people/alice", "knows", "http://example.org/people/carol"),
        ("http://example.org/people/bob", "knows", "http://example.org/people/carol"),
        ("http://example.org/people/carol", "worksWith", "http://example.org/people/alice"),
    ];
    for (tail, label, head) in triples {
        loader.add_edge_by_ids(None, &tail.into(), &head.into(), label)?;
    }
    loader.shutdown()?;

    let stats = loader.stats();
    println!(
        "✓ Loaded {} vertices and {} edges ({} cache hits)",
        stats.vertices_created, stats.edges_created, stats.vertex_hits
    );

    let alice_id = "http://example.org/people/alice".into();
    if let Some(alice) = loader.get_vertex(&alice_id)? {
        for friend in loader.adjacent_vertices(&alice, Direction::Out, &["knows"])? {
            println!("  {} knows {}", alice.id(), friend.id());
        }
    }
    Ok(())
}
