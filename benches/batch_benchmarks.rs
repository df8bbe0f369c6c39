use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use samyama_wrappers::graph::{Features, Id, MemoryGraph};
use samyama_wrappers::ingest::{Compression, IdentityCompression, UrlCompression};
use samyama_wrappers::{BatchConfig, BatchGraph, CompressionKind};

fn iri(i: usize) -> String {
    format!("http://example.org/dataset/{}/person/{}", i % 16, i)
}

/// Benchmark key compression on IRI-like IDs
fn bench_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression");
    let keys: Vec<String> = (0..10_000).map(iri).collect();

    group.bench_function("identity", |b| {
        b.iter(|| {
            let mut compression = IdentityCompression;
            for key in &keys {
                compression.compress(key);
            }
        });
    });
    group.bench_function("url", |b| {
        b.iter(|| {
            let mut compression = UrlCompression::new();
            for key in &keys {
                compression.compress(key);
            }
        });
    });
    group.finish();
}

/// Benchmark bulk edge loading through the ID cache
fn bench_bulk_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_load");

    for size in [1_000, 10_000].iter() {
        for kind in [CompressionKind::Identity, CompressionKind::Url] {
            let name = format!("{:?}", kind).to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, &size| {
                b.iter(|| {
                    let base = MemoryGraph::with_features(Features {
                        supports_vertex_ids: false,
                        supports_edge_ids: false,
                        supports_transactions: true,
                    });
                    let config = BatchConfig {
                        compression: kind,
                        buffer_size: Some(1_000),
                        ..BatchConfig::default()
                    };
                    let mut loader = BatchGraph::with_config(base, config).unwrap();
                    for i in 0..size {
                        let tail = Id::from(iri(i));
                        let head = Id::from(iri((i * 7 + 1) % size));
                        loader.add_edge_by_ids(None, &tail, &head, "knows").unwrap();
                    }
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compression, bench_bulk_load);
criterion_main!(benches);
