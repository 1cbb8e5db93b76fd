use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cachelib::simulator::{NoObserver, Simulator};
use cachelib::util::{config_for, synthetic_trace, MAPPINGS, POLICIES};

const TRACE_LENGTH: usize = 100_000;

/// Replays the same synthetic trace through every policy and mapping
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Policies");
    // Span is a few times the cache size so every policy has to evict regularly
    let trace = synthetic_trace(TRACE_LENGTH, 1024, 0x5eed);

    for mapping in MAPPINGS {
        for policy in POLICIES {
            let config = config_for(256, 8, policy, mapping);
            group.bench_with_input(BenchmarkId::new(mapping.to_string(), policy), &config, |bench, conf| {
                bench.iter(|| {
                    let mut simulator = Simulator::new(conf, NoObserver).unwrap();
                    simulator.run(trace.iter().copied())
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
