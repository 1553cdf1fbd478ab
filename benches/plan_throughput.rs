//! Planner throughput benchmarks.
//!
//! Run with: cargo bench --bench plan_throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use swapcore::{IntervalPlanner, MemoryRequest};

/// Forward/backward request shape: one activation per layer, live from
/// its forward tick to the matching backward tick, gradients trailing.
fn forward_backward_requests(layers: usize) -> Vec<MemoryRequest> {
    let total = 2 * layers as u64;
    let mut requests = Vec::with_capacity(layers * 2);
    for i in 0..layers {
        let start = i as u64;
        let end = total - i as u64;
        requests.push(MemoryRequest::new(4096 * (1 + i % 7), start, end));
    }
    for i in 0..layers {
        requests.push(MemoryRequest::wgrad(2048, (layers + i) as u64, total));
    }
    requests
}

fn bench_plan_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_layout");
    let planner = IntervalPlanner::new();

    for layers in [16usize, 128, 1024] {
        let requests = forward_backward_requests(layers);
        group.throughput(Throughput::Elements(requests.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(layers), |b| {
            b.iter(|| planner.plan_layout(black_box(&requests)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan_layout);
criterion_main!(benches);
