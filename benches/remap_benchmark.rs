use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sampling_remap::{IdRemapTable, IdType, ParallelConfig, WorkerPool};

const CAPACITY: usize = 1 << 22;

fn sampled_ids(len: usize, distinct: u32) -> Vec<IdType> {
    // Scatter over the full capacity with heavy repetition, like a neighbour sample.
    (0..len as u32)
        .map(|i| (i % distinct).wrapping_mul(2_654_435_761) % CAPACITY as u32)
        .collect()
}

fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap_populate");
    let input = sampled_ids(1 << 20, 1 << 16);
    group.throughput(Throughput::Elements(input.len() as u64));

    for threads in [1, 4, 8] {
        let pool = WorkerPool::new(ParallelConfig::default().with_num_threads(threads)).unwrap();
        let mut table = IdRemapTable::new(CAPACITY);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &input, |b, input| {
            b.iter(|| {
                table.populate(&pool, black_box(input));
                black_box(table.num_items());
                table.reset(&pool);
            });
        });
    }
    group.finish();
}

fn bench_map_edges(c: &mut Criterion) {
    let pool = WorkerPool::with_threads(8).unwrap();
    let table = IdRemapTable::new(CAPACITY);
    let src = sampled_ids(1 << 20, 1 << 14);
    let dst = sampled_ids(1 << 20, 1 << 16);
    table.populate(&pool, &src);
    table.populate(&pool, &dst);
    let mut new_src = vec![0; src.len()];
    let mut new_dst = vec![0; dst.len()];

    let mut group = c.benchmark_group("remap_map_edges");
    group.throughput(Throughput::Elements(src.len() as u64));
    group.bench_function("1M_edges", |b| {
        b.iter(|| {
            table.map_edges(&pool, &src, &dst, &mut new_src, &mut new_dst);
            black_box(&new_dst);
        });
    });
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    // Reset cost scales with capacity, not with how much of it a batch touched.
    let pool = WorkerPool::with_threads(8).unwrap();
    let mut group = c.benchmark_group("remap_reset");
    for capacity in [1 << 16, 1 << 20, 1 << 22] {
        let mut table = IdRemapTable::new(capacity);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| table.reset(&pool));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_populate, bench_map_edges, bench_reset);
criterion_main!(benches);
