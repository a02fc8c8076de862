use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sampling_remap::validate::{clear_presence_map, presence_map};
use sampling_remap::{BatchValidator, Context, Device, DeviceConfig, IdType, SystemMemory, EMPTY_KEY};

fn bench_validators(c: &mut Criterion) {
    let dev = Device::new(Context::Gpu(0), DeviceConfig::default()).unwrap();
    let stream = dev.stream();
    let validator = BatchValidator::for_stream(&stream);
    let mem = SystemMemory::new();

    let len = 1 << 20;
    let input: Vec<IdType> = (0..len as u32).collect();
    let map = presence_map(&mem, &stream, len).unwrap();

    let mut group = c.benchmark_group("validate");
    group.throughput(Throughput::Elements(len as u64));
    group.bench_function("check_for_duplicates", |b| {
        b.iter(|| {
            clear_presence_map(&map);
            black_box(validator.check_for_duplicates(&stream, &map, &input));
        });
    });
    group.bench_function("check_sentinel_absent", |b| {
        b.iter(|| validator.check_sentinel_absent(&stream, black_box(&input), EMPTY_KEY));
    });
    group.finish();
}

criterion_group!(benches, bench_validators);
criterion_main!(benches);
