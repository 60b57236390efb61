use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dmgboy_common::bench::generate_data;
use dmgboy_hashing::crc32::crc32;

fn benchmark_hashing(c: &mut Criterion) {
    let data = generate_data(10_000_000_usize);

    let mut group = c.benchmark_group("hashing");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("crc32", |b| {
        b.iter(|| {
            let value = crc32(black_box(&data));
            black_box(value);
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_hashing);
criterion_main!(benches);
