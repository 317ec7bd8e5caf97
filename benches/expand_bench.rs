use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use polars::prelude::*;

use work2related::expand::{count_references, expand};

/// Synthetic partition: `works` origin rows with `fan_out` related works each,
/// every second reference resolvable in the lookup.
fn synthetic(works: usize, fan_out: usize) -> (DataFrame, DataFrame) {
    let ids: Vec<String> = (0..works).map(|i| format!("W{}", i)).collect();
    let dates: Vec<&str> = (0..works).map(|_| "2020-01-01").collect();
    let topics: Vec<&str> = (0..works).map(|_| "Astrophysics").collect();
    let related: Vec<String> = (0..works)
        .map(|i| {
            (0..fan_out)
                .map(|j| format!("R{}", (i * fan_out + j) % (works * 2)))
                .collect::<Vec<_>>()
                .join(";")
        })
        .collect();

    let origin = DataFrame::new(vec![
        Column::new("id".into(), &ids),
        Column::new("date".into(), &dates),
        Column::new("related_works".into(), &related),
        Column::new("primary_topic".into(), &topics),
    ])
    .unwrap();

    let lookup_ids: Vec<String> = (0..works).map(|i| format!("R{}", i * 2)).collect();
    let lookup_dates: Vec<&str> = (0..works).map(|_| "2019-01-01").collect();
    let lookup_topics: Vec<&str> = (0..works).map(|_| "Cosmology").collect();
    let lookup = DataFrame::new(vec![
        Column::new("related_work_id".into(), &lookup_ids),
        Column::new("related_publication_date".into(), &lookup_dates),
        Column::new("related_primary_topic".into(), &lookup_topics),
    ])
    .unwrap();

    (origin, lookup)
}

fn bench_expand(c: &mut Criterion) {
    let (origin, lookup) = synthetic(100_000, 10);
    let references = count_references(&origin).unwrap();

    let mut group = c.benchmark_group("expand");
    group.throughput(Throughput::Elements(references as u64));
    group.sample_size(10);

    group.bench_function("expand_100k_x10", |b| {
        b.iter(|| black_box(expand(&origin, &lookup).unwrap()))
    });

    group.bench_function("count_references_100k_x10", |b| {
        b.iter(|| black_box(count_references(&origin).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
