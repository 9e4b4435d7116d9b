//! Cache benchmarks
//!
//! Lookups run under the write lock, so these numbers bound how much the
//! cache adds in front of a provider call.
//!
//! Run with: cargo bench -p contentguard-cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use tokio::runtime::Runtime;

use contentguard_cache::{cache_key, BatchGetItem, BatchSetItem, CacheManager};
use contentguard_core::ContentType;

fn benchmark_cache_key(c: &mut Criterion) {
    let test_cases = vec![
        ("short_text", "hello world".to_string()),
        ("image_url", "https://cdn.example.com/uploads/2024/06/avatar-1234.png".to_string()),
        ("long_text", "lorem ipsum dolor sit amet ".repeat(200)),
    ];

    let mut group = c.benchmark_group("Cache_Key");
    for (name, content) in test_cases {
        group.bench_with_input(BenchmarkId::new("sha256", name), &content, |b, content| {
            b.iter(|| cache_key(black_box(ContentType::Text), black_box(content)));
        });
    }
    group.finish();
}

fn benchmark_get_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("Cache_Get_Set");
    group.sample_size(100);

    for size in [100usize, 1_000, 10_000] {
        let cache = CacheManager::new(size, Duration::from_secs(3600));
        for i in 0..size {
            cache.set(ContentType::Text, &format!("content-{}", i), i, 64);
        }

        group.bench_with_input(BenchmarkId::new("get_hit", size), &size, |b, size| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % size;
                cache.get(ContentType::Text, black_box(&format!("content-{}", i)))
            });
        });

        group.bench_with_input(BenchmarkId::new("get_miss", size), &size, |b, _| {
            b.iter(|| cache.get(ContentType::Text, black_box("never-inserted")));
        });

        group.bench_with_input(BenchmarkId::new("set_evicting", size), &size, |b, size| {
            let mut i = *size;
            b.iter(|| {
                i += 1;
                cache.set(ContentType::Text, black_box(&format!("content-{}", i)), i, 64);
            });
        });
    }

    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let _guard = rt.enter();

    let mut group = c.benchmark_group("Cache_Batch");
    let cache = CacheManager::new(1_000, Duration::from_secs(3600));

    for batch in [10usize, 100] {
        let gets: Vec<BatchGetItem> = (0..batch)
            .map(|i| BatchGetItem::new(ContentType::Image, format!("img-{}", i)))
            .collect();

        group.bench_with_input(BenchmarkId::new("batch_set", batch), &batch, |b, batch| {
            b.iter(|| {
                let items = (0..*batch)
                    .map(|i| BatchSetItem::new(ContentType::Image, format!("img-{}", i), i, 128))
                    .collect();
                cache.batch_set(black_box(items))
            });
        });

        group.bench_with_input(BenchmarkId::new("batch_get", batch), &gets, |b, gets| {
            b.iter(|| cache.batch_get(black_box(gets)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_cache_key,
    benchmark_get_set,
    benchmark_batch
);
criterion_main!(benches);
