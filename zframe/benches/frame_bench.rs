//! Performance benchmarks for the frame container.
//!
//! Measures compression and decompression throughput across data patterns
//! (uniform, random, repetitive, text-like) and header parsing latency.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use zframe::{compress, decompress, parse_frame_header};

/// Generate test data patterns for benchmarking.
mod test_data {
    /// Uniform data: one repeated byte, the RLE fast path.
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    /// Deterministic pseudo-random data, the raw-block path.
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Short repeating pattern, common in structured files.
    pub fn repetitive(size: usize) -> Vec<u8> {
        let pattern = b"TOBEORNOTTOBEORTOBEORNOT";
        let mut data = Vec::with_capacity(size);
        while data.len() < size {
            let take = (size - data.len()).min(pattern.len());
            data.extend_from_slice(&pattern[..take]);
        }
        data
    }

    /// Text-like data.
    pub fn text_like(size: usize) -> Vec<u8> {
        let text: &[u8] = b"The quick brown fox jumps over the lazy dog. \
                            Pack my box with five dozen liquor jugs. \
                            How vexingly quick daft zebras jump! ";
        let mut data = Vec::with_capacity(size);
        while data.len() < size {
            let take = (size - data.len()).min(text.len());
            data.extend_from_slice(&text[..take]);
        }
        data
    }
}

fn bench_compress(c: &mut Criterion) {
    let patterns: [(&str, fn(usize) -> Vec<u8>); 4] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("repetitive", test_data::repetitive),
        ("text", test_data::text_like),
    ];

    let mut group = c.benchmark_group("compress");
    for (name, generate) in patterns {
        for size in [1024usize, 128 * 1024, 1024 * 1024] {
            let data = generate(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                b.iter(|| compress(black_box(data)).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let patterns: [(&str, fn(usize) -> Vec<u8>); 3] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("text", test_data::text_like),
    ];

    let mut group = c.benchmark_group("decompress");
    for (name, generate) in patterns {
        for size in [1024usize, 128 * 1024, 1024 * 1024] {
            let frame = compress(&generate(size)).unwrap();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &frame, |b, frame| {
                b.iter(|| decompress(black_box(frame)).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_parse_header(c: &mut Criterion) {
    let frame = compress(&test_data::text_like(64 * 1024)).unwrap();
    c.bench_function("parse_frame_header", |b| {
        b.iter(|| parse_frame_header(black_box(&frame)).unwrap());
    });
}

criterion_group!(benches, bench_compress, bench_decompress, bench_parse_header);
criterion_main!(benches);
