//! Benchmarks for streaming DEFLATE decompression.
//!
//! - One-shot decompression across data patterns and levels
//! - Cost of small output buffers (resumption overhead)
//! - Zlib framing overhead

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::{DeflateEncoder, ZlibEncoder};
use oxiflate_inflate::{Inflater, inflate, zlib_decompress};
use std::hint::black_box;
use std::io::Write;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// Random data - varied byte values
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Highly repetitive data - long matches
    pub fn repeated(size: usize) -> Vec<u8> {
        b"abcdefgh".iter().copied().cycle().take(size).collect()
    }

    /// Text-like data
    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. ";
        text.iter().copied().cycle().take(size).collect()
    }
}

fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).expect("in-memory write");
    encoder.finish().expect("in-memory finish")
}

/// One-shot decompression of 1 MiB in different shapes
fn bench_inflate_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate_patterns");
    let size = 1024 * 1024;

    let patterns: [(&str, PatternGenerator); 3] = [
        ("random", test_data::random),
        ("repeated", test_data::repeated),
        ("text", test_data::text_like),
    ];

    for (name, generator) in patterns {
        let data = generator(size);
        for level in [1, 6, 9] {
            let compressed = deflate(&data, level);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(name, format!("level{}", level)),
                &compressed,
                |b, compressed| b.iter(|| black_box(inflate(black_box(compressed)))),
            );
        }
    }

    group.finish();
}

/// Streaming with small output buffers
fn bench_output_buffer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate_output_buffer");
    let data = test_data::text_like(1024 * 1024);
    let compressed = deflate(&data, 6);

    for buffer_size in [64usize, 1024, 32 * 1024] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &compressed,
            |b, compressed| {
                let mut buffer = vec![0u8; buffer_size];
                b.iter(|| {
                    let mut inflater = Inflater::new();
                    let mut pos = 0;
                    let mut total = 0;
                    while !inflater.finished() {
                        match inflater.inflate(&compressed[pos..], &mut buffer) {
                            Ok(result) => {
                                pos += result.bytes_consumed;
                                total += result.bytes_written;
                            }
                            Err(_) => break,
                        }
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

/// Zlib framing on top of the raw decoder
fn bench_zlib(c: &mut Criterion) {
    let mut group = c.benchmark_group("zlib");
    let data = test_data::text_like(1024 * 1024);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data).expect("in-memory write");
    let compressed = encoder.finish().expect("in-memory finish");

    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("decompress_1MB", |b| {
        b.iter(|| black_box(zlib_decompress(black_box(&compressed))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_inflate_patterns,
    bench_output_buffer_sizes,
    bench_zlib
);
criterion_main!(benches);
