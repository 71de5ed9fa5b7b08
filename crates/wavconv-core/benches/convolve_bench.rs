//! Benchmarks for the transform engine and the convolution pipeline
//!
//! Run with: cargo bench -p wavconv-core --bench convolve_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use wavconv_core::buffer::InterleavedBuffer;
use wavconv_core::fft::{self, Direction, Execution};
use wavconv_core::{convolve_direct, Convolver, SizingPolicy};

fn test_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (i as f64 * 0.013).sin() * 0.5 + (i as f64 * 0.171).cos() * 0.25)
        .collect()
}

fn decaying_impulse(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (-(i as f64) / (len as f64 / 4.0)).exp())
        .collect()
}

// ============================================================================
// Transform Engine Benchmarks
// ============================================================================

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for log2 in [8u32, 10, 12, 14, 16].iter() {
        let k = 1usize << log2;
        let buffer = InterleavedBuffer::from_real(&test_signal(k), k);

        group.throughput(Throughput::Elements(k as u64));

        group.bench_with_input(BenchmarkId::new("forward", k), &k, |b, &k| {
            b.iter(|| {
                let mut data = buffer.clone().into_inner();
                fft::transform(black_box(&mut data), k, Direction::Forward)
            })
        });
    }

    group.finish();
}

fn bench_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution");
    group.measurement_time(Duration::from_secs(5));

    for log2 in [12u32, 16, 18].iter() {
        let k = 1usize << log2;
        let buffer = InterleavedBuffer::from_real(&test_signal(k), k);

        for (name, execution) in [
            ("sequential", Execution::Sequential),
            ("parallel", Execution::Parallel),
        ] {
            group.bench_with_input(BenchmarkId::new(name, k), &k, |b, &k| {
                b.iter(|| {
                    let mut data = buffer.clone().into_inner();
                    fft::transform_with(black_box(&mut data), k, Direction::Forward, execution)
                })
            });
        }
    }

    group.finish();
}

// ============================================================================
// Convolution Benchmarks
// ============================================================================

fn bench_fft_vs_direct(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_vs_direct");

    let x = test_signal(4096);
    for ir_len in [16usize, 128, 1024].iter() {
        let h = decaying_impulse(*ir_len);
        let convolver = Convolver::new(SizingPolicy::Linear);

        group.throughput(Throughput::Elements((x.len() + h.len() - 1) as u64));

        group.bench_with_input(BenchmarkId::new("fft", ir_len), ir_len, |b, _| {
            b.iter(|| convolver.convolve(black_box(&x), black_box(&h)))
        });

        group.bench_with_input(BenchmarkId::new("direct", ir_len), ir_len, |b, _| {
            b.iter(|| convolve_direct(black_box(&x), black_box(&h)))
        });
    }

    group.finish();
}

fn bench_reverb_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverb");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    // One second of audio against a two second room response at 44.1 kHz
    let x = test_signal(44_100);
    let h = decaying_impulse(88_200);

    for policy in [SizingPolicy::Linear, SizingPolicy::Reference] {
        let convolver = Convolver::new(policy);
        group.bench_function(BenchmarkId::new("convolve", policy), |b| {
            b.iter(|| convolver.convolve(black_box(&x), black_box(&h)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_transform,
    bench_execution,
    bench_fft_vs_direct,
    bench_reverb_length,
);

criterion_main!(benches);
