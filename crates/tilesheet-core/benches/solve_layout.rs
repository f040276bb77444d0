use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use tilesheet_core::prelude::*;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(u32, u32)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            (
                rng.gen_range(min_size..=max_size),
                rng.gen_range(min_size..=max_size),
            )
        })
        .collect()
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_layout");
    for count in [2usize, 5, 10] {
        let sizes = generate_sizes(count, 16, 512);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("solve", count), &sizes, |b, sizes| {
            b.iter(|| black_box(tilesheet_core::solve(sizes, 10)))
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let sizes = generate_sizes(10, 32, 128);
    let inputs: Vec<InputTile> = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| InputTile {
            name: format!("tile_{i}.png"),
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                w,
                h,
                Rgba([(i * 20) as u8, 80, 160, 255]),
            )),
        })
        .collect();
    let cfg = SheetConfig::default();

    c.bench_function("merge_10_tiles", |b| {
        b.iter(|| black_box(merge_tiles(inputs.clone(), &cfg)))
    });

    if let Ok(out) = merge_tiles(inputs.clone(), &cfg) {
        let composite = DynamicImage::ImageRgba8(out.composite);
        c.bench_function("split_10_regions", |b| {
            b.iter(|| black_box(split_sheet(&composite, &out.manifest, &cfg)))
        });
    }
}

criterion_group!(benches, bench_solve, bench_round_trip);
criterion_main!(benches);
