//! Benchmarks for geometry extraction
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wrlglb_parsers::{decode_text, extract_geometry, find_blocks, ParseOptions};

/// A scene of `shapes` grid panels, each `n`x`n` quads
fn grid_scene(shapes: usize, n: usize) -> String {
    let mut out = String::from("#VRML V2.0 utf8\n");

    for shape in 0..shapes {
        out.push_str("Shape { geometry IndexedFaceSet { coord Coordinate { point [\n");
        for y in 0..=n {
            for x in 0..=n {
                out.push_str(&format!("{} {} {},\n", x as f32 * 0.01, y as f32 * 0.01, shape as f32 * 0.1));
            }
        }
        out.push_str("] }\ncoordIndex [\n");
        let row = n + 1;
        for y in 0..n {
            for x in 0..n {
                let a = y * row + x;
                out.push_str(&format!("{} {} {} {} -1,\n", a, a + 1, a + row + 1, a + row));
            }
        }
        out.push_str("] } }\n");
    }

    out
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_geometry");
    let options = ParseOptions::default();

    for (shapes, n) in [(1, 10), (10, 20), (20, 50)] {
        let scene = grid_scene(shapes, n);
        group.throughput(Throughput::Bytes(scene.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("grid", format!("{shapes}x{n}")),
            &scene,
            |b, scene| b.iter(|| extract_geometry(black_box(scene), &options)),
        );
    }

    group.finish();
}

fn bench_find_blocks(c: &mut Criterion) {
    let scene = grid_scene(20, 50);
    c.bench_function("find_blocks", |b| b.iter(|| find_blocks(black_box(&scene))));
}

fn bench_decode(c: &mut Criterion) {
    let scene = grid_scene(20, 50).into_bytes();
    c.bench_function("decode_text_utf8", |b| b.iter(|| decode_text(black_box(&scene))));
}

criterion_group!(benches, bench_extract, bench_find_blocks, bench_decode);
criterion_main!(benches);
