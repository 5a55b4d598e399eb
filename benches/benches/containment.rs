// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use roibridge_region::{PlaneComposite, Region, adapter};
use roibridge_shape::{BoundaryType, PlaneCoordinate, RemoteRoi, RemoteShape, ShapeGeometry};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// A star-shaped polygon with `n` vertices around `(100, 100)`.
fn gen_star(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * core::f64::consts::TAU;
            let r = if i % 2 == 0 { 100.0 } else { 45.0 };
            Point::new(100.0 + r * angle.cos(), 100.0 + r * angle.sin())
        })
        .collect()
}

fn gen_points(count: usize, extent: f64) -> Vec<[f64; 3]> {
    let mut rng = Rng::new(0x81FD_BEE7_94F0_AF1A);
    (0..count)
        .map(|_| {
            [
                rng.next_f64() * extent,
                rng.next_f64() * extent,
                rng.next_f64() * 16.0,
            ]
        })
        .collect()
}

/// One disk per z plane, shrinking with depth.
fn gen_stack(planes: i32) -> PlaneComposite {
    let roi = RemoteRoi::from_shapes((0..planes).map(|z| {
        let r = 100.0 - f64::from(z) * 4.0;
        RemoteShape::new(ShapeGeometry::Ellipse {
            x: 100.0,
            y: 100.0,
            radius_x: r,
            radius_y: r,
        })
        .on_plane(PlaneCoordinate::new(z, -1, -1).unwrap())
    }));
    adapter::from_remote_roi(&roi).unwrap()
}

fn bench_polygon_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygon_contains");
    let queries = gen_points(1024, 200.0);
    group.throughput(Throughput::Elements(queries.len() as u64));
    for &n in &[8_usize, 64, 512] {
        for boundary in [BoundaryType::Closed, BoundaryType::Unspecified] {
            let region = Region::polygon(gen_star(n), boundary);
            group.bench_with_input(
                BenchmarkId::new(format!("{boundary:?}"), n),
                &region,
                |b, region| {
                    b.iter(|| {
                        let mut hits = 0_usize;
                        for q in &queries {
                            hits += usize::from(region.contains(black_box(&q[..2])));
                        }
                        hits
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_composite_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_contains");
    let queries = gen_points(1024, 200.0);
    group.throughput(Throughput::Elements(queries.len() as u64));
    for &planes in &[4_i32, 16] {
        let composite = gen_stack(planes);
        group.bench_with_input(
            BenchmarkId::from_parameter(planes),
            &composite,
            |b, composite| {
                b.iter(|| {
                    let mut hits = 0_usize;
                    for q in &queries {
                        hits += usize::from(composite.contains(black_box(q)));
                    }
                    hits
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_polygon_contains, bench_composite_contains);
criterion_main!(benches);
