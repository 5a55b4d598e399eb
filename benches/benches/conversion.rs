// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Affine;
use roibridge_region::{Region, adapter};
use roibridge_shape::{BoundaryType, PlaneCoordinate, RemoteShape, ShapeGeometry};
use roibridge_tree::{ImageId, InMemorySession, RoiBridge};

/// A union of `n` boxes spread over planes, under a shared transform.
fn gen_union(n: usize) -> Region {
    let members = (0..n).map(|i| {
        let z = i32::try_from(i % 8).unwrap();
        Region::rect(i as f64 * 3.0, 0.0, 2.0, 2.0, BoundaryType::Closed)
            .on_plane(PlaneCoordinate::new(z, 0, 0).unwrap())
    });
    Region::union(members).transform(Affine::translate((5.0, -2.0)))
}

fn bench_to_remote(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_remote_roi");
    for &n in &[16_usize, 256] {
        let region = gen_union(n);
        group.bench_function(format!("union_{n}"), |b| {
            b.iter(|| adapter::to_remote_roi(black_box(&region)).unwrap());
        });
    }
    group.finish();
}

fn bench_from_remote(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_remote_roi");
    for &n in &[16_usize, 256] {
        let roi = adapter::to_remote_roi(&gen_union(n)).unwrap();
        group.bench_function(format!("shapes_{n}"), |b| {
            b.iter(|| adapter::from_remote_roi(black_box(&roi)).unwrap());
        });
    }
    group.finish();
}

fn bench_resynchronize(c: &mut Criterion) {
    let n = 64;
    let region = gen_union(n);
    let desired: Vec<RemoteShape> = (0..n)
        .map(|i| {
            RemoteShape::new(ShapeGeometry::Point {
                x: i as f64,
                y: 1.0,
            })
        })
        .collect();
    c.bench_function("resynchronize_64", |b| {
        b.iter_batched(
            || {
                let session = Arc::new(InMemorySession::new());
                let mut bridge = RoiBridge::new(session);
                let saved = bridge.upload_region(ImageId(1), 0_u64, &region).unwrap();
                (bridge, saved.id.unwrap())
            },
            |(mut bridge, id)| bridge.resynchronize(id, &desired).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_to_remote,
    bench_from_remote,
    bench_resynchronize
);
criterion_main!(benches);
