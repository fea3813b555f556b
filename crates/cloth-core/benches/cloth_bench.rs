//! Benchmarks for cloth-core
//!
//! Run with: `cargo bench -p cloth-core`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Affine3A, Vec3};

use cloth_core::{
    segment_distance, ClothConfig, ClothMesh, ClothSolver, ColliderIndex, ColliderSample,
    ColliderSampler,
};

/// Sphere surface sampled on a latitude/longitude lattice.
fn sphere_surface(centre: Vec3, radius: f32, rings: usize, segments: usize) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut positions = Vec::with_capacity(rings * segments);
    let mut normals = Vec::with_capacity(rings * segments);
    for r in 1..rings {
        let theta = std::f32::consts::PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = std::f32::consts::TAU * s as f32 / segments as f32;
            let n = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            positions.push(centre + n * radius);
            normals.push(n);
        }
    }
    (positions, normals)
}

// ============================================================================
// Segment distance
// ============================================================================

fn bench_segment_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_distance");

    group.bench_function("skew", |b| {
        let (p0, p1) = (Vec3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, -0.1, 0.3));
        let (q0, q1) = (Vec3::new(0.1, -1.0, 1.0), Vec3::new(-0.2, 1.0, 0.8));
        b.iter(|| segment_distance(black_box(p0), black_box(p1), black_box(q0), black_box(q1)));
    });

    group.bench_function("parallel", |b| {
        let (p0, p1) = (Vec3::ZERO, Vec3::X);
        let (q0, q1) = (Vec3::new(0.5, 1.0, 0.0), Vec3::new(1.5, 1.0, 0.0));
        b.iter(|| segment_distance(black_box(p0), black_box(p1), black_box(q0), black_box(q1)));
    });

    group.finish();
}

// ============================================================================
// Collider index
// ============================================================================

fn bench_collider_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("collider_index");

    let (positions, normals) = sphere_surface(Vec3::new(0.0, 1.0, 0.0), 0.5, 64, 64);
    let mut sampler = ColliderSampler::new(0.02);
    let samples = sampler.sample(&positions, &normals);

    group.bench_function("build_4k", |b| {
        let mut index = ColliderIndex::new(0.05);
        b.iter(|| {
            index.build(black_box(&samples));
            index.bucket_count()
        });
    });

    group.bench_function("query_4k", |b| {
        let index = ColliderIndex::from_samples(&samples, 0.05);
        b.iter(|| {
            let mut hits = 0;
            for p in &positions {
                index.query_neighbors(black_box(*p), |_| hits += 1);
            }
            hits
        });
    });

    group.finish();
}

// ============================================================================
// Cloth step
// ============================================================================

fn bench_cloth_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloth_step");
    group.sample_size(20);

    let (positions, normals) = sphere_surface(Vec3::new(0.5, 0.5, 0.5), 0.3, 32, 32);

    for model in [
        cloth_core::CollisionModel::PointToPoint,
        cloth_core::CollisionModel::SegmentToSegment,
    ] {
        let config = ClothConfig {
            collision_model: model,
            collision_radius: 0.02,
            bucket_size: 0.05,
            iterations: 10,
            ..ClothConfig::default()
        };
        let mesh = ClothMesh::grid(32, 32, 1.0 / 31.0);
        let transform = Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0));

        group.bench_function(format!("grid_32x32_{model:?}_30_steps"), |b| {
            b.iter(|| {
                let Ok(mut cloth) =
                    ClothSolver::new(&mesh, config.clone(), transform, Affine3A::IDENTITY)
                else {
                    return 0;
                };
                let mut sampler = ColliderSampler::new(config.collision_radius);
                let samples: Vec<ColliderSample> = sampler.sample(&positions, &normals);
                let dt = 1.0 / 60.0;
                let mut collided = 0;
                for k in 0..30 {
                    collided += cloth.step(black_box(dt), dt * k as f32, &samples).collided;
                }
                collided
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_segment_distance,
    bench_collider_index,
    bench_cloth_step,
);
criterion_main!(benches);
