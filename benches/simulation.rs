//! Benchmarks for the CPU simulation step and the connection scan.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use particle_field::config::{ConnectionConfig, FieldConfig, ParticleConfig};
use particle_field::connections::build_connections;
use particle_field::particle::ParticleStore;
use particle_field::scene::SceneSurface;
use particle_field::{SimRng, SimulationContext};

fn context(count: usize) -> SimulationContext {
    let mut config = FieldConfig::default();
    config.seed = Some(1);
    config.particles.count = count;
    SimulationContext::new(config).expect("default config is valid")
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for count in [50, 150, 500] {
        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, &count| {
            let mut ctx = context(count);
            b.iter(|| black_box(ctx.step(1.0 / 60.0)))
        });
    }

    group.finish();
}

fn bench_build_connections(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_connections");
    let config = ConnectionConfig::default();

    for count in [50, 150, 500] {
        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, &count| {
            let particles = ParticleStore::initialize(
                &ParticleConfig {
                    count,
                    ..ParticleConfig::default()
                },
                &mut SimRng::seeded(2),
            );
            let mut rng = SimRng::seeded(3);
            b.iter(|| black_box(build_connections(particles.as_slice(), &config, &mut rng)))
        });
    }

    group.finish();
}

fn bench_frame_geometry(c: &mut Criterion) {
    let mut ctx = context(150);
    let mut scene = SceneSurface::new(1280, 720, &ctx.config.scene);
    scene.attach(&ctx);
    ctx.step(1.0 / 60.0);

    c.bench_function("frame_geometry", |b| b.iter(|| black_box(scene.frame(&ctx))));
}

criterion_group!(
    benches,
    bench_step,
    bench_build_connections,
    bench_frame_geometry,
);
criterion_main!(benches);
