use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skarn_world::{sim::WorldSim, site::settlement::Settlement, util::RandomField, World};
use vek::*;

fn settlement(c: &mut Criterion) {
    c.bench_function("plan", |b| {
        let sim = WorldSim::generate(210);
        let nz = RandomField::new(210);
        let mut i = 0;
        b.iter(|| {
            i += 1;
            black_box(Settlement::generate(Vec2::new(i * 97, -i * 131), &nz, &sim));
        });
    });

    c.bench_function("chunk", |b| {
        let world = World::generate(210);
        let mut i = 0;
        b.iter(|| {
            i += 1;
            black_box(world.generate_chunk(Vec2::new(i % 32, i / 32)));
        });
    });
}

criterion_group!(benches, settlement);
criterion_main!(benches);
