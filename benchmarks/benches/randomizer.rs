use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use jser_vectors::config::{GenerationParams, DEFAULT_SEED};
use jser_vectors::randomizer::{Randomizer, SpecialFloatPolicy};
use jser_vectors::shapes::{ShapeId, ShapeRegistry};
use jser_wire::primitive::PrimitiveKind;

fn bench_primitives(c: &mut Criterion) {
    let randomizer = Randomizer::new(SpecialFloatPolicy::default()).unwrap();
    let mut group = c.benchmark_group("randomizer_next");
    for kind in PrimitiveKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
            b.iter(|| black_box(randomizer.next(kind, &mut rng)));
        });
    }
    group.finish();
}

fn bench_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("randomizer_double_policy");
    for (label, policy) in [
        ("default", SpecialFloatPolicy::default()),
        ("raw_only", SpecialFloatPolicy::raw_only()),
    ] {
        let randomizer = Randomizer::new(policy).unwrap();
        group.bench_function(label, |b| {
            let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
            b.iter(|| black_box(randomizer.next_double(&mut rng)));
        });
    }
    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    let randomizer = Randomizer::new(SpecialFloatPolicy::default()).unwrap();
    let registry = ShapeRegistry::new(&GenerationParams::default().class_prefix);
    let mut group = c.benchmark_group("randomizer_fill");
    for shape in ShapeId::FILLABLE {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{shape:?}")),
            &shape,
            |b, &shape| {
                let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
                b.iter(|| black_box(randomizer.fill(&registry, shape, &mut rng).unwrap()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_primitives, bench_policies, bench_fill);
criterion_main!(benches);
