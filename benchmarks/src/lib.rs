//! Shared helpers for jser benchmark suites.

use rand::rngs::StdRng;
use rand::SeedableRng;

use jser_vectors::config::{GenerationParams, DEFAULT_SEED};
use jser_vectors::randomizer::{Randomizer, SpecialFloatPolicy};
use jser_vectors::scenarios::{run_scenario, Scenario};
use jser_vectors::shapes::{ShapeId, ShapeRegistry};
use jser_vectors::value::Datum;
use jser_wire::primitive::{JavaString, PrimitiveKind};

/// A fixed mix of values to render: every primitive kind, strings and
/// records, drawn from the default policy.
///
/// # Panics
///
/// Panics if the default policy is rejected or a fillable shape fails to
/// fill. Benchmark setup failures are fatal.
#[must_use]
pub fn datum_corpus(per_kind: usize) -> Vec<Datum> {
    let randomizer = Randomizer::new(SpecialFloatPolicy::default()).unwrap();
    let registry = ShapeRegistry::new(&GenerationParams::default().class_prefix);
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let mut corpus = Vec::new();
    for _ in 0..per_kind {
        for kind in PrimitiveKind::ALL {
            corpus.push(Datum::Prim(randomizer.next(kind, &mut rng)));
        }
        corpus.push(Datum::Str(randomizer.next_string(&mut rng)));
        for shape in ShapeId::FILLABLE {
            corpus.push(Datum::Aggregate(randomizer.fill(&registry, shape, &mut rng).unwrap()));
        }
    }
    corpus
}

/// Every UTF-16 code unit, as one string.
#[must_use]
pub fn all_code_units() -> JavaString {
    JavaString::from_units((0..=u16::MAX).collect())
}

/// Run `scenario` into memory; returns (stream bytes, oracle bytes).
///
/// # Panics
///
/// Panics if the scenario fails.
#[must_use]
pub fn run_in_memory(scenario: Scenario, params: &GenerationParams) -> (Vec<u8>, Vec<u8>) {
    let mut bin = Vec::new();
    let mut oracle = Vec::new();
    run_scenario(scenario, params, DEFAULT_SEED, &mut bin, Some(&mut oracle)).unwrap();
    (bin, oracle)
}
