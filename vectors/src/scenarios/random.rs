//! Seeded mix of primitives and randomly filled records.

use rand::Rng;

use jser_wire::writer::ObjectOutput;

use super::Session;
use crate::error::VectorError;
use crate::randomizer::Randomizer;
use crate::shapes::ShapeId;
use crate::value::Datum;

pub(super) fn random(s: &mut Session<'_>) -> Result<(), VectorError> {
    let items = s.params.random_items;
    let ratio = s.params.primitive_ratio;
    for _ in 0..items {
        if s.rng.gen::<f32>() < ratio {
            let kind = Randomizer::next_kind(&mut s.rng);
            let value = s.randomizer.next(kind, &mut s.rng);
            s.prim(value)?;
        } else {
            let shape = ShapeId::FILLABLE[s.rng.gen_range(0..ShapeId::FILLABLE.len())];
            let record = s.randomizer.fill(&s.registry, shape, &mut s.rng)?;
            let id = s.registry.materialize(&record, &mut s.graph)?;
            s.out.write_object(&s.graph, id.into())?;
            s.oracle_line(&Datum::Aggregate(record))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_with;
    use super::super::Scenario;
    use crate::config::GenerationParams;

    fn params(items: usize, primitive_ratio: f32) -> GenerationParams {
        GenerationParams {
            random_items: items,
            primitive_ratio,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn one_line_per_item() {
        let (_, oracle) = run_with(Scenario::Random, &params(500, 0.5), 3);
        assert_eq!(oracle.lines().count(), 500);
        assert!(oracle.lines().any(|l| l.starts_with('L')));
        assert!(oracle.lines().any(|l| !l.starts_with('L')));
    }

    #[test]
    fn same_seed_same_bytes() {
        let p = params(300, 0.5);
        assert_eq!(run_with(Scenario::Random, &p, 11), run_with(Scenario::Random, &p, 11));
        assert_ne!(run_with(Scenario::Random, &p, 11).0, run_with(Scenario::Random, &p, 12).0);
    }

    #[test]
    fn ratio_extremes() {
        let (_, all_prims) = run_with(Scenario::Random, &params(200, 1.0), 5);
        assert!(all_prims.lines().all(|l| !l.starts_with('L')));

        let (_, all_records) = run_with(Scenario::Random, &params(50, 0.0), 5);
        assert!(all_records.lines().all(|l| l.starts_with("L{\"")));
        // Flat records and the inner record of nested ones both carry `b`.
        assert!(all_records.lines().all(|l| l.contains("\"b\":")));
    }
}
