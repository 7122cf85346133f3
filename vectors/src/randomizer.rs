//! Edge-case biased value source.
//!
//! Integer, char and boolean kinds come straight from the generator's native
//! ranges. Floating-point kinds start from raw random bits and are then
//! pushed into a special-value bucket:
//!
//! | Bucket    | Exponent | Fraction            |
//! |-----------|----------|---------------------|
//! | NaN       | all ones | non-zero            |
//! | Infinity  | all ones | zero                |
//! | Subnormal | zero     | non-zero            |
//! | Zero      | zero     | zero                |
//! | Raw       | as drawn | as drawn            |
//!
//! One uniform sample per value picks the bucket against cumulative
//! thresholds, so observed frequencies match the policy exactly. The sign
//! bit is always the drawn one. A NaN or subnormal draw whose fraction came
//! out zero redraws the fraction until it is not, keeping the buckets
//! disjoint.

use rand::Rng;

use jser_wire::primitive::{JavaString, Primitive, PrimitiveKind};

use crate::error::VectorError;
use crate::shapes::{FieldShape, ShapeId, ShapeRegistry};
use crate::value::{Aggregate, Datum};

const F32_EXPONENT: u32 = 0x7F80_0000;
const F32_FRACTION: u32 = 0x007F_FFFF;
const F64_EXPONENT: u64 = 0x7FF0_0000_0000_0000;
const F64_FRACTION: u64 = 0x000F_FFFF_FFFF_FFFF;

/// Probabilities of the special float buckets. The remainder is raw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialFloatPolicy {
    pub p_nan: f32,
    pub p_infinity: f32,
    pub p_subnormal: f32,
    pub p_zero: f32,
}

impl Default for SpecialFloatPolicy {
    fn default() -> Self {
        Self {
            p_nan: 0.05,
            p_infinity: 0.05,
            p_subnormal: 0.05,
            p_zero: 0.05,
        }
    }
}

/// Special-value bucket of one float draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBucket {
    Nan,
    Infinity,
    Subnormal,
    Zero,
    Raw,
}

impl SpecialFloatPolicy {
    /// Policy that never forces a special value.
    #[must_use]
    pub fn raw_only() -> Self {
        Self {
            p_nan: 0.0,
            p_infinity: 0.0,
            p_subnormal: 0.0,
            p_zero: 0.0,
        }
    }

    /// # Errors
    ///
    /// [`VectorError::InvalidPolicy`] if a probability is outside `[0, 1]`
    /// or they sum past 1.
    pub fn validate(&self) -> Result<(), VectorError> {
        let named = [
            ("p_nan", self.p_nan),
            ("p_infinity", self.p_infinity),
            ("p_subnormal", self.p_subnormal),
            ("p_zero", self.p_zero),
        ];
        for (name, p) in named {
            if !(0.0..=1.0).contains(&p) {
                return Err(VectorError::InvalidPolicy {
                    detail: format!("{name} = {p} is outside [0, 1]"),
                });
            }
        }
        let total: f32 = named.iter().map(|(_, p)| p).sum();
        if total > 1.0 {
            return Err(VectorError::InvalidPolicy {
                detail: format!("probabilities sum to {total}"),
            });
        }
        Ok(())
    }

    /// Bucket of a uniform sample in `[0, 1)`, checked in the fixed order
    /// NaN, Infinity, Subnormal, Zero.
    #[must_use]
    pub fn classify(&self, sample: f32) -> FloatBucket {
        let mut threshold = self.p_nan;
        if sample < threshold {
            return FloatBucket::Nan;
        }
        threshold += self.p_infinity;
        if sample < threshold {
            return FloatBucket::Infinity;
        }
        threshold += self.p_subnormal;
        if sample < threshold {
            return FloatBucket::Subnormal;
        }
        threshold += self.p_zero;
        if sample < threshold {
            return FloatBucket::Zero;
        }
        FloatBucket::Raw
    }
}

/// Force raw `f32` bits into `bucket`.
pub fn shape_f32_bits<R: Rng + ?Sized>(bucket: FloatBucket, bits: u32, rng: &mut R) -> u32 {
    match bucket {
        FloatBucket::Nan => nonzero_fraction_f32(bits | F32_EXPONENT, rng),
        FloatBucket::Infinity => (bits | F32_EXPONENT) & !F32_FRACTION,
        FloatBucket::Subnormal => nonzero_fraction_f32(bits & !F32_EXPONENT, rng),
        FloatBucket::Zero => bits & !(F32_EXPONENT | F32_FRACTION),
        FloatBucket::Raw => bits,
    }
}

/// Force raw `f64` bits into `bucket`.
pub fn shape_f64_bits<R: Rng + ?Sized>(bucket: FloatBucket, bits: u64, rng: &mut R) -> u64 {
    match bucket {
        FloatBucket::Nan => nonzero_fraction_f64(bits | F64_EXPONENT, rng),
        FloatBucket::Infinity => (bits | F64_EXPONENT) & !F64_FRACTION,
        FloatBucket::Subnormal => nonzero_fraction_f64(bits & !F64_EXPONENT, rng),
        FloatBucket::Zero => bits & !(F64_EXPONENT | F64_FRACTION),
        FloatBucket::Raw => bits,
    }
}

fn nonzero_fraction_f32<R: Rng + ?Sized>(mut bits: u32, rng: &mut R) -> u32 {
    while bits & F32_FRACTION == 0 {
        bits |= rng.gen::<u32>() & F32_FRACTION;
    }
    bits
}

fn nonzero_fraction_f64<R: Rng + ?Sized>(mut bits: u64, rng: &mut R) -> u64 {
    while bits & F64_FRACTION == 0 {
        bits |= rng.gen::<u64>() & F64_FRACTION;
    }
    bits
}

/// Value source. Holds only the policy; all entropy comes from the caller's
/// generator, so a fixed seed and call sequence reproduce every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Randomizer {
    policy: SpecialFloatPolicy,
}

impl Randomizer {
    /// # Errors
    ///
    /// [`VectorError::InvalidPolicy`] if `policy` does not validate.
    pub fn new(policy: SpecialFloatPolicy) -> Result<Self, VectorError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    #[must_use]
    pub fn policy(&self) -> &SpecialFloatPolicy {
        &self.policy
    }

    /// One value of `kind`.
    pub fn next<R: Rng + ?Sized>(&self, kind: PrimitiveKind, rng: &mut R) -> Primitive {
        match kind {
            PrimitiveKind::Byte => Primitive::Byte(rng.gen()),
            PrimitiveKind::Char => Primitive::Char(rng.gen()),
            PrimitiveKind::Double => Primitive::Double(self.next_double(rng)),
            PrimitiveKind::Float => Primitive::Float(self.next_float(rng)),
            PrimitiveKind::Int => Primitive::Int(rng.gen()),
            PrimitiveKind::Long => Primitive::Long(rng.gen()),
            PrimitiveKind::Short => Primitive::Short(rng.gen()),
            PrimitiveKind::Boolean => Primitive::Boolean(rng.gen()),
        }
    }

    /// A kind chosen uniformly.
    pub fn next_kind<R: Rng + ?Sized>(rng: &mut R) -> PrimitiveKind {
        PrimitiveKind::ALL[rng.gen_range(0..PrimitiveKind::ALL.len())]
    }

    pub fn next_float<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let bits: u32 = rng.gen();
        let bucket = self.policy.classify(rng.gen());
        f32::from_bits(shape_f32_bits(bucket, bits, rng))
    }

    pub fn next_double<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let bits: u64 = rng.gen();
        let bucket = self.policy.classify(rng.gen());
        f64::from_bits(shape_f64_bits(bucket, bits, rng))
    }

    /// A random identifier in UUID v4 layout.
    pub fn next_string<R: Rng + ?Sized>(&self, rng: &mut R) -> JavaString {
        let mut bytes: [u8; 16] = rng.gen();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        let hex = hex::encode(bytes);
        JavaString::from(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    /// A record of `shape` with every field drawn, nested shapes recursively.
    ///
    /// # Errors
    ///
    /// [`VectorError::UnsupportedFieldShape`] for array fields, which the
    /// generic filler does not produce.
    pub fn fill<R: Rng + ?Sized>(
        &self,
        registry: &ShapeRegistry,
        shape: ShapeId,
        rng: &mut R,
    ) -> Result<Aggregate, VectorError> {
        let def = registry.def(shape);
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in def.fields {
            let datum = match field.shape {
                FieldShape::Primitive(kind) => Datum::Prim(self.next(kind, rng)),
                FieldShape::String => Datum::Str(self.next_string(rng)),
                FieldShape::Nested(inner) => Datum::Aggregate(self.fill(registry, inner, rng)?),
                FieldShape::PrimitiveArray(kind) => {
                    return Err(VectorError::UnsupportedFieldShape {
                        shape: def.simple_name.to_string(),
                        field: field.name.to_string(),
                        detail: format!("{kind}[]"),
                    });
                }
            };
            fields.push((field.name.to_string(), datum));
        }
        Ok(Aggregate {
            shape,
            class_name: registry.class_name(shape),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn f32_bucket_of(bits: u32) -> FloatBucket {
        let (exp, frac) = (bits & F32_EXPONENT, bits & F32_FRACTION);
        match (exp, frac) {
            (F32_EXPONENT, 0) => FloatBucket::Infinity,
            (F32_EXPONENT, _) => FloatBucket::Nan,
            (0, 0) => FloatBucket::Zero,
            (0, _) => FloatBucket::Subnormal,
            _ => FloatBucket::Raw,
        }
    }

    fn f64_bucket_of(bits: u64) -> FloatBucket {
        let (exp, frac) = (bits & F64_EXPONENT, bits & F64_FRACTION);
        match (exp, frac) {
            (F64_EXPONENT, 0) => FloatBucket::Infinity,
            (F64_EXPONENT, _) => FloatBucket::Nan,
            (0, 0) => FloatBucket::Zero,
            (0, _) => FloatBucket::Subnormal,
            _ => FloatBucket::Raw,
        }
    }

    #[test]
    fn default_thresholds() {
        let p = SpecialFloatPolicy::default();
        assert_eq!(p.classify(0.0), FloatBucket::Nan);
        assert_eq!(p.classify(0.049), FloatBucket::Nan);
        assert_eq!(p.classify(0.07), FloatBucket::Infinity);
        assert_eq!(p.classify(0.12), FloatBucket::Subnormal);
        assert_eq!(p.classify(0.17), FloatBucket::Zero);
        assert_eq!(p.classify(0.21), FloatBucket::Raw);
        assert_eq!(p.classify(0.999), FloatBucket::Raw);
    }

    #[test]
    fn policy_validation() {
        assert!(SpecialFloatPolicy::default().validate().is_ok());
        let bad = SpecialFloatPolicy {
            p_nan: -0.1,
            ..SpecialFloatPolicy::default()
        };
        assert!(matches!(bad.validate(), Err(VectorError::InvalidPolicy { .. })));
        let over = SpecialFloatPolicy {
            p_nan: 0.5,
            p_infinity: 0.5,
            p_subnormal: 0.1,
            p_zero: 0.0,
        };
        assert!(over.validate().is_err());
        assert!(Randomizer::new(over).is_err());
    }

    #[test]
    fn zero_fraction_nan_draw_is_redrawn() {
        let mut rng = StdRng::seed_from_u64(1);
        let bits = shape_f32_bits(FloatBucket::Nan, 0x8000_0000, &mut rng);
        assert!(f32::from_bits(bits).is_nan());
        assert_eq!(bits & 0x8000_0000, 0x8000_0000);
        let bits = shape_f64_bits(FloatBucket::Subnormal, 0, &mut rng);
        assert!(f64::from_bits(bits).is_subnormal());
    }

    #[test]
    fn sign_survives_infinity_and_zero() {
        let mut rng = StdRng::seed_from_u64(2);
        let neg = 0xBF80_0000; // -1.0
        assert_eq!(
            f32::from_bits(shape_f32_bits(FloatBucket::Infinity, neg, &mut rng)),
            f32::NEG_INFINITY
        );
        let z = f32::from_bits(shape_f32_bits(FloatBucket::Zero, neg, &mut rng));
        assert!(z == 0.0 && z.is_sign_negative());
    }

    #[test]
    fn same_seed_same_values() {
        let r = Randomizer::default();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..64)
                .map(|_| {
                    let kind = Randomizer::next_kind(&mut rng);
                    r.next(kind, &mut rng).to_be_bytes()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(9), draw(9));
        assert_ne!(draw(9), draw(10));
    }

    #[test]
    fn bucket_frequencies_follow_policy() {
        let policy = SpecialFloatPolicy {
            p_nan: 0.25,
            p_infinity: 0.25,
            p_subnormal: 0.25,
            p_zero: 0.25,
        };
        let r = Randomizer::new(policy).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            let v = r.next_double(&mut rng);
            let idx = match f64_bucket_of(v.to_bits()) {
                FloatBucket::Nan => 0,
                FloatBucket::Infinity => 1,
                FloatBucket::Subnormal => 2,
                FloatBucket::Zero => 3,
                FloatBucket::Raw => panic!("raw bucket with zero raw mass"),
            };
            counts[idx] += 1;
        }
        for c in counts {
            assert!((800..1200).contains(&c), "{counts:?}");
        }
    }

    #[test]
    fn uuid_layout() {
        let mut rng = StdRng::seed_from_u64(4);
        let s = Randomizer::default().next_string(&mut rng);
        let text = String::from_utf16(s.units()).unwrap();
        assert_eq!(text.len(), 36);
        assert_eq!(&text[14..15], "4");
        assert_eq!(text.matches('-').count(), 4);
    }

    #[test]
    fn fill_rejects_array_fields() {
        let registry = ShapeRegistry::default();
        let mut rng = StdRng::seed_from_u64(5);
        let err = Randomizer::default()
            .fill(&registry, ShapeId::Series, &mut rng)
            .unwrap_err();
        assert!(matches!(err, VectorError::UnsupportedFieldShape { .. }));
    }

    #[test]
    fn fill_nested() {
        let registry = ShapeRegistry::default();
        let mut rng = StdRng::seed_from_u64(6);
        let agg = Randomizer::default()
            .fill(&registry, ShapeId::Nested, &mut rng)
            .unwrap();
        let labels: Vec<&str> = agg.fields.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["id", "inner", "label"]);
        assert!(matches!(agg.get("inner"), Some(Datum::Aggregate(inner)) if inner.fields.len() == 8));
    }

    proptest! {
        #[test]
        fn f32_buckets_are_exclusive(bits in any::<u32>(), sample in 0f32..1.0, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let bucket = SpecialFloatPolicy::default().classify(sample);
            let out = shape_f32_bits(bucket, bits, &mut rng);
            prop_assert_eq!(out & 0x8000_0000, bits & 0x8000_0000);
            if bucket != FloatBucket::Raw {
                prop_assert_eq!(f32_bucket_of(out), bucket);
            }
        }

        #[test]
        fn f64_buckets_are_exclusive(bits in any::<u64>(), sample in 0f32..1.0, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let bucket = SpecialFloatPolicy::default().classify(sample);
            let out = shape_f64_bits(bucket, bits, &mut rng);
            prop_assert_eq!(out >> 63, bits >> 63);
            if bucket != FloatBucket::Raw {
                prop_assert_eq!(f64_bucket_of(out), bucket);
            }
        }
    }
}
