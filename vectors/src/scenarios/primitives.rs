//! Scalar scenarios: literal primitives, float specials, integer limits and
//! boxed wrappers.

use jser_wire::primitive::{Primitive, PrimitiveKind};

use super::Session;
use crate::error::VectorError;

pub(super) fn primitives(s: &mut Session<'_>) -> Result<(), VectorError> {
    for value in [
        Primitive::Byte(69),
        Primitive::Char(0x2714),
        Primitive::Double(420e69),
        Primitive::Float(-9e30),
        Primitive::Int(420 * 69),
        Primitive::Long(420 << 54),
        Primitive::Short(-12345),
        Primitive::Boolean(true),
    ] {
        s.prim(value)?;
    }
    Ok(())
}

pub(super) fn floats(s: &mut Session<'_>) -> Result<(), VectorError> {
    let singles = [
        0.5,
        1_000_000.0,
        0.0,
        -0.0,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NAN,
        1e-40,
    ];
    let doubles = [
        0.5,
        1_000_000.0,
        0.0,
        -0.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
        1e-310,
    ];
    for v in singles {
        s.prim(Primitive::Float(v))?;
    }
    for v in doubles {
        s.prim(Primitive::Double(v))?;
    }
    Ok(())
}

pub(super) fn int_limits(s: &mut Session<'_>) -> Result<(), VectorError> {
    for v in [-1, 0, 1, i8::MIN, i8::MAX] {
        s.prim(Primitive::Byte(v))?;
    }
    // 0, MIN, MAX, then the low and high surrogate ranges.
    for v in [0, u16::MIN, u16::MAX, 0xDC00, 0xDFFF, 0xD800, 0xDBFF] {
        s.prim(Primitive::Char(v))?;
    }
    for v in [-1, 0, 1, i32::MIN, i32::MAX] {
        s.prim(Primitive::Int(v))?;
    }
    for v in [-1, 0, 1, i64::MIN, i64::MAX] {
        s.prim(Primitive::Long(v))?;
    }
    for v in [-1, 0, 1, i16::MIN, i16::MAX] {
        s.prim(Primitive::Short(v))?;
    }
    Ok(())
}

pub(super) fn wrappers(s: &mut Session<'_>) -> Result<(), VectorError> {
    for kind in PrimitiveKind::ALL {
        let value = match kind {
            PrimitiveKind::Byte => Primitive::Byte(5),
            PrimitiveKind::Char => Primitive::Char(5),
            PrimitiveKind::Double => Primitive::Double(5.0),
            PrimitiveKind::Float => Primitive::Float(5.0),
            PrimitiveKind::Int => Primitive::Int(5),
            PrimitiveKind::Long => Primitive::Long(5),
            PrimitiveKind::Short => Primitive::Short(5),
            PrimitiveKind::Boolean => Primitive::Boolean(true),
        };
        let id = s.graph.add_wrapper(value);
        s.object(id)?;
    }
    Ok(())
}
