//! String framing edges.

use jser_wire::primitive::JavaString;

use super::Session;
use crate::error::VectorError;

/// Longest run of one-byte units that still fits `TC_STRING`.
const SHORT_STRING_MAX: usize = 0xFFFF;

pub(super) fn strings(s: &mut Session<'_>) -> Result<(), VectorError> {
    s.string(JavaString::from(""))?;
    s.string(JavaString::from_units(vec![0]))?;
    s.string(JavaString::repeat_unit(u16::from(b'a'), SHORT_STRING_MAX))?;
    s.string(JavaString::repeat_unit(u16::from(b'b'), SHORT_STRING_MAX + 1))?;
    s.string(JavaString::all_code_units())?;
    Ok(())
}
