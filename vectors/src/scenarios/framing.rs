//! Framing scenarios: hand-placed block boundaries and a protocol downgrade.

use jser_wire::constants::ProtocolVersion;
use jser_wire::writer::ObjectOutput;
use tracing::debug;

use super::graphs;
use super::hooks;
use super::Session;
use crate::error::VectorError;

/// Bytes of `0x0DEFACED`, written across six blocks: `[] [0d] [] [] [ef ac] [ed]`.
const SPLIT_INT: [u8; 4] = 0x0DEF_ACED_u32.to_be_bytes();

fn byte(s: &mut Session<'_>, b: u8) -> Result<(), VectorError> {
    s.out.write_byte(i8::from_be_bytes([b]))?;
    Ok(())
}

fn bytes_in_block(s: &mut Session<'_>, bytes: &[u8]) -> Result<(), VectorError> {
    s.out.raw_framing().start_block()?;
    for &b in bytes {
        byte(s, b)?;
    }
    s.out.raw_framing().end_block()?;
    Ok(())
}

fn empty_block(s: &mut Session<'_>) -> Result<(), VectorError> {
    s.out.raw_framing().emit_empty_block()?;
    Ok(())
}

pub(super) fn blocks(s: &mut Session<'_>) -> Result<(), VectorError> {
    let [b0, b1, b2, b3] = SPLIT_INT;
    empty_block(s)?;
    bytes_in_block(s, &[b0])?;
    empty_block(s)?;
    empty_block(s)?;
    bytes_in_block(s, &[b1, b2])?;
    bytes_in_block(s, &[b3])?;
    debug!("split int written");

    let class = graphs::empty_class(s);
    let first = s.instance(&class, &[])?;
    let second = s.instance(&class, &[])?;
    s.object(first)?;
    for _ in 0..3 {
        empty_block(s)?;
    }
    s.object(second)
}

pub(super) fn protocol_version(s: &mut Session<'_>) -> Result<(), VectorError> {
    let before = hooks::ext_child(s, 7)?;
    s.object(before)?;
    s.out.reset()?;
    s.out.use_protocol_version(ProtocolVersion::V1)?;
    let after = hooks::ext_child(s, 8)?;
    s.object(after)
}
