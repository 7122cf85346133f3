//! Modified UTF-8, the string encoding of the stream protocol.
//!
//! Differences from standard UTF-8:
//!
//! - U+0000 is encoded as the two bytes `C0 80`, never as a single zero.
//! - Each UTF-16 code unit is encoded on its own; surrogate halves become
//!   three bytes each instead of one four-byte sequence.

/// Byte length of the modified UTF-8 encoding of `units`.
#[must_use]
pub fn encoded_len(units: &[u16]) -> u64 {
    units.iter().map(|&u| unit_len(u)).sum()
}

const fn unit_len(unit: u16) -> u64 {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Append the modified UTF-8 encoding of `units` to `buf`.
#[allow(clippy::cast_possible_truncation)] // each shifted value is masked to a byte first
pub fn encode_into(units: &[u16], buf: &mut Vec<u8>) {
    for &unit in units {
        match unit {
            0x0001..=0x007F => buf.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                buf.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                buf.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                buf.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}

/// Encode `units` into a fresh buffer.
#[must_use]
pub fn encode(units: &[u16]) -> Vec<u8> {
    let capacity = usize::try_from(encoded_len(units)).unwrap_or(units.len() * 3);
    let mut buf = Vec::with_capacity(capacity);
    encode_into(units, &mut buf);
    buf
}
