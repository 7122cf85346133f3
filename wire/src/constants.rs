//! Wire constants of the object serialization stream protocol.
//!
//! Values are fixed by the protocol; every multi-byte quantity on the wire is
//! big-endian.

/// First two bytes of every stream.
pub const STREAM_MAGIC: u16 = 0xACED;

/// Stream format version written after the magic.
pub const STREAM_VERSION: u16 = 5;

pub const TC_NULL: u8 = 0x70;
pub const TC_REFERENCE: u8 = 0x71;
pub const TC_CLASSDESC: u8 = 0x72;
pub const TC_OBJECT: u8 = 0x73;
pub const TC_STRING: u8 = 0x74;
pub const TC_ARRAY: u8 = 0x75;
pub const TC_CLASS: u8 = 0x76;
pub const TC_BLOCKDATA: u8 = 0x77;
pub const TC_ENDBLOCKDATA: u8 = 0x78;
pub const TC_RESET: u8 = 0x79;
pub const TC_BLOCKDATALONG: u8 = 0x7A;
pub const TC_EXCEPTION: u8 = 0x7B;
pub const TC_LONGSTRING: u8 = 0x7C;
pub const TC_PROXYCLASSDESC: u8 = 0x7D;
pub const TC_ENUM: u8 = 0x7E;

/// Class has a custom `writeObject` hook (serializable classes only).
pub const SC_WRITE_METHOD: u8 = 0x01;
pub const SC_SERIALIZABLE: u8 = 0x02;
pub const SC_EXTERNALIZABLE: u8 = 0x04;
/// Externalized data is framed in block-data mode (protocol 2 only).
pub const SC_BLOCK_DATA: u8 = 0x08;
pub const SC_ENUM: u8 = 0x10;

/// First handle assigned in every handle epoch.
pub const BASE_WIRE_HANDLE: u32 = 0x7E_0000;

/// Largest payload a single block carries before the buffer is drained.
pub const MAX_BLOCK_SIZE: usize = 1024;

/// Largest block length that fits the short `TC_BLOCKDATA` header.
pub const MAX_SHORT_BLOCK_LEN: usize = 0xFF;

/// Largest modified UTF-8 byte length encodable as `TC_STRING`.
pub const MAX_SHORT_UTF_LEN: u64 = 0xFFFF;

/// Protocol revision selectable with `use_protocol_version`.
///
/// The revisions differ only in how externalized object data is framed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    /// Externalized data written raw, without block framing.
    V1,
    /// Externalized data written in block-data mode (the default).
    #[default]
    V2,
}

impl ProtocolVersion {
    /// Numeric revision as used by the reference writer.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Parse a numeric revision.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}
