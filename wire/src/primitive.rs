//! Primitive values and UTF-16 strings as the protocol sees them.
//!
//! # Type codes
//!
//! | Kind    | Code | Width |
//! |---------|------|-------|
//! | Byte    | `B`  | 1     |
//! | Char    | `C`  | 2     |
//! | Double  | `D`  | 8     |
//! | Float   | `F`  | 4     |
//! | Int     | `I`  | 4     |
//! | Long    | `J`  | 8     |
//! | Short   | `S`  | 2     |
//! | Boolean | `Z`  | 1     |
//!
//! Encoding is big-endian. NaN is canonicalized before encoding, the same
//! way the reference writer goes through `floatToIntBits`.

use std::fmt;

/// Canonical single-precision NaN bit pattern.
pub const CANONICAL_NAN_F32_BITS: u32 = 0x7fc0_0000;

/// Canonical double-precision NaN bit pattern.
pub const CANONICAL_NAN_F64_BITS: u64 = 0x7ff8_0000_0000_0000;

/// One of the eight primitive kinds of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl PrimitiveKind {
    /// All kinds, in type-code order.
    pub const ALL: [Self; 8] = [
        Self::Byte,
        Self::Char,
        Self::Double,
        Self::Float,
        Self::Int,
        Self::Long,
        Self::Short,
        Self::Boolean,
    ];

    /// Single-byte type code used in field descriptors and array class names.
    #[must_use]
    pub const fn type_code(self) -> u8 {
        match self {
            Self::Byte => b'B',
            Self::Char => b'C',
            Self::Double => b'D',
            Self::Float => b'F',
            Self::Int => b'I',
            Self::Long => b'J',
            Self::Short => b'S',
            Self::Boolean => b'Z',
        }
    }

    /// Inverse of [`type_code`](Self::type_code).
    #[must_use]
    pub const fn from_type_code(code: u8) -> Option<Self> {
        match code {
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'D' => Some(Self::Double),
            b'F' => Some(Self::Float),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            b'S' => Some(Self::Short),
            b'Z' => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Encoded width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Byte | Self::Boolean => 1,
            Self::Char | Self::Short => 2,
            Self::Float | Self::Int => 4,
            Self::Double | Self::Long => 8,
        }
    }

    /// The all-zero value a field of this kind holds before assignment.
    #[must_use]
    pub const fn default_value(self) -> Primitive {
        match self {
            Self::Byte => Primitive::Byte(0),
            Self::Char => Primitive::Char(0),
            Self::Double => Primitive::Double(0.0),
            Self::Float => Primitive::Float(0.0),
            Self::Int => Primitive::Int(0),
            Self::Long => Primitive::Long(0),
            Self::Short => Primitive::Short(0),
            Self::Boolean => Primitive::Boolean(false),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A single primitive value. `Char` is one UTF-16 code unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
}

impl Primitive {
    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Char(_) => PrimitiveKind::Char,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Int(_) => PrimitiveKind::Int,
            Self::Long(_) => PrimitiveKind::Long,
            Self::Short(_) => PrimitiveKind::Short,
            Self::Boolean(_) => PrimitiveKind::Boolean,
        }
    }

    /// Append the big-endian wire encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match *self {
            Self::Byte(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Char(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Double(v) => buf.extend_from_slice(&wire_f64_bits(v).to_be_bytes()),
            Self::Float(v) => buf.extend_from_slice(&wire_f32_bits(v).to_be_bytes()),
            Self::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Long(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Short(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Boolean(v) => buf.push(u8::from(v)),
        }
    }

    /// The wire encoding as a fresh buffer.
    #[must_use]
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.kind().width());
        self.encode_into(&mut buf);
        buf
    }
}

/// Bits written for an `f32`: raw bits, except NaN which is canonical.
#[must_use]
pub fn wire_f32_bits(v: f32) -> u32 {
    if v.is_nan() {
        CANONICAL_NAN_F32_BITS
    } else {
        v.to_bits()
    }
}

/// Bits written for an `f64`: raw bits, except NaN which is canonical.
#[must_use]
pub fn wire_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN_F64_BITS
    } else {
        v.to_bits()
    }
}

/// A string as a sequence of UTF-16 code units.
///
/// Unlike `String`, lone surrogate halves are representable, which the
/// all-code-units fixture needs.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct JavaString(Vec<u16>);

impl JavaString {
    #[must_use]
    pub fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    /// `count` copies of `unit`.
    #[must_use]
    pub fn repeat_unit(unit: u16, count: usize) -> Self {
        Self(vec![unit; count])
    }

    /// Every code unit `0x0000..=0xFFFF`, ascending.
    #[must_use]
    pub fn all_code_units() -> Self {
        Self((0..=u16::MAX).collect())
    }

    #[must_use]
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for JavaString {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

impl From<String> for JavaString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Debug for JavaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lossy, and truncated: the all-units string is 64Ki long.
        const PREVIEW: usize = 32;
        let head = &self.0[..self.0.len().min(PREVIEW)];
        let text = String::from_utf16_lossy(head);
        if self.0.len() > PREVIEW {
            write!(f, "JavaString({text:?}… len={})", self.0.len())
        } else {
            write!(f, "JavaString({text:?})")
        }
    }
}
