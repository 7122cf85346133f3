//! Values as the oracle sees them.

use jser_wire::primitive::{JavaString, Primitive};

use crate::shapes::ShapeId;

/// Everything the canonical encoder renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Prim(Primitive),
    Str(JavaString),
    Aggregate(Aggregate),
    Null,
}

impl Datum {
    /// Oracle line prefix: the primitive type code, `L` for everything else.
    #[must_use]
    pub fn type_code(&self) -> char {
        match self {
            Self::Prim(p) => char::from(p.kind().type_code()),
            Self::Str(_) | Self::Aggregate(_) | Self::Null => 'L',
        }
    }
}

impl From<Primitive> for Datum {
    fn from(p: Primitive) -> Self {
        Self::Prim(p)
    }
}

impl From<JavaString> for Datum {
    fn from(s: JavaString) -> Self {
        Self::Str(s)
    }
}

impl From<Aggregate> for Datum {
    fn from(a: Aggregate) -> Self {
        Self::Aggregate(a)
    }
}

/// A plain data record: labelled values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub shape: ShapeId,
    /// Binary class name the record is written under.
    pub class_name: String,
    pub fields: Vec<(String, Datum)>,
}

impl Aggregate {
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Datum> {
        self.fields
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, d)| d)
    }
}
