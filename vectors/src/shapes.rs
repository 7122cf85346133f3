//! Statically declared record shapes.
//!
//! A shape is a class name plus an ordered field list. Fields are declared
//! in the order the stream writer emits them (primitives first, then
//! objects, each group by name), so the oracle's field order and the
//! decoder's field order agree. [`ShapeRegistry::check_wire_order`] holds
//! every shape to that.

use std::collections::BTreeMap;
use std::rc::Rc;

use jser_wire::class::{self, ClassDesc, STRING_CLASS};
use jser_wire::graph::{ObjId, ObjectGraph, Value};
use jser_wire::primitive::PrimitiveKind;

use crate::config::DEFAULT_CLASS_PREFIX;
use crate::error::VectorError;
use crate::value::{Aggregate, Datum};

/// Identifier of a registered shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeId {
    /// One field of every primitive kind.
    Flat,
    /// An int, a nested [`ShapeId::Flat`] record and a string.
    Nested,
    /// An int and a primitive array; not fillable.
    Series,
}

impl ShapeId {
    /// Shapes the generic filler can produce.
    pub const FILLABLE: [Self; 2] = [Self::Flat, Self::Nested];
}

/// Declared type of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Primitive(PrimitiveKind),
    String,
    Nested(ShapeId),
    PrimitiveArray(PrimitiveKind),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub shape: FieldShape,
}

impl FieldDef {
    const fn prim(name: &'static str, kind: PrimitiveKind) -> Self {
        Self {
            name,
            shape: FieldShape::Primitive(kind),
        }
    }

    const fn of(name: &'static str, shape: FieldShape) -> Self {
        Self { name, shape }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShapeDef {
    pub id: ShapeId,
    /// Class name without the package prefix.
    pub simple_name: &'static str,
    pub fields: &'static [FieldDef],
}

const FLAT_FIELDS: &[FieldDef] = &[
    FieldDef::prim("b", PrimitiveKind::Byte),
    FieldDef::prim("c", PrimitiveKind::Char),
    FieldDef::prim("d", PrimitiveKind::Double),
    FieldDef::prim("f", PrimitiveKind::Float),
    FieldDef::prim("i", PrimitiveKind::Int),
    FieldDef::prim("j", PrimitiveKind::Long),
    FieldDef::prim("s", PrimitiveKind::Short),
    FieldDef::prim("z", PrimitiveKind::Boolean),
];

const NESTED_FIELDS: &[FieldDef] = &[
    FieldDef::prim("id", PrimitiveKind::Int),
    FieldDef::of("inner", FieldShape::Nested(ShapeId::Flat)),
    FieldDef::of("label", FieldShape::String),
];

const SERIES_FIELDS: &[FieldDef] = &[
    FieldDef::prim("count", PrimitiveKind::Int),
    FieldDef::of("samples", FieldShape::PrimitiveArray(PrimitiveKind::Double)),
];

const SHAPES: &[ShapeDef] = &[
    ShapeDef {
        id: ShapeId::Flat,
        simple_name: "A",
        fields: FLAT_FIELDS,
    },
    ShapeDef {
        id: ShapeId::Nested,
        simple_name: "Nested",
        fields: NESTED_FIELDS,
    },
    ShapeDef {
        id: ShapeId::Series,
        simple_name: "Series",
        fields: SERIES_FIELDS,
    },
];

/// Shape table plus the package prefix class names are built with.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    prefix: String,
    defs: BTreeMap<ShapeId, ShapeDef>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CLASS_PREFIX)
    }
}

impl ShapeRegistry {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            defs: SHAPES.iter().map(|def| (def.id, *def)).collect(),
        }
    }

    #[must_use]
    pub fn def(&self, id: ShapeId) -> &ShapeDef {
        // Every ShapeId has an entry in SHAPES.
        &self.defs[&id]
    }

    /// Fully qualified class name of `id`.
    #[must_use]
    pub fn class_name(&self, id: ShapeId) -> String {
        format!("{}{}", self.prefix, self.def(id).simple_name)
    }

    /// Class descriptor of `id`, fields in declaration order.
    #[must_use]
    pub fn class_desc(&self, id: ShapeId) -> ClassDesc {
        let mut builder = ClassDesc::serializable(&self.class_name(id));
        for field in self.def(id).fields {
            builder = match field.shape {
                FieldShape::Primitive(kind) => builder.primitive(field.name, kind),
                FieldShape::String => builder.object(field.name, STRING_CLASS),
                FieldShape::Nested(inner) => builder.object(field.name, &self.class_name(inner)),
                FieldShape::PrimitiveArray(kind) => {
                    builder.object(field.name, &class::array_class_name(&kind.to_string()))
                }
            };
        }
        builder.build()
    }

    /// Report the first shape whose declaration order is not the writer's
    /// emission order.
    ///
    /// # Errors
    ///
    /// [`VectorError::ShapeOrder`] naming the shape and both orders.
    pub fn check_wire_order(&self) -> Result<(), VectorError> {
        for id in self.defs.keys() {
            let desc = self.class_desc(*id);
            let order = desc.wire_order();
            if order.iter().enumerate().any(|(pos, &i)| pos != i) {
                let declared: Vec<&str> =
                    desc.fields().iter().map(|f| f.name.as_str()).collect();
                let emitted: Vec<&str> = order
                    .iter()
                    .map(|&i| desc.fields()[i].name.as_str())
                    .collect();
                return Err(VectorError::ShapeOrder {
                    shape: desc.name().to_string(),
                    detail: format!("declared {declared:?}, emitted {emitted:?}"),
                });
            }
        }
        Ok(())
    }

    /// The graph's descriptor for `id`, built and registered on first use.
    fn registered_class(&self, id: ShapeId, graph: &mut ObjectGraph) -> Rc<ClassDesc> {
        graph
            .class(&self.class_name(id))
            .unwrap_or_else(|| graph.register_class(self.class_desc(id)))
    }

    /// Build graph nodes for `aggregate`, nested records first.
    ///
    /// # Errors
    ///
    /// [`VectorError::ShapeMismatch`] if the aggregate's labels or values do
    /// not fit its shape.
    pub fn materialize(
        &self,
        aggregate: &Aggregate,
        graph: &mut ObjectGraph,
    ) -> Result<ObjId, VectorError> {
        let def = self.def(aggregate.shape);
        let mismatch = |detail: String| VectorError::ShapeMismatch {
            shape: def.simple_name.to_string(),
            detail,
        };
        if aggregate.fields.len() != def.fields.len() {
            return Err(mismatch(format!(
                "{} fields for {} declared",
                aggregate.fields.len(),
                def.fields.len()
            )));
        }

        let class = self.registered_class(aggregate.shape, graph);
        let mut values = Vec::with_capacity(def.fields.len());
        for (field, (label, datum)) in def.fields.iter().zip(&aggregate.fields) {
            if field.name != label.as_str() {
                return Err(mismatch(format!("label {label} where {} is declared", field.name)));
            }
            let value = match datum {
                Datum::Null => Value::Null,
                Datum::Prim(p) => Value::Prim(*p),
                Datum::Str(s) => Value::Ref(graph.add_string(s.clone())),
                Datum::Aggregate(inner) => Value::Ref(self.materialize(inner, graph)?),
            };
            values.push((field.name, value));
        }
        graph
            .add_instance(&class, &values)
            .map_err(|e| mismatch(e.to_string()))
    }
}
