//! Custom write hooks, externalized records, inheritance and class tokens.
//!
//! Hooks only read the graph, so any object a hook writes beyond its own
//! fields is created up front and either captured by the hook or stored in
//! a field the hook reads.

use std::rc::Rc;

use jser_wire::class::{ClassDesc, STRING_CLASS};
use jser_wire::graph::{ObjId, ObjectGraph, Value};
use jser_wire::primitive::{JavaString, Primitive, PrimitiveKind};
use jser_wire::writer::{ObjectOutput, WriteHook};
use jser_wire::StreamError;

use super::graphs;
use super::Session;
use crate::error::VectorError;

/// UTF payload the externalized child writes after its int. Decoder suites
/// assert this literal.
pub(super) const EXTERNAL_MARKER: &str = "testicle";

fn int_field(graph: &ObjectGraph, this: ObjId, name: &str) -> Result<i32, StreamError> {
    match graph.primitive_field(this, name)? {
        Primitive::Int(v) => Ok(v),
        other => Err(StreamError::TypeMismatch {
            target: name.to_string(),
            detail: format!("expected int, got {}", other.kind()),
        }),
    }
}

struct DefaultFields;

impl WriteHook for DefaultFields {
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        _this: ObjId,
    ) -> Result<(), StreamError> {
        out.default_write_object(graph)
    }
}

struct WritesNothing;

impl WriteHook for WritesNothing {
    fn write(
        &self,
        _out: &mut dyn ObjectOutput,
        _graph: &ObjectGraph,
        _this: ObjId,
    ) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Default fields, then one more object.
struct DefaultThenObject {
    extra: ObjId,
}

impl WriteHook for DefaultThenObject {
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        _this: ObjId,
    ) -> Result<(), StreamError> {
        out.default_write_object(graph)?;
        out.write_object(graph, Value::Ref(self.extra))
    }
}

/// Field `i` as block data instead of the default dump.
struct IntInsteadOfFields;

impl WriteHook for IntInsteadOfFields {
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        this: ObjId,
    ) -> Result<(), StreamError> {
        out.write_int(int_field(graph, this, "i")?)
    }
}

/// Block data on both sides of the default dump.
struct FieldsBetweenInts;

impl WriteHook for FieldsBetweenInts {
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        _this: ObjId,
    ) -> Result<(), StreamError> {
        out.write_int(123)?;
        out.default_write_object(graph)?;
        out.write_int(456)
    }
}

/// `i`, the marker string, then the object in field `extra`.
struct ExternalChild;

impl WriteHook for ExternalChild {
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        this: ObjId,
    ) -> Result<(), StreamError> {
        out.write_int(int_field(graph, this, "i")?)?;
        out.write_utf(&JavaString::from(EXTERNAL_MARKER))?;
        out.write_object(graph, graph.field(this, "extra")?)
    }
}

/// `EmptySerW`: serializable, no fields, a hook that writes nothing.
fn empty_hooked(s: &mut Session<'_>) -> Result<ObjId, VectorError> {
    let name = s.class_name("EmptySerW");
    let class = s.register(
        ClassDesc::serializable(&name)
            .write_hook(Rc::new(WritesNothing))
            .build(),
    );
    s.instance(&class, &[])
}

/// A serializable record with one int field `i` and an optional hook.
fn int_record(
    s: &mut Session<'_>,
    simple: &str,
    hook: Option<Rc<dyn WriteHook>>,
    i: i32,
) -> Result<ObjId, VectorError> {
    let mut builder =
        ClassDesc::serializable(&s.class_name(simple)).primitive("i", PrimitiveKind::Int);
    if let Some(hook) = hook {
        builder = builder.write_hook(hook);
    }
    let class = s.register(builder.build());
    s.instance(&class, &[("i", Primitive::Int(i).into())])
}

/// `ExtChild extends ExtParent`, both externalizable. Only the child's hook
/// runs.
fn ext_child_class(s: &mut Session<'_>) -> Rc<ClassDesc> {
    let parent = s.register(
        ClassDesc::externalizable(&s.class_name("ExtParent"), Rc::new(WritesNothing)).build(),
    );
    let companion = s.class_name("EmptySerW");
    s.register(
        ClassDesc::externalizable(&s.class_name("ExtChild"), Rc::new(ExternalChild))
            .primitive("i", PrimitiveKind::Int)
            .object("extra", &companion)
            .extends(parent)
            .build(),
    )
}

/// A fresh `ExtChild` with its own companion object.
pub(super) fn ext_child(s: &mut Session<'_>, i: i32) -> Result<ObjId, VectorError> {
    let extra = empty_hooked(s)?;
    let class = ext_child_class(s);
    s.instance(&class, &[("i", Primitive::Int(i).into()), ("extra", extra.into())])
}

pub(super) fn handlers(s: &mut Session<'_>) -> Result<(), VectorError> {
    let plain = int_record(s, "SerNoW", None, 1)?;
    let hooked = int_record(s, "SerW", Some(Rc::new(DefaultFields)), 2)?;
    let extra = empty_hooked(s)?;
    let with_extra = int_record(s, "SerWExtra", Some(Rc::new(DefaultThenObject { extra })), 3)?;
    let no_fields = int_record(s, "SerWNoFields", Some(Rc::new(IntInsteadOfFields)), 4)?;
    let misplaced = int_record(s, "SerWMisplacedFields", Some(Rc::new(FieldsBetweenInts)), 5)?;
    let external = ext_child(s, 6)?;
    for id in [plain, hooked, with_extra, no_fields, misplaced, external] {
        s.object(id)?;
    }
    Ok(())
}

pub(super) fn inheritance(s: &mut Session<'_>) -> Result<(), VectorError> {
    let base = s.register(
        ClassDesc::serializable(&s.class_name("Base"))
            .primitive("i", PrimitiveKind::Int)
            .build(),
    );
    let note = s.graph.add_string("derived-extra");
    let derived = s.register(
        ClassDesc::serializable(&s.class_name("Derived"))
            .primitive("j", PrimitiveKind::Long)
            .object("name", STRING_CLASS)
            .write_hook(Rc::new(DefaultThenObject { extra: note }))
            .extends(Rc::clone(&base))
            .build(),
    );
    let name = s.graph.add_string("derived");
    let deep = s.instance(
        &derived,
        &[
            ("i", Primitive::Int(1).into()),
            ("j", Primitive::Long(2).into()),
            ("name", name.into()),
        ],
    )?;
    let shallow = s.instance(&base, &[("i", Primitive::Int(3).into())])?;
    s.object(deep)?;
    s.object(shallow)
}

pub(super) fn class_descs(s: &mut Session<'_>) -> Result<(), VectorError> {
    let plain = graphs::int_and_obj_class(s);
    let external = ext_child_class(s);
    let array = s.graph.array_class("[I");
    let tokens = [
        s.graph.class_token(&plain),
        s.graph.class_token(&external),
        s.graph.class_token(&array),
    ];
    for token in tokens {
        s.object(token)?;
    }
    s.object(tokens[0])
}
