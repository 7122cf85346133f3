//! Identity scenarios: arrays, back-references, resets, cycles.

use std::rc::Rc;

use jser_wire::class::{ClassDesc, OBJECT_CLASS};
use jser_wire::graph::{ObjId, Value};
use jser_wire::primitive::{Primitive, PrimitiveKind};
use jser_wire::writer::ObjectOutput;
use tracing::debug;

use super::Session;
use crate::error::VectorError;

/// `IntAndObj { int i; Object obj; }`
pub(super) fn int_and_obj_class(s: &mut Session<'_>) -> Rc<ClassDesc> {
    let name = s.class_name("IntAndObj");
    s.register(
        ClassDesc::serializable(&name)
            .primitive("i", PrimitiveKind::Int)
            .object("obj", OBJECT_CLASS)
            .build(),
    )
}

fn int_and_obj(s: &mut Session<'_>, i: i32, obj: Value) -> Result<ObjId, VectorError> {
    let class = int_and_obj_class(s);
    s.instance(&class, &[("i", Primitive::Int(i).into()), ("obj", obj)])
}

/// A serializable class without fields.
pub(super) fn empty_class(s: &mut Session<'_>) -> Rc<ClassDesc> {
    let name = s.class_name("EmptyClass");
    s.register(ClassDesc::serializable(&name).build())
}

pub(super) fn arrays(s: &mut Session<'_>) -> Result<(), VectorError> {
    let empty = s.graph.add_primitive_array(PrimitiveKind::Boolean, Vec::new())?;
    s.object(empty)?;

    let all_bytes = (i8::MIN..=i8::MAX).map(Primitive::Byte).collect();
    let all_bytes = s.graph.add_primitive_array(PrimitiveKind::Byte, all_bytes)?;
    s.object(all_bytes)?;

    let mut rows = Vec::with_capacity(3);
    for row in [[1, 2, 3], [4, 5, 6], [7, 8, 9]] {
        let values = row.into_iter().map(Primitive::Int).collect();
        rows.push(Value::Ref(s.graph.add_primitive_array(PrimitiveKind::Int, values)?));
    }
    let matrix = s.graph.add_object_array("[I", rows)?;
    s.object(matrix)?;

    let a = int_and_obj(s, 1, Value::Null)?;
    let b = int_and_obj(s, 2, Value::Ref(a))?;
    let c = int_and_obj(s, 3, Value::Ref(b))?;
    let component = s.class_name("IntAndObj");
    let linked = s
        .graph
        .add_object_array(&component, vec![a.into(), b.into(), c.into()])?;
    s.object(linked)
}

pub(super) fn obj_ref_vs_eq(s: &mut Session<'_>) -> Result<(), VectorError> {
    let class = empty_class(s);
    let first = s.instance(&class, &[])?;
    let second = s.instance(&class, &[])?;
    for id in [first, second, first, second] {
        s.object(id)?;
    }
    for _ in 0..3 {
        s.out.reset()?;
    }
    debug!("handles forgotten, rewriting first instance");
    s.object(first)
}

pub(super) fn circular(s: &mut Session<'_>) -> Result<(), VectorError> {
    let id = int_and_obj(s, 5, Value::Null)?;
    s.graph.set_field(id, "obj", Value::Ref(id))?;
    s.object(id)
}

pub(super) fn mutual_refs(s: &mut Session<'_>) -> Result<(), VectorError> {
    let (a_name, b_name) = (s.class_name("MutualA"), s.class_name("MutualB"));
    let a_class = s.register(
        ClassDesc::serializable(&a_name)
            .primitive("id", PrimitiveKind::Int)
            .object("peer", &b_name)
            .build(),
    );
    let b_class = s.register(
        ClassDesc::serializable(&b_name)
            .primitive("id", PrimitiveKind::Int)
            .object("peer", &a_name)
            .build(),
    );
    let a = s.instance(&a_class, &[("id", Primitive::Int(1).into())])?;
    let b = s.instance(&b_class, &[("id", Primitive::Int(2).into()), ("peer", a.into())])?;
    s.graph.set_field(a, "peer", b.into())?;
    s.object(a)?;
    s.object(b)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{body, count, run};
    use super::super::Scenario;
    use jser_wire::constants::{TC_ARRAY, TC_CLASSDESC, TC_OBJECT, TC_REFERENCE, TC_RESET};

    fn handle_ref(n: u8) -> [u8; 5] {
        [TC_REFERENCE, 0, 0x7E, 0, n]
    }

    #[test]
    fn arrays_layout() {
        let (bin, _) = run(Scenario::Arrays);
        let body = body(&bin);
        assert_eq!(&body[..5], [TC_ARRAY, TC_CLASSDESC, 0, 2, b'[']);
        let all: Vec<u8> = (0..=255u8).map(|b| b.wrapping_add(0x80)).collect();
        assert_eq!(count(body, &all), 1);
        assert_eq!(count(body, b"[[I"), 1);
        assert_eq!(count(body, b"[I"), 2);
        assert_eq!(count(body, b"[Lcom.o11k.GenerateTests$IntAndObj;"), 1);
        // c.obj points back at b.
        let mut tail = vec![0, 0, 0, 3];
        tail.extend(handle_ref(0x0F));
        assert!(body.ends_with(&tail));
    }

    #[test]
    fn resets_forget_handles() {
        let (bin, _) = run(Scenario::ObjRefVsEq);
        let body = body(&bin);
        let mut repeats = handle_ref(1).to_vec();
        repeats.extend(handle_ref(2));
        assert_eq!(count(body, &repeats), 1);
        assert_eq!(count(body, &[TC_RESET, TC_RESET, TC_RESET, TC_OBJECT, TC_CLASSDESC]), 1);
        assert_eq!(count(body, b"GenerateTests$EmptyClass"), 2);
        // Fresh descriptor after the resets, no field data.
        assert!(body.ends_with(&[0x78, 0x70]));
    }

    #[test]
    fn circular_points_at_itself() {
        let (bin, _) = run(Scenario::Circular);
        let mut tail = vec![0, 0, 0, 5];
        tail.extend(handle_ref(2));
        assert!(body(&bin).ends_with(&tail));
    }

    #[test]
    fn mutual_refs_second_object_is_a_reference() {
        let (bin, _) = run(Scenario::MutualRefs);
        let mut tail = vec![0, 0, 0, 2];
        tail.extend(handle_ref(2));
        tail.extend(handle_ref(5));
        assert!(body(&bin).ends_with(&tail));
        assert_eq!(count(body(&bin), b"Lcom/o11k/GenerateTests$MutualB;"), 1);
    }
}
