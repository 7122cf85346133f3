//! Object graph arena.
//!
//! Heap nodes live in one `Vec`; an [`ObjId`] is a slot index and is the
//! node's identity. Two structurally equal instances in different slots are
//! different objects on the wire. Cycles need no special support: build the
//! nodes, then point a field back with [`ObjectGraph::set_field`].

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::class::{self, ClassDesc, FieldDesc, FieldType};
use crate::error::StreamError;
use crate::primitive::{JavaString, Primitive, PrimitiveKind};

/// Identity of a node in an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(usize);

impl ObjId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A field or array element value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Null,
    Prim(Primitive),
    Ref(ObjId),
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Self::Prim(p)
    }
}

impl From<ObjId> for Value {
    fn from(id: ObjId) -> Self {
        Self::Ref(id)
    }
}

/// An instance: one slot list per class level, super-most first, each list
/// in that level's declaration order.
#[derive(Debug, Clone)]
pub struct Instance {
    class: Rc<ClassDesc>,
    levels: Vec<Rc<ClassDesc>>,
    slots: Vec<Vec<Value>>,
}

impl Instance {
    #[must_use]
    pub fn class(&self) -> &Rc<ClassDesc> {
        &self.class
    }

    /// Class levels, super-most first.
    #[must_use]
    pub fn levels(&self) -> &[Rc<ClassDesc>] {
        &self.levels
    }

    /// Slots of level `level`, in declaration order.
    #[must_use]
    pub fn level_slots(&self, level: usize) -> &[Value] {
        self.slots.get(level).map_or(&[], Vec::as_slice)
    }

    /// `(level, slot)` of `name`, searching the most derived level first.
    fn locate(&self, name: &str) -> Option<(usize, usize)> {
        self.levels.iter().enumerate().rev().find_map(|(level, desc)| {
            desc.fields()
                .iter()
                .position(|f| f.name == name)
                .map(|slot| (level, slot))
        })
    }
}

/// Array elements.
#[derive(Debug, Clone)]
pub enum ArrayElements {
    Primitive {
        kind: PrimitiveKind,
        values: Vec<Primitive>,
    },
    Objects(Vec<Value>),
}

impl ArrayElements {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Primitive { values, .. } => values.len(),
            Self::Objects(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub class: Rc<ClassDesc>,
    pub elements: ArrayElements,
}

/// A heap node.
#[derive(Debug, Clone)]
pub enum Node {
    Instance(Instance),
    Array(ArrayNode),
    Str(JavaString),
    /// A class object (`Foo.class`), written as `TC_CLASS`.
    ClassToken(Rc<ClassDesc>),
}

/// Arena of heap nodes plus the class descriptors they use.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    nodes: Vec<Node>,
    classes: BTreeMap<String, Rc<ClassDesc>>,
    tokens: BTreeMap<String, ObjId>,
}

impl ObjectGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    /// Intern `desc` by name. A class already registered under the same
    /// name is returned unchanged and `desc` is dropped.
    pub fn register_class(&mut self, desc: ClassDesc) -> Rc<ClassDesc> {
        Rc::clone(
            self.classes
                .entry(desc.name().to_string())
                .or_insert_with(|| Rc::new(desc)),
        )
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<Rc<ClassDesc>> {
        self.classes.get(name).cloned()
    }

    /// The boxed wrapper class for `kind`, with `java.lang.Number` as super
    /// for the numeric kinds.
    pub fn wrapper_class(&mut self, kind: PrimitiveKind) -> Rc<ClassDesc> {
        let (name, _) = class::wrapper_identity(kind);
        if let Some(desc) = self.class(name) {
            return desc;
        }
        let number = class::wrapper_is_number(kind)
            .then(|| self.register_class(class::number_class()));
        self.register_class(class::wrapper_class(kind, number))
    }

    /// The array class `name` (`[I`, `[Ljava.lang.Object;`).
    pub fn array_class(&mut self, name: &str) -> Rc<ClassDesc> {
        match self.class(name) {
            Some(desc) => desc,
            None => self.register_class(class::array_class(name)),
        }
    }

    // -----------------------------------------------------------------------
    // Node construction
    // -----------------------------------------------------------------------

    fn push(&mut self, node: Node) -> ObjId {
        self.nodes.push(node);
        ObjId(self.nodes.len() - 1)
    }

    pub fn add_string(&mut self, s: impl Into<JavaString>) -> ObjId {
        self.push(Node::Str(s.into()))
    }

    /// New instance of `class` with every field at its default, then
    /// `values` assigned by name.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownField`] or [`StreamError::TypeMismatch`] for a
    /// bad assignment, [`StreamError::DanglingObject`] for a reference
    /// outside the graph.
    pub fn add_instance(
        &mut self,
        class: &Rc<ClassDesc>,
        values: &[(&str, Value)],
    ) -> Result<ObjId, StreamError> {
        let levels = class.hierarchy();
        let slots = levels
            .iter()
            .map(|desc| desc.fields().iter().map(default_slot).collect())
            .collect();
        let mut instance = Instance {
            class: Rc::clone(class),
            levels,
            slots,
        };
        for (name, value) in values {
            self.assign(&mut instance, name, *value)?;
        }
        Ok(self.push(Node::Instance(instance)))
    }

    /// Boxed primitive: an instance of the wrapper class holding `value`.
    pub fn add_wrapper(&mut self, value: Primitive) -> ObjId {
        let class = self.wrapper_class(value.kind());
        let levels = class.hierarchy();
        let slots = levels
            .iter()
            .map(|desc| {
                if Rc::ptr_eq(desc, &class) {
                    vec![Value::Prim(value)]
                } else {
                    Vec::new()
                }
            })
            .collect();
        self.push(Node::Instance(Instance {
            class,
            levels,
            slots,
        }))
    }

    /// Primitive array of `kind`.
    ///
    /// # Errors
    ///
    /// [`StreamError::TypeMismatch`] if an element is of another kind.
    pub fn add_primitive_array(
        &mut self,
        kind: PrimitiveKind,
        values: Vec<Primitive>,
    ) -> Result<ObjId, StreamError> {
        let name = format!("[{}", char::from(kind.type_code()));
        if let Some(bad) = values.iter().find(|v| v.kind() != kind) {
            return Err(StreamError::TypeMismatch {
                target: name,
                detail: format!("element of kind {}", bad.kind()),
            });
        }
        let class = self.array_class(&name);
        Ok(self.push(Node::Array(ArrayNode {
            class,
            elements: ArrayElements::Primitive { kind, values },
        })))
    }

    /// Object array whose component class is `component` (binary name, e.g.
    /// `java.lang.Object` or `[I`).
    ///
    /// # Errors
    ///
    /// [`StreamError::TypeMismatch`] for a primitive element,
    /// [`StreamError::DanglingObject`] for a reference outside the graph.
    pub fn add_object_array(
        &mut self,
        component: &str,
        values: Vec<Value>,
    ) -> Result<ObjId, StreamError> {
        let name = class::array_class_name(component);
        for value in &values {
            self.check_object_value(&name, *value)?;
        }
        let class = self.array_class(&name);
        Ok(self.push(Node::Array(ArrayNode {
            class,
            elements: ArrayElements::Objects(values),
        })))
    }

    /// The class object for `class`. Interned: one node per class name.
    pub fn class_token(&mut self, class: &Rc<ClassDesc>) -> ObjId {
        if let Some(&id) = self.tokens.get(class.name()) {
            return id;
        }
        let id = self.push(Node::ClassToken(Rc::clone(class)));
        self.tokens.insert(class.name().to_string(), id);
        id
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// [`StreamError::DanglingObject`] if `id` is not in this graph.
    pub fn node(&self, id: ObjId) -> Result<&Node, StreamError> {
        self.nodes.get(id.0).ok_or(StreamError::DanglingObject { id })
    }

    /// # Errors
    ///
    /// [`StreamError::WrongNodeKind`] if `id` is not an instance.
    pub fn instance(&self, id: ObjId) -> Result<&Instance, StreamError> {
        match self.node(id)? {
            Node::Instance(instance) => Ok(instance),
            _ => Err(StreamError::WrongNodeKind {
                id,
                expected: "an instance",
            }),
        }
    }

    /// Value of field `name` of instance `id`.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownField`] if no level declares `name`.
    pub fn field(&self, id: ObjId, name: &str) -> Result<Value, StreamError> {
        let instance = self.instance(id)?;
        let (level, slot) = instance.locate(name).ok_or_else(|| StreamError::UnknownField {
            class: instance.class.name().to_string(),
            field: name.to_string(),
        })?;
        Ok(instance.slots[level][slot])
    }

    /// Primitive value of field `name` of instance `id`.
    ///
    /// # Errors
    ///
    /// As [`field`](Self::field), plus [`StreamError::TypeMismatch`] for an
    /// object field.
    pub fn primitive_field(&self, id: ObjId, name: &str) -> Result<Primitive, StreamError> {
        match self.field(id, name)? {
            Value::Prim(p) => Ok(p),
            _ => Err(StreamError::TypeMismatch {
                target: name.to_string(),
                detail: "object field read as primitive".to_string(),
            }),
        }
    }

    /// Assign field `name` of instance `id`.
    ///
    /// # Errors
    ///
    /// As [`add_instance`](Self::add_instance), plus
    /// [`StreamError::WrongNodeKind`] if `id` is not an instance.
    pub fn set_field(&mut self, id: ObjId, name: &str, value: Value) -> Result<(), StreamError> {
        let mut instance = self.instance(id)?.clone();
        self.assign(&mut instance, name, value)?;
        self.nodes[id.0] = Node::Instance(instance);
        Ok(())
    }

    fn assign(&self, instance: &mut Instance, name: &str, value: Value) -> Result<(), StreamError> {
        let (level, slot) = instance.locate(name).ok_or_else(|| StreamError::UnknownField {
            class: instance.class.name().to_string(),
            field: name.to_string(),
        })?;
        let field = &instance.levels[level].fields()[slot];
        let target = format!("{}.{}", instance.levels[level].name(), field.name);
        match (&field.ty, value) {
            (FieldType::Primitive(kind), Value::Prim(p)) if p.kind() == *kind => {}
            (FieldType::Primitive(kind), other) => {
                return Err(StreamError::TypeMismatch {
                    target,
                    detail: format!("expected {kind}, got {other:?}"),
                });
            }
            (FieldType::Object { .. }, other) => self.check_object_value(&target, other)?,
        }
        instance.slots[level][slot] = value;
        Ok(())
    }

    fn check_object_value(&self, target: &str, value: Value) -> Result<(), StreamError> {
        match value {
            Value::Null => Ok(()),
            Value::Ref(id) => self.node(id).map(|_| ()),
            Value::Prim(p) => Err(StreamError::TypeMismatch {
                target: target.to_string(),
                detail: format!("primitive {} in an object slot", p.kind()),
            }),
        }
    }
}

fn default_slot(field: &FieldDesc) -> Value {
    match field.ty {
        FieldType::Primitive(kind) => Value::Prim(kind.default_value()),
        FieldType::Object { .. } => Value::Null,
    }
}
