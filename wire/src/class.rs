//! Class descriptors: the self-describing type records of the protocol.
//!
//! A descriptor is written once per handle epoch and referenced afterwards:
//!
//! ```text
//! TC_CLASSDESC name:utf suid:i64 flags:u8 field_count:u16
//!   { type_code:u8 name:utf [class_name:string-object] }*
//!   TC_ENDBLOCKDATA            -- empty class annotation
//!   super_desc                 -- TC_NULL, TC_REFERENCE or another TC_CLASSDESC
//! ```
//!
//! # Field order
//!
//! Fields are emitted primitives first, then object fields, each group by
//! name in UTF-16 code unit order. Declaration order is kept separately
//! because value slots follow it.

use std::fmt;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::constants::{
    ProtocolVersion, SC_BLOCK_DATA, SC_EXTERNALIZABLE, SC_SERIALIZABLE, SC_WRITE_METHOD,
};
use crate::primitive::PrimitiveKind;
use crate::writer::WriteHook;

/// Domain prefix for derived `serialVersionUID` fingerprints.
const DOMAIN_DERIVED_SUID: &[u8] = b"JSER::DERIVED_SUID::V1\0";

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(PrimitiveKind),
    /// Object or array field, carrying its JVM type signature
    /// (`Ljava/lang/Object;`, `[I`).
    Object { signature: String },
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDesc {
    #[must_use]
    pub fn primitive(name: &str, kind: PrimitiveKind) -> Self {
        Self {
            name: name.to_string(),
            ty: FieldType::Primitive(kind),
        }
    }

    /// An object field whose static type is `class_name` (binary name,
    /// e.g. `java.lang.Object` or `[I`).
    #[must_use]
    pub fn object(name: &str, class_name: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: FieldType::Object {
                signature: signature_of(class_name),
            },
        }
    }

    /// Type code byte written in the descriptor.
    #[must_use]
    pub fn type_code(&self) -> u8 {
        match &self.ty {
            FieldType::Primitive(kind) => kind.type_code(),
            FieldType::Object { signature } => {
                if signature.starts_with('[') {
                    b'['
                } else {
                    b'L'
                }
            }
        }
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.ty, FieldType::Primitive(_))
    }
}

/// JVM type signature of a binary class name.
///
/// `java.lang.Object` → `Ljava/lang/Object;`, `[Ljava.lang.Object;` →
/// `[Ljava/lang/Object;`, `[I` → `[I`.
#[must_use]
pub fn signature_of(class_name: &str) -> String {
    let slashed = class_name.replace('.', "/");
    if slashed.starts_with('[') {
        slashed
    } else {
        format!("L{slashed};")
    }
}

/// Binary name of the array class whose elements are `component`.
#[must_use]
pub fn array_class_name(component: &str) -> String {
    if component.starts_with('[') {
        format!("[{component}")
    } else if let Some(kind) = primitive_by_name(component) {
        format!("[{}", char::from(kind.type_code()))
    } else {
        format!("[L{component};")
    }
}

fn primitive_by_name(name: &str) -> Option<PrimitiveKind> {
    PrimitiveKind::ALL
        .into_iter()
        .find(|kind| kind.to_string() == name)
}

/// How instances of a class produce their serial data.
#[derive(Clone)]
pub enum ClassKind {
    /// Default field dump, or a custom hook run in block-data mode.
    Serializable { write_hook: Option<Rc<dyn WriteHook>> },
    /// Data produced entirely by the hook; no field dump.
    Externalizable { hook: Rc<dyn WriteHook> },
}

impl fmt::Debug for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serializable { write_hook } => f
                .debug_struct("Serializable")
                .field("write_hook", &write_hook.is_some())
                .finish(),
            Self::Externalizable { .. } => f.write_str("Externalizable"),
        }
    }
}

/// A class descriptor.
#[derive(Debug, Clone)]
pub struct ClassDesc {
    name: String,
    suid: i64,
    kind: ClassKind,
    fields: Vec<FieldDesc>,
    super_desc: Option<Rc<ClassDesc>>,
}

impl ClassDesc {
    /// Start a serializable class.
    #[must_use]
    pub fn serializable(name: &str) -> ClassBuilder {
        ClassBuilder::new(
            name,
            ClassKind::Serializable {
                write_hook: None,
            },
        )
    }

    /// Start an externalizable class whose data comes from `hook`.
    #[must_use]
    pub fn externalizable(name: &str, hook: Rc<dyn WriteHook>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Externalizable { hook })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn suid(&self) -> i64 {
        self.suid
    }

    #[must_use]
    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    #[must_use]
    pub fn super_desc(&self) -> Option<&Rc<ClassDesc>> {
        self.super_desc.as_ref()
    }

    #[must_use]
    pub fn is_externalizable(&self) -> bool {
        matches!(self.kind, ClassKind::Externalizable { .. })
    }

    /// The custom serializable hook, if any.
    #[must_use]
    pub fn write_hook(&self) -> Option<&Rc<dyn WriteHook>> {
        match &self.kind {
            ClassKind::Serializable { write_hook } => write_hook.as_ref(),
            ClassKind::Externalizable { .. } => None,
        }
    }

    /// Descriptor flags byte under `protocol`.
    #[must_use]
    pub fn flags(&self, protocol: ProtocolVersion) -> u8 {
        match &self.kind {
            ClassKind::Serializable { write_hook } => {
                if write_hook.is_some() {
                    SC_SERIALIZABLE | SC_WRITE_METHOD
                } else {
                    SC_SERIALIZABLE
                }
            }
            ClassKind::Externalizable { .. } => match protocol {
                ProtocolVersion::V1 => SC_EXTERNALIZABLE,
                ProtocolVersion::V2 => SC_EXTERNALIZABLE | SC_BLOCK_DATA,
            },
        }
    }

    /// Indices into [`fields`](Self::fields), in wire emission order.
    ///
    /// Externalizable classes publish no fields: their state is whatever the
    /// hook writes.
    #[must_use]
    pub fn wire_order(&self) -> Vec<usize> {
        if self.is_externalizable() {
            return Vec::new();
        }
        let mut order: Vec<usize> = (0..self.fields.len()).collect();
        order.sort_by(|&a, &b| {
            let (fa, fb) = (&self.fields[a], &self.fields[b]);
            fb.is_primitive()
                .cmp(&fa.is_primitive())
                .then_with(|| fa.name.encode_utf16().cmp(fb.name.encode_utf16()))
        });
        order
    }

    /// The class and its serializable ancestors, super-most first.
    #[must_use]
    pub fn hierarchy(self: &Rc<Self>) -> Vec<Rc<ClassDesc>> {
        let mut chain = vec![Rc::clone(self)];
        let mut cursor = self.super_desc.clone();
        while let Some(desc) = cursor {
            cursor = desc.super_desc.clone();
            chain.push(desc);
        }
        chain.reverse();
        chain
    }
}

/// Builder for [`ClassDesc`].
pub struct ClassBuilder {
    name: String,
    suid: Option<i64>,
    kind: ClassKind,
    fields: Vec<FieldDesc>,
    super_desc: Option<Rc<ClassDesc>>,
}

impl ClassBuilder {
    fn new(name: &str, kind: ClassKind) -> Self {
        Self {
            name: name.to_string(),
            suid: None,
            kind,
            fields: Vec::new(),
            super_desc: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn primitive(self, name: &str, kind: PrimitiveKind) -> Self {
        self.field(FieldDesc::primitive(name, kind))
    }

    #[must_use]
    pub fn object(self, name: &str, class_name: &str) -> Self {
        self.field(FieldDesc::object(name, class_name))
    }

    /// Declare the `serialVersionUID` instead of deriving one.
    #[must_use]
    pub fn suid(mut self, suid: i64) -> Self {
        self.suid = Some(suid);
        self
    }

    /// Attach a custom write hook. Ignored for externalizable classes,
    /// which already carry theirs.
    #[must_use]
    pub fn write_hook(mut self, hook: Rc<dyn WriteHook>) -> Self {
        if let ClassKind::Serializable { write_hook } = &mut self.kind {
            *write_hook = Some(hook);
        }
        self
    }

    #[must_use]
    pub fn extends(mut self, super_desc: Rc<ClassDesc>) -> Self {
        self.super_desc = Some(super_desc);
        self
    }

    #[must_use]
    pub fn build(self) -> ClassDesc {
        let mut desc = ClassDesc {
            name: self.name,
            suid: 0,
            kind: self.kind,
            fields: self.fields,
            super_desc: self.super_desc,
        };
        desc.suid = self.suid.unwrap_or_else(|| derived_suid(&desc));
        desc
    }
}

/// Stable UID for classes that do not declare one.
///
/// First 8 bytes (big-endian) of
/// `sha256(DOMAIN || name || 0 || flags || {code || name || 0 || signature || 0}*)`
/// over fields in wire order. Stable across runs, not the reference
/// platform's default-UID algorithm (that one hashes method signatures,
/// which descriptors here do not have).
fn derived_suid(desc: &ClassDesc) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_DERIVED_SUID);
    hasher.update(desc.name.as_bytes());
    hasher.update([0u8, desc.flags(ProtocolVersion::V2)]);
    for i in desc.wire_order() {
        let field = &desc.fields[i];
        hasher.update([field.type_code()]);
        hasher.update(field.name.as_bytes());
        hasher.update([0u8]);
        if let FieldType::Object { signature } = &field.ty {
            hasher.update(signature.as_bytes());
        }
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head)
}

// ---------------------------------------------------------------------------
// Built-in descriptors
// ---------------------------------------------------------------------------

pub const NUMBER_CLASS: &str = "java.lang.Number";
pub const OBJECT_CLASS: &str = "java.lang.Object";
pub const STRING_CLASS: &str = "java.lang.String";

/// `java.lang.Number`: serializable, no fields.
#[must_use]
pub fn number_class() -> ClassDesc {
    ClassDesc::serializable(NUMBER_CLASS)
        .suid(-8_742_448_824_652_078_965)
        .build()
}

/// Binary name and published UID of the wrapper class for `kind`.
#[must_use]
pub const fn wrapper_identity(kind: PrimitiveKind) -> (&'static str, i64) {
    match kind {
        PrimitiveKind::Byte => ("java.lang.Byte", -7_183_698_231_559_129_828),
        PrimitiveKind::Char => ("java.lang.Character", 3_786_198_910_865_385_080),
        PrimitiveKind::Double => ("java.lang.Double", -9_172_774_392_245_257_468),
        PrimitiveKind::Float => ("java.lang.Float", -2_671_257_302_660_747_028),
        PrimitiveKind::Int => ("java.lang.Integer", 1_360_826_667_806_852_920),
        PrimitiveKind::Long => ("java.lang.Long", 4_290_774_380_558_885_855),
        PrimitiveKind::Short => ("java.lang.Short", 7_515_723_908_773_894_738),
        PrimitiveKind::Boolean => ("java.lang.Boolean", -3_665_804_199_014_368_530),
    }
}

/// Whether the wrapper for `kind` extends `java.lang.Number`.
#[must_use]
pub const fn wrapper_is_number(kind: PrimitiveKind) -> bool {
    !matches!(kind, PrimitiveKind::Char | PrimitiveKind::Boolean)
}

/// Wrapper descriptor for `kind`: one field `value` of that kind.
///
/// `number` must be the interned `java.lang.Number` descriptor for numeric
/// kinds; it is ignored for `char` and `boolean`.
#[must_use]
pub fn wrapper_class(kind: PrimitiveKind, number: Option<Rc<ClassDesc>>) -> ClassDesc {
    let (name, suid) = wrapper_identity(kind);
    let builder = ClassDesc::serializable(name)
        .suid(suid)
        .primitive("value", kind);
    match number {
        Some(number) if wrapper_is_number(kind) => builder.extends(number).build(),
        _ => builder.build(),
    }
}

/// Published UIDs of common array classes.
#[must_use]
pub fn known_array_suid(name: &str) -> Option<i64> {
    let bits: u64 = match name {
        "[B" => 0xACF3_17F8_0608_54E0,
        "[C" => 0xB026_66B0_E25D_84AC,
        "[D" => 0x3EA6_8C14_AB63_5A1E,
        "[F" => 0x0B9C_8189_22E0_0C42,
        "[I" => 0x4DBA_6026_76EA_B2A5,
        "[J" => 0x7820_04B5_12B1_7593,
        "[S" => 0xEF83_2E06_E55D_B0FA,
        "[Z" => 0x578F_2039_14B8_5DE2,
        "[[I" => 0x17F7_E44F_198F_893C,
        "[Ljava.lang.Object;" => 0x90CE_589F_1073_296C,
        "[Ljava.lang.String;" => 0xADD2_56E7_E91D_7B47,
        _ => return None,
    };
    Some(i64::from_be_bytes(bits.to_be_bytes()))
}

/// Descriptor of the array class `name` (`[I`, `[Lfoo.Bar;`): serializable,
/// no fields, no super descriptor.
#[must_use]
pub fn array_class(name: &str) -> ClassDesc {
    let builder = ClassDesc::serializable(name);
    match known_array_suid(name) {
        Some(suid) => builder.suid(suid).build(),
        None => builder.build(),
    }
}
