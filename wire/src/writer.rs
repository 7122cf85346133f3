//! Object stream writer.
//!
//! # Stream layout
//!
//! ```text
//! AC ED 00 05              -- magic, version
//! content*                 -- block data and objects, interleaved
//! ```
//!
//! Top-level primitive writes land in block data. Every `write_object` leaves
//! block-data mode for the duration of the object and restores the previous
//! mode afterwards, on error too.
//!
//! # Hooks
//!
//! A hooked serializable level runs its [`WriteHook`] in block-data mode and
//! is closed by `TC_ENDBLOCKDATA`. Inside the hook,
//! [`ObjectOutput::default_write_object`] dumps that level's fields once.
//! Externalized objects run their hook framed the same way under protocol 2,
//! raw under protocol 1.

use std::io::Write;
use std::rc::Rc;

use tracing::debug;

use crate::block::BlockDataOutput;
use crate::class::{ClassDesc, ClassKind, FieldType};
use crate::constants::{
    ProtocolVersion, MAX_SHORT_UTF_LEN, STREAM_MAGIC, STREAM_VERSION, TC_ARRAY, TC_BLOCKDATA,
    TC_CLASS, TC_CLASSDESC, TC_ENDBLOCKDATA, TC_LONGSTRING, TC_NULL, TC_OBJECT, TC_REFERENCE,
    TC_RESET, TC_STRING,
};
use crate::error::StreamError;
use crate::graph::{ArrayElements, ArrayNode, Instance, Node, ObjId, ObjectGraph, Value};
use crate::handles::{HandleKey, HandleTable};
use crate::mutf8;
use crate::primitive::{JavaString, Primitive};

/// Custom serialization routine attached to a class.
///
/// For a serializable class this is its `writeObject` equivalent; for an
/// externalizable class, its `writeExternal`.
pub trait WriteHook {
    /// Write the data of `this`, reading field values from `graph`.
    ///
    /// # Errors
    ///
    /// Whatever the writes on `out` return.
    fn write(
        &self,
        out: &mut dyn ObjectOutput,
        graph: &ObjectGraph,
        this: ObjId,
    ) -> Result<(), StreamError>;
}

/// Write surface shared by the top-level session and hooks.
pub trait ObjectOutput {
    /// Write one primitive in the current framing mode.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    fn write_primitive(&mut self, value: Primitive) -> Result<(), StreamError>;

    /// Write a 16-bit length-prefixed modified UTF-8 string.
    ///
    /// # Errors
    ///
    /// [`StreamError::UtfTooLong`] above 65535 encoded bytes.
    fn write_utf(&mut self, s: &JavaString) -> Result<(), StreamError>;

    /// Write `value` as an object: null, back-reference or new content.
    ///
    /// # Errors
    ///
    /// [`StreamError::PrimitiveAsObject`] for a primitive, graph errors for
    /// dangling ids, plus anything a nested hook returns.
    fn write_object(&mut self, graph: &ObjectGraph, value: Value) -> Result<(), StreamError>;

    /// Dump the current hook level's fields.
    ///
    /// # Errors
    ///
    /// [`StreamError::NotInWriteHook`] outside a serializable hook,
    /// [`StreamError::DefaultFieldsAlreadyWritten`] on a second call.
    fn default_write_object(&mut self, graph: &ObjectGraph) -> Result<(), StreamError>;

    /// Emit `TC_RESET` and forget every handle.
    ///
    /// # Errors
    ///
    /// [`StreamError::ResetInsideObject`] while an object is being written.
    fn reset(&mut self) -> Result<(), StreamError>;

    fn write_boolean(&mut self, v: bool) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Boolean(v))
    }

    fn write_byte(&mut self, v: i8) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Byte(v))
    }

    fn write_char(&mut self, v: u16) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Char(v))
    }

    fn write_short(&mut self, v: i16) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Short(v))
    }

    fn write_int(&mut self, v: i32) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Int(v))
    }

    fn write_long(&mut self, v: i64) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Long(v))
    }

    fn write_float(&mut self, v: f32) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Float(v))
    }

    fn write_double(&mut self, v: f64) -> Result<(), StreamError> {
        self.write_primitive(Primitive::Double(v))
    }
}

/// Active hook invocation.
#[derive(Debug)]
struct HookFrame {
    this: ObjId,
    level: usize,
    class: Rc<ClassDesc>,
    /// False for externalized hooks, where field dumps are not allowed.
    serializable: bool,
    fields_written: bool,
}

/// One stream session over a sink.
#[derive(Debug)]
pub struct ObjectStreamWriter<W: Write> {
    bout: BlockDataOutput<W>,
    handles: HandleTable,
    protocol: ProtocolVersion,
    depth: u32,
    hooks: Vec<HookFrame>,
}

impl<W: Write> ObjectStreamWriter<W> {
    /// Write the stream header and enter block-data mode.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn new(out: W) -> Result<Self, StreamError> {
        let mut bout = BlockDataOutput::new(out);
        bout.write_bytes(&STREAM_MAGIC.to_be_bytes())?;
        bout.write_bytes(&STREAM_VERSION.to_be_bytes())?;
        bout.set_block_data_mode(true)?;
        Ok(Self {
            bout,
            handles: HandleTable::new(),
            protocol: ProtocolVersion::default(),
            depth: 0,
            hooks: Vec::new(),
        })
    }

    #[must_use]
    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    /// Handles assigned in the current epoch.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Select the protocol revision for the rest of the stream.
    ///
    /// # Errors
    ///
    /// [`StreamError::ProtocolSwitchOnNonEmptyStream`] once any handle has
    /// been assigned since the start or the last reset.
    pub fn use_protocol_version(&mut self, version: ProtocolVersion) -> Result<(), StreamError> {
        if !self.handles.is_empty() {
            return Err(StreamError::ProtocolSwitchOnNonEmptyStream {
                handles: self.handles.len(),
            });
        }
        debug!(version = version.number(), "protocol version selected");
        self.protocol = version;
        Ok(())
    }

    /// [`use_protocol_version`](Self::use_protocol_version) by revision
    /// number.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnsupportedProtocolVersion`] for anything but 1 or 2.
    pub fn use_protocol_number(&mut self, version: u8) -> Result<(), StreamError> {
        let parsed = ProtocolVersion::from_number(version)
            .ok_or(StreamError::UnsupportedProtocolVersion { version })?;
        self.use_protocol_version(parsed)
    }

    /// Drain buffered block data and flush the sink.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.bout.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink.
    ///
    /// # Errors
    ///
    /// I/O failure of the final flush.
    pub fn finish(self) -> Result<W, StreamError> {
        Ok(self.bout.into_inner()?)
    }

    /// Direct control over block framing, bypassing the object protocol.
    ///
    /// Meant for producing degenerate but valid framing (empty blocks,
    /// primitives split across blocks). Misuse yields streams no decoder
    /// accepts.
    pub fn raw_framing(&mut self) -> RawFraming<'_, W> {
        RawFraming {
            bout: &mut self.bout,
        }
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    fn write_object0(&mut self, graph: &ObjectGraph, value: Value) -> Result<(), StreamError> {
        self.depth += 1;
        let result = self.write_content(graph, value);
        self.depth -= 1;
        result
    }

    fn write_content(&mut self, graph: &ObjectGraph, value: Value) -> Result<(), StreamError> {
        let id = match value {
            Value::Null => return Ok(self.bout.write_u8(TC_NULL)?),
            Value::Prim(p) => return Err(StreamError::PrimitiveAsObject { kind: p.kind() }),
            Value::Ref(id) => id,
        };
        if let Some(handle) = self.handles.lookup(&HandleKey::Node(id)) {
            return self.write_handle(handle);
        }
        match graph.node(id)? {
            Node::Str(s) => {
                self.handles.assign(HandleKey::Node(id));
                self.write_string(s.units())
            }
            Node::Array(array) => self.write_array(graph, id, array),
            Node::ClassToken(desc) => {
                self.bout.write_u8(TC_CLASS)?;
                self.write_class_desc(desc)?;
                self.handles.assign(HandleKey::Node(id));
                Ok(())
            }
            Node::Instance(instance) => self.write_ordinary(graph, id, instance),
        }
    }

    fn write_handle(&mut self, handle: u32) -> Result<(), StreamError> {
        self.bout.write_u8(TC_REFERENCE)?;
        self.bout.write_bytes(&handle.to_be_bytes())?;
        Ok(())
    }

    /// `TC_STRING` or `TC_LONGSTRING` plus payload. The handle is the
    /// caller's business.
    fn write_string(&mut self, units: &[u16]) -> Result<(), StreamError> {
        let utf_len = mutf8::encoded_len(units);
        if utf_len <= MAX_SHORT_UTF_LEN {
            self.bout.write_u8(TC_STRING)?;
            self.write_utf_payload(units)
        } else {
            self.bout.write_u8(TC_LONGSTRING)?;
            self.bout.write_bytes(&utf_len.to_be_bytes())?;
            self.bout.write_bytes(&mutf8::encode(units))?;
            Ok(())
        }
    }

    fn write_utf_payload(&mut self, units: &[u16]) -> Result<(), StreamError> {
        let utf_len = mutf8::encoded_len(units);
        let short = u16::try_from(utf_len).map_err(|_| StreamError::UtfTooLong { len: utf_len })?;
        self.bout.write_bytes(&short.to_be_bytes())?;
        self.bout.write_bytes(&mutf8::encode(units))?;
        Ok(())
    }

    fn write_array(
        &mut self,
        graph: &ObjectGraph,
        id: ObjId,
        array: &ArrayNode,
    ) -> Result<(), StreamError> {
        self.bout.write_u8(TC_ARRAY)?;
        self.write_class_desc(&array.class)?;
        self.handles.assign(HandleKey::Node(id));
        let len = array.elements.len();
        let len = i32::try_from(len).map_err(|_| StreamError::LengthOverflow {
            what: "array",
            len,
        })?;
        self.bout.write_bytes(&len.to_be_bytes())?;
        match &array.elements {
            ArrayElements::Primitive { values, .. } => {
                let mut buf = Vec::with_capacity(values.iter().map(|v| v.kind().width()).sum());
                for v in values {
                    v.encode_into(&mut buf);
                }
                self.bout.write_bytes(&buf)?;
            }
            ArrayElements::Objects(values) => {
                for value in values {
                    self.write_object0(graph, *value)?;
                }
            }
        }
        Ok(())
    }

    fn write_class_desc(&mut self, desc: &Rc<ClassDesc>) -> Result<(), StreamError> {
        let key = HandleKey::Class(desc.name().to_string());
        if let Some(handle) = self.handles.lookup(&key) {
            return self.write_handle(handle);
        }
        self.bout.write_u8(TC_CLASSDESC)?;
        self.handles.assign(key);
        let name = JavaString::from(desc.name());
        self.write_utf_payload(name.units())?;
        self.bout.write_bytes(&desc.suid().to_be_bytes())?;
        self.bout.write_u8(desc.flags(self.protocol))?;

        let order = desc.wire_order();
        let count = u16::try_from(order.len()).map_err(|_| StreamError::LengthOverflow {
            what: "field list",
            len: order.len(),
        })?;
        self.bout.write_bytes(&count.to_be_bytes())?;
        for i in order {
            let field = &desc.fields()[i];
            self.bout.write_u8(field.type_code())?;
            self.write_utf_payload(JavaString::from(field.name.as_str()).units())?;
            if let FieldType::Object { signature } = &field.ty {
                self.write_type_string(signature)?;
            }
        }

        // Empty class annotation.
        self.bout.set_block_data_mode(true)?;
        self.bout.set_block_data_mode(false)?;
        self.bout.write_u8(TC_ENDBLOCKDATA)?;

        match desc.super_desc() {
            Some(super_desc) => self.write_class_desc(super_desc),
            None => Ok(self.bout.write_u8(TC_NULL)?),
        }
    }

    /// Field signature strings are shared by content within an epoch.
    fn write_type_string(&mut self, signature: &str) -> Result<(), StreamError> {
        let key = HandleKey::TypeString(signature.to_string());
        if let Some(handle) = self.handles.lookup(&key) {
            return self.write_handle(handle);
        }
        self.handles.assign(key);
        self.write_string(JavaString::from(signature).units())
    }

    fn write_ordinary(
        &mut self,
        graph: &ObjectGraph,
        id: ObjId,
        instance: &Instance,
    ) -> Result<(), StreamError> {
        let class = Rc::clone(instance.class());
        self.bout.write_u8(TC_OBJECT)?;
        self.write_class_desc(&class)?;
        self.handles.assign(HandleKey::Node(id));
        match class.kind() {
            ClassKind::Externalizable { hook } => {
                let hook = Rc::clone(hook);
                self.write_external_data(graph, id, &class, hook.as_ref())
            }
            ClassKind::Serializable { .. } => self.write_serial_data(graph, id, instance),
        }
    }

    fn write_external_data(
        &mut self,
        graph: &ObjectGraph,
        id: ObjId,
        class: &Rc<ClassDesc>,
        hook: &dyn WriteHook,
    ) -> Result<(), StreamError> {
        let frame = HookFrame {
            this: id,
            level: 0,
            class: Rc::clone(class),
            serializable: false,
            fields_written: false,
        };
        match self.protocol {
            ProtocolVersion::V1 => self.run_hook(frame, hook, graph),
            ProtocolVersion::V2 => {
                self.bout.set_block_data_mode(true)?;
                self.run_hook(frame, hook, graph)?;
                self.bout.set_block_data_mode(false)?;
                self.bout.write_u8(TC_ENDBLOCKDATA)?;
                Ok(())
            }
        }
    }

    fn write_serial_data(
        &mut self,
        graph: &ObjectGraph,
        id: ObjId,
        instance: &Instance,
    ) -> Result<(), StreamError> {
        for (level, desc) in instance.levels().iter().enumerate() {
            if let Some(hook) = desc.write_hook() {
                let hook = Rc::clone(hook);
                let frame = HookFrame {
                    this: id,
                    level,
                    class: Rc::clone(desc),
                    serializable: true,
                    fields_written: false,
                };
                self.bout.set_block_data_mode(true)?;
                self.run_hook(frame, hook.as_ref(), graph)?;
                self.bout.set_block_data_mode(false)?;
                self.bout.write_u8(TC_ENDBLOCKDATA)?;
            } else {
                self.default_write_fields(graph, instance, level)?;
            }
        }
        Ok(())
    }

    /// Run `hook` with `frame` as the current context. The frame is popped
    /// on every path.
    fn run_hook(
        &mut self,
        frame: HookFrame,
        hook: &dyn WriteHook,
        graph: &ObjectGraph,
    ) -> Result<(), StreamError> {
        let this = frame.this;
        self.hooks.push(frame);
        let result = hook.write(self, graph, this);
        self.hooks.pop();
        result
    }

    /// Primitive fields as one byte run, then object fields, in wire order.
    fn default_write_fields(
        &mut self,
        graph: &ObjectGraph,
        instance: &Instance,
        level: usize,
    ) -> Result<(), StreamError> {
        let desc = &instance.levels()[level];
        let slots = instance.level_slots(level);
        let order = desc.wire_order();

        let mut prim = Vec::new();
        for &i in &order {
            let field = &desc.fields()[i];
            if let (FieldType::Primitive(_), Some(Value::Prim(p))) = (&field.ty, slots.get(i)) {
                p.encode_into(&mut prim);
            }
        }
        self.bout.write_bytes(&prim)?;

        for &i in &order {
            if matches!(desc.fields()[i].ty, FieldType::Object { .. }) {
                let value = slots.get(i).copied().unwrap_or(Value::Null);
                self.write_object0(graph, value)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> ObjectOutput for ObjectStreamWriter<W> {
    fn write_primitive(&mut self, value: Primitive) -> Result<(), StreamError> {
        let mut buf = Vec::with_capacity(value.kind().width());
        value.encode_into(&mut buf);
        self.bout.write_bytes(&buf)?;
        Ok(())
    }

    fn write_utf(&mut self, s: &JavaString) -> Result<(), StreamError> {
        self.write_utf_payload(s.units())
    }

    fn write_object(&mut self, graph: &ObjectGraph, value: Value) -> Result<(), StreamError> {
        let old_mode = self.bout.set_block_data_mode(false)?;
        let result = self.write_object0(graph, value);
        let restored = self.bout.set_block_data_mode(old_mode);
        result?;
        restored?;
        Ok(())
    }

    fn default_write_object(&mut self, graph: &ObjectGraph) -> Result<(), StreamError> {
        let frame = self
            .hooks
            .last_mut()
            .filter(|f| f.serializable)
            .ok_or(StreamError::NotInWriteHook)?;
        if frame.fields_written {
            return Err(StreamError::DefaultFieldsAlreadyWritten {
                class: frame.class.name().to_string(),
            });
        }
        frame.fields_written = true;
        let (this, level) = (frame.this, frame.level);

        let instance = graph.instance(this)?;
        self.bout.set_block_data_mode(false)?;
        self.default_write_fields(graph, instance, level)?;
        self.bout.set_block_data_mode(true)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StreamError> {
        if self.depth != 0 {
            return Err(StreamError::ResetInsideObject { depth: self.depth });
        }
        self.bout.set_block_data_mode(false)?;
        self.bout.write_u8(TC_RESET)?;
        self.handles.clear();
        self.bout.set_block_data_mode(true)?;
        debug!("stream reset");
        Ok(())
    }
}

/// Raw block-framing control over a writer's sink.
///
/// Obtained from [`ObjectStreamWriter::raw_framing`]. Nothing here checks
/// protocol state.
pub struct RawFraming<'a, W: Write> {
    bout: &'a mut BlockDataOutput<W>,
}

impl<W: Write> RawFraming<'_, W> {
    /// Switch block-data mode, returning the previous mode.
    ///
    /// # Errors
    ///
    /// I/O failure while draining.
    pub fn set_block_data_mode(&mut self, mode: bool) -> Result<bool, StreamError> {
        Ok(self.bout.set_block_data_mode(mode)?)
    }

    /// Enter block-data mode.
    ///
    /// # Errors
    ///
    /// I/O failure while draining.
    pub fn start_block(&mut self) -> Result<(), StreamError> {
        self.set_block_data_mode(true).map(|_| ())
    }

    /// Leave block-data mode and flush, closing the current block.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn end_block(&mut self) -> Result<(), StreamError> {
        self.bout.set_block_data_mode(false)?;
        self.flush()
    }

    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.bout.flush()?;
        Ok(())
    }

    /// Flush, then write `bytes` straight to the sink.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.flush()?;
        self.bout.write_unbuffered(bytes)?;
        Ok(())
    }

    /// Close the current block and emit a zero-length block header.
    ///
    /// # Errors
    ///
    /// I/O failure of the sink.
    pub fn emit_empty_block(&mut self) -> Result<(), StreamError> {
        self.end_block()?;
        self.write_raw(&[TC_BLOCKDATA, 0])
    }
}
