//! Typed stream-writer errors.
//!
//! Every failure is reported, none is recovered: a stream that returned an
//! error is in an unspecified framing state and must be discarded.

use crate::graph::ObjId;

/// Failure while writing a stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `default_write_object` was called with no serializable hook active,
    /// including from inside an externalized hook.
    #[error("default_write_object called outside a serializable write hook")]
    NotInWriteHook,

    /// `default_write_object` was called twice for one hierarchy level.
    #[error("default fields of {class} already written")]
    DefaultFieldsAlreadyWritten { class: String },

    /// `reset` was requested while an object was being written.
    #[error("reset requested at object depth {depth}")]
    ResetInsideObject { depth: u32 },

    /// Protocol revision switch after handles were assigned.
    #[error("protocol version switch on a stream holding {handles} handles")]
    ProtocolSwitchOnNonEmptyStream { handles: usize },

    /// A protocol revision number other than 1 or 2.
    #[error("unsupported protocol version {version}")]
    UnsupportedProtocolVersion { version: u8 },

    /// A field name does not exist anywhere in the class hierarchy.
    #[error("class {class} has no field {field}")]
    UnknownField { class: String, field: String },

    /// A value does not fit the declared field or element type.
    #[error("type mismatch for {target}: {detail}")]
    TypeMismatch { target: String, detail: String },

    /// An `ObjId` that does not belong to the graph.
    #[error("object {id:?} is not in the graph")]
    DanglingObject { id: ObjId },

    /// The node is not of the kind the operation needs.
    #[error("object {id:?} is not {expected}")]
    WrongNodeKind { id: ObjId, expected: &'static str },

    /// A primitive was handed to `write_object`.
    #[error("primitive {kind} cannot be written as an object; box it first")]
    PrimitiveAsObject { kind: crate::primitive::PrimitiveKind },

    /// A `write_utf` payload longer than the 16-bit length prefix allows.
    #[error("modified UTF-8 payload of {len} bytes exceeds 65535")]
    UtfTooLong { len: u64 },

    /// An array or string whose length does not fit the wire field.
    #[error("{what} length {len} exceeds wire limit")]
    LengthOverflow { what: &'static str, len: usize },
}
