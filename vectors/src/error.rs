//! Typed generation errors.

use std::path::PathBuf;

use jser_wire::StreamError;

/// Failure while generating vectors.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// The stream writer rejected an operation.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// I/O failure on an artifact or the output directory.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an in-memory or already-opened sink.
    #[error("I/O error: {0}")]
    Sink(#[from] std::io::Error),

    /// The generic filler met a field shape it cannot produce.
    #[error("cannot fill field {field} of shape {shape}: unsupported field shape {detail}")]
    UnsupportedFieldShape {
        shape: String,
        field: String,
        detail: String,
    },

    /// A shape declares fields in an order the writer does not emit.
    #[error("shape {shape} declares fields out of wire order: {detail}")]
    ShapeOrder { shape: String, detail: String },

    /// An aggregate does not match its shape.
    #[error("aggregate does not match shape {shape}: {detail}")]
    ShapeMismatch { shape: String, detail: String },

    /// Special-float probabilities out of range.
    #[error("invalid float policy: {detail}")]
    InvalidPolicy { detail: String },

    /// Generation parameters out of range.
    #[error("invalid parameters: {detail}")]
    InvalidParams { detail: String },

    /// A scenario name that is not in the catalog.
    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },

    /// Manifest serialization failed.
    #[error("manifest error: {detail}")]
    Manifest { detail: String },
}

impl VectorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
