//! Jser Wire: writer side of the Java Object Serialization Stream Protocol.
//!
//! The crate produces byte streams that a conformant `ObjectInputStream`
//! decoder accepts. It is write-only: there is no reader.
//!
//! # Layers
//!
//! `constants` ← `primitive` ← `mutf8` ← `block` ← `class`/`graph` ← `handles` ← `writer`
//!
//! `class` names the [`writer::WriteHook`] trait so descriptors can carry
//! hooks; apart from that the direction is one-way.
//!
//! # Key types
//!
//! - [`writer::ObjectStreamWriter`] -- the stream session (header, handles, resets)
//! - [`writer::ObjectOutput`] -- object-safe write surface, also handed to hooks
//! - [`writer::RawFraming`] -- advanced capability for forcing block framing
//! - [`graph::ObjectGraph`] -- arena of heap nodes; identity is the arena slot
//! - [`class::ClassDesc`] -- class descriptor with optional custom write hook

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod block;
pub mod class;
pub mod constants;
pub mod error;
pub mod graph;
pub mod handles;
pub mod mutf8;
pub mod primitive;
pub mod writer;

pub use error::StreamError;
