//! Jser Vectors: conformance vectors for object serialization stream decoders.
//!
//! Each scenario drives a [`jser_wire`] writer session into one protocol
//! state and, for value-bearing scenarios, records the expected values as
//! oracle lines a decoder's output is compared against.
//!
//! # Module Dependency Direction
//!
//! `error` ← `value` ← `randomizer`/`shapes` ← `canon` ← `oracle` ← `config` ← `scenarios` ← `fixture_dir`
//!
//! # Key types
//!
//! - [`value::Datum`] -- closed sum of everything the encoder renders
//! - [`randomizer::Randomizer`] -- edge-case biased value source
//! - [`shapes::ShapeRegistry`] -- statically declared record shapes
//! - [`scenarios::Scenario`] -- the catalog
//! - [`fixture_dir::write_fixture_dir`] -- materializes a run on disk

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod canon;
pub mod config;
pub mod error;
pub mod fixture_dir;
pub mod oracle;
pub mod randomizer;
pub mod scenarios;
pub mod shapes;
pub mod value;

pub use error::VectorError;
