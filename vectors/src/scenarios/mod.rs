//! The scenario catalog.
//!
//! Every scenario is a fixed sequence of writer operations run against a
//! fresh [`Session`]: one stream, one object graph, and for value-bearing
//! scenarios one oracle. Only [`Scenario::Random`] consumes entropy, all of
//! it from a generator seeded per run.

mod framing;
mod graphs;
mod hooks;
mod primitives;
mod random;
mod strings;

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use jser_wire::class::ClassDesc;
use jser_wire::graph::{ObjId, ObjectGraph, Value};
use jser_wire::primitive::{JavaString, Primitive};
use jser_wire::writer::{ObjectOutput, ObjectStreamWriter};

use crate::config::GenerationParams;
use crate::error::VectorError;
use crate::oracle::OracleWriter;
use crate::randomizer::Randomizer;
use crate::shapes::ShapeRegistry;
use crate::value::Datum;

/// A named catalog entry. Declaration order is generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scenario {
    Primitives,
    Floats,
    IntLimits,
    PrimitiveWrappers,
    Strings,
    Arrays,
    ObjRefVsEq,
    Blocks,
    Circular,
    Handlers,
    MutualRefs,
    Inheritance,
    ClassDescs,
    ProtocolVersion,
    Random,
}

impl Scenario {
    pub const ALL: [Self; 15] = [
        Self::Primitives,
        Self::Floats,
        Self::IntLimits,
        Self::PrimitiveWrappers,
        Self::Strings,
        Self::Arrays,
        Self::ObjRefVsEq,
        Self::Blocks,
        Self::Circular,
        Self::Handlers,
        Self::MutualRefs,
        Self::Inheritance,
        Self::ClassDescs,
        Self::ProtocolVersion,
        Self::Random,
    ];

    /// Artifact stem.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primitives => "primitives",
            Self::Floats => "floats",
            Self::IntLimits => "int-limits",
            Self::PrimitiveWrappers => "primitive-wrappers",
            Self::Strings => "strings",
            Self::Arrays => "arrays",
            Self::ObjRefVsEq => "obj-ref-vs-eq",
            Self::Blocks => "blocks",
            Self::Circular => "circular",
            Self::Handlers => "handlers",
            Self::MutualRefs => "mutual-refs",
            Self::Inheritance => "inheritance",
            Self::ClassDescs => "class-descs",
            Self::ProtocolVersion => "protocol-version",
            Self::Random => "random",
        }
    }

    /// # Errors
    ///
    /// [`VectorError::UnknownScenario`] for a name outside the catalog.
    pub fn from_name(name: &str) -> Result<Self, VectorError> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| VectorError::UnknownScenario {
                name: name.to_string(),
            })
    }

    /// Whether the scenario writes an oracle next to its stream.
    #[must_use]
    pub const fn has_oracle(self) -> bool {
        matches!(
            self,
            Self::Primitives | Self::Floats | Self::IntLimits | Self::Strings | Self::Random
        )
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Primitives => "one literal per primitive kind",
            Self::Floats => "signed zeros, infinities, NaN and a subnormal, float then double",
            Self::IntLimits => "-1, 0, 1, MIN and MAX per integer kind, surrogate boundary chars",
            Self::PrimitiveWrappers => "one boxed value per primitive kind",
            Self::Strings => "empty, NUL, both sides of the long-string boundary, every code unit",
            Self::Arrays => "empty, all bytes, int matrix, linked records",
            Self::ObjRefVsEq => "equal but distinct instances, back-references, resets",
            Self::Blocks => "an int split across empty and partial blocks, empty blocks between objects",
            Self::Circular => "a record referencing itself",
            Self::Handlers => "custom write hooks and an externalized object",
            Self::MutualRefs => "two record kinds referencing each other",
            Self::Inheritance => "hooked subtype over a serializable supertype",
            Self::ClassDescs => "class tokens for plain, externalized and array types",
            Self::ProtocolVersion => "externalized data under protocol 2, then protocol 1",
            Self::Random => "seeded mix of primitives and records",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one scenario run produced besides its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioOutcome {
    /// Oracle lines written; `None` for binary-only scenarios.
    pub oracle_lines: Option<u64>,
}

/// Run `scenario` into `bin` and, if the scenario has one, its oracle into
/// `oracle`. Both sinks are flushed before returning.
///
/// # Errors
///
/// Writer rejections, sink I/O failures and generation errors of the
/// random scenario.
pub fn run_scenario(
    scenario: Scenario,
    params: &GenerationParams,
    seed: u64,
    bin: &mut dyn Write,
    oracle: Option<&mut dyn Write>,
) -> Result<ScenarioOutcome, VectorError> {
    debug!(scenario = scenario.name(), seed, "scenario started");
    let oracle: Option<Box<dyn Write + '_>> = match oracle {
        Some(sink) if scenario.has_oracle() => Some(Box::new(sink)),
        _ => None,
    };
    let mut session = Session::new(params, seed, Box::new(bin), oracle)?;
    match scenario {
        Scenario::Primitives => primitives::primitives(&mut session)?,
        Scenario::Floats => primitives::floats(&mut session)?,
        Scenario::IntLimits => primitives::int_limits(&mut session)?,
        Scenario::PrimitiveWrappers => primitives::wrappers(&mut session)?,
        Scenario::Strings => strings::strings(&mut session)?,
        Scenario::Arrays => graphs::arrays(&mut session)?,
        Scenario::ObjRefVsEq => graphs::obj_ref_vs_eq(&mut session)?,
        Scenario::Blocks => framing::blocks(&mut session)?,
        Scenario::Circular => graphs::circular(&mut session)?,
        Scenario::Handlers => hooks::handlers(&mut session)?,
        Scenario::MutualRefs => graphs::mutual_refs(&mut session)?,
        Scenario::Inheritance => hooks::inheritance(&mut session)?,
        Scenario::ClassDescs => hooks::class_descs(&mut session)?,
        Scenario::ProtocolVersion => framing::protocol_version(&mut session)?,
        Scenario::Random => random::random(&mut session)?,
    }
    let outcome = session.finish()?;
    debug!(
        scenario = scenario.name(),
        oracle_lines = ?outcome.oracle_lines,
        "scenario finished"
    );
    Ok(outcome)
}

/// One writer session plus the state a scenario body needs.
pub(crate) struct Session<'a> {
    pub(crate) out: ObjectStreamWriter<Box<dyn Write + 'a>>,
    oracle: Option<OracleWriter<Box<dyn Write + 'a>>>,
    pub(crate) graph: ObjectGraph,
    pub(crate) params: &'a GenerationParams,
    pub(crate) rng: StdRng,
    pub(crate) randomizer: Randomizer,
    pub(crate) registry: ShapeRegistry,
}

impl<'a> Session<'a> {
    fn new(
        params: &'a GenerationParams,
        seed: u64,
        bin: Box<dyn Write + 'a>,
        oracle: Option<Box<dyn Write + 'a>>,
    ) -> Result<Self, VectorError> {
        params.validate()?;
        Ok(Self {
            out: ObjectStreamWriter::new(bin)?,
            oracle: oracle.map(OracleWriter::new),
            graph: ObjectGraph::new(),
            params,
            rng: StdRng::seed_from_u64(seed),
            randomizer: Randomizer::new(params.float_policy)?,
            registry: ShapeRegistry::new(&params.class_prefix),
        })
    }

    fn finish(self) -> Result<ScenarioOutcome, VectorError> {
        self.out.finish()?;
        let oracle_lines = match self.oracle {
            Some(oracle) => {
                let lines = oracle.lines();
                oracle.finish()?;
                Some(lines)
            }
            None => None,
        };
        Ok(ScenarioOutcome { oracle_lines })
    }

    /// Record the oracle line for `datum`, if this session keeps one.
    pub(crate) fn oracle_line(&mut self, datum: &Datum) -> Result<(), VectorError> {
        match &mut self.oracle {
            Some(oracle) => oracle.write(datum),
            None => Ok(()),
        }
    }

    /// Write a primitive and its oracle line.
    pub(crate) fn prim(&mut self, value: Primitive) -> Result<(), VectorError> {
        self.out.write_primitive(value)?;
        self.oracle_line(&Datum::Prim(value))
    }

    /// Write a fresh string object and its oracle line.
    pub(crate) fn string(&mut self, s: JavaString) -> Result<(), VectorError> {
        let id = self.graph.add_string(s.clone());
        self.object(id)?;
        self.oracle_line(&Datum::Str(s))
    }

    pub(crate) fn object(&mut self, id: ObjId) -> Result<(), VectorError> {
        self.out.write_object(&self.graph, Value::Ref(id))?;
        Ok(())
    }

    pub(crate) fn class_name(&self, simple: &str) -> String {
        format!("{}{simple}", self.params.class_prefix)
    }

    pub(crate) fn register(&mut self, desc: ClassDesc) -> Rc<ClassDesc> {
        self.graph.register_class(desc)
    }

    pub(crate) fn instance(
        &mut self,
        class: &Rc<ClassDesc>,
        values: &[(&str, Value)],
    ) -> Result<ObjId, VectorError> {
        Ok(self.graph.add_instance(class, values)?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Run `scenario` in memory with default parameters.
    pub(crate) fn run(scenario: Scenario) -> (Vec<u8>, String) {
        run_with(scenario, &GenerationParams::default(), 7)
    }

    pub(crate) fn run_with(
        scenario: Scenario,
        params: &GenerationParams,
        seed: u64,
    ) -> (Vec<u8>, String) {
        let mut bin = Vec::new();
        let mut oracle = Vec::new();
        run_scenario(scenario, params, seed, &mut bin, Some(&mut oracle)).unwrap();
        (bin, String::from_utf8(oracle).unwrap())
    }

    /// Stream bytes after the 4-byte header.
    pub(crate) fn body(bin: &[u8]) -> &[u8] {
        assert_eq!(&bin[..4], [0xAC, 0xED, 0x00, 0x05]);
        &bin[4..]
    }

    pub(crate) fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }
}
