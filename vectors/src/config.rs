//! Run configuration.
//!
//! No file format: the binary maps its flags onto [`GeneratorConfig`], tests
//! build one directly.

use std::path::PathBuf;

use crate::error::VectorError;
use crate::randomizer::SpecialFloatPolicy;
use crate::scenarios::Scenario;

/// Package prefix of every record class the catalog writes. Decoder suites
/// register handlers under these names.
pub const DEFAULT_CLASS_PREFIX: &str = "com.o11k.GenerateTests$";

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0x6a73_6572_7665_6374;

/// Knobs of the randomized scenario and record naming.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Values written by the `random` scenario.
    pub random_items: usize,
    /// Probability that a random item is a bare primitive rather than a record.
    pub primitive_ratio: f32,
    pub float_policy: SpecialFloatPolicy,
    pub class_prefix: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            random_items: 10_000,
            primitive_ratio: 0.5,
            float_policy: SpecialFloatPolicy::default(),
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
        }
    }
}

impl GenerationParams {
    /// # Errors
    ///
    /// [`VectorError::InvalidParams`] for a ratio outside `[0, 1]`,
    /// [`VectorError::InvalidPolicy`] for a bad float policy.
    pub fn validate(&self) -> Result<(), VectorError> {
        if !(0.0..=1.0).contains(&self.primitive_ratio) {
            return Err(VectorError::InvalidParams {
                detail: format!("primitive_ratio {} outside [0, 1]", self.primitive_ratio),
            });
        }
        self.float_policy.validate()
    }
}

/// One generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub out_dir: PathBuf,
    pub seed: u64,
    /// Scenarios to generate; empty selects the whole catalog.
    pub scenarios: Vec<Scenario>,
    pub params: GenerationParams,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            seed: DEFAULT_SEED,
            scenarios: Vec::new(),
            params: GenerationParams::default(),
        }
    }

    /// # Errors
    ///
    /// As [`GenerationParams::validate`].
    pub fn validate(&self) -> Result<(), VectorError> {
        self.params.validate()
    }

    /// Selected scenarios in catalog order, duplicates removed.
    #[must_use]
    pub fn selected_scenarios(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() {
            return Scenario::ALL.to_vec();
        }
        Scenario::ALL
            .iter()
            .copied()
            .filter(|s| self.scenarios.contains(s))
            .collect()
    }
}
