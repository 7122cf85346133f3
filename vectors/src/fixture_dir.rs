//! Fixture directory materialization.
//!
//! Layout of a generated directory:
//!
//! ```text
//! <out_dir>/
//!   <scenario>.ser     stream bytes, one per selected scenario
//!   <scenario>.txt     oracle lines, value-bearing scenarios only
//!   manifest.json      seed, parameters, per-artifact size and digest
//! ```
//!
//! Artifacts are digested while they are written, so the manifest never
//! re-reads the directory. Existing files are overwritten; a failed run may
//! leave partial artifacts behind and no manifest.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::{GenerationParams, GeneratorConfig};
use crate::error::VectorError;
use crate::randomizer::SpecialFloatPolicy;
use crate::scenarios::{self, Scenario};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_SCHEMA: &str = "jser_vectors.manifest.v1";

/// Digest prefix used in the manifest.
const DIGEST_PREFIX: &str = "sha256:";

/// One file written to the fixture directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub file: String,
    pub bytes: u64,
    /// `sha256:<hex>` of the file content.
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub stream: ArtifactRecord,
    pub oracle: Option<ArtifactRecord>,
    pub oracle_lines: Option<u64>,
}

/// Everything one run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureReport {
    pub out_dir: PathBuf,
    pub scenarios: Vec<ScenarioReport>,
    /// Digest of the manifest bytes.
    pub manifest_digest: String,
}

/// Write sink that hashes and counts everything passing through.
struct DigestWriter<W: Write> {
    inner: W,
    hasher: Sha256,
    bytes: u64,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    fn finish(mut self, file: String) -> io::Result<ArtifactRecord> {
        self.inner.flush()?;
        Ok(ArtifactRecord {
            file,
            bytes: self.bytes,
            digest: format!("{DIGEST_PREFIX}{}", hex::encode(self.hasher.finalize())),
        })
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn create(path: &Path) -> Result<DigestWriter<BufWriter<File>>, VectorError> {
    let file = File::create(path).map_err(|e| VectorError::io(path, e))?;
    Ok(DigestWriter::new(BufWriter::new(file)))
}

/// Generate every selected scenario into `config.out_dir` and write the
/// manifest.
///
/// # Errors
///
/// Invalid parameters, I/O failures on the directory or an artifact, and
/// any scenario failure. Generation stops at the first error.
pub fn write_fixture_dir(config: &GeneratorConfig) -> Result<FixtureReport, VectorError> {
    config.validate()?;
    let dir = &config.out_dir;
    std::fs::create_dir_all(dir).map_err(|e| VectorError::io(dir, e))?;

    let mut reports = Vec::new();
    for scenario in config.selected_scenarios() {
        reports.push(write_scenario(dir, scenario, config)?);
    }

    let manifest = manifest_bytes(config, &reports)?;
    let manifest_path = dir.join(MANIFEST_FILE);
    write_atomic(&manifest_path, &manifest)?;
    let manifest_digest = format!("{DIGEST_PREFIX}{}", hex::encode(Sha256::digest(&manifest)));
    info!(
        dir = %dir.display(),
        scenarios = reports.len(),
        manifest = %manifest_digest,
        "fixture directory written"
    );

    Ok(FixtureReport {
        out_dir: dir.clone(),
        scenarios: reports,
        manifest_digest,
    })
}

fn write_scenario(
    dir: &Path,
    scenario: Scenario,
    config: &GeneratorConfig,
) -> Result<ScenarioReport, VectorError> {
    let stream_file = format!("{}.ser", scenario.name());
    let oracle_file = format!("{}.txt", scenario.name());
    let stream_path = dir.join(&stream_file);
    let oracle_path = dir.join(&oracle_file);

    let mut stream = create(&stream_path)?;
    let mut oracle = if scenario.has_oracle() {
        Some(create(&oracle_path)?)
    } else {
        None
    };

    let outcome = scenarios::run_scenario(
        scenario,
        &config.params,
        config.seed,
        &mut stream,
        oracle.as_mut().map(|w| w as &mut dyn Write),
    )?;

    let stream = stream
        .finish(stream_file)
        .map_err(|e| VectorError::io(&stream_path, e))?;
    info!(
        scenario = scenario.name(),
        file = %stream.file,
        bytes = stream.bytes,
        "artifact written"
    );
    let oracle = match oracle {
        Some(w) => {
            let record = w
                .finish(oracle_file)
                .map_err(|e| VectorError::io(&oracle_path, e))?;
            info!(
                scenario = scenario.name(),
                file = %record.file,
                bytes = record.bytes,
                lines = outcome.oracle_lines.unwrap_or_default(),
                "artifact written"
            );
            Some(record)
        }
        None => None,
    };

    Ok(ScenarioReport {
        scenario,
        stream,
        oracle,
        oracle_lines: outcome.oracle_lines,
    })
}

/// Shortest decimal of an `f32`, as a JSON number.
fn json_f32(v: f32) -> serde_json::Value {
    v.to_string()
        .parse::<f64>()
        .map_or(serde_json::Value::Null, serde_json::Value::from)
}

fn policy_json(policy: &SpecialFloatPolicy) -> serde_json::Value {
    serde_json::json!({
        "p_infinity": json_f32(policy.p_infinity),
        "p_nan": json_f32(policy.p_nan),
        "p_subnormal": json_f32(policy.p_subnormal),
        "p_zero": json_f32(policy.p_zero),
    })
}

fn params_json(params: &GenerationParams) -> serde_json::Value {
    serde_json::json!({
        "class_prefix": params.class_prefix,
        "float_policy": policy_json(&params.float_policy),
        "primitive_ratio": json_f32(params.primitive_ratio),
        "random_items": params.random_items,
    })
}

fn artifact_json(record: &ArtifactRecord) -> serde_json::Value {
    serde_json::json!({
        "bytes": record.bytes,
        "digest": record.digest,
        "file": record.file,
    })
}

/// Manifest bytes: pretty JSON with sorted keys and a trailing newline.
fn manifest_bytes(
    config: &GeneratorConfig,
    reports: &[ScenarioReport],
) -> Result<Vec<u8>, VectorError> {
    let mut scenarios = serde_json::Map::new();
    for report in reports {
        scenarios.insert(
            report.scenario.name().to_string(),
            serde_json::json!({
                "oracle": report.oracle.as_ref().map(artifact_json),
                "oracle_lines": report.oracle_lines,
                "stream": artifact_json(&report.stream),
            }),
        );
    }
    let manifest = serde_json::json!({
        "params": params_json(&config.params),
        "scenarios": scenarios,
        "schema_version": MANIFEST_SCHEMA,
        "seed": config.seed,
    });
    let mut bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| VectorError::Manifest {
        detail: e.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write bytes to a path via temp file + rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), VectorError> {
    let dir = path.parent().ok_or_else(|| VectorError::Manifest {
        detail: format!("{} has no parent directory", path.display()),
    })?;
    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dir.join(temp_name);
    std::fs::write(&temp_path, content).map_err(|e| VectorError::io(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| VectorError::io(path, e))?;
    Ok(())
}
