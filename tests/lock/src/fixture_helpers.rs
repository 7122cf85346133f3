//! Helpers for generating and inspecting vector directories in lock tests.
//!
//! Every helper panics on failure; they exist only to keep test bodies
//! focused on the property under test.

use std::path::Path;

use jser_vectors::config::GeneratorConfig;
use jser_vectors::fixture_dir::{write_fixture_dir, FixtureReport, MANIFEST_FILE};
use jser_vectors::scenarios::Scenario;
use jser_wire::constants::{STREAM_MAGIC, STREAM_VERSION};
use sha2::{Digest, Sha256};

/// Item count small enough to keep lock tests fast.
pub const LOCK_RANDOM_ITEMS: usize = 200;

/// Generate `scenarios` (all when empty) into `dir` with the default seed.
///
/// # Panics
///
/// Panics if generation fails.
#[must_use]
pub fn generate(dir: &Path, scenarios: &[Scenario]) -> FixtureReport {
    let mut config = GeneratorConfig::new(dir);
    config.scenarios = scenarios.to_vec();
    config.params.random_items = LOCK_RANDOM_ITEMS;
    write_fixture_dir(&config).unwrap()
}

/// # Panics
///
/// Panics if the file cannot be read.
#[must_use]
pub fn read_artifact(dir: &Path, file: &str) -> Vec<u8> {
    std::fs::read(dir.join(file)).unwrap_or_else(|e| panic!("read {file}: {e}"))
}

/// # Panics
///
/// Panics if the manifest is missing or not JSON.
#[must_use]
pub fn read_manifest(dir: &Path) -> serde_json::Value {
    serde_json::from_slice(&read_artifact(dir, MANIFEST_FILE)).unwrap()
}

/// `sha256:<hex>` of `bytes`, as the manifest spells it.
#[must_use]
pub fn sha256_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// Stream bytes after the four-byte header.
///
/// # Panics
///
/// Panics if the header is not magic plus version 5.
#[must_use]
pub fn stream_body(bytes: &[u8]) -> &[u8] {
    let mut header = STREAM_MAGIC.to_be_bytes().to_vec();
    header.extend(STREAM_VERSION.to_be_bytes());
    assert_eq!(&bytes[..4], header.as_slice(), "stream header");
    &bytes[4..]
}

#[must_use]
pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}
