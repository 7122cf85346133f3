//! Lock tests binding `manifest.json` to the artifacts it lists.
//!
//! Proves that the manifest:
//! - Names every artifact of every selected scenario, and nothing else
//! - Carries byte counts and `sha256:` digests matching the files on disk
//! - Records oracle line counts that match the oracle files
//! - Is byte-identical across runs with the same configuration

use lock_tests::fixture_helpers::{generate, read_artifact, read_manifest, sha256_digest};
use jser_vectors::fixture_dir::{MANIFEST_FILE, MANIFEST_SCHEMA};
use jser_vectors::scenarios::Scenario;

#[test]
fn manifest_lists_every_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let _ = generate(dir.path(), &[]);
    let manifest = read_manifest(dir.path());
    assert_eq!(manifest["schema_version"], MANIFEST_SCHEMA);
    let scenarios = manifest["scenarios"].as_object().unwrap();
    assert_eq!(scenarios.len(), Scenario::ALL.len());
    for scenario in Scenario::ALL {
        let entry = &scenarios[scenario.name()];
        assert_eq!(
            entry["stream"]["file"],
            format!("{}.ser", scenario.name()),
            "{scenario}"
        );
        assert_eq!(
            entry["oracle"].is_object(),
            scenario.has_oracle(),
            "{scenario}: oracle presence"
        );
    }
}

#[test]
fn manifest_digests_match_files() {
    let dir = tempfile::tempdir().unwrap();
    let _ = generate(dir.path(), &[]);
    let manifest = read_manifest(dir.path());
    for (name, entry) in manifest["scenarios"].as_object().unwrap() {
        for role in ["stream", "oracle"] {
            let artifact = &entry[role];
            if artifact.is_null() {
                continue;
            }
            let file = artifact["file"].as_str().unwrap();
            let bytes = read_artifact(dir.path(), file);
            assert_eq!(artifact["bytes"], bytes.len(), "{name}/{role}: byte count");
            assert_eq!(
                artifact["digest"],
                sha256_digest(&bytes),
                "{name}/{role}: digest"
            );
        }
    }
}

#[test]
fn oracle_line_counts_match_files() {
    let dir = tempfile::tempdir().unwrap();
    let _ = generate(dir.path(), &[]);
    let manifest = read_manifest(dir.path());
    for scenario in Scenario::ALL.into_iter().filter(|s| s.has_oracle()) {
        let entry = &manifest["scenarios"][scenario.name()];
        let text = String::from_utf8(read_artifact(dir.path(), &format!("{scenario}.txt"))).unwrap();
        assert!(text.ends_with('\n'), "{scenario}: trailing newline");
        assert_eq!(entry["oracle_lines"], text.lines().count(), "{scenario}");
    }
}

#[test]
fn report_digest_matches_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(dir.path(), &[Scenario::Primitives, Scenario::Blocks]);
    let bytes = read_artifact(dir.path(), MANIFEST_FILE);
    assert_eq!(report.manifest_digest, sha256_digest(&bytes));
    assert_eq!(report.scenarios.len(), 2);
}

#[test]
fn rerun_into_same_directory_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let first = generate(dir.path(), &[]);
    let manifest = read_artifact(dir.path(), MANIFEST_FILE);
    let second = generate(dir.path(), &[]);
    assert_eq!(first, second);
    assert_eq!(manifest, read_artifact(dir.path(), MANIFEST_FILE));
}

#[test]
fn separate_directories_produce_identical_bytes() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let ra = generate(a.path(), &[]);
    let rb = generate(b.path(), &[]);
    assert_eq!(ra.manifest_digest, rb.manifest_digest);
    for scenario in &ra.scenarios {
        let file = &scenario.stream.file;
        assert_eq!(
            read_artifact(a.path(), file),
            read_artifact(b.path(), file),
            "{file}"
        );
    }
}
