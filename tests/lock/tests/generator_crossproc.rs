//! Cross-process determinism of the `vector_generator` binary.
//!
//! Spawns the generator under several environment variants (cwd, locale,
//! timezone) into separate output directories and asserts identical stdout
//! and identical artifact bytes. Also locks the CLI surface: seed
//! sensitivity, scenario selection, catalog listing and failure exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lock_tests::fixture_helpers::read_artifact;
use jser_vectors::scenarios::Scenario;

/// Resolve the path to the compiled `vector_generator` binary.
fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("can resolve test binary path")
        .parent()
        .expect("binary dir exists")
        .parent()
        .expect("deps parent exists")
        .to_path_buf();
    path.push("vector_generator");
    path
}

fn spawn(work_dir: &Path, args: &[&str], env_overrides: &[(&str, &str)]) -> Output {
    let bin = binary_path();
    let mut command = Command::new(&bin);
    command
        .current_dir(work_dir)
        .args(args)
        .env_remove("LC_ALL")
        .env_remove("LANG")
        .env_remove("RUST_LOG");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }
    command
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {}: {e}", bin.display()))
}

/// Run the generator into `out` and return its stdout.
fn generate(work_dir: &Path, out: &Path, extra: &[&str], env: &[(&str, &str)]) -> String {
    let out = out.to_string_lossy();
    let mut args = vec!["--out", out.as_ref(), "--items", "300"];
    args.extend_from_slice(extra);
    let output = spawn(work_dir, &args, env);
    assert!(
        output.status.success(),
        "vector_generator exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

/// The `key=value` line for `key` in generator stdout.
fn line_for<'a>(stdout: &'a str, key: &str) -> &'a str {
    stdout
        .lines()
        .find(|l| l.split('=').next() == Some(key))
        .unwrap_or_else(|| panic!("no {key} line in output:\n{stdout}"))
}

#[test]
fn crossproc_determinism_three_env_variants() {
    let root = tempfile::tempdir().unwrap();
    let cwd_a = tempfile::tempdir().unwrap();
    let variants: [(&Path, &[(&str, &str)]); 3] = [
        (root.path(), &[]),
        (cwd_a.path(), &[("LANG", "tr_TR.UTF-8"), ("LC_ALL", "tr_TR.UTF-8")]),
        (Path::new("/"), &[("TZ", "Pacific/Kiritimati"), ("RUST_LOG", "debug")]),
    ];

    let mut outputs = Vec::new();
    for (i, (cwd, env)) in variants.iter().enumerate() {
        let out = root.path().join(format!("run{i}"));
        outputs.push((out.clone(), generate(cwd, &out, &[], env)));
    }

    let (first_dir, baseline) = &outputs[0];
    assert!(baseline.lines().last().unwrap().starts_with("manifest=sha256:"));
    assert_eq!(
        baseline.lines().count(),
        Scenario::ALL.len() + Scenario::ALL.iter().filter(|s| s.has_oracle()).count() + 1
    );
    for (dir, stdout) in &outputs[1..] {
        assert_eq!(stdout, baseline, "stdout differs for {}", dir.display());
        for scenario in Scenario::ALL {
            let file = format!("{scenario}.ser");
            assert_eq!(
                read_artifact(dir, &file),
                read_artifact(first_dir, &file),
                "{file} differs for {}",
                dir.display()
            );
        }
    }
}

#[test]
fn seed_only_changes_random_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let a = generate(root.path(), &root.path().join("a"), &["--seed", "1"], &[]);
    let b = generate(root.path(), &root.path().join("b"), &["--seed", "2"], &[]);
    assert_ne!(line_for(&a, "random.ser"), line_for(&b, "random.ser"));
    assert_ne!(line_for(&a, "random.txt"), line_for(&b, "random.txt"));
    for scenario in Scenario::ALL.into_iter().filter(|s| *s != Scenario::Random) {
        let key = format!("{scenario}.ser");
        assert_eq!(line_for(&a, &key), line_for(&b, &key), "{key}");
    }
}

#[test]
fn scenario_flag_selects_subset() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("subset");
    let stdout = generate(
        root.path(),
        &out,
        &["--scenario", "strings", "--scenario", "circular"],
        &[],
    );
    let keys: Vec<&str> = stdout
        .lines()
        .filter_map(|l| l.split('=').next())
        .collect();
    // Catalog order, not flag order.
    assert_eq!(keys, ["strings.ser", "strings.txt", "circular.ser", "manifest"]);
    assert!(!out.join("random.ser").exists());
}

#[test]
fn list_prints_catalog() {
    let root = tempfile::tempdir().unwrap();
    let output = spawn(root.path(), &["--list"], &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), Scenario::ALL.len());
    for scenario in Scenario::ALL {
        assert!(
            stdout.lines().any(|l| l.split_whitespace().next() == Some(scenario.name())),
            "{scenario} missing from --list"
        );
    }
}

#[test]
fn unknown_scenario_fails() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("bad");
    let out = out.to_string_lossy();
    let output = spawn(
        root.path(),
        &["--out", out.as_ref(), "--scenario", "no-such-scenario"],
        &[],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no-such-scenario"));
}

#[test]
fn missing_out_is_a_usage_error() {
    let root = tempfile::tempdir().unwrap();
    let output = spawn(root.path(), &[], &[]);
    assert!(!output.status.success());
}
