//! Byte-level locks on generated streams.
//!
//! These read the artifacts a fixture run leaves on disk, so they cover the
//! whole path from scenario to file: writer framing, digesting sink and
//! oracle encoding together.

use lock_tests::fixture_helpers::{count_occurrences, generate, read_artifact, stream_body};
use jser_vectors::scenarios::Scenario;
use jser_wire::constants::{
    TC_BLOCKDATA, TC_CLASSDESC, TC_LONGSTRING, TC_OBJECT, TC_REFERENCE, TC_RESET, TC_STRING,
};

fn generated(scenario: Scenario) -> (Vec<u8>, Option<String>) {
    let dir = tempfile::tempdir().unwrap();
    let _ = generate(dir.path(), &[scenario]);
    let bin = read_artifact(dir.path(), &format!("{scenario}.ser"));
    let oracle = scenario.has_oracle().then(|| {
        String::from_utf8(read_artifact(dir.path(), &format!("{scenario}.txt"))).unwrap()
    });
    (bin, oracle)
}

#[test]
fn every_stream_starts_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let _ = generate(dir.path(), &[]);
    for scenario in Scenario::ALL {
        let bin = read_artifact(dir.path(), &format!("{scenario}.ser"));
        assert!(bin.len() > 4, "{scenario}: empty stream");
        let _ = stream_body(&bin);
    }
}

/// Golden bytes and text for the literal primitives.
#[test]
fn primitives_golden() {
    let (bin, oracle) = generated(Scenario::Primitives);
    let expected: [u8; 32] = [
        TC_BLOCKDATA, 30, // one block
        0x45, // byte 69
        0x27, 0x14, // char U+2714
        0x4E, 0xCE, 0x6D, 0x55, 0x3A, 0x03, 0x15, 0x7F, // double 4.2E71
        0xF2, 0xE3, 0x31, 0x23, // float -9e30
        0x00, 0x00, 0x71, 0x34, // int 28980
        0x69, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // long 420 << 54
        0xCF, 0xC7, // short -12345
        0x01, // true
    ];
    assert_eq!(stream_body(&bin), expected);
    assert_eq!(
        oracle.unwrap(),
        "B69\nC'\u{2714}'\nD4.2E71\nF-8.999999984311469E30\nI28980\nJ7566047373982433280n\nS-12345\nZtrue\n"
    );
}

#[test]
fn strings_cross_long_string_boundary() {
    let (bin, oracle) = generated(Scenario::Strings);
    let body = stream_body(&bin);
    let short_max = 3 + 5 + 3 + 0xFFFF;
    assert_eq!(body[8], TC_STRING);
    assert!(body[11..short_max].iter().all(|&b| b == b'a'));
    assert_eq!(body[short_max], TC_LONGSTRING);
    let long_start = short_max + 9;
    assert!(body[long_start..long_start + 0x1_0000].iter().all(|&b| b == b'b'));
    assert_eq!(body[long_start + 0x1_0000], TC_LONGSTRING);

    let oracle = oracle.unwrap();
    let lines: Vec<&str> = oracle.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "L\"\\u0000\"");
    assert!(lines[4].starts_with("L\"\\u0000"));
    assert!(lines[4].ends_with("\\uffff\""));
}

#[test]
fn blocks_split_int_then_empty_blocks() {
    let (bin, oracle) = generated(Scenario::Blocks);
    assert!(oracle.is_none());
    let body = stream_body(&bin);
    let head: [u8; 16] = [
        TC_BLOCKDATA, 0,
        TC_BLOCKDATA, 1, 0x0D,
        TC_BLOCKDATA, 0,
        TC_BLOCKDATA, 0,
        TC_BLOCKDATA, 2, 0xEF, 0xAC,
        TC_BLOCKDATA, 1, 0xED,
    ];
    assert_eq!(&body[..16], head);
    let gap = [TC_BLOCKDATA, 0, TC_BLOCKDATA, 0, TC_BLOCKDATA, 0, TC_OBJECT, TC_REFERENCE];
    assert_eq!(count_occurrences(body, &gap), 1);
}

#[test]
fn obj_ref_vs_eq_reuses_then_forgets_handles() {
    let (bin, _) = generated(Scenario::ObjRefVsEq);
    let body = stream_body(&bin);
    // Two fresh instances, then references to handles 1 and 2.
    let refs = [
        TC_REFERENCE, 0, 0x7E, 0, 1,
        TC_REFERENCE, 0, 0x7E, 0, 2,
    ];
    assert_eq!(count_occurrences(body, &refs), 1);
    assert_eq!(count_occurrences(body, b"GenerateTests$EmptyClass"), 2);
    let after_resets = [TC_RESET, TC_RESET, TC_RESET, TC_OBJECT, TC_CLASSDESC];
    assert_eq!(count_occurrences(body, &after_resets), 1);
}

#[test]
fn binary_only_scenarios_write_no_oracle() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(dir.path(), &[]);
    for s in &report.scenarios {
        let txt = dir.path().join(format!("{}.txt", s.scenario));
        assert_eq!(txt.exists(), s.scenario.has_oracle(), "{}", s.scenario);
    }
}
