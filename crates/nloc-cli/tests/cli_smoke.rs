use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/bilocal.yaml")
}

fn nloc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nloc"))
}

fn read_json(path: PathBuf) -> Value {
    let text = fs::read_to_string(&path).expect("read artefact");
    serde_json::from_str(&text).expect("parse artefact")
}

#[test]
fn factorize_writes_all_artefacts() {
    let dir = tempdir().expect("tempdir");
    let status = nloc()
        .args(["--log", "warn", "factorize", "--created-at", "1970-01-01T00:00:00Z"])
        .arg("--config")
        .arg(fixture())
        .arg("--out")
        .arg(dir.path())
        .status()
        .expect("run nloc factorize");
    assert!(status.success(), "factorize failed");

    let report = read_json(dir.path().join("report.json"));
    assert_eq!(report["provenance"]["created_at"], "1970-01-01T00:00:00Z");
    assert_eq!(report["report_hash"].as_str().map(str::len), Some(64));
    // A0, A1 and B0 are known, leaving B1 as the only extra column.
    let columns = read_json(dir.path().join("extra_columns.json"));
    let columns = columns.as_array().expect("column list");
    assert_eq!(columns.len(), 1);
    assert_eq!(report["summary"]["extra_columns"], 1);
    assert_eq!(columns[0]["column"], "b_1");
    assert_eq!(columns[0]["monomial"], "B1");

    let constraints = read_json(dir.path().join("constraints.json"));
    assert_eq!(constraints["A0*B0"], "0.25");
}

#[test]
fn factorize_is_reproducible() {
    let first = tempdir().expect("tempdir");
    let second = tempdir().expect("tempdir");
    for dir in [&first, &second] {
        let status = nloc()
            .args(["factorize", "--created-at", "1970-01-01T00:00:00Z"])
            .arg("--config")
            .arg(fixture())
            .arg("--out")
            .arg(dir.path())
            .status()
            .expect("run nloc factorize");
        assert!(status.success());
    }
    let left = fs::read(first.path().join("report.json")).expect("first report");
    let right = fs::read(second.path().join("report.json")).expect("second report");
    assert_eq!(left, right);
}

#[test]
fn clean_snaps_noise() {
    let dir = tempdir().expect("tempdir");
    let status = nloc()
        .arg("clean")
        .arg("--config")
        .arg(fixture())
        .arg("--out")
        .arg(dir.path())
        .status()
        .expect("run nloc clean");
    assert!(status.success());

    let cleaned = read_json(dir.path().join("moments.json"));
    assert_eq!(cleaned["summary"]["imaginary_dropped"], 1);
    assert_eq!(cleaned["summary"]["snapped_to_zero"], 1);
    let c0 = cleaned["moments"]
        .as_array()
        .expect("records")
        .iter()
        .find(|record| record["key_text"] == "C0")
        .expect("C0 record");
    assert_eq!(c0["value_text"], "0");
}

#[test]
fn enumerate_prints_json() {
    let output = nloc()
        .args(["enumerate", "--degree", "1"])
        .arg("--config")
        .arg(fixture())
        .output()
        .expect("run nloc enumerate");
    assert!(output.status.success());
    let listed: Vec<String> = serde_json::from_slice(&output.stdout).expect("json list");
    assert_eq!(listed, ["1", "A0", "A1", "B0", "B1", "C0", "C1"]);
}

#[test]
fn missing_config_fails() {
    let dir = tempdir().expect("tempdir");
    let status = nloc()
        .args(["clean", "--config"])
        .arg(dir.path().join("absent.yaml"))
        .arg("--out")
        .arg(dir.path())
        .status()
        .expect("run nloc clean");
    assert!(!status.success());
}
