use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const TS: &str = "2025-04-01T00:00:00Z";

fn rosra() -> Command {
    let mut cmd = Command::cargo_bin("rosra").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn init(dir: &Path, id: &str) {
    rosra()
        .args(["init", "--dir"])
        .arg(dir)
        .args(["--report", id, "--title", "Test County"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id));
}

#[test]
fn init_then_list_and_refuse_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    init(tmp.path(), "county");

    rosra()
        .args(["list", "--dir"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("county\tTest County"));

    rosra()
        .args(["init", "--dir"])
        .arg(tmp.path())
        .args(["--report", "county"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    rosra().args(["init", "--force", "--dir"]).arg(tmp.path()).args(["--report", "county"]).assert().success();
}

#[test]
fn compute_writes_artifacts_and_is_reproducible() {
    let tmp = tempfile::tempdir().unwrap();
    init(tmp.path(), "county");
    let out = tmp.path().join("out");

    let run = || {
        rosra()
            .args(["compute", "--quiet", "--dir"])
            .arg(tmp.path())
            .args(["--report", "county", "--timestamp", TS, "--render", "json", "html", "--out"])
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("RES:").and(predicate::str::contains("RUN:2025-04-01T00:00:00Z-")));
        fs::read(out.join("result.json")).unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);

    let result: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(result["title"], "Test County");
    assert_eq!(result["totals"]["largest_gap_by_stream"]["key"], "short_term_user_charge");

    let run_record: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("run_record.json")).unwrap()).unwrap();
    assert_eq!(run_record["outputs"]["result_id"], result["id"]);
    assert_eq!(run_record["inputs"]["report_id"], "county");

    assert!(out.join("report.json").is_file());
    let html = fs::read_to_string(out.join("report.html")).unwrap();
    assert!(html.contains("Test County"));
}

#[test]
fn category_edits_round_trip_through_the_saved_report() {
    let tmp = tempfile::tempdir().unwrap();
    init(tmp.path(), "county");
    let base = |sub: &str| {
        let mut c = rosra();
        c.args(["category", sub, "--dir"]).arg(tmp.path()).args(["--report", "county", "--stream", "license"]);
        c
    };

    base("add").args(["--name", "Hawkers"]).assert().success().stdout("LIC-4\n");
    base("update").args(["--id", "LIC-4", "--field", "license_fee", "--value", "1,200"]).assert().success();
    base("rename").args(["--id", "LIC-4", "--name", "Street Hawkers"]).assert().success();

    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(tmp.path().join("county.json")).unwrap()).unwrap();
    let cats = saved["license"]["categories"].as_array().unwrap();
    assert_eq!(cats.len(), 4);
    assert_eq!(cats[3]["name"], "Street Hawkers");
    assert_eq!(cats[3]["license_fee"], 1200.0);

    base("delete").args(["--id", "LIC-4"]).assert().success();
    base("delete").args(["--id", "LIC-4"]).assert().code(2).stderr(predicate::str::contains("no effect"));
}

#[test]
fn validate_reports_duplicate_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let wb = tmp.path().join("wb.json");
    fs::write(
        &wb,
        r#"{"license":{"categories":[
            {"id":"LIC-1","name":"A","estimated_licensees":1,"registered_licensees":1,"compliant_licensees":1,"license_fee":1,"average_paid_license_fee":1},
            {"id":"LIC-1","name":"B","estimated_licensees":1,"registered_licensees":1,"compliant_licensees":1,"license_fee":1,"average_paid_license_fee":1}
        ],"aggregate":{"total_estimated_licensees":2}}}"#,
    )
    .unwrap();

    rosra()
        .args(["validate", "--workbook"])
        .arg(&wb)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Category.DuplicateId"));
}

#[test]
fn error_exit_codes() {
    let tmp = tempfile::tempdir().unwrap();

    // Missing saved report is an I/O failure.
    rosra()
        .args(["compute", "--dir"])
        .arg(tmp.path())
        .args(["--report", "nope", "--timestamp", TS])
        .assert()
        .code(4);

    // Params outside their domain are rejected before computing.
    init(tmp.path(), "county");
    let params = tmp.path().join("params.json");
    fs::write(&params, r#"{"days_per_year": 0}"#).unwrap();
    rosra()
        .args(["compute", "--dir"])
        .arg(tmp.path())
        .args(["--report", "county", "--params"])
        .arg(&params)
        .assert()
        .code(2);

    // Networked paths never reach the filesystem.
    rosra().args(["list", "--dir", "https://example.org/reports"]).assert().code(2);

    // Unknown stream codes fail at argument parsing.
    rosra()
        .args(["category", "add", "--report", "county", "--stream", "parking"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown stream"));
}
