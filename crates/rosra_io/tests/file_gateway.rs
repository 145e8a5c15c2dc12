use std::fs;

use assert_json_diff::assert_json_include;
use serde_json::{json, Value};

use rosra_core::ids::ReportId;
use rosra_core::seeds::seed_workbook;
use rosra_io::gateway::{FileGateway, ReportGateway};
use rosra_io::IoError;

fn rid(s: &str) -> ReportId {
    s.parse().unwrap()
}

#[test]
fn workbook_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut gw = FileGateway::new(dir.path()).unwrap();
    let mut wb = seed_workbook();
    wb.license.categories[0].fields.license_fee = 152.37;
    wb.property_tax.categories[1].fields.tax_rate = 0.0125;

    let saved = gw.save(&rid("fy2024"), &wb).unwrap();
    assert_eq!(saved.bytes as u64, fs::metadata(gw.path_for(&rid("fy2024"))).unwrap().len());

    let loaded = gw.load(&rid("fy2024")).unwrap();
    assert_eq!(loaded.workbook, wb);
    assert!(loaded.coercions.is_empty());
}

#[test]
fn saved_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let mut gw = FileGateway::new(dir.path()).unwrap();
    gw.save(&rid("shape"), &seed_workbook()).unwrap();

    let text = fs::read_to_string(gw.path_for(&rid("shape"))).unwrap();
    assert!(!text.ends_with('\n'));
    let v: Value = serde_json::from_str(&text).unwrap();
    assert_json_include!(
        actual: v,
        expected: json!({
            "schema_version": "1",
            "property_tax": {
                "aggregate": { "total_estimated_taxpayers": 70000.0, "registered_taxpayers": 50000.0 },
                "categories": [ { "id": "PT-1", "name": "Residential", "registered_taxpayers": 30000.0 } ]
            },
            "mixed": { "categories": [ { "id": "MXC-1", "period": "daily" }, { "id": "MXC-2", "period": "monthly" } ] }
        })
    );
}

#[test]
fn failed_save_leaves_existing_reports_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut gw = FileGateway::new(dir.path()).unwrap();
    let wb = seed_workbook();
    gw.save(&rid("good"), &wb).unwrap();
    let before = fs::read(gw.path_for(&rid("good"))).unwrap();

    // Occupy the destination of another report with a non-empty directory.
    let blocked = gw.path_for(&rid("blocked"));
    fs::create_dir_all(blocked.join("inner")).unwrap();

    let mut edited = wb.clone();
    edited.title = "Edited".into();
    assert!(matches!(gw.save(&rid("blocked"), &edited), Err(IoError::Path(_))));

    assert_eq!(fs::read(gw.path_for(&rid("good"))).unwrap(), before);
    assert!(blocked.join("inner").is_dir());
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "temp file left behind: {names:?}");
}

#[test]
fn malformed_reports_are_rejected_by_schema() {
    let dir = tempfile::tempdir().unwrap();
    let gw = FileGateway::new(dir.path()).unwrap();
    fs::write(
        gw.path_for(&rid("bad")),
        r#"{"license":{"categories":[{"id":"LIC-1","name":"x","license_fee":"free"}]}}"#,
    )
    .unwrap();
    match gw.load(&rid("bad")) {
        Err(IoError::Schema { pointer, .. }) => assert_eq!(pointer, "/license/categories/0/license_fee"),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn list_is_sorted_and_skips_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut gw = FileGateway::new(dir.path()).unwrap();
    let mut wb = seed_workbook();
    wb.title = "Beta".into();
    gw.save(&rid("b"), &wb).unwrap();
    wb.title = "Alpha".into();
    gw.save(&rid("a"), &wb).unwrap();
    fs::write(dir.path().join("notes.txt"), "x").unwrap();
    fs::write(dir.path().join("has space.json"), "{}").unwrap();

    let list = gw.list().unwrap();
    let got: Vec<(&str, &str)> = list.iter().map(|s| (s.id.as_str(), s.title.as_str())).collect();
    assert_eq!(got, vec![("a", "Alpha"), ("b", "Beta")]);
}

#[test]
fn missing_report_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let gw = FileGateway::new(dir.path()).unwrap();
    assert!(matches!(gw.load(&rid("nope")), Err(IoError::NotFound(_))));
}
