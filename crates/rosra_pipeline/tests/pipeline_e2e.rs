use std::fs;

use assert_json_diff::assert_json_include;
use serde_json::json;

use rosra_core::entities::StreamKind;
use rosra_core::seeds::seed_workbook;
use rosra_io::gateway::{MemoryGateway, ReportGateway};
use rosra_pipeline::{
    edit_workbook, run_from_workbook_path, run_with_ctx, EngineParams, Outcome, PipelineCtx, PipelineError,
    StreamEdit,
};

const TS: &str = "2025-05-01T09:00:00Z";

#[test]
fn property_tax_worked_example_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workbook.json");
    fs::write(
        &path,
        json!({
            "title": "Worked example",
            "property_tax": {
                "categories": [{
                    "id": "PT-1", "name": "Residential",
                    "registered_taxpayers": 30000, "compliant_taxpayers": 20000,
                    "actual_land_value": 10000, "estimated_land_value": 30000, "tax_rate": 0.007
                }],
                "aggregate": { "total_estimated_taxpayers": 70000, "registered_taxpayers": 50000 }
            }
        })
        .to_string(),
    )
    .unwrap();

    let out = run_from_workbook_path(&path, None, TS).unwrap();
    let pt = out.metrics.get(StreamKind::PropertyTax).unwrap();
    let close = |a: f64, b: f64| (a - b).abs() < 1e-6 * b.abs().max(1.0);
    assert!(close(pt.actual, 1_400_000.0));
    assert!(close(pt.potential, 8_820_000.0));
    assert!(close(pt.gap, 7_420_000.0));
    assert!(close(pt.gap_breakdown.registration_gap.unwrap(), 1_960_000.0));
    assert!(close(pt.gap_breakdown.combined_gaps, 1_960_000.0));

    // benchmark_tax_rate is optional and must not count as a coercion.
    assert!(out.validation.issues.is_empty(), "{:?}", out.validation.issues);

    let v = serde_json::to_value(&out.result).unwrap();
    assert_json_include!(
        actual: v,
        expected: json!({
            "title": "Worked example",
            "rate_gap_policy": "illustrative",
            "streams": [ { "stream": "property_tax", "category_count": 1, "illustrative_rate_gap": 42.0 } ],
            "totals": { "largest_gap_by_stream": { "kind": "gap", "key": "property_tax" } }
        })
    );
}

#[test]
fn missing_fields_are_reported_as_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wb.json");
    fs::write(
        &path,
        r#"{"license":{"categories":[{"id":"LIC-1","name":"Permits","license_fee":100}],"aggregate":{"total_estimated_licensees":10}}}"#,
    )
    .unwrap();

    let out = run_from_workbook_path(&path, None, TS).unwrap();
    assert!(out.validation.pass);
    assert_eq!(out.run_record.validation.warnings, 4);
    assert!(out.run_record.validation.issues.iter().all(|i| i.code == "Input.Coerced"));
}

#[test]
fn params_file_switches_rate_gap_policy() {
    let dir = tempfile::tempdir().unwrap();
    let wb_path = dir.path().join("wb.json");
    let params_path = dir.path().join("params.json");
    let mut wb = seed_workbook();
    wb.property_tax.categories[0].fields.benchmark_tax_rate = 0.01;
    fs::write(&wb_path, serde_json::to_vec(&wb).unwrap()).unwrap();
    fs::write(&params_path, r#"{"property_tax_rate_gap":"benchmark","currency_symbol":"€"}"#).unwrap();

    let out = run_from_workbook_path(&wb_path, Some(&params_path), TS).unwrap();
    let pt = out.metrics.get(StreamKind::PropertyTax).unwrap();
    assert!(pt.illustrative_rate_gap.is_none());
    assert!((pt.gap_breakdown.rate_gap.unwrap() - 600_000.0).abs() < 1e-6);
    assert_eq!(out.result.rate_gap_policy, "benchmark");
    assert!(out.result.narrative.largest_stream.contains('€'));
}

#[test]
fn bad_params_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let wb_path = dir.path().join("wb.json");
    let params_path = dir.path().join("params.json");
    fs::write(&wb_path, "{}").unwrap();
    fs::write(&params_path, r#"{"days_per_year": -1}"#).unwrap();
    assert!(matches!(run_from_workbook_path(&wb_path, Some(&params_path), TS), Err(PipelineError::Io(_))));
}

#[test]
fn edits_saved_and_reloaded_give_the_same_result() {
    let mut gw = MemoryGateway::new();
    let id = "county".parse().unwrap();
    let mut wb = seed_workbook();

    let added = edit_workbook(&mut wb, StreamKind::License, StreamEdit::Add { name: Some("Hawkers".into()) });
    let Outcome::Added(cat) = added else { panic!("expected an added id") };
    for (field, raw) in [("estimated_licensees", "50"), ("license_fee", "80"), ("registered_licensees", "-3")] {
        let out = edit_workbook(
            &mut wb,
            StreamKind::License,
            StreamEdit::UpdateRaw { id: cat.clone(), field: field.into(), raw: raw.into() },
        );
        assert_eq!(out, Outcome::Applied);
    }
    gw.save(&id, &wb).unwrap();

    let before = run_with_ctx(PipelineCtx::new(wb, EngineParams::default(), TS)).unwrap();
    let loaded = gw.load(&id).unwrap();
    assert!(loaded.coercions.is_empty());
    let after = run_with_ctx(PipelineCtx::new(loaded.workbook, EngineParams::default(), TS)).unwrap();
    assert_eq!(before.result, after.result);
    assert_eq!(before.run_record.id, after.run_record.id);
}
