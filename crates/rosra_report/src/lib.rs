//! rosra_report: Pure offline report model + renderers (JSON/HTML).
//!
//! Determinism rules:
//! - No network, no I/O here. Callers supply artifacts already in-memory.
//! - Nothing is recomputed: amounts come from `result.json` and are only
//!   formatted (currency with thousands grouping, percents with one decimal).
//! - Stable section order and field names.
//!
//! Inputs are accepted as JSON values (`serde_json::Value`) so this crate stays
//! independent of the pipeline's concrete document types.

#![deny(unsafe_code)]

use std::fmt;

use serde_json::Value;

use rosra_core::numeric::{format_currency, percent_1dp};

#[cfg(feature = "render_html")]
mod render_html;
#[cfg(feature = "render_json")]
mod render_json;

#[cfg(feature = "render_html")]
pub use render_html::render_html;
#[cfg(feature = "render_json")]
pub use render_json::render_json;

pub type ResultArtifact = Value;
pub type RunRecordArtifact = Value;

// ===== Errors =====
#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    Template(String),
    MissingField(String),
    Inconsistent(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Template(m) => write!(f, "template: {m}"),
            ReportError::MissingField(p) => write!(f, "missing field: {p}"),
            ReportError::Inconsistent(m) => write!(f, "inconsistent artifacts: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub totals: SectionTotals,
    pub findings: SectionFindings,
    pub streams: Vec<StreamSection>,
    pub integrity: SectionIntegrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionCover {
    pub title: String,
    pub period_label: Option<String>,
    pub overall: String,
    pub band: String,
}

/// One named amount, already formatted.
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AmountRow {
    pub name: String,
    pub amount: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionTotals {
    pub actual: String,
    pub potential: String,
    pub combined_gap: String,
    pub combined_residual: String,
    pub potential_leveraged: String,
    pub band: String,
    pub components: Vec<AmountRow>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionFindings {
    pub largest_stream: String,
    pub largest_gap_type: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StreamSection {
    pub code: String,
    pub label: String,
    pub category_count: u64,
    pub actual: String,
    pub potential: String,
    pub gap: String,
    pub potential_leveraged: String,
    pub band: String,
    /// Only the components the stream defines, in fixed order.
    pub components: Vec<AmountRow>,
    pub illustrative_rate_gap: Option<String>,
    pub narrative: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionIntegrity {
    pub result_id: String,
    pub run_id: String,
    pub timestamp_utc: String,
    pub engine_vendor: String,
    pub engine_name: String,
    pub engine_version: String,
    pub engine_build: String,
    pub workbook_sha256: String,
    pub params_sha256: String,
    pub rate_gap_policy: String,
    pub validation_warnings: u64,
}

const STREAM_COMPONENTS: [(&str, &str); 5] = [
    ("/registration_gap", "Registration"),
    ("/compliance_gap", "Compliance"),
    ("/assessment_gap", "Assessment"),
    ("/rate_gap", "Rate"),
    ("/combined_gaps", "Combined"),
];

const TOTAL_COMPONENTS: [(&str, &str); 4] = [
    ("/totals/total_registration_gap", "Registration"),
    ("/totals/total_compliance_gap", "Compliance"),
    ("/totals/total_assessment_gap", "Assessment"),
    ("/totals/total_rate_gap", "Rate"),
];

// ===== API =====

/// Build the report model from artifacts (pure, offline).
///
/// Reads only the fields used for presentation. Missing required fields yield
/// `ReportError::MissingField`; a run record that points at a different
/// result yields `ReportError::Inconsistent`.
pub fn build_model(result: &ResultArtifact, run: &RunRecordArtifact) -> Result<ReportModel, ReportError> {
    let symbol = json_get_str(result, "/currency_symbol").unwrap_or_else(|_| "$".into());
    let money = |ptr: &str| json_get_f64(result, ptr).map(|x| format_currency(&symbol, x));

    // ---- Cover ----
    let cover = SectionCover {
        title: json_get_str(result, "/title")?,
        period_label: json_get_str(result, "/period_label").ok().filter(|s| !s.trim().is_empty()),
        overall: json_get_str(result, "/narrative/overall")?,
        band: band_label(&json_get_str(result, "/totals/band")?),
    };

    // ---- Totals ----
    let mut components = Vec::with_capacity(TOTAL_COMPONENTS.len());
    for (ptr, name) in TOTAL_COMPONENTS {
        components.push(AmountRow { name: name.to_string(), amount: money(ptr)? });
    }
    let totals = SectionTotals {
        actual: money("/totals/total_actual")?,
        potential: money("/totals/total_potential")?,
        combined_gap: money("/totals/total_combined_gap")?,
        combined_residual: money("/totals/total_combined_residual")?,
        potential_leveraged: percent_1dp(json_get_f64(result, "/totals/potential_leveraged")?),
        band: band_label(&json_get_str(result, "/totals/band")?),
        components,
    };

    let findings = SectionFindings {
        largest_stream: json_get_str(result, "/narrative/largest_stream")?,
        largest_gap_type: json_get_str(result, "/narrative/largest_gap_type")?,
    };

    // ---- Streams (artifact order is canonical stream order) ----
    let streams = result
        .pointer("/streams")
        .and_then(Value::as_array)
        .ok_or_else(|| ReportError::MissingField("/streams".into()))?
        .iter()
        .map(|s| stream_section(s, &symbol))
        .collect::<Result<Vec<_>, _>>()?;

    // ---- Integrity (ids must link) ----
    let result_id = json_get_str(result, "/id")?;
    let linked = json_get_str(run, "/outputs/result_id")?;
    if linked != result_id {
        return Err(ReportError::Inconsistent(format!(
            "run record points at {linked}, result is {result_id}"
        )));
    }
    let integrity = SectionIntegrity {
        result_id,
        run_id: json_get_str(run, "/id")?,
        timestamp_utc: json_get_str(run, "/timestamp_utc")?,
        engine_vendor: json_get_str(run, "/engine/vendor").unwrap_or_else(|_| "rosra".into()),
        engine_name: json_get_str(run, "/engine/name").unwrap_or_else(|_| "rosra_engine".into()),
        engine_version: json_get_str(run, "/engine/version").unwrap_or_else(|_| "0.0.0".into()),
        engine_build: json_get_str(run, "/engine/build").unwrap_or_else(|_| "dev".into()),
        workbook_sha256: json_get_str(run, "/inputs/workbook_sha256")?,
        params_sha256: json_get_str(run, "/inputs/params_sha256")?,
        rate_gap_policy: json_get_str(result, "/rate_gap_policy").unwrap_or_else(|_| "illustrative".into()),
        validation_warnings: json_get_u64(run, "/validation/warnings").unwrap_or(0),
    };

    Ok(ReportModel { cover, totals, findings, streams, integrity })
}

fn stream_section(s: &Value, symbol: &str) -> Result<StreamSection, ReportError> {
    let money = |ptr: &str| json_get_f64(s, ptr).map(|x| format_currency(symbol, x));
    let breakdown = s
        .pointer("/breakdown")
        .ok_or_else(|| ReportError::MissingField("/streams/*/breakdown".into()))?;
    // Undefined components are absent from the artifact and skipped here.
    let components = STREAM_COMPONENTS
        .iter()
        .filter_map(|(ptr, name)| {
            json_get_f64(breakdown, ptr)
                .ok()
                .map(|x| AmountRow { name: (*name).to_string(), amount: format_currency(symbol, x) })
        })
        .collect();

    Ok(StreamSection {
        code: json_get_str(s, "/stream")?,
        label: json_get_str(s, "/label")?,
        category_count: json_get_u64(s, "/category_count").unwrap_or(0),
        actual: money("/actual")?,
        potential: money("/potential")?,
        gap: money("/gap")?,
        potential_leveraged: percent_1dp(json_get_f64(s, "/potential_leveraged")?),
        band: band_label(&json_get_str(s, "/band")?),
        components,
        illustrative_rate_gap: json_get_f64(s, "/illustrative_rate_gap").ok().map(|x| format_currency(symbol, x)),
        narrative: json_get_str(s, "/narrative")?,
    })
}

/// Human label for a band code; unknown codes pass through.
pub fn band_label(code: &str) -> String {
    match code {
        "significant_challenge" => "Significant challenge",
        "moderate" => "Moderate",
        "strong" => "Strong",
        "undetermined" => "Undetermined",
        other => other,
    }
    .to_string()
}

// ===== Helpers (pure) =====

fn json_get_str(root: &Value, ptr: &str) -> Result<String, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

fn json_get_f64(root: &Value, ptr: &str) -> Result<f64, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_f64)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

fn json_get_u64(root: &Value, ptr: &str) -> Result<u64, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_u64)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result() -> Value {
        json!({
            "id": "RES:abc",
            "title": "Example County",
            "period_label": "",
            "currency_symbol": "KSh ",
            "rate_gap_policy": "illustrative",
            "streams": [{
                "stream": "license", "label": "License", "category_count": 2,
                "actual": 1000.0, "potential": 4000.0, "gap": 3000.0,
                "potential_leveraged": 25.0, "band": "significant_challenge",
                "breakdown": { "registration_gap": 1200.4, "compliance_gap": 800.0,
                               "assessment_gap": 500.0, "combined_gaps": 499.6 },
                "narrative": "License realises 25.0% of its potential revenue, a significant challenge."
            }],
            "totals": {
                "total_registration_gap": 1200.4, "total_compliance_gap": 800.0,
                "total_assessment_gap": 500.0, "total_rate_gap": 0.0,
                "total_combined_gap": 3000.0, "total_combined_residual": 499.6,
                "total_actual": 1000.0, "total_potential": 4000.0,
                "potential_leveraged": 25.0, "band": "significant_challenge"
            },
            "narrative": { "overall": "Overall.", "largest_stream": "Largest.", "largest_gap_type": "Type." }
        })
    }

    fn run() -> Value {
        json!({
            "id": "RUN:2025-01-01T00:00:00Z-def",
            "timestamp_utc": "2025-01-01T00:00:00Z",
            "engine": { "vendor": "rosra", "name": "rosra_engine", "version": "0.1.0", "build": "dev" },
            "inputs": { "workbook_sha256": "aa", "params_sha256": "bb" },
            "outputs": { "result_id": "RES:abc", "result_sha256": "abc" },
            "validation": { "pass": true, "errors": 0, "warnings": 3, "issues": [] }
        })
    }

    #[test]
    fn model_formats_amounts_and_skips_undefined_components() {
        let m = build_model(&result(), &run()).unwrap();
        assert_eq!(m.cover.period_label, None);
        assert_eq!(m.cover.band, "Significant challenge");
        assert_eq!(m.totals.actual, "KSh 1,000");
        assert_eq!(m.totals.potential_leveraged, "25.0%");
        let lic = &m.streams[0];
        assert_eq!(lic.category_count, 2);
        let names: Vec<_> = lic.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Registration", "Compliance", "Assessment", "Combined"]);
        assert_eq!(lic.components[0].amount, "KSh 1,200");
        assert!(lic.illustrative_rate_gap.is_none());
        assert_eq!(m.integrity.validation_warnings, 3);
    }

    #[test]
    fn unlinked_run_record_is_rejected() {
        let mut r = run();
        r["outputs"]["result_id"] = json!("RES:other");
        assert!(matches!(build_model(&result(), &r), Err(ReportError::Inconsistent(_))));
    }

    #[test]
    fn missing_title_names_the_pointer() {
        let mut res = result();
        res.as_object_mut().unwrap().remove("title");
        assert_eq!(build_model(&res, &run()), Err(ReportError::MissingField("/title".into())));
    }

    #[test]
    fn band_labels() {
        assert_eq!(band_label("strong"), "Strong");
        assert_eq!(band_label("whatever"), "whatever");
    }
}
