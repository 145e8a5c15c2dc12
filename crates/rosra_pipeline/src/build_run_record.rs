//! BUILD_RUN_RECORD: provenance for one pipeline run.
//!
//! The record echoes input digests, the effective params, the result id and a
//! validation summary. Its id is `RUN:<timestamp>-<sha256>` over the canonical
//! bytes of the record without the id field.

use serde::{Deserialize, Serialize};

use rosra_core::variables::EngineParams;
use rosra_io::{canonical_json, hasher};

use crate::validate::{Severity, ValidationReport};
use crate::{EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    pub id: String,
    pub timestamp_utc: String,
    pub engine: EngineMeta,
    pub inputs: RunInputs,
    pub params: EngineParams,
    pub outputs: RunOutputs,
    pub validation: ValidationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub workbook_sha256: String,
    pub params_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutputs {
    pub result_id: String,
    pub result_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub pass: bool,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<IssueEcho>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueEcho {
    pub severity: String,
    pub code: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub message: String,
}

impl From<&ValidationReport> for ValidationSummary {
    fn from(r: &ValidationReport) -> Self {
        let issues = r
            .issues
            .iter()
            .map(|i| IssueEcho {
                severity: match i.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                }
                .to_string(),
                code: i.code.to_string(),
                where_: i.where_.to_string(),
                message: i.message.clone(),
            })
            .collect();
        ValidationSummary { pass: r.pass, errors: r.error_count(), warnings: r.warning_count(), issues }
    }
}

/// Assemble the record and derive its id.
pub fn build_run_record(
    timestamp_utc: &str,
    engine: &EngineMeta,
    inputs: RunInputs,
    params: &EngineParams,
    outputs: RunOutputs,
    validation: ValidationSummary,
) -> Result<RunRecordDoc, PipelineError> {
    let timestamp = hasher::normalize_rfc3339_utc_seconds(timestamp_utc)?;

    #[derive(Serialize)]
    struct RunNoId<'a> {
        timestamp_utc: &'a str,
        engine: &'a EngineMeta,
        inputs: &'a RunInputs,
        params: &'a EngineParams,
        outputs: &'a RunOutputs,
        validation: &'a ValidationSummary,
    }
    let no_id = RunNoId {
        timestamp_utc: &timestamp,
        engine,
        inputs: &inputs,
        params,
        outputs: &outputs,
        validation: &validation,
    };
    let bytes = canonical_json::to_canonical_bytes(&no_id)?;
    let id = hasher::run_id_from_bytes(&timestamp, &bytes)?;

    Ok(RunRecordDoc {
        id: id.to_string(),
        timestamp_utc: timestamp,
        engine: engine.clone(),
        inputs,
        params: params.clone(),
        outputs,
        validation,
    })
}
