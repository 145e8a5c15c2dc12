//! rosra_pipeline: deterministic pipeline surface
//! (edit → validate → compute → aggregate → narrative → build result → build run record).
//!
//! Stays free of direct file I/O except for the path-based convenience entry;
//! JSON shape, schema checks and hashing are routed through `rosra_io`, and
//! all formulas live in `rosra_algo`.

#![forbid(unsafe_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rosra_core::entities::Workbook;
use rosra_core::ids::ReportId;
use rosra_core::numeric::approx_eq_rel;
use rosra_io::hasher::{self, HashError};
use rosra_io::loader::{self, Coercion};
use rosra_io::IoError;

pub mod aggregate;
pub mod build_result;
pub mod build_run_record;
pub mod compute;
pub mod narrative;
pub mod store;
pub mod validate;

pub use aggregate::{analyze, AggregateTotals, Largest};
pub use build_result::ResultDoc;
pub use build_run_record::RunRecordDoc;
pub use compute::{compute_workbook, WorkbookMetrics};
pub use store::{edit_workbook, CategoryStore, Outcome, StoreAction, StreamEdit};
pub use validate::{validate, Severity, ValidationIssue, ValidationReport};

pub use rosra_core::variables::{EngineParams, RateGapPolicy};

/// Engine identifiers recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "rosra".to_string(),
        name: "rosra_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: if cfg!(debug_assertions) { "dev" } else { "release" }.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("validation failed with {} error(s)", .0.error_count())]
    Validation(Box<ValidationReport>),

    #[error("self-verification failed: {0}")]
    SelfVerify(String),

    #[error("build error: {0}")]
    Build(String),
}

impl From<HashError> for PipelineError {
    fn from(e: HashError) -> Self {
        PipelineError::Build(e.to_string())
    }
}

/// Inputs of one run. The workbook is expected to be coerced already (the
/// loaders do this); `coercions` lists what was changed so validation can
/// report it.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub workbook: Workbook,
    pub coercions: Vec<Coercion>,
    pub params: EngineParams,
    pub engine_meta: EngineMeta,
    /// RFC3339 UTC; supplied by the caller so runs are reproducible.
    pub timestamp_utc: String,
    pub report_id: Option<ReportId>,
}

impl PipelineCtx {
    pub fn new(workbook: Workbook, params: EngineParams, timestamp_utc: impl Into<String>) -> Self {
        Self {
            workbook,
            coercions: Vec::new(),
            params,
            engine_meta: engine_identifiers(),
            timestamp_utc: timestamp_utc.into(),
            report_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub metrics: WorkbookMetrics,
    pub totals: AggregateTotals,
    pub validation: ValidationReport,
    pub result: ResultDoc,
    pub run_record: RunRecordDoc,
}

/// Run every stage over a prepared context.
pub fn run_with_ctx(ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    // --- VALIDATE ---
    let validation = validate::validate(&ctx.workbook, &ctx.params, &ctx.coercions);
    for issue in &validation.issues {
        match issue.severity {
            Severity::Error => tracing::error!(code = issue.code, at = %issue.where_, "{}", issue.message),
            Severity::Warning => tracing::warn!(code = issue.code, at = %issue.where_, "{}", issue.message),
        }
    }
    if !validation.pass {
        return Err(PipelineError::Validation(Box::new(validation)));
    }

    // --- COMPUTE / AGGREGATE ---
    let metrics = compute::compute_workbook(&ctx.workbook, &ctx.params);
    let totals = aggregate::analyze(&metrics);
    self_verify(&metrics, &totals, ctx.params.invariant_tolerance)?;

    // --- BUILD_RESULT (id over the document without it) ---
    let mut result = build_result::build_result(&ctx.workbook, &metrics, &totals, &ctx.params);
    let res_id = hasher::res_id_from_canonical(&result)?;
    let result_sha256 = res_id.as_hex().to_string();
    result.id = Some(res_id.to_string());

    // --- BUILD_RUN_RECORD ---
    let inputs = build_run_record::RunInputs {
        report_id: ctx.report_id.as_ref().map(ToString::to_string),
        workbook_sha256: hasher::digest_of(&ctx.workbook)?.to_string(),
        params_sha256: hasher::digest_of(&ctx.params)?.to_string(),
    };
    let outputs = build_run_record::RunOutputs { result_id: res_id.to_string(), result_sha256 };
    let run_record = build_run_record::build_run_record(
        &ctx.timestamp_utc,
        &ctx.engine_meta,
        inputs,
        &ctx.params,
        outputs,
        (&validation).into(),
    )?;

    tracing::info!(result = %res_id, run = %run_record.id, "pipeline complete");
    Ok(PipelineOutputs { metrics, totals, validation, result, run_record })
}

/// Load a workbook (and optional params) from disk, then run the pipeline.
pub fn run_from_workbook_path(
    workbook_path: &Path,
    params_path: Option<&Path>,
    timestamp_utc: &str,
) -> Result<PipelineOutputs, PipelineError> {
    let loaded = loader::load_workbook(workbook_path)?;
    let params = match params_path {
        Some(p) => loader::load_params(p)?,
        None => EngineParams::default(),
    };
    let mut ctx = PipelineCtx::new(loaded.workbook, params, timestamp_utc);
    ctx.coercions = loaded.coercions;
    run_with_ctx(ctx)
}

/// Re-check the published invariants before anything is written.
fn self_verify(metrics: &WorkbookMetrics, totals: &AggregateTotals, tol: f64) -> Result<(), PipelineError> {
    for m in metrics.streams() {
        let figures = [m.actual, m.potential, m.gap, m.potential_leveraged, m.gap_breakdown.combined_gaps];
        if figures.iter().any(|x| !x.is_finite()) {
            return Err(PipelineError::SelfVerify(format!("{} has a non-finite figure", m.stream.label())));
        }
        if !m.breakdown_sums_to_gap(tol) {
            tracing::warn!(stream = m.stream.code(), gap = m.gap, "breakdown drifted from gap");
            return Err(PipelineError::SelfVerify(format!(
                "{} breakdown does not sum to its gap",
                m.stream.label()
            )));
        }
    }
    let gap_sum: f64 = metrics.streams().iter().map(|m| m.gap).sum();
    if !approx_eq_rel(totals.total_combined_gap, gap_sum, tol) {
        return Err(PipelineError::SelfVerify("total combined gap differs from the sum of stream gaps".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosra_core::seeds::seed_workbook;

    const TS: &str = "2025-01-15T12:00:00Z";

    #[test]
    fn seed_run_produces_linked_ids() {
        let out = run_with_ctx(PipelineCtx::new(seed_workbook(), EngineParams::default(), TS)).unwrap();
        let res_id = out.result.id.clone().unwrap();
        assert!(res_id.starts_with("RES:"));
        assert_eq!(out.run_record.outputs.result_id, res_id);
        assert_eq!(out.run_record.outputs.result_sha256, res_id[4..]);
        assert!(out.run_record.id.starts_with("RUN:2025-01-15T12:00:00Z-"));
    }

    #[test]
    fn result_id_is_stable_across_runs_and_timestamps() {
        let a = run_with_ctx(PipelineCtx::new(seed_workbook(), EngineParams::default(), TS)).unwrap();
        let b = run_with_ctx(PipelineCtx::new(seed_workbook(), EngineParams::default(), "2026-06-30T00:00:00Z"))
            .unwrap();
        assert_eq!(a.result.id, b.result.id);
        assert_ne!(a.run_record.id, b.run_record.id);
    }

    #[test]
    fn validation_errors_stop_the_run() {
        let mut wb = seed_workbook();
        let dup = wb.property_tax.categories[0].clone();
        wb.property_tax.categories.push(dup);
        match run_with_ctx(PipelineCtx::new(wb, EngineParams::default(), TS)) {
            Err(PipelineError::Validation(r)) => assert_eq!(r.error_count(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
