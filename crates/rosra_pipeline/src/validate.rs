//! Structural and semantic checks before any computation.
//!
//! Errors stop the pipeline; warnings are carried into the run record. Input
//! values that were coerced at the boundary surface here as warnings, so
//! nothing is silently changed.

use std::collections::BTreeSet;

use rosra_core::entities::{Category, StreamKind, Workbook};
use rosra_core::ids::CategoryId;
use rosra_core::variables::EngineParams;
use rosra_io::loader::Coercion;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityRef {
    Root,
    Param(&'static str),
    Stream(StreamKind),
    Category(StreamKind, CategoryId),
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Root => f.write_str("/"),
            EntityRef::Param(p) => write!(f, "params.{p}"),
            EntityRef::Stream(k) => f.write_str(k.workbook_key()),
            EntityRef::Category(k, id) => write!(f, "{}/{id}", k.workbook_key()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub where_: EntityRef,
}

/// `pass` is true when no issue has `Severity::Error`. Issue order is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }
}

pub fn validate(wb: &Workbook, params: &EngineParams, coercions: &[Coercion]) -> ValidationReport {
    let mut issues = Vec::new();

    issues.extend(check_params(params));
    issues.extend(check_ids(StreamKind::PropertyTax, &wb.property_tax.categories));
    issues.extend(check_ids(StreamKind::License, &wb.license.categories));
    issues.extend(check_ids(StreamKind::ShortTermUserCharge, &wb.short_term.categories));
    issues.extend(check_ids(StreamKind::LongTermUserCharge, &wb.long_term.categories));
    issues.extend(check_ids(StreamKind::MixedUserCharge, &wb.mixed.categories));
    issues.extend(check_property_tax(wb));
    issues.extend(check_license(wb));
    issues.extend(check_user_charges(wb));
    issues.extend(coercions.iter().map(coercion_warning));

    sort_issues_stably(&mut issues);
    ValidationReport { pass: !issues.iter().any(|i| i.severity == Severity::Error), issues }
}

fn error(code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Error, code, message, where_ }
}

fn warning(code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Warning, code, message, where_ }
}

fn check_params(params: &EngineParams) -> Vec<ValidationIssue> {
    match params.validate_domains() {
        Ok(()) => Vec::new(),
        Err(e) => vec![error("Params.Domain", EntityRef::Param("engine"), e.to_string())],
    }
}

/// Ids must be unique within a stream; empty names are allowed but flagged.
fn check_ids<F>(kind: StreamKind, categories: &[Category<F>]) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for c in categories {
        if !seen.insert(&c.id) {
            out.push(error(
                "Category.DuplicateId",
                EntityRef::Category(kind, c.id.clone()),
                format!("category id {} appears more than once", c.id),
            ));
        }
        if c.name.trim().is_empty() {
            out.push(warning(
                "Category.EmptyName",
                EntityRef::Category(kind, c.id.clone()),
                "category has no name".to_string(),
            ));
        }
    }
    out
}

fn check_property_tax(wb: &Workbook) -> Vec<ValidationIssue> {
    let kind = StreamKind::PropertyTax;
    let snap = &wb.property_tax;
    let mut out = Vec::new();

    for c in &snap.categories {
        if c.fields.compliant_taxpayers > c.fields.registered_taxpayers {
            out.push(warning(
                "PropertyTax.CompliantExceedsRegistered",
                EntityRef::Category(kind, c.id.clone()),
                format!(
                    "compliant taxpayers ({}) exceed registered taxpayers ({})",
                    c.fields.compliant_taxpayers, c.fields.registered_taxpayers
                ),
            ));
        }
    }

    let agg = &snap.aggregate;
    if !snap.categories.is_empty() && (agg.registered_taxpayers == 0.0 || agg.total_estimated_taxpayers == 0.0) {
        out.push(warning(
            "PropertyTax.CoverageUndefined",
            EntityRef::Stream(kind),
            "registered or total estimated taxpayers is 0; potential revenue and registration gap are reported as 0"
                .to_string(),
        ));
    }
    if agg.registered_taxpayers > agg.total_estimated_taxpayers && agg.total_estimated_taxpayers > 0.0 {
        out.push(warning(
            "PropertyTax.RegisteredExceedsEstimated",
            EntityRef::Stream(kind),
            format!(
                "registered taxpayers ({}) exceed the estimated total ({})",
                agg.registered_taxpayers, agg.total_estimated_taxpayers
            ),
        ));
    }
    out
}

fn check_license(wb: &Workbook) -> Vec<ValidationIssue> {
    let kind = StreamKind::License;
    let snap = &wb.license;
    let mut out = Vec::new();

    for c in &snap.categories {
        if c.fields.compliant_licensees > c.fields.registered_licensees {
            out.push(warning(
                "License.CompliantExceedsRegistered",
                EntityRef::Category(kind, c.id.clone()),
                format!(
                    "compliant licensees ({}) exceed registered licensees ({})",
                    c.fields.compliant_licensees, c.fields.registered_licensees
                ),
            ));
        }
    }

    let registered: f64 = snap.categories.iter().map(|c| c.fields.registered_licensees).sum();
    if registered > snap.aggregate.total_estimated_licensees {
        out.push(warning(
            "License.NegativeUnregistered",
            EntityRef::Stream(kind),
            format!(
                "registered licensees ({registered}) exceed the estimated total ({}); the registration gap will be negative",
                snap.aggregate.total_estimated_licensees
            ),
        ));
    }
    out
}

fn check_user_charges(wb: &Workbook) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    let streams = [
        (StreamKind::ShortTermUserCharge, &wb.short_term),
        (StreamKind::LongTermUserCharge, &wb.long_term),
        (StreamKind::MixedUserCharge, &wb.mixed),
    ];
    for (kind, snap) in streams {
        for c in &snap.categories {
            if c.fields.actual_users > c.fields.estimated_users {
                out.push(warning(
                    "UserCharge.ActualExceedsEstimated",
                    EntityRef::Category(kind, c.id.clone()),
                    format!(
                        "actual users ({}) exceed estimated users ({})",
                        c.fields.actual_users, c.fields.estimated_users
                    ),
                ));
            }
        }
    }
    out
}

fn coercion_warning(c: &Coercion) -> ValidationIssue {
    let where_ = match &c.category {
        Some(id) => EntityRef::Category(c.stream, id.clone()),
        None => EntityRef::Stream(c.stream),
    };
    let message = match c.original {
        Some(v) => format!("{} was {v}; coerced to 0", c.field),
        None => format!("{} is missing; treated as 0", c.field),
    };
    warning("Input.Coerced", where_, message)
}

/// Sort by (code, where, message) so reports are byte-identical across runs.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.code
            .cmp(b.code)
            .then_with(|| a.where_.cmp(&b.where_))
            .then_with(|| a.message.cmp(&b.message))
    });
}
