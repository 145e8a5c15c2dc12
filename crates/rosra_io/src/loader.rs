//! Loader: read local workbook/params JSON, validate via Draft 2020-12
//! schemas, coerce numeric inputs and return typed values. No network I/O.
//!
//! Boundary coercion: negative or missing numbers become 0. Every coercion is
//! returned as a `Coercion` record so validation can surface it as a warning.

use std::fs;
use std::path::Path;

use serde_json::Value;

use rosra_core::entities::{AggregateInputs, Category, CategoryFields, StreamKind, Workbook};
use rosra_core::ids::{CategoryId, Sha256};
use rosra_core::variables::EngineParams;

use crate::{hasher, looks_like_url_strict, schema, IoError, IoResult};

/// Documents larger than this are refused before parsing.
pub const MAX_JSON_BYTES: u64 = 16 * 1024 * 1024;
/// Upper bound on categories per stream.
pub const MAX_CATEGORIES_PER_STREAM: usize = 10_000;

/// One value changed at the input boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    pub stream: StreamKind,
    /// `None` for stream-level aggregate inputs.
    pub category: Option<CategoryId>,
    pub field: String,
    /// Value before coercion; `None` when the field was absent.
    pub original: Option<f64>,
}

/// A workbook after schema validation and coercion.
#[derive(Debug, Clone)]
pub struct LoadedWorkbook {
    pub workbook: Workbook,
    pub coercions: Vec<Coercion>,
    /// Digest of the coerced workbook's canonical JSON.
    pub sha256: Sha256,
}

/* ----------------------------------- Reading ---------------------------------- */

/// Read and parse a local JSON file, enforcing the offline posture and size limit.
pub fn read_json_value_with_limits(path: &Path) -> IoResult<Value> {
    let shown = path.display().to_string();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Invalid(format!("URLs are not supported: {shown}")));
    }
    let meta = fs::metadata(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    if meta.len() > MAX_JSON_BYTES {
        return Err(IoError::Limit(format!("{shown} is {} bytes (max {MAX_JSON_BYTES})", meta.len())));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let v = serde_json::from_slice(&bytes)?;
    Ok(v)
}

/// Load, validate and coerce a workbook file.
pub fn load_workbook(path: &Path) -> IoResult<LoadedWorkbook> {
    let v = read_json_value_with_limits(path)?;
    parse_workbook_value(v)
}

/// Validate and coerce an already-parsed workbook document.
pub fn parse_workbook_value(v: Value) -> IoResult<LoadedWorkbook> {
    schema::validate_value(schema::SchemaKind::Workbook, &v)?;
    check_limits(&v)?;

    let mut coercions = missing_fields(&v);
    let mut workbook: Workbook = serde_json::from_value(v)?;
    coercions.extend(coerce_workbook(&mut workbook));

    if !coercions.is_empty() {
        tracing::warn!(count = coercions.len(), "workbook inputs coerced to 0");
    }

    let sha256 = hasher::digest_of(&workbook)?;
    Ok(LoadedWorkbook { workbook, coercions, sha256 })
}

/// Load engine params: schema check, serde defaults, then domain validation.
pub fn load_params(path: &Path) -> IoResult<EngineParams> {
    let v = read_json_value_with_limits(path)?;
    parse_params_value(v)
}

pub fn parse_params_value(v: Value) -> IoResult<EngineParams> {
    schema::validate_value(schema::SchemaKind::Params, &v)?;
    let params: EngineParams = serde_json::from_value(v)?;
    params
        .validate_domains()
        .map_err(|e| IoError::Invalid(e.to_string()))?;
    Ok(params)
}

fn check_limits(v: &Value) -> IoResult<()> {
    for kind in StreamKind::ALL {
        let n = v
            .get(kind.workbook_key())
            .and_then(|s| s.get("categories"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if n > MAX_CATEGORIES_PER_STREAM {
            return Err(IoError::Limit(format!(
                "{} has {n} categories (max {MAX_CATEGORIES_PER_STREAM})",
                kind.workbook_key()
            )));
        }
    }
    Ok(())
}

/* ---------------------------------- Coercion ---------------------------------- */

/// Field names every category of a stream should carry, with accepted aliases.
fn expected_fields(kind: StreamKind) -> &'static [&'static [&'static str]] {
    match kind {
        StreamKind::PropertyTax => &[
            &["registered_taxpayers"],
            &["compliant_taxpayers"],
            &["actual_land_value"],
            &["estimated_land_value"],
            &["tax_rate"],
        ],
        StreamKind::License => &[
            &["estimated_licensees"],
            &["registered_licensees"],
            &["compliant_licensees"],
            &["license_fee"],
            &["average_paid_license_fee"],
        ],
        _ => &[
            &["estimated_users", "estimated_daily_fees", "estimated_leases"],
            &["actual_users", "actual_daily_fees", "registered_leases"],
            &["potential_rate"],
            &["actual_rate"],
        ],
    }
}

/// Category fields absent from the raw document (defaulted to 0 by serde).
fn missing_fields(v: &Value) -> Vec<Coercion> {
    let mut out = Vec::new();
    for kind in StreamKind::ALL {
        let cats = v
            .get(kind.workbook_key())
            .and_then(|s| s.get("categories"))
            .and_then(Value::as_array);
        for cat in cats.into_iter().flatten() {
            let Some(obj) = cat.as_object() else { continue };
            let id = obj
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<CategoryId>().ok());
            for names in expected_fields(kind) {
                if !names.iter().any(|n| obj.contains_key(*n)) {
                    out.push(Coercion {
                        stream: kind,
                        category: id.clone(),
                        field: names[0].to_string(),
                        original: None,
                    });
                }
            }
        }
    }
    out
}

fn coerce_categories<F: CategoryFields>(kind: StreamKind, cats: &mut [Category<F>], out: &mut Vec<Coercion>) {
    for c in cats {
        let before = c.fields.clone();
        for field in c.fields.coerce_all() {
            out.push(Coercion {
                stream: kind,
                category: Some(c.id.clone()),
                field: field.to_string(),
                original: before.get(field),
            });
        }
    }
}

fn coerce_aggregate<A: AggregateInputs>(kind: StreamKind, agg: &mut A, out: &mut Vec<Coercion>) {
    for (field, original) in agg.coerce_all() {
        out.push(Coercion { stream: kind, category: None, field: field.to_string(), original: Some(original) });
    }
}

/// Coerce every numeric input of a workbook in place.
pub fn coerce_workbook(wb: &mut Workbook) -> Vec<Coercion> {
    let mut out = Vec::new();
    coerce_categories(StreamKind::PropertyTax, &mut wb.property_tax.categories, &mut out);
    coerce_aggregate(StreamKind::PropertyTax, &mut wb.property_tax.aggregate, &mut out);
    coerce_categories(StreamKind::License, &mut wb.license.categories, &mut out);
    coerce_aggregate(StreamKind::License, &mut wb.license.aggregate, &mut out);
    coerce_categories(StreamKind::ShortTermUserCharge, &mut wb.short_term.categories, &mut out);
    coerce_categories(StreamKind::LongTermUserCharge, &mut wb.long_term.categories, &mut out);
    coerce_categories(StreamKind::MixedUserCharge, &mut wb.mixed.categories, &mut out);
    out
}
