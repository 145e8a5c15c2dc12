//! Deterministic hashing and id builders for canonical artifacts.
//!
//! - Canonical JSON hashing: UTF-8, **sorted object keys**, array order preserved.
//! - `RES:` ids derive from canonical result bytes; `RUN:` ids combine an
//!   RFC3339-UTC timestamp with a hash of canonical run-record bytes.
//! - Hex digests are **lowercase**.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use rosra_core::ids::{ResultId, RunId, Sha256 as Sha256Hex};

use crate::canonical_json::to_canonical_json_bytes;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("canonicalization error: {0}")]
    Canonical(String),

    #[error("invalid timestamp (expected RFC3339 UTC like 2025-08-12T10:00:00Z): {0}")]
    InvalidTimestamp(String),

    #[error("invalid id: {0}")]
    InvalidId(String),
}

/* ---------------------------------- Hashing --------------------------------- */

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON bytes of a parsed value.
pub fn sha256_canonical_value(v: &Value) -> Result<String, HashError> {
    let bytes = to_canonical_json_bytes(v).map_err(|e| HashError::Canonical(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let v = serde_json::to_value(value)?;
    sha256_canonical_value(&v)
}

/// Typed digest of a serializable value.
pub fn digest_of<T: Serialize>(value: &T) -> Result<Sha256Hex, HashError> {
    let hex = sha256_canonical(value)?;
    hex.parse::<Sha256Hex>().map_err(|e| HashError::InvalidId(format!("{e}")))
}

/* -------------------------------- Artifact ids ------------------------------- */

/// `RES:<hex>` for `result.json`.
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> Result<ResultId, HashError> {
    let hex = sha256_canonical(value)?;
    format!("RES:{hex}").parse::<ResultId>().map_err(|e| HashError::InvalidId(format!("{e}")))
}

/// `RUN:<timestamp>-<hex>` for `run_record.json`.
/// `timestamp_utc` is normalized to whole seconds with a trailing `Z`.
pub fn run_id_from_bytes(timestamp_utc: &str, run_bytes_canonical: &[u8]) -> Result<RunId, HashError> {
    let ts = normalize_rfc3339_utc_seconds(timestamp_utc)?;
    let hex = sha256_hex(run_bytes_canonical);
    format!("RUN:{ts}-{hex}").parse::<RunId>().map_err(|e| HashError::InvalidId(format!("{e}")))
}

/// Normalize an RFC3339 timestamp with any offset to `YYYY-MM-DDTHH:MM:SSZ`.
/// Fractional seconds are truncated.
pub fn normalize_rfc3339_utc_seconds(ts: &str) -> Result<String, HashError> {
    DateTime::parse_from_rfc3339(ts.trim())
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
        .map_err(|_| HashError::InvalidTimestamp(ts.to_string()))
}

/// Current time, normalized the same way.
pub fn now_rfc3339_utc_seconds() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
