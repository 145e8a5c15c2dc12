//! crates/rosra_io/src/lib.rs
//! I/O boundary of the engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Canonical JSON, SHA-256 digests and artifact ids.
//! - JSON Schema validation of workbooks and params (Draft 2020-12).
//! - Size-limited loaders that coerce numeric inputs at the boundary.
//! - `ReportGateway`: load/save/list saved workbooks (file and in-memory).

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for rosra_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (read, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors with a JSON Pointer hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// JSON Schema validation failures.
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    /// Hashing / id construction failures.
    #[error("hash error: {0}")]
    Hash(String),

    /// Input exceeds a configured size or count limit.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Saved report does not exist.
    #[error("report not found: {0}")]
    NotFound(String),

    /// Generic validation / invariants (bad ids, param domains, URL paths).
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps no pointer; line/column are in the message.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

pub mod canonical_json;
pub mod gateway;
pub mod hasher;
pub mod loader;
pub mod schema;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::gateway::{FileGateway, MemoryGateway, ReportGateway, ReportSummary, SavedReport};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_params, load_workbook, Coercion, LoadedWorkbook};
}
