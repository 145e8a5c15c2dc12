//! ReportGateway: persistence boundary for saved workbooks.
//!
//! Only the workbook (categories plus stream-level inputs) is stored; metrics
//! are always recomputed after a load. Saves are all-or-nothing: a failed save
//! leaves the previously stored report and the caller's workbook untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use rosra_core::entities::Workbook;
use rosra_core::ids::{ReportId, Sha256};

use crate::canonical_json::{to_canonical_json_bytes, write_bytes_atomic};
use crate::loader::{self, parse_workbook_value, LoadedWorkbook, MAX_JSON_BYTES};
use crate::{hasher, looks_like_url_strict, IoError, IoResult};

/// Wire version stamped into every saved report.
pub const REPORT_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub id: ReportId,
    /// Digest of the stored canonical bytes.
    pub sha256: Sha256,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub id: ReportId,
    pub title: String,
}

pub trait ReportGateway {
    fn load(&self, id: &ReportId) -> IoResult<LoadedWorkbook>;
    fn save(&mut self, id: &ReportId, workbook: &Workbook) -> IoResult<SavedReport>;
    /// Saved reports, ascending by id.
    fn list(&self) -> IoResult<Vec<ReportSummary>>;
}

/// Canonical bytes of a saved report document.
pub fn report_bytes(workbook: &Workbook) -> IoResult<Vec<u8>> {
    let mut v = serde_json::to_value(workbook)?;
    if let Value::Object(map) = &mut v {
        map.insert("schema_version".into(), Value::String(REPORT_SCHEMA_VERSION.into()));
    }
    let bytes = to_canonical_json_bytes(&v)?;
    if bytes.len() as u64 > MAX_JSON_BYTES {
        return Err(IoError::Limit(format!("report is {} bytes (max {MAX_JSON_BYTES})", bytes.len())));
    }
    Ok(bytes)
}

fn saved(id: &ReportId, bytes: &[u8]) -> IoResult<SavedReport> {
    let sha256 = hasher::sha256_hex(bytes)
        .parse::<Sha256>()
        .map_err(|e| IoError::Hash(format!("{e}")))?;
    Ok(SavedReport { id: id.clone(), sha256, bytes: bytes.len() })
}

/* -------------------------------- File gateway -------------------------------- */

/// Stores each report as `<root>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> IoResult<Self> {
        let root = root.into();
        let shown = root.display().to_string();
        if looks_like_url_strict(&shown) {
            return Err(IoError::Invalid(format!("URLs are not supported: {shown}")));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &ReportId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

impl ReportGateway for FileGateway {
    fn load(&self, id: &ReportId) -> IoResult<LoadedWorkbook> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(IoError::NotFound(id.to_string()));
        }
        tracing::debug!(report = %id, path = %path.display(), "loading report");
        loader::load_workbook(&path)
    }

    fn save(&mut self, id: &ReportId, workbook: &Workbook) -> IoResult<SavedReport> {
        let bytes = report_bytes(workbook)?;
        let path = self.path_for(id);
        write_bytes_atomic(&path, &bytes).map_err(|e| {
            tracing::warn!(report = %id, error = %e, "save failed; previous report left in place");
            IoError::Path(format!("{}: {e}", path.display()))
        })?;
        tracing::debug!(report = %id, bytes = bytes.len(), "report saved");
        saved(id, &bytes)
    }

    fn list(&self) -> IoResult<Vec<ReportSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<ReportId>().ok())
            else {
                continue;
            };
            let title = loader::read_json_value_with_limits(&path)
                .ok()
                .and_then(|v| v.get("title").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_default();
            out.push(ReportSummary { id, title });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

/* ------------------------------- Memory gateway ------------------------------- */

/// In-process gateway holding canonical report bytes.
#[derive(Debug, Default, Clone)]
pub struct MemoryGateway {
    reports: BTreeMap<ReportId, Vec<u8>>,
    reject_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (simulates an unavailable backend).
    pub fn set_reject_saves(&mut self, reject: bool) {
        self.reject_saves = reject;
    }

    pub fn raw(&self, id: &ReportId) -> Option<&[u8]> {
        self.reports.get(id).map(Vec::as_slice)
    }
}

impl ReportGateway for MemoryGateway {
    fn load(&self, id: &ReportId) -> IoResult<LoadedWorkbook> {
        let bytes = self.reports.get(id).ok_or_else(|| IoError::NotFound(id.to_string()))?;
        let v: Value = serde_json::from_slice(bytes)?;
        parse_workbook_value(v)
    }

    fn save(&mut self, id: &ReportId, workbook: &Workbook) -> IoResult<SavedReport> {
        if self.reject_saves {
            return Err(IoError::Path(format!("save rejected for {id}")));
        }
        let bytes = report_bytes(workbook)?;
        let out = saved(id, &bytes)?;
        self.reports.insert(id.clone(), bytes);
        Ok(out)
    }

    fn list(&self) -> IoResult<Vec<ReportSummary>> {
        let mut out = Vec::with_capacity(self.reports.len());
        for (id, bytes) in &self.reports {
            let v: Value = serde_json::from_slice(bytes)?;
            let title = v.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
            out.push(ReportSummary { id: id.clone(), title });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosra_core::seeds::seed_workbook;

    fn rid(s: &str) -> ReportId {
        s.parse().unwrap()
    }

    #[test]
    fn memory_round_trip_and_list() {
        let mut gw = MemoryGateway::new();
        let wb = seed_workbook();
        let saved = gw.save(&rid("county-2024"), &wb).unwrap();
        assert_eq!(saved.bytes, gw.raw(&rid("county-2024")).unwrap().len());

        let back = gw.load(&rid("county-2024")).unwrap();
        assert_eq!(back.workbook, wb);
        assert!(back.coercions.is_empty());

        let list = gw.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, wb.title);
    }

    #[test]
    fn rejected_save_keeps_previous_bytes() {
        let mut gw = MemoryGateway::new();
        let id = rid("r1");
        let wb = seed_workbook();
        gw.save(&id, &wb).unwrap();
        let before = gw.raw(&id).unwrap().to_vec();

        let mut edited = wb.clone();
        edited.title = "Edited".into();
        gw.set_reject_saves(true);
        assert!(gw.save(&id, &edited).is_err());
        assert_eq!(gw.raw(&id).unwrap(), before.as_slice());
        assert_eq!(edited.title, "Edited");
    }

    #[test]
    fn unknown_report_is_not_found() {
        let gw = MemoryGateway::new();
        assert!(matches!(gw.load(&rid("missing")), Err(IoError::NotFound(_))));
    }

    #[test]
    fn url_roots_are_refused() {
        assert!(FileGateway::new("https://reports.example.org").is_err());
    }
}
