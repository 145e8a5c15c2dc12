//! JSON rendering of the report model.
//!
//! Field order follows the struct layout; callers that persist the value go
//! through the canonical writer, which sorts keys.

use serde_json::Value;

use crate::{ReportError, ReportModel};

pub fn render_json(model: &ReportModel) -> Result<Value, ReportError> {
    serde_json::to_value(model).map_err(|e| ReportError::Template(format!("json_serialize: {e}")))
}
