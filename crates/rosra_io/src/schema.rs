//! JSON Schema (Draft 2020-12) validation for workbook and params documents.
//!
//! Schemas are embedded at compile time; validation is offline. When several
//! violations exist, the one with the smallest instance pointer is reported so
//! the error text is stable across runs.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::{IoError, IoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Workbook,
    Params,
}

impl SchemaKind {
    fn source(self) -> &'static str {
        match self {
            SchemaKind::Workbook => include_str!("../schemas/workbook.schema.json"),
            SchemaKind::Params => include_str!("../schemas/params.schema.json"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Workbook => "workbook",
            SchemaKind::Params => "params",
        }
    }
}

fn pointer_text(p: String) -> String {
    if p.is_empty() { "/".to_string() } else { p }
}

/// Validate `instance` against the embedded schema for `kind`.
pub fn validate_value(kind: SchemaKind, instance: &Value) -> IoResult<()> {
    let schema: Value = serde_json::from_str(kind.source())?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(&schema)
        .map_err(|e| IoError::Schema {
            pointer: format!("{} schema", kind.name()),
            msg: e.to_string(),
        })?;

    let first = match compiled.validate(instance) {
        Ok(()) => None,
        Err(errors) => {
            let mut all: Vec<(String, String)> = errors
                .map(|e| (pointer_text(e.instance_path.to_string()), e.to_string()))
                .collect();
            all.sort();
            all.into_iter().next()
        }
    };

    match first {
        None => Ok(()),
        Some((pointer, msg)) => {
            tracing::debug!(schema = kind.name(), %pointer, %msg, "schema validation failed");
            Err(IoError::Schema { pointer, msg })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_documents_pass() {
        validate_value(SchemaKind::Workbook, &json!({})).unwrap();
        validate_value(SchemaKind::Params, &json!({})).unwrap();
    }

    #[test]
    fn wrong_types_are_rejected_with_pointer() {
        let wb = json!({
            "property_tax": {
                "categories": [ { "id": "PT-1", "name": "x", "tax_rate": "high" } ]
            }
        });
        match validate_value(SchemaKind::Workbook, &wb) {
            Err(IoError::Schema { pointer, .. }) => {
                assert_eq!(pointer, "/property_tax/categories/0/tax_rate");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn bad_category_id_is_rejected() {
        let wb = json!({ "license": { "categories": [ { "id": "has space", "name": "x" } ] } });
        assert!(validate_value(SchemaKind::Workbook, &wb).is_err());
    }

    #[test]
    fn unknown_params_are_rejected() {
        assert!(validate_value(SchemaKind::Params, &json!({"tie_seed": 1})).is_err());
        assert!(validate_value(SchemaKind::Params, &json!({"property_tax_rate_gap": "magic"})).is_err());
    }
}
