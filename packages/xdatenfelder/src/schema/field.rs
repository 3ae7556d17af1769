//! JSON Schema fragments for single fields.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::codelist::CodeListResolution;
use crate::config::{DISPLAY_DATA_URL, DISPLAY_FILE, DISPLAY_LABEL};
use crate::header::HasHeader;
use crate::model::{DataType, Field};

/// Constraints FIM authors put into `praezisierung` as a JSON object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationDetails {
    min_length: Option<LengthValue>,
    max_length: Option<LengthValue>,
    pattern: Option<String>,
}

/// Lengths show up both as numbers and as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LengthValue {
    Number(u64),
    Text(String),
}

impl LengthValue {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Base fragment for a data type.
pub(crate) fn data_type_schema(data_type: &DataType) -> Map<String, Value> {
    let schema = match data_type {
        DataType::Text => json!({"type": "string"}),
        DataType::Date => json!({"type": "string", "format": "date"}),
        DataType::Bool => json!({"type": "boolean"}),
        DataType::Num | DataType::NumCurrency => json!({"type": "number"}),
        DataType::NumInt => json!({"type": "integer"}),
        DataType::File => json!({"type": "string", "x-display": DISPLAY_FILE}),
        DataType::Obj => json!({"type": "string", "x-display": DISPLAY_DATA_URL}),
        DataType::Other(code) => {
            tracing::warn!(data_type = %code, "Unknown data type, falling back to string");
            json!({"type": "string"})
        }
    };

    match schema {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Length and pattern constraints from a validation blob.
///
/// Returns `None` if the blob is not a JSON object of the expected shape;
/// a single bad value drops all constraints.
pub(crate) fn validation_constraints(raw: &str) -> Option<Map<String, Value>> {
    let details: ValidationDetails = match serde_json::from_str(raw) {
        Ok(details) => details,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring validation details that are not JSON constraints");
            return None;
        }
    };

    let length = |value: &Option<LengthValue>, key: &str| -> Option<Option<u64>> {
        match value {
            None => Some(None),
            Some(v) => match v.as_u64() {
                Some(n) => Some(Some(n)),
                None => {
                    tracing::debug!(key, ?v, "Ignoring validation details with invalid length");
                    None
                }
            },
        }
    };

    let min_length = length(&details.min_length, "minLength")?;
    let max_length = length(&details.max_length, "maxLength")?;

    let mut constraints = Map::new();
    if let Some(n) = min_length {
        constraints.insert("minLength".to_string(), json!(n));
    }
    if let Some(n) = max_length {
        constraints.insert("maxLength".to_string(), json!(n));
    }
    if let Some(pattern) = details.pattern {
        constraints.insert("pattern".to_string(), json!(pattern));
    }
    Some(constraints)
}

pub(crate) fn input_schema(field: &Field) -> Value {
    let mut schema = data_type_schema(&field.data_type);
    schema.insert("title".to_string(), json!(field.display_title()));
    if let Some(hint) = &field.input_hint {
        schema.insert("description".to_string(), json!(hint));
    }
    if let Some(default) = &field.default_value {
        schema.insert("default".to_string(), json!(default));
    }
    if let Some(constraints) = field.validation_details.as_deref().and_then(validation_constraints) {
        schema.extend(constraints);
    }
    Value::Object(schema)
}

/// Select field; `resolution` is `None` when the field names no code list.
pub(crate) fn select_schema(field: &Field, resolution: Option<&CodeListResolution>) -> Value {
    let labels = resolution.map(CodeListResolution::labels).unwrap_or_default();

    let mut schema = Map::new();
    schema.insert("title".to_string(), json!(field.display_title()));
    schema.insert("type".to_string(), json!("string"));
    schema.insert("enum".to_string(), json!(labels));
    if let Some(hint) = &field.input_hint {
        schema.insert("description".to_string(), json!(hint));
    }
    if let Some(uri) = &field.reference_value_uri {
        schema.insert("x-codelist".to_string(), json!(uri));
    }

    let unresolved = match resolution {
        Some(CodeListResolution::Resolved(_)) => None,
        Some(CodeListResolution::Unresolved { reason }) => Some(reason.as_str()),
        None => Some("no code list reference"),
    };
    if let Some(reason) = unresolved {
        schema.insert("x-codelist-unresolved".to_string(), json!(reason));
    }

    Value::Object(schema)
}

/// Read-only text; the label's content lives in `default_value`.
pub(crate) fn label_schema(field: &Field) -> Value {
    let mut schema = Map::new();
    schema.insert("title".to_string(), json!(field.display_title()));
    if let Some(text) = &field.default_value {
        schema.insert("description".to_string(), json!(text));
    }
    schema.insert("type".to_string(), json!("string"));
    schema.insert("x-display".to_string(), json!(DISPLAY_LABEL));
    Value::Object(schema)
}

/// Fallback for field types without a dedicated rendering.
pub(crate) fn other_schema(field: &Field) -> Value {
    let mut schema = Map::new();
    schema.insert("title".to_string(), json!(field.display_title()));
    schema.insert("type".to_string(), json!("string"));
    if let Some(hint) = &field.input_hint {
        schema.insert("description".to_string(), json!(hint));
    }
    Value::Object(schema)
}
