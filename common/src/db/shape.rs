//! Row shaping: coerces raw driver rows into typed records.

use serde_json::{Number, Value};

use crate::models::{FieldType, FieldTypeMap, RawRow, ShapeError, ShapedRecord};

/// Shapes every row through `fields`, preserving row order.
///
/// Each declared field must exist in every row. `Number` fields accept
/// numbers and numeric text; `String` fields accept anything scalar and use
/// its textual form. SQL NULL stays `null` for either type.
pub fn shape(rows: &[RawRow], fields: &FieldTypeMap) -> Result<Vec<ShapedRecord>, ShapeError> {
    rows.iter().map(|row| shape_row(row, fields)).collect()
}

/// Shapes a single row.
pub fn shape_row(row: &RawRow, fields: &FieldTypeMap) -> Result<ShapedRecord, ShapeError> {
    let mut record = ShapedRecord::new();
    for (name, ty) in fields.iter() {
        let raw = row.get(name).ok_or_else(|| ShapeError::MissingColumn {
            field: name.to_string(),
        })?;
        record.insert(name, coerce(name, raw, ty)?);
    }
    Ok(record)
}

fn coerce(field: &str, raw: &Value, ty: FieldType) -> Result<Value, ShapeError> {
    match (ty, raw) {
        (_, Value::Null) => Ok(Value::Null),

        (FieldType::String, Value::String(s)) => Ok(Value::String(s.clone())),
        (FieldType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (FieldType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

        (FieldType::Number, Value::Number(n)) => Ok(Value::Number(n.clone())),
        (FieldType::Number, Value::String(s)) => parse_number(s)
            .map(Value::Number)
            .ok_or_else(|| ShapeError::NotNumeric {
                field: field.to_string(),
                value: s.clone(),
            }),

        (expected, other) => Err(ShapeError::Unsupported {
            field: field.to_string(),
            expected,
            found: json_kind(other),
        }),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Number::from(u));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
