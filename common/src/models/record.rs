//! Row and record models.
//!
//! A `RawRow` is what the driver hands back, loosely typed. A `ShapedRecord`
//! is the same row after coercion through a `FieldTypeMap`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Primitive type a shaped field is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Textual representation of the value.
    String,
    /// Numeric value; text must parse as a number.
    Number,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
        }
    }
}

/// Ordered mapping of output field name to declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypeMap {
    fields: Vec<(String, FieldType)>,
}

impl FieldTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. A repeated name replaces the earlier declaration.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = ty,
            None => self.fields.push((name, ty)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One driver row: column names paired with loosely typed values, in
/// select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<(String, Value)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Value of the first column with this name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A row coerced into field name to typed value, ready for a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapedRecord(Map<String, Value>);

impl ShapedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Attaches or replaces a field, e.g. a child list on a parent record.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<ShapedRecord> for Value {
    fn from(record: ShapedRecord) -> Self {
        record.into_value()
    }
}

/// A row did not satisfy its field type map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("field '{field}' is not present in the result row")]
    MissingColumn { field: String },

    #[error("field '{field}' declared as number but value '{value}' is not numeric")]
    NotNumeric { field: String, value: String },

    #[error("field '{field}' declared as {expected} cannot hold a {found} value")]
    Unsupported {
        field: String,
        expected: FieldType,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_map_keeps_declaration_order() {
        let map = FieldTypeMap::new()
            .field("title", FieldType::String)
            .field("release_year", FieldType::Number)
            .field("actors", FieldType::String);

        let names: Vec<_> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["title", "release_year", "actors"]);
    }

    #[test]
    fn test_field_map_redeclaration_replaces_type() {
        let map = FieldTypeMap::new()
            .field("id", FieldType::String)
            .field("id", FieldType::Number);

        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some(("id", FieldType::Number)));
    }

    #[test]
    fn test_raw_row_lookup() {
        let row = RawRow::new().with("name", "Action").with("category_id", 1);
        assert_eq!(row.get("name"), Some(&json!("Action")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_shaped_record_serializes_as_plain_object() {
        let mut record = ShapedRecord::new();
        record.insert("first_name", "MARY");
        record.insert("rentals", json!([]));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"first_name": "MARY", "rentals": []})
        );
    }
}
