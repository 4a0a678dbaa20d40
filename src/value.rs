//! Dynamically typed field values and schema field descriptors.
//!
//! Records arriving from the binder have no compiled shape, so every field value
//! is carried as a [`DynamicValue`] and every schema entry as a [`FieldDescriptor`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single record field.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DynamicValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<DynamicValue>),
    Record(IndexMap<String, DynamicValue>),
}

impl DynamicValue {
    /// Coarse kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            DynamicValue::Null => FieldKind::Null,
            DynamicValue::Bool(_) => FieldKind::Bool,
            DynamicValue::Int(_) => FieldKind::Int,
            DynamicValue::Float(_) => FieldKind::Float,
            DynamicValue::String(_) => FieldKind::String,
            DynamicValue::Array(_) => FieldKind::Array,
            DynamicValue::Record(_) => FieldKind::Record,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynamicValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Human-readable rendering used in trace lines.
///
/// Strings print bare, nested records print as `{name=value, ...}` and arrays
/// as `[a, b]`, so a flattened record reads the same way at every depth.
pub fn to_display_string(value: &DynamicValue) -> String {
    match value {
        DynamicValue::Null => "null".to_string(),
        DynamicValue::Bool(b) => b.to_string(),
        DynamicValue::Int(i) => i.to_string(),
        // Debug keeps the fractional part on whole numbers (3.0, not 3)
        DynamicValue::Float(fl) => format!("{:?}", fl),
        DynamicValue::String(s) => s.clone(),
        DynamicValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(to_display_string).collect();
            format!("[{}]", rendered.join(", "))
        }
        DynamicValue::Record(fields) => render_entries(fields.iter()),
    }
}

/// Render `(name, value)` pairs as `{name=value, ...}` in iteration order.
pub(crate) fn render_entries<'a, I>(entries: I) -> String
where
    I: Iterator<Item = (&'a String, &'a DynamicValue)>,
{
    let rendered: Vec<String> = entries
        .map(|(name, value)| format!("{}={}", name, to_display_string(value)))
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_display_string(self))
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl From<i64> for DynamicValue {
    fn from(i: i64) -> Self {
        DynamicValue::Int(i)
    }
}

impl From<i32> for DynamicValue {
    fn from(i: i32) -> Self {
        DynamicValue::Int(i64::from(i))
    }
}

impl From<f64> for DynamicValue {
    fn from(fl: f64) -> Self {
        DynamicValue::Float(fl)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

/// Convert a JSON value into a dynamic value.
pub fn json_value_to_dynamic(value: serde_json::Value) -> DynamicValue {
    match value {
        serde_json::Value::Null => DynamicValue::Null,
        serde_json::Value::Bool(b) => DynamicValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DynamicValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                DynamicValue::Float(f)
            } else {
                DynamicValue::Null
            }
        }
        serde_json::Value::String(s) => DynamicValue::String(s),
        serde_json::Value::Array(arr) => {
            DynamicValue::Array(arr.into_iter().map(json_value_to_dynamic).collect())
        }
        serde_json::Value::Object(map) => DynamicValue::Record(
            map.into_iter()
                .map(|(k, v)| (k, json_value_to_dynamic(v)))
                .collect(),
        ),
    }
}

/// Kind hint carried by a schema field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Record,
    /// Union or otherwise not pinned to one kind.
    Mixed,
}

/// One entry of a record schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_scalars() {
        assert_eq!(to_display_string(&DynamicValue::Int(42)), "42");
        assert_eq!(to_display_string(&DynamicValue::from("widget")), "widget");
        assert_eq!(to_display_string(&DynamicValue::Bool(true)), "true");
        assert_eq!(to_display_string(&DynamicValue::Null), "null");
        assert_eq!(to_display_string(&DynamicValue::Float(3.0)), "3.0");
        assert_eq!(to_display_string(&DynamicValue::Float(2.5)), "2.5");
    }

    #[test]
    fn test_display_nested() {
        let mut inner = IndexMap::new();
        inner.insert("city".to_string(), DynamicValue::from("Phnom Penh"));
        inner.insert("zip".to_string(), DynamicValue::Int(12000));

        let value = DynamicValue::Array(vec![
            DynamicValue::Record(inner),
            DynamicValue::Null,
        ]);

        assert_eq!(value.to_string(), "[{city=Phnom Penh, zip=12000}, null]");
    }

    #[test]
    fn test_json_conversion() {
        let value = json_value_to_dynamic(json!({"id": 7, "price": 1.5, "tags": ["a"]}));

        match value {
            DynamicValue::Record(fields) => {
                assert_eq!(fields.get("id"), Some(&DynamicValue::Int(7)));
                assert_eq!(fields.get("price"), Some(&DynamicValue::Float(1.5)));
                assert_eq!(
                    fields.get("tags"),
                    Some(&DynamicValue::Array(vec![DynamicValue::from("a")]))
                );
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(DynamicValue::from(None::<String>), DynamicValue::Null);
        assert_eq!(DynamicValue::from(Some(5i64)), DynamicValue::Int(5));
    }

    #[test]
    fn test_kind() {
        assert_eq!(DynamicValue::Int(1).kind(), FieldKind::Int);
        assert_eq!(DynamicValue::Null.kind(), FieldKind::Null);
        assert!(DynamicValue::Null.is_null());
    }
}
