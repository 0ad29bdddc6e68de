//! Content payloads and component records.

use serde::Deserialize;
use serde_json::Value;

/// A component record: a JSON object with a `type` field plus arbitrary data.
pub type Record = serde_json::Map<String, Value>;

/// Page content as fetched from a route's content path.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ContentPayload {
    /// Component records in display order.
    #[serde(default)]
    pub components: Vec<Value>,
}

/// The record's `type` field, if it is a string.
#[must_use]
pub fn record_type(record: &Record) -> Option<&str> {
    record.get("type").and_then(Value::as_str)
}

/// Text for a scalar value.
///
/// Strings are used as-is, numbers and booleans use their JSON spelling.
/// Returns `None` for null, sequences and objects.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_payload_missing_components_is_empty() {
        let payload: ContentPayload = serde_json::from_str("{}").unwrap();

        assert!(payload.components.is_empty());
    }

    #[test]
    fn test_record_type() {
        let record = json!({ "type": "Hero", "title": "Hi" });
        let untyped = json!({ "type": 3 });

        assert_eq!(record_type(record.as_object().unwrap()), Some("Hero"));
        assert_eq!(record_type(untyped.as_object().unwrap()), None);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("x")).as_deref(), Some("x"));
        assert_eq!(scalar_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(scalar_text(&json!(1.5)).as_deref(), Some("1.5"));
        assert_eq!(scalar_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(scalar_text(&json!(null)), None);
        assert_eq!(scalar_text(&json!([1])), None);
    }
}
