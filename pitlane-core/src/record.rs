//! Schema-less records as returned by the telemetry API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single API record: an insertion-ordered map of field names to JSON values.
///
/// The collector never validates the shape of a record beyond the fields that
/// make up its unique key, so the payload is kept as dynamic JSON.
///
/// # Examples
///
/// ```
/// use pitlane_core::Record;
/// use serde_json::json;
///
/// let record = Record::try_from(json!({"session_key": 9476, "driver_number": 1}))
///     .expect("object payload");
/// assert_eq!(record.get("session_key"), Some(&json!(9476)));
/// assert_eq!(record.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Return the value stored under `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Return the value stored under `field` unless it is absent or `null`.
    #[must_use]
    pub fn present(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    /// Insert or overwrite `field`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying JSON map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the record and return the underlying JSON map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Object(record.0)
    }
}

/// Error returned when a JSON value is not an object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a JSON object, found {kind}")]
pub struct NotAnObject {
    /// JSON type that was supplied instead.
    pub kind: &'static str,
}

impl TryFrom<Value> for Record {
    type Error = NotAnObject;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(NotAnObject {
                kind: json_kind(&other),
            }),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Map serialisation cannot fail: keys are strings and values are JSON.
        let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn present_ignores_null_fields() {
        let record = Record::try_from(json!({"lap_number": null, "lap_time": 91.2}))
            .expect("object payload");

        assert_eq!(record.get("lap_number"), Some(&Value::Null));
        assert_eq!(record.present("lap_number"), None);
        assert_eq!(record.present("lap_time"), Some(&json!(91.2)));
        assert_eq!(record.present("missing"), None);
    }

    #[rstest]
    #[case(json!([1, 2]), "array")]
    #[case(json!("sessions"), "string")]
    #[case(json!(null), "null")]
    #[case(json!(3), "number")]
    fn rejects_non_object_values(#[case] value: Value, #[case] kind: &'static str) {
        let err = Record::try_from(value).expect_err("non-object should fail");
        assert_eq!(err, NotAnObject { kind });
    }

    #[rstest]
    fn display_renders_compact_json_in_insertion_order() {
        let record: Record = [("driver_number", json!(44)), ("broadcast_name", json!("L HAMILTON"))]
            .into_iter()
            .collect();

        assert_eq!(
            record.to_string(),
            r#"{"driver_number":44,"broadcast_name":"L HAMILTON"}"#
        );
    }

    #[rstest]
    fn deserialises_transparently() {
        let records: Vec<Record> =
            serde_json::from_str(r#"[{"session_key":1},{"session_key":2,"year":2024}]"#)
                .expect("valid payload");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("year"), Some(&json!(2024)));
    }
}
