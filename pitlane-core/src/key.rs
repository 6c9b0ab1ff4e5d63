//! Unique key definitions and the lookup keys derived from records.
//!
//! A [`UniqueKey`] names the fields whose combined values identify a record
//! within its collection. Applying it to a [`Record`] yields a [`LookupKey`]
//! that stores use to find the document to replace, or a [`MissingKeyError`]
//! when the record cannot be deduplicated safely.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::Record;

/// Ordered, non-empty list of field names forming a collection's unique key.
///
/// # Examples
///
/// ```
/// use pitlane_core::UniqueKey;
///
/// let key = UniqueKey::new(["session_key", "driver_number"])?;
/// assert_eq!(key.fields(), ["session_key", "driver_number"]);
/// # Ok::<(), pitlane_core::UniqueKeyError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    fields: Vec<String>,
}

/// Errors returned by [`UniqueKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniqueKeyError {
    /// No field names were supplied.
    #[error("a unique key needs at least one field")]
    Empty,
    /// A field name was blank.
    #[error("unique key field names must not be blank")]
    BlankField,
    /// The same field appeared more than once.
    #[error("unique key field `{field}` is listed more than once")]
    DuplicateField {
        /// The repeated field name.
        field: String,
    },
}

impl UniqueKey {
    /// Validate and construct a key from field names in lookup order.
    pub fn new<I, S>(fields: I) -> Result<Self, UniqueKeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for raw in fields {
            let field: String = raw.into();
            if field.trim().is_empty() {
                return Err(UniqueKeyError::BlankField);
            }
            if collected.contains(&field) {
                return Err(UniqueKeyError::DuplicateField { field });
            }
            collected.push(field);
        }
        if collected.is_empty() {
            return Err(UniqueKeyError::Empty);
        }
        Ok(Self { fields: collected })
    }

    /// Key for the `sessions` collection.
    #[must_use]
    pub fn session() -> Self {
        Self::from_static(&["session_key"])
    }

    /// Key for the `drivers` collection.
    #[must_use]
    pub fn driver() -> Self {
        Self::from_static(&["session_key", "driver_number"])
    }

    /// Key for the `laps` collection.
    #[must_use]
    pub fn lap() -> Self {
        Self::from_static(&["session_key", "driver_number", "lap_number"])
    }

    fn from_static(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
        }
    }

    /// Field names in lookup order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Derive the lookup key for `record`.
    ///
    /// A field counts as missing when it is absent or holds JSON `null`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pitlane_core::{MissingKeyError, Record, UniqueKey};
    /// use serde_json::json;
    ///
    /// let record = Record::try_from(json!({"driver_number": 1})).expect("object");
    /// let err = UniqueKey::driver().lookup_key(&record).unwrap_err();
    /// assert_eq!(err.field, "session_key");
    /// ```
    pub fn lookup_key(&self, record: &Record) -> Result<LookupKey, MissingKeyError> {
        let parts = self
            .fields
            .iter()
            .map(|field| {
                record
                    .present(field)
                    .map(|value| (field.clone(), value.clone()))
                    .ok_or_else(|| MissingKeyError {
                        field: field.clone(),
                        record: record.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LookupKey { parts })
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(", "))
    }
}

/// Ordered `(field, value)` pairs identifying one document in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupKey {
    parts: Vec<(String, Value)>,
}

impl LookupKey {
    /// The key's fields and values in lookup order.
    #[must_use]
    pub fn parts(&self) -> &[(String, Value)] {
        &self.parts
    }

    /// Render the key as a JSON object suitable for equality filters.
    #[must_use]
    pub fn to_filter(&self) -> Map<String, Value> {
        self.parts.iter().cloned().collect()
    }

    /// Render the key values as a compact JSON array.
    ///
    /// Two keys derived from the same [`UniqueKey`] are equal exactly when
    /// their canonical forms are equal, which lets stores index on a string.
    /// Integral floats render as integers, so `9476.0` and `9476` name the
    /// same document, matching MongoDB's numeric equality.
    #[must_use]
    pub fn canonical(&self) -> String {
        Value::Array(
            self.parts
                .iter()
                .map(|(_, value)| canonical_value(value))
                .collect(),
        )
        .to_string()
    }
}

/// Largest magnitude at which `f64` still represents every integer (2^53).
const EXACT_INTEGRAL_F64: f64 = 9_007_199_254_740_992.0;

fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .and_then(integral)
            .map_or_else(|| value.clone(), Value::from),
        _ => value.clone(),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "only integral values within the exact f64 range are converted"
)]
fn integral(float: f64) -> Option<i64> {
    (float.fract() == 0.0 && float.abs() <= EXACT_INTEGRAL_F64).then(|| float as i64)
}

/// A record lacks one of the fields required by its collection's unique key.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record is missing unique key field `{field}`: {record}")]
pub struct MissingKeyError {
    /// First key field found missing.
    pub field: String,
    /// The offending record.
    pub record: Record,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).expect("object payload")
    }

    #[rstest]
    fn lookup_key_follows_field_order() {
        let lap = record(json!({
            "lap_number": 3,
            "driver_number": 44,
            "session_key": 9476,
            "lap_duration": 92.4,
        }));

        let key = UniqueKey::lap().lookup_key(&lap).expect("all key fields present");

        assert_eq!(
            key.parts(),
            [
                ("session_key".to_owned(), json!(9476)),
                ("driver_number".to_owned(), json!(44)),
                ("lap_number".to_owned(), json!(3)),
            ]
        );
        assert_eq!(key.canonical(), "[9476,44,3]");
        assert_eq!(key.to_string(), "session_key=9476, driver_number=44, lap_number=3");
    }

    #[rstest]
    #[case(json!({"driver_number": 1}), "session_key")]
    #[case(json!({"session_key": 9476}), "driver_number")]
    #[case(json!({"session_key": null, "driver_number": 1}), "session_key")]
    fn lookup_key_reports_first_missing_field(#[case] payload: Value, #[case] missing: &str) {
        let driver = record(payload);

        let err = UniqueKey::driver()
            .lookup_key(&driver)
            .expect_err("key should be incomplete");

        assert_eq!(err.field, missing);
        assert_eq!(err.record, driver);
    }

    #[rstest]
    fn filter_contains_only_key_fields() {
        let session = record(json!({"session_key": 9476, "session_name": "Race"}));

        let filter = UniqueKey::session()
            .lookup_key(&session)
            .expect("key present")
            .to_filter();

        assert_eq!(Value::Object(filter), json!({"session_key": 9476}));
    }

    #[rstest]
    fn canonical_form_distinguishes_value_types() {
        let numeric = record(json!({"session_key": 1}));
        let textual = record(json!({"session_key": "1"}));
        let key = UniqueKey::session();

        let left = key.lookup_key(&numeric).expect("present").canonical();
        let right = key.lookup_key(&textual).expect("present").canonical();

        assert_ne!(left, right);
    }

    #[rstest]
    #[case(json!(9476.0), json!(9476))]
    #[case(json!(-3.0), json!(-3))]
    #[case(json!(0.0), json!(0))]
    fn canonical_form_treats_integral_floats_as_integers(
        #[case] float: Value,
        #[case] integer: Value,
    ) {
        let key = UniqueKey::session();
        let left = key
            .lookup_key(&record(json!({"session_key": float})))
            .expect("present");
        let right = key
            .lookup_key(&record(json!({"session_key": integer})))
            .expect("present");

        assert_eq!(left.canonical(), right.canonical());
    }

    #[rstest]
    fn canonical_form_keeps_fractional_floats() {
        let key = UniqueKey::session();
        let fractional = key
            .lookup_key(&record(json!({"session_key": 9476.5})))
            .expect("present");

        assert_eq!(fractional.canonical(), "[9476.5]");
    }

    #[rstest]
    #[case(Vec::<&str>::new(), UniqueKeyError::Empty)]
    #[case(vec!["session_key", " "], UniqueKeyError::BlankField)]
    #[case(
        vec!["session_key", "session_key"],
        UniqueKeyError::DuplicateField { field: "session_key".to_owned() }
    )]
    fn rejects_invalid_key_definitions(#[case] fields: Vec<&str>, #[case] expected: UniqueKeyError) {
        assert_eq!(UniqueKey::new(fields), Err(expected));
    }

    #[rstest]
    fn missing_key_error_names_the_record() {
        let err = UniqueKey::driver()
            .lookup_key(&record(json!({"driver_number": 1})))
            .expect_err("missing session key");

        assert_eq!(
            err.to_string(),
            r#"record is missing unique key field `session_key`: {"driver_number":1}"#
        );
    }
}
