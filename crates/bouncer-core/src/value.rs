//! Schema-less structured values
//!
//! [`DynamicValue`] is the protobuf `google.protobuf.Value` model: null,
//! double, string, bool, object and list. Values travel as plain JSON; the
//! non-finite doubles JSON cannot carry are written with the protobuf JSON
//! spellings `"NaN"`, `"Infinity"` and `"-Infinity"`, and whole numbers are
//! written without a fraction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum DynamicValue {
    Null,
    Number(f64),
    String(String),
    Bool(bool),
    Object(BTreeMap<String, DynamicValue>),
    Array(Vec<DynamicValue>),
}

/// A record of named dynamic values (`google.protobuf.Struct`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicStruct {
    pub fields: BTreeMap<String, DynamicValue>,
}

impl DynamicValue {
    /// Name of the active variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            DynamicValue::Null => "null",
            DynamicValue::Number(_) => "number",
            DynamicValue::String(_) => "string",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Object(_) => "object",
            DynamicValue::Array(_) => "array",
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        DynamicValue::String(s.into())
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, DynamicValue>> {
        match self {
            DynamicValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl DynamicStruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: DynamicValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.fields.get(key)
    }
}

impl From<Value> for DynamicValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DynamicValue::Null,
            Value::Bool(b) => DynamicValue::Bool(b),
            Value::Number(n) => DynamicValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => DynamicValue::String(s),
            Value::Array(items) => {
                DynamicValue::Array(items.into_iter().map(DynamicValue::from).collect())
            }
            Value::Object(map) => DynamicValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, DynamicValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DynamicValue> for Value {
    fn from(value: DynamicValue) -> Self {
        match value {
            DynamicValue::Null => Value::Null,
            DynamicValue::Bool(b) => Value::Bool(b),
            DynamicValue::Number(n) if is_exact_integer(n) => Value::Number(Number::from(n as i64)),
            DynamicValue::Number(n) => match Number::from_f64(n) {
                Some(number) => Value::Number(number),
                None if n.is_nan() => Value::String("NaN".to_string()),
                None if n.is_sign_positive() => Value::String("Infinity".to_string()),
                None => Value::String("-Infinity".to_string()),
            },
            DynamicValue::String(s) => Value::String(s),
            DynamicValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            DynamicValue::Object(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, val) in map {
                    object.insert(key, Value::from(val));
                }
                Value::Object(object)
            }
        }
    }
}

/// Whole numbers a double holds exactly are written without a fraction
///
/// Negative zero stays a float so its sign survives.
fn is_exact_integer(n: f64) -> bool {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    n.fract() == 0.0 && n.abs() <= EXACT_LIMIT && (n != 0.0 || n.is_sign_positive())
}

impl From<f64> for DynamicValue {
    fn from(n: f64) -> Self {
        DynamicValue::Number(n)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_roundtrip_preserves_shape() {
        let input = json!({"a": [1.5, null, true], "b": {"c": "x"}});
        let value: DynamicValue = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(value.kind(), "object");
        assert_eq!(serde_json::to_value(&value).unwrap(), input);
    }

    #[test]
    fn test_whole_numbers_are_written_as_integers() {
        assert_eq!(Value::from(DynamicValue::Number(4.0)), json!(4));
        assert_eq!(Value::from(DynamicValue::Number(-3.0)), json!(-3));
        assert_eq!(Value::from(DynamicValue::Number(0.5)), json!(0.5));
        assert_eq!(Value::from(DynamicValue::Number(1e300)), json!(1e300));
    }

    #[test]
    fn test_negative_zero_keeps_its_sign() {
        let written = Value::from(DynamicValue::Number(-0.0));
        assert!(written.is_f64());
        assert!(written.as_f64().unwrap().is_sign_negative());
        assert_eq!(written.to_string(), "-0.0");
        assert_eq!(Value::from(DynamicValue::Number(0.0)).to_string(), "0");

        let echoed: DynamicValue = serde_json::from_str(r#"{"z": -0.0}"#).unwrap();
        assert_eq!(serde_json::to_string(&echoed).unwrap(), r#"{"z":-0.0}"#);
    }

    #[test]
    fn test_non_finite_numbers_use_protobuf_spellings() {
        assert_eq!(Value::from(DynamicValue::Number(f64::NAN)), json!("NaN"));
        assert_eq!(
            Value::from(DynamicValue::Number(f64::INFINITY)),
            json!("Infinity")
        );
        assert_eq!(
            Value::from(DynamicValue::Number(f64::NEG_INFINITY)),
            json!("-Infinity")
        );
    }

    #[test]
    fn test_struct_is_a_plain_object() {
        let s: DynamicStruct = serde_json::from_value(json!({"k": 2})).unwrap();
        assert_eq!(s.get("k"), Some(&DynamicValue::Number(2.0)));
        assert!(serde_json::from_value::<DynamicStruct>(json!([1])).is_err());
    }
}
