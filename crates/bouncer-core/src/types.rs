//! Request and response records for the bounce calls
//!
//! Field names follow the fixture service's protobuf schema (snake_case), so
//! JSON bodies written for the original servers decode unchanged.
//!
//! Copyright (c) 2025 Bouncer Team
//! Licensed under the Apache-2.0 license

use crate::any::AnyBox;
use crate::field_mask::FieldMask;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Scalars and wrappers
// ---------------------------------------------------------------------------

/// Every protobuf scalar kind, singular and repeated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarRecord {
    #[serde(with = "crate::float_json")]
    pub double_val: f64,
    #[serde(with = "crate::float_json")]
    pub float_val: f32,
    pub int64_val: i64,
    pub uint64_val: u64,
    pub sint64_val: i64,
    pub fixed64_val: u64,
    pub sfixed64_val: i64,
    pub int32_val: i32,
    pub uint32_val: u32,
    pub sint32_val: i32,
    pub fixed32_val: u32,
    pub sfixed32_val: i32,
    pub bool_val: bool,
    pub bytes_val: Vec<u8>,
    pub string_val: String,

    #[serde(with = "crate::float_json::vec")]
    pub double_vals: Vec<f64>,
    #[serde(with = "crate::float_json::vec")]
    pub float_vals: Vec<f32>,
    pub int64_vals: Vec<i64>,
    pub uint64_vals: Vec<u64>,
    pub sint64_vals: Vec<i64>,
    pub fixed64_vals: Vec<u64>,
    pub sfixed64_vals: Vec<i64>,
    pub int32_vals: Vec<i32>,
    pub uint32_vals: Vec<u32>,
    pub sint32_vals: Vec<i32>,
    pub fixed32_vals: Vec<u32>,
    pub sfixed32_vals: Vec<i32>,
    pub bool_vals: Vec<bool>,
    pub bytes_vals: Vec<Vec<u8>>,
    pub string_vals: Vec<String>,
}

/// Nullable wrapped scalars; `None` is an absent wrapper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperRecord {
    #[serde(skip_serializing_if = "Option::is_none", with = "crate::float_json::option")]
    pub double_wrapper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", with = "crate::float_json::option")]
    pub float_wrapper: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int64_wrapper: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uint64_wrapper: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int32_wrapper: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uint32_wrapper: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bool_wrapper: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_wrapper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_wrapper: Option<Vec<u8>>,

    #[serde(with = "crate::float_json::vec_option")]
    pub double_wrappers: Vec<Option<f64>>,
    #[serde(with = "crate::float_json::vec_option")]
    pub float_wrappers: Vec<Option<f32>>,
    pub int64_wrappers: Vec<Option<i64>>,
    pub uint64_wrappers: Vec<Option<u64>>,
    pub int32_wrappers: Vec<Option<i32>>,
    pub uint32_wrappers: Vec<Option<u32>>,
    pub bool_wrappers: Vec<Option<bool>>,
    pub string_wrappers: Vec<Option<String>>,
    pub bytes_wrappers: Vec<Option<Vec<u8>>>,
}

// ---------------------------------------------------------------------------
// Recursive records
// ---------------------------------------------------------------------------

/// Opaque enum identifier, passed through untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumValue(pub i32);

/// Self-referential record exercising every field shape the masks can reach
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexRecord {
    pub int64_val: i64,
    pub int32_val: i32,
    pub bool_val: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_val: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_val: Option<String>,
    pub enum_val: EnumValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_map: Option<BTreeMap<u64, ComplexRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_map: Option<BTreeMap<String, ComplexRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complex_value: Option<Box<ComplexRecord>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub complex_values: Vec<ComplexRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any: Option<AnyBox>,
    pub any_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_mask: Option<FieldMask>,
}

/// Registered Any payload carrying a single greeting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraRecord {
    pub greeting: String,
}

/// Registered Any payload wrapping one string (`google.protobuf.StringValue`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappedString {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceMaskedFieldsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complex_value: Option<ComplexRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_mask: Option<FieldMask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceMaskedFieldsResponse {
    pub complex_value: ComplexRecord,
}

// ---------------------------------------------------------------------------
// Greetings, time and passthrough calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelloRequest {
    pub greeting: String,
    pub boolean_test: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelloResponse {
    pub reply: String,
    pub boolean_test: bool,
}

/// Signed span of time in the protobuf `Duration` shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BounceGoodTimesRequest {
    pub now: DateTime<Utc>,
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub postponement: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BounceGoodTimesResponse {
    pub now: DateTime<Utc>,
    pub new_when: DateTime<Utc>,
    pub total_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallIn {
    #[serde(default)]
    pub message: String,
    pub now: DateTime<Utc>,
    pub when: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallOut {
    pub reply: String,
    pub time_message: String,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tail {
    pub count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<Tail>,
}

/// Echo carries any JSON object; it is returned exactly as received
pub type EchoMsg = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Headers {
    pub headers: Vec<Header>,
}

/// Inbound call metadata: lower-cased keys, each with one or more values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallMetadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`; keys are case-insensitive
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(key.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|values| values.as_slice())
    }

    /// Entries ordered by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layer `other` on top: its keys replace ours
    pub fn merge(&mut self, other: CallMetadata) {
        for (key, values) in other.entries {
            self.entries.insert(key, values);
        }
    }
}

impl From<HashMap<String, Vec<String>>> for CallMetadata {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        let mut metadata = CallMetadata::new();
        for (key, values) in map {
            for value in values {
                metadata.insert(&key, value);
            }
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complex_record_defaults_from_sparse_json() {
        let record: ComplexRecord =
            serde_json::from_value(json!({"int32_val": 3, "complex_value": {}})).unwrap();
        assert_eq!(record.int32_val, 3);
        assert!(record.string_val.is_none());
        assert_eq!(record.complex_value.as_deref(), Some(&ComplexRecord::default()));
    }

    #[test]
    fn test_int_map_keys_are_decimal_strings() {
        let record: ComplexRecord =
            serde_json::from_value(json!({"int_map": {"7": {"int32_val": 1}}})).unwrap();
        let map = record.int_map.as_ref().unwrap();
        assert_eq!(map[&7].int32_val, 1);
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["int_map"]["7"]["int32_val"], json!(1));
    }

    #[test]
    fn test_wrapper_absence_survives_json() {
        let record: WrapperRecord = serde_json::from_value(json!({
            "int32_wrapper": 4,
            "string_wrappers": ["a", null]
        }))
        .unwrap();
        assert_eq!(record.int32_wrapper, Some(4));
        assert_eq!(record.bool_wrapper, None);
        assert_eq!(record.string_wrappers, vec![Some("a".to_string()), None]);
    }

    #[test]
    fn test_call_metadata_lowercases_and_orders_keys() {
        let mut md = CallMetadata::new();
        md.insert("X-Zeta", "1");
        md.insert("x-alpha", "2");
        md.insert("X-ALPHA", "3");
        let keys: Vec<_> = md.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x-alpha", "x-zeta"]);
        assert_eq!(md.get("X-Alpha").unwrap(), ["2", "3"]);
    }
}
