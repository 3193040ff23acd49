//! Field layout of the records a mask can address
//!
//! Paths are validated against these descriptors when a record carries its
//! own mask: a path may only descend through singular message fields, and a
//! list or map field may only appear as the last segment.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

static JSON_NAME_BOUNDARY: OnceLock<Regex> = OnceLock::new();
static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

/// Message types reachable from a [`crate::types::ComplexRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSchema {
    ComplexRecord,
    AnyBox,
    FieldMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
    Map,
}

/// One field of a message schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub cardinality: Cardinality,
    /// Message type of the field (of the values, for maps)
    pub message: Option<MessageSchema>,
}

const fn scalar(name: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        name,
        cardinality: Cardinality::Singular,
        message: None,
    }
}

const fn message(
    name: &'static str,
    cardinality: Cardinality,
    schema: MessageSchema,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        cardinality,
        message: Some(schema),
    }
}

const COMPLEX_RECORD_FIELDS: &[FieldDescriptor] = &[
    scalar("int64_val"),
    scalar("int32_val"),
    scalar("bool_val"),
    scalar("bytes_val"),
    scalar("string_val"),
    scalar("enum_val"),
    message("int_map", Cardinality::Map, MessageSchema::ComplexRecord),
    message("string_map", Cardinality::Map, MessageSchema::ComplexRecord),
    message("complex_value", Cardinality::Singular, MessageSchema::ComplexRecord),
    message("complex_values", Cardinality::Repeated, MessageSchema::ComplexRecord),
    message("any", Cardinality::Singular, MessageSchema::AnyBox),
    scalar("any_processed"),
    message("field_mask", Cardinality::Singular, MessageSchema::FieldMask),
];

const ANY_BOX_FIELDS: &[FieldDescriptor] = &[scalar("type_url"), scalar("value")];

const FIELD_MASK_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    name: "paths",
    cardinality: Cardinality::Repeated,
    message: None,
}];

impl MessageSchema {
    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            MessageSchema::ComplexRecord => COMPLEX_RECORD_FIELDS,
            MessageSchema::AnyBox => ANY_BOX_FIELDS,
            MessageSchema::FieldMask => FIELD_MASK_FIELDS,
        }
    }

    /// Resolve a path segment by schema name or JSON (lowerCamelCase) name
    pub fn field(self, segment: &str) -> Option<&'static FieldDescriptor> {
        let fields = self.fields();
        if let Some(found) = fields.iter().find(|f| f.name == segment) {
            return Some(found);
        }

        let snake = json_name_to_field_name(segment);
        fields.iter().find(|f| f.name == snake)
    }
}

/// `stringVal` → `string_val`
///
/// Only a capital that follows a lower-case letter or digit is rewritten;
/// other characters keep their case, so `STRING_VAL` matches no field.
pub fn json_name_to_field_name(segment: &str) -> String {
    let boundary = JSON_NAME_BOUNDARY
        .get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid boundary regex"));
    boundary
        .replace_all(segment, |caps: &regex::Captures<'_>| {
            format!("{}_{}", &caps[1], caps[2].to_ascii_lowercase())
        })
        .into_owned()
}

fn is_identifier(segment: &str) -> bool {
    let identifier = IDENTIFIER
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
    identifier.is_match(segment)
}

/// Validate `path` against `schema` and return it in canonical spelling
pub fn normalize_path(schema: MessageSchema, path: &str) -> Result<String> {
    let segments = super::split_path(path)?;
    let mut current = Some(schema);
    let mut canonical = Vec::with_capacity(segments.len());

    for segment in segments {
        let Some(message) = current else {
            return Err(Error::invalid_field_mask(
                path,
                format!("'{}' descends into a field that is not a message", segment),
            ));
        };

        if !is_identifier(segment) {
            return Err(Error::invalid_field_mask(
                path,
                format!("'{}' is not a field name", segment),
            ));
        }

        let field = message.field(segment).ok_or_else(|| {
            Error::invalid_field_mask(path, format!("no field named '{}'", segment))
        })?;

        canonical.push(field.name);
        current = match field.cardinality {
            Cardinality::Singular => field.message,
            Cardinality::Repeated | Cardinality::Map => None,
        };
    }

    Ok(canonical.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_names_resolve() {
        assert_eq!(json_name_to_field_name("stringVal"), "string_val");
        assert_eq!(json_name_to_field_name("int64Val"), "int64_val");
        assert_eq!(json_name_to_field_name("complexValues"), "complex_values");
        assert_eq!(json_name_to_field_name("any"), "any");
        assert_eq!(
            MessageSchema::ComplexRecord.field("anyProcessed").map(|f| f.name),
            Some("any_processed")
        );
    }

    #[test]
    fn test_json_names_are_case_exact() {
        assert_eq!(json_name_to_field_name("STRING_VAL"), "STRING_VAL");
        assert_eq!(json_name_to_field_name("String_Val"), "String_Val");
        assert!(MessageSchema::ComplexRecord.field("STRING_VAL").is_none());
        assert!(MessageSchema::ComplexRecord.field("String_Val").is_none());
        assert!(MessageSchema::ComplexRecord.field("StringVal").is_none());
        assert!(normalize_path(MessageSchema::ComplexRecord, "Complex_Value").is_err());
    }

    #[test]
    fn test_normalize_accepts_nested_singular_paths() {
        let schema = MessageSchema::ComplexRecord;
        assert_eq!(
            normalize_path(schema, "complexValue.fieldMask").unwrap(),
            "complex_value.field_mask"
        );
        assert_eq!(
            normalize_path(schema, "complex_value.complex_value.string_val").unwrap(),
            "complex_value.complex_value.string_val"
        );
        assert_eq!(normalize_path(schema, "any.type_url").unwrap(), "any.type_url");
        assert_eq!(normalize_path(schema, "field_mask.paths").unwrap(), "field_mask.paths");
    }

    #[test]
    fn test_normalize_rejects_bad_paths() {
        let schema = MessageSchema::ComplexRecord;
        assert!(normalize_path(schema, "nope").is_err());
        assert!(normalize_path(schema, "complex_values.int32_val").is_err());
        assert!(normalize_path(schema, "int_map.7").is_err());
        assert!(normalize_path(schema, "string_val.more").is_err());
        assert!(normalize_path(schema, "complex_value..string_val").is_err());
    }
}
