//! Schema-less values

use super::{bounce_all, Bounce};
use crate::value::{DynamicStruct, DynamicValue};

impl Bounce for DynamicValue {
    fn bounce(self) -> Self {
        match self {
            DynamicValue::Null => DynamicValue::string("no more null"),
            DynamicValue::Number(n) if n.is_nan() => DynamicValue::string("not a number"),
            DynamicValue::Number(n) if n == f64::INFINITY => DynamicValue::string("infinity"),
            DynamicValue::Number(n) if n == f64::NEG_INFINITY => {
                DynamicValue::string("-infinity")
            }
            DynamicValue::Number(n) => DynamicValue::Number(n.bounce()),
            DynamicValue::String(s) => DynamicValue::String(s.bounce()),
            DynamicValue::Bool(b) => DynamicValue::Bool(b.bounce()),
            DynamicValue::Object(fields) => DynamicValue::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, value.bounce()))
                    .collect(),
            ),
            DynamicValue::Array(items) => DynamicValue::Array(bounce_all(items)),
        }
    }
}

impl Bounce for DynamicStruct {
    fn bounce(self) -> Self {
        DynamicStruct {
            fields: self
                .fields
                .into_iter()
                .map(|(key, value)| (key, value.bounce()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_numbers_become_strings() {
        assert_eq!(
            DynamicValue::Number(f64::NAN).bounce(),
            DynamicValue::string("not a number")
        );
        assert_eq!(
            DynamicValue::Number(f64::INFINITY).bounce(),
            DynamicValue::string("infinity")
        );
        assert_eq!(
            DynamicValue::Number(f64::NEG_INFINITY).bounce(),
            DynamicValue::string("-infinity")
        );
        assert_eq!(DynamicValue::Number(-0.25).bounce(), DynamicValue::Number(-0.5));
    }

    #[test]
    fn test_null_and_bool() {
        assert_eq!(DynamicValue::Null.bounce(), DynamicValue::string("no more null"));
        assert_eq!(DynamicValue::Bool(false).bounce(), DynamicValue::Bool(true));
    }

    #[test]
    fn test_nested_containers_recurse() {
        let input = DynamicStruct::new().with(
            "list",
            DynamicValue::Array(vec![DynamicValue::Null, "x".into(), 2.0.into()]),
        );
        let out = input.bounce();
        assert_eq!(
            out.get("list"),
            Some(&DynamicValue::Array(vec![
                DynamicValue::string("no more null"),
                DynamicValue::string("hello x"),
                DynamicValue::Number(4.0),
            ]))
        );
    }
}
