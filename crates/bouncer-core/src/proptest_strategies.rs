//! Property-based testing strategies for generating bounce inputs
//!
//! These strategies generate random but well-formed records for the
//! property tests at the bottom of this module.

#![cfg(test)]

use crate::any::{AnyBox, KnownMessage};
use crate::field_mask::FieldMask;
use crate::types::*;
use crate::value::DynamicValue;
use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;

/// Strategy for generating schema-less values, including non-finite numbers
pub fn dynamic_value_strategy() -> impl Strategy<Value = DynamicValue> {
    let leaf = prop_oneof![
        Just(DynamicValue::Null),
        any::<bool>().prop_map(DynamicValue::Bool),
        prop::num::f64::ANY.prop_map(DynamicValue::Number),
        "[a-z ]{0,12}".prop_map(DynamicValue::String),
    ];

    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..6).prop_map(DynamicValue::Array),
            btree_map("[a-z]{1,6}", inner, 0..6).prop_map(DynamicValue::Object),
        ]
    })
}

/// Strategy for generating boxed values, registered or not
pub fn any_box_strategy() -> impl Strategy<Value = AnyBox> {
    prop_oneof![
        "[a-z]{0,10}".prop_map(|greeting| {
            AnyBox::pack(&KnownMessage::Extra(ExtraRecord { greeting }))
                .expect("extra records always encode")
        }),
        "[a-z]{0,10}".prop_map(|value| {
            AnyBox::pack(&KnownMessage::WrappedString(WrappedString { value }))
                .expect("wrapped strings always encode")
        }),
        "[a-z]{1,8}\\.[A-Z][a-z]{1,8}".prop_map(|name| AnyBox {
            type_url: format!("type.googleapis.com/{}", name),
            value: Vec::new(),
        }),
    ]
}

/// Strategy for generating flat records without nesting
pub fn flat_complex_strategy() -> impl Strategy<Value = ComplexRecord> {
    (
        any::<i64>(),
        any::<i32>(),
        any::<bool>(),
        option::of(vec(any::<u8>(), 0..8)),
        option::of("[a-z]{0,8}"),
        any::<i32>(),
        option::of(any_box_strategy()),
    )
        .prop_map(
            |(int64_val, int32_val, bool_val, bytes_val, string_val, enum_val, any)| {
                ComplexRecord {
                    int64_val,
                    int32_val,
                    bool_val,
                    bytes_val,
                    string_val,
                    enum_val: EnumValue(enum_val),
                    any,
                    ..Default::default()
                }
            },
        )
}

/// Strategy for generating nested records
pub fn complex_record_strategy() -> impl Strategy<Value = ComplexRecord> {
    flat_complex_strategy().prop_recursive(3, 24, 4, |inner| {
        (
            flat_complex_strategy(),
            option::of(btree_map(any::<u64>(), inner.clone(), 0..3)),
            option::of(btree_map("[a-z]{1,4}", inner.clone(), 0..3)),
            option::of(inner.clone()),
            vec(inner, 0..3),
        )
            .prop_map(
                |(mut record, int_map, string_map, complex_value, complex_values)| {
                    record.int_map = int_map;
                    record.string_map = string_map;
                    record.complex_value = complex_value.map(Box::new);
                    record.complex_values = complex_values;
                    record
                },
            )
    })
}

/// Strategy for generating field masks over record field names
pub fn field_mask_strategy() -> impl Strategy<Value = FieldMask> {
    let segment = prop_oneof![
        Just("int64_val"),
        Just("int32Val"),
        Just("bool_val"),
        Just("string_val"),
        Just("complex_value"),
        Just("complexValues"),
        Just("any"),
        Just("any_processed"),
    ];
    vec(vec(segment, 1..4).prop_map(|parts| parts.join(".")), 0..4).prop_map(FieldMask::new)
}

mod properties {
    use super::*;
    use crate::field_mask::{prune, MaskTree};
    use crate::transform::Bounce;

    fn depth(record: &ComplexRecord) -> usize {
        let nested = record.complex_value.as_deref().map(depth).unwrap_or(0);
        let listed = record.complex_values.iter().map(depth).max().unwrap_or(0);
        1 + nested.max(listed)
    }

    proptest! {
        #[test]
        fn bounce_is_deterministic(record in complex_record_strategy()) {
            prop_assert_eq!(record.clone().bounce(), record.bounce());
        }

        #[test]
        fn absent_fields_stay_absent(record in complex_record_strategy()) {
            let out = record.clone().bounce();
            prop_assert_eq!(record.int_map.is_none(), out.int_map.is_none());
            prop_assert_eq!(record.string_map.is_none(), out.string_map.is_none());
            prop_assert_eq!(record.complex_value.is_none(), out.complex_value.is_none());
            prop_assert_eq!(record.complex_values.len(), out.complex_values.len());
            if record.string_val.is_none() {
                prop_assert!(out.string_val.is_none());
            }
            if record.any.is_none() {
                prop_assert!(out.any.is_none());
                prop_assert!(!out.any_processed);
            }
            prop_assert_eq!(out.any.is_some(), out.any_processed);
            prop_assert_eq!(depth(&record), depth(&out));
        }

        #[test]
        fn scalar_rules_hold(x in any::<i32>(), b in any::<bool>()) {
            prop_assert_eq!(b.bounce().bounce(), b);
            prop_assert_eq!(x.bounce(), x.wrapping_add(x));
        }

        #[test]
        fn pruning_is_idempotent(
            record in complex_record_strategy(),
            mask in field_mask_strategy(),
        ) {
            let tree = MaskTree::parse(&mask).unwrap();
            let mut once = record.bounce();
            prune(&mut once, &tree);
            let mut twice = once.clone();
            prune(&mut twice, &tree);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn dynamic_arrays_keep_length(items in vec(dynamic_value_strategy(), 0..8)) {
            let len = items.len();
            match DynamicValue::Array(items).bounce() {
                DynamicValue::Array(out) => prop_assert_eq!(out.len(), len),
                other => prop_assert!(false, "array became {}", other.kind()),
            }
        }
    }
}
