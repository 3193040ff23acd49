//! Pruning a transformed record down to the fields a mask names

use super::schema::MessageSchema;
use super::MaskTree;
use crate::types::ComplexRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Keep only what `tree` reaches in `record`; everything else is reset
///
/// A mask without paths filters nothing. Segments that name no field match
/// nothing.
pub fn prune(record: &mut ComplexRecord, tree: &MaskTree) {
    if tree.is_empty() || tree.is_whole() {
        return;
    }
    prune_record(record, tree);
}

fn prune_nested(record: &mut ComplexRecord, tree: &MaskTree) {
    if !tree.is_whole() {
        prune_record(record, tree);
    }
}

/// Group the child segments by the field they resolve to, so `stringVal`
/// and `string_val` share one subtree
fn selected_fields(tree: &MaskTree) -> BTreeMap<&'static str, MaskTree> {
    let mut selected: BTreeMap<&'static str, MaskTree> = BTreeMap::new();
    for (segment, subtree) in tree.children() {
        match MessageSchema::ComplexRecord.field(segment) {
            Some(field) => selected.entry(field.name).or_default().merge(subtree),
            None => debug!(segment, "Field mask segment names no field"),
        }
    }
    selected
}

fn prune_record(record: &mut ComplexRecord, tree: &MaskTree) {
    let mut source = std::mem::take(record);

    for (name, subtree) in selected_fields(tree) {
        match name {
            "int64_val" => record.int64_val = source.int64_val,
            "int32_val" => record.int32_val = source.int32_val,
            "bool_val" => record.bool_val = source.bool_val,
            "bytes_val" => record.bytes_val = source.bytes_val.take(),
            "string_val" => record.string_val = source.string_val.take(),
            "enum_val" => record.enum_val = source.enum_val,
            "any" => record.any = source.any.take(),
            "any_processed" => record.any_processed = source.any_processed,
            "field_mask" => record.field_mask = source.field_mask.take(),
            "complex_value" => {
                record.complex_value = source.complex_value.take().map(|mut nested| {
                    prune_nested(&mut nested, &subtree);
                    nested
                });
            }
            "complex_values" => {
                let mut values = std::mem::take(&mut source.complex_values);
                for value in &mut values {
                    prune_nested(value, &subtree);
                }
                record.complex_values = values;
            }
            "int_map" => {
                record.int_map = source
                    .int_map
                    .take()
                    .map(|map| prune_map(map, &subtree, |key| key.to_string()));
            }
            "string_map" => {
                record.string_map = source
                    .string_map
                    .take()
                    .map(|map| prune_map(map, &subtree, |key| key.clone()));
            }
            other => debug!(field = other, "Field has no pruning rule"),
        }
    }
}

/// The segment after a map field selects entries by key text
fn prune_map<K: Ord>(
    map: BTreeMap<K, ComplexRecord>,
    tree: &MaskTree,
    key_text: impl Fn(&K) -> String,
) -> BTreeMap<K, ComplexRecord> {
    if tree.is_whole() {
        return map;
    }

    map.into_iter()
        .filter_map(|(key, mut value)| {
            let entry_tree = tree.child(&key_text(&key))?;
            prune_nested(&mut value, entry_tree);
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::any::{AnyBox, KnownType};
    use crate::field_mask::FieldMask;

    fn populated() -> ComplexRecord {
        ComplexRecord {
            int64_val: 10,
            int32_val: 4,
            bool_val: true,
            string_val: Some("hello top".to_string()),
            bytes_val: Some(b"x abc".to_vec()),
            complex_value: Some(Box::new(ComplexRecord {
                int32_val: 2,
                string_val: Some("hello inner".to_string()),
                ..Default::default()
            })),
            complex_values: vec![
                ComplexRecord {
                    int32_val: 6,
                    bool_val: true,
                    ..Default::default()
                },
                ComplexRecord {
                    int32_val: 8,
                    ..Default::default()
                },
            ],
            int_map: Some(BTreeMap::from([
                (1, ComplexRecord { int32_val: 1, ..Default::default() }),
                (2, ComplexRecord { int32_val: 2, bool_val: true, ..Default::default() }),
            ])),
            string_map: Some(BTreeMap::from([(
                "k".to_string(),
                ComplexRecord { int64_val: 3, ..Default::default() },
            )])),
            any: Some(AnyBox {
                type_url: KnownType::WrappedString.type_url(),
                value: br#"{"value":"hello"}"#.to_vec(),
            }),
            any_processed: true,
            ..Default::default()
        }
    }

    fn tree(paths: &[&str]) -> MaskTree {
        MaskTree::parse(&FieldMask::new(paths.iter().copied())).unwrap()
    }

    #[test]
    fn test_single_leaf_keeps_only_that_leaf() {
        let mut record = populated();
        prune(&mut record, &tree(&["stringVal"]));
        assert_eq!(
            record,
            ComplexRecord {
                string_val: Some("hello top".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_ancestor_keeps_subtree() {
        let mut record = populated();
        let expected = record.complex_value.clone();
        prune(&mut record, &tree(&["complex_value", "complex_value.int32_val"]));
        assert_eq!(record.complex_value, expected);
        assert_eq!(record.int32_val, 0);
    }

    #[test]
    fn test_nested_leaf_prunes_siblings() {
        let mut record = populated();
        prune(&mut record, &tree(&["complexValue.int32Val"]));
        let nested = record.complex_value.unwrap();
        assert_eq!(nested.int32_val, 2);
        assert!(nested.string_val.is_none());
    }

    #[test]
    fn test_list_applies_submask_to_every_element() {
        let mut record = populated();
        prune(&mut record, &tree(&["complex_values.bool_val"]));
        let bools: Vec<_> = record.complex_values.iter().map(|r| r.bool_val).collect();
        let ints: Vec<_> = record.complex_values.iter().map(|r| r.int32_val).collect();
        assert_eq!(bools, vec![true, false]);
        assert_eq!(ints, vec![0, 0]);
    }

    #[test]
    fn test_map_segment_selects_keys() {
        let mut record = populated();
        prune(&mut record, &tree(&["int_map.2.bool_val", "string_map"]));
        let int_map = record.int_map.unwrap();
        assert_eq!(int_map.len(), 1);
        assert_eq!(
            int_map[&2],
            ComplexRecord { bool_val: true, ..Default::default() }
        );
        assert_eq!(record.string_map.unwrap()["k"].int64_val, 3);
    }

    #[test]
    fn test_empty_and_unknown_masks() {
        let mut record = populated();
        prune(&mut record, &tree(&[]));
        assert_eq!(record, populated());

        prune(&mut record, &tree(&["no_such_field"]));
        assert_eq!(record, ComplexRecord::default());
    }

    #[test]
    fn test_opaque_fields_kept_whole() {
        let mut record = populated();
        prune(&mut record, &tree(&["any.type_url"]));
        assert_eq!(record.any, populated().any);
        assert!(!record.any_processed);
    }
}
