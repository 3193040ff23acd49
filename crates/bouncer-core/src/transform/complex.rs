//! The recursive record

use super::{bounce_all, resolve_any, Bounce};
use crate::field_mask::{normalize_path, FieldMask, MessageSchema};
use crate::types::ComplexRecord;
use tracing::warn;

/// Path appended to every mask a record carries through a bounce
pub const SELF_MASK_PATH: &str = "complex_value.field_mask";

impl Bounce for ComplexRecord {
    fn bounce(self) -> Self {
        let mut out = ComplexRecord {
            int64_val: self.int64_val.bounce(),
            int32_val: self.int32_val.bounce(),
            bool_val: self.bool_val.bounce(),
            // Empty and absent are the same thing for these two
            bytes_val: self.bytes_val.filter(|b| !b.is_empty()).bounce(),
            string_val: self.string_val.filter(|s| !s.is_empty()).bounce(),
            enum_val: self.enum_val,
            int_map: self.int_map.map(|map| {
                map.into_iter()
                    .map(|(key, value)| (key, value.bounce()))
                    .collect()
            }),
            string_map: self.string_map.map(|map| {
                map.into_iter()
                    .map(|(key, value)| (key, value.bounce()))
                    .collect()
            }),
            complex_value: self.complex_value.bounce(),
            complex_values: bounce_all(self.complex_values),
            any: None,
            any_processed: false,
            field_mask: self.field_mask.map(rebuild_mask),
        };

        if let Some(boxed) = self.any {
            match resolve_any(&boxed) {
                Ok(resolved) => {
                    out.any = Some(resolved);
                    out.any_processed = true;
                }
                Err(err) => {
                    warn!(
                        type_url = %boxed.type_url,
                        error = %err,
                        "Dropping Any value that could not be bounced"
                    );
                }
            }
        }

        out
    }
}

/// Keep the requested paths that exist on the record, then add [`SELF_MASK_PATH`]
fn rebuild_mask(mask: FieldMask) -> FieldMask {
    let mut rebuilt = FieldMask::default();
    for path in &mask.paths {
        match normalize_path(MessageSchema::ComplexRecord, path) {
            Ok(canonical) => rebuilt.append(canonical),
            Err(err) => warn!(path = %path, error = %err, "Dropping field mask path"),
        }
    }
    rebuilt.append(SELF_MASK_PATH);
    rebuilt
}
