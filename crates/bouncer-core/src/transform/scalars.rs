//! Scalar rules and the all-scalars record

use super::{bounce_all, Bounce, BYTES_SUFFIX, GREETING_PREFIX};
use crate::types::ScalarRecord;

macro_rules! impl_wrapping_double {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bounce for $ty {
                fn bounce(self) -> Self {
                    self.wrapping_mul(2)
                }
            }
        )*
    };
}

impl_wrapping_double!(i32, i64, u32, u64);

impl Bounce for f32 {
    fn bounce(self) -> Self {
        self * 2.0
    }
}

impl Bounce for f64 {
    fn bounce(self) -> Self {
        self * 2.0
    }
}

impl Bounce for bool {
    fn bounce(self) -> Self {
        !self
    }
}

impl Bounce for String {
    fn bounce(self) -> Self {
        let mut out = String::with_capacity(GREETING_PREFIX.len() + self.len());
        out.push_str(GREETING_PREFIX);
        out.push_str(&self);
        out
    }
}

impl Bounce for Vec<u8> {
    fn bounce(mut self) -> Self {
        self.extend_from_slice(BYTES_SUFFIX);
        self
    }
}

impl Bounce for ScalarRecord {
    fn bounce(self) -> Self {
        ScalarRecord {
            double_val: self.double_val.bounce(),
            float_val: self.float_val.bounce(),
            int64_val: self.int64_val.bounce(),
            uint64_val: self.uint64_val.bounce(),
            sint64_val: self.sint64_val.bounce(),
            fixed64_val: self.fixed64_val.bounce(),
            sfixed64_val: self.sfixed64_val.bounce(),
            int32_val: self.int32_val.bounce(),
            uint32_val: self.uint32_val.bounce(),
            sint32_val: self.sint32_val.bounce(),
            fixed32_val: self.fixed32_val.bounce(),
            sfixed32_val: self.sfixed32_val.bounce(),
            bool_val: self.bool_val.bounce(),
            bytes_val: self.bytes_val.bounce(),
            string_val: self.string_val.bounce(),

            double_vals: bounce_all(self.double_vals),
            float_vals: bounce_all(self.float_vals),
            int64_vals: bounce_all(self.int64_vals),
            uint64_vals: bounce_all(self.uint64_vals),
            sint64_vals: bounce_all(self.sint64_vals),
            fixed64_vals: bounce_all(self.fixed64_vals),
            sfixed64_vals: bounce_all(self.sfixed64_vals),
            int32_vals: bounce_all(self.int32_vals),
            uint32_vals: bounce_all(self.uint32_vals),
            sint32_vals: bounce_all(self.sint32_vals),
            fixed32_vals: bounce_all(self.fixed32_vals),
            sfixed32_vals: bounce_all(self.sfixed32_vals),
            bool_vals: bounce_all(self.bool_vals),
            bytes_vals: bounce_all(self.bytes_vals),
            string_vals: bounce_all(self.string_vals),
        }
    }
}
