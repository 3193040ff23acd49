//! Nullable wrapped scalars
//!
//! A present wrapper is unwrapped, bounced with the scalar rule and wrapped
//! again; an absent one stays absent. Lists keep their holes.

use super::{bounce_all, Bounce};
use crate::types::WrapperRecord;

impl Bounce for WrapperRecord {
    fn bounce(self) -> Self {
        WrapperRecord {
            double_wrapper: self.double_wrapper.bounce(),
            float_wrapper: self.float_wrapper.bounce(),
            int64_wrapper: self.int64_wrapper.bounce(),
            uint64_wrapper: self.uint64_wrapper.bounce(),
            int32_wrapper: self.int32_wrapper.bounce(),
            uint32_wrapper: self.uint32_wrapper.bounce(),
            bool_wrapper: self.bool_wrapper.bounce(),
            string_wrapper: self.string_wrapper.bounce(),
            bytes_wrapper: self.bytes_wrapper.bounce(),

            double_wrappers: bounce_all(self.double_wrappers),
            float_wrappers: bounce_all(self.float_wrappers),
            int64_wrappers: bounce_all(self.int64_wrappers),
            uint64_wrappers: bounce_all(self.uint64_wrappers),
            int32_wrappers: bounce_all(self.int32_wrappers),
            uint32_wrappers: bounce_all(self.uint32_wrappers),
            bool_wrappers: bounce_all(self.bool_wrappers),
            string_wrappers: bounce_all(self.string_wrappers),
            bytes_wrappers: bounce_all(self.bytes_wrappers),
        }
    }
}
