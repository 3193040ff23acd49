//! Opening, bouncing and re-boxing Any values

use super::Bounce;
use crate::any::{AnyBox, KnownMessage};
use crate::error::Result;
use crate::types::{ExtraRecord, WrappedString};

impl Bounce for ExtraRecord {
    fn bounce(self) -> Self {
        ExtraRecord {
            greeting: self.greeting.bounce(),
        }
    }
}

impl Bounce for WrappedString {
    fn bounce(self) -> Self {
        WrappedString {
            value: self.value.bounce(),
        }
    }
}

impl Bounce for KnownMessage {
    fn bounce(self) -> Self {
        match self {
            KnownMessage::Complex(record) => KnownMessage::Complex(record.bounce()),
            KnownMessage::Extra(record) => KnownMessage::Extra(record.bounce()),
            KnownMessage::WrappedString(record) => KnownMessage::WrappedString(record.bounce()),
        }
    }
}

/// Decode a box, bounce its payload and box the result under the same tag
///
/// Fails with [`crate::Error::UnsupportedAnyType`] when the tag names no
/// registered type, or [`crate::Error::AnyDecode`] when the payload does not
/// decode as the tagged type.
pub fn resolve_any(boxed: &AnyBox) -> Result<AnyBox> {
    let message = boxed.unpack()?;
    AnyBox::pack_as(&message.bounce(), boxed.type_url.clone())
}
