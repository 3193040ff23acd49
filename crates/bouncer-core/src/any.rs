//! Type-tagged boxed values
//!
//! An [`AnyBox`] carries an encoded payload plus a type URL naming its
//! schema. Only the fixed registry in [`KnownType`] can be opened; anything
//! else is reported as [`Error::UnsupportedAnyType`]. Payloads are the JSON
//! encoding of the concrete record.

use crate::error::{Error, Result};
use crate::types::{ComplexRecord, ExtraRecord, WrappedString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used when packing registered messages
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// A type-tagged container holding an encoded value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnyBox {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// Registry of schemas an [`AnyBox`] may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownType {
    ComplexRecord,
    ExtraRecord,
    WrappedString,
}

/// A decoded Any payload
#[derive(Debug, Clone, PartialEq)]
pub enum KnownMessage {
    Complex(ComplexRecord),
    Extra(ExtraRecord),
    WrappedString(WrappedString),
}

impl KnownType {
    pub const ALL: [KnownType; 3] = [
        KnownType::ComplexRecord,
        KnownType::ExtraRecord,
        KnownType::WrappedString,
    ];

    /// Fully-qualified schema name
    pub fn full_name(self) -> &'static str {
        match self {
            KnownType::ComplexRecord => "targetservice.ComplexType",
            KnownType::ExtraRecord => "targetextras.ExtraType",
            KnownType::WrappedString => "google.protobuf.StringValue",
        }
    }

    pub fn type_url(self) -> String {
        format!("{}{}", TYPE_URL_PREFIX, self.full_name())
    }

    /// Look up a type URL; the name after the final `/` decides
    pub fn from_type_url(type_url: &str) -> Option<Self> {
        let name = type_url.rsplit('/').next().unwrap_or(type_url);
        Self::ALL.into_iter().find(|known| known.full_name() == name)
    }
}

impl fmt::Display for KnownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl KnownMessage {
    pub fn known_type(&self) -> KnownType {
        match self {
            KnownMessage::Complex(_) => KnownType::ComplexRecord,
            KnownMessage::Extra(_) => KnownType::ExtraRecord,
            KnownMessage::WrappedString(_) => KnownType::WrappedString,
        }
    }
}

impl AnyBox {
    /// Box a registered message under its canonical type URL
    pub fn pack(message: &KnownMessage) -> Result<Self> {
        Self::pack_as(message, message.known_type().type_url())
    }

    /// Box a registered message under an explicit type URL
    pub fn pack_as(message: &KnownMessage, type_url: String) -> Result<Self> {
        let encoded = match message {
            KnownMessage::Complex(record) => serde_json::to_vec(record),
            KnownMessage::Extra(record) => serde_json::to_vec(record),
            KnownMessage::WrappedString(record) => serde_json::to_vec(record),
        };

        let value = encoded.map_err(|source| Error::AnyEncode {
            type_url: type_url.clone(),
            source,
        })?;

        Ok(Self { type_url, value })
    }

    /// Resolve the type tag and decode the payload
    pub fn unpack(&self) -> Result<KnownMessage> {
        let known = KnownType::from_type_url(&self.type_url).ok_or_else(|| {
            Error::UnsupportedAnyType {
                type_url: self.type_url.clone(),
            }
        })?;

        let decode_err = |source| Error::AnyDecode {
            type_url: self.type_url.clone(),
            source,
        };

        let message = match known {
            KnownType::ComplexRecord => {
                KnownMessage::Complex(serde_json::from_slice(&self.value).map_err(decode_err)?)
            }
            KnownType::ExtraRecord => {
                KnownMessage::Extra(serde_json::from_slice(&self.value).map_err(decode_err)?)
            }
            KnownType::WrappedString => KnownMessage::WrappedString(
                serde_json::from_slice(&self.value).map_err(decode_err)?,
            ),
        };

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_uses_last_segment() {
        assert_eq!(
            KnownType::from_type_url("type.googleapis.com/targetextras.ExtraType"),
            Some(KnownType::ExtraRecord)
        );
        assert_eq!(
            KnownType::from_type_url("example.com/custom/google.protobuf.StringValue"),
            Some(KnownType::WrappedString)
        );
        assert_eq!(
            KnownType::from_type_url("targetservice.ComplexType"),
            Some(KnownType::ComplexRecord)
        );
        assert_eq!(KnownType::from_type_url("type.googleapis.com/foo.Bar"), None);
    }

    #[test]
    fn test_pack_then_unpack() {
        let message = KnownMessage::Extra(ExtraRecord {
            greeting: "world".to_string(),
        });
        let boxed = AnyBox::pack(&message).unwrap();
        assert_eq!(boxed.type_url, "type.googleapis.com/targetextras.ExtraType");
        assert_eq!(boxed.unpack().unwrap(), message);
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let boxed = AnyBox {
            type_url: "type.googleapis.com/foo.Bar".to_string(),
            value: b"{}".to_vec(),
        };
        match boxed.unpack() {
            Err(Error::UnsupportedAnyType { type_url }) => {
                assert_eq!(type_url, "type.googleapis.com/foo.Bar")
            }
            other => panic!("expected UnsupportedAnyType, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_payload_is_decode_error() {
        let boxed = AnyBox {
            type_url: KnownType::ExtraRecord.type_url(),
            value: vec![0xff, 0x00],
        };
        assert!(matches!(boxed.unpack(), Err(Error::AnyDecode { .. })));
    }
}
