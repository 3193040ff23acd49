//! JSON form of the record float fields
//!
//! JSON has no literal for NaN or the infinities, and `serde_json` writes them
//! as `null`, which would read back as an absent wrapper. These fields use
//! the protobuf JSON spellings `"NaN"`, `"Infinity"` and `"-Infinity"`
//! instead, and accept them (or any numeric string) on input. Finite values
//! are plain numbers. Use with `#[serde(with = "...")]` on the field kind:
//! the module itself for `f32`/`f64`, then [`option`], [`vec`] and
//! [`vec_option`].

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

pub(crate) trait JsonFloat: Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
    fn serialize_finite<S: Serializer>(self, serializer: S) -> Result<S::Ok, S::Error>;
}

impl JsonFloat for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn serialize_finite<S: Serializer>(self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self)
    }
}

impl JsonFloat for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn serialize_finite<S: Serializer>(self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(self)
    }
}

struct Wire<T>(T);

impl<T: JsonFloat> Serialize for Wire<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0.to_f64();
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if value == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            self.0.serialize_finite(serializer)
        }
    }
}

struct WireVisitor<T>(PhantomData<T>);

impl<'de, T: JsonFloat> Visitor<'de> for WireVisitor<T> {
    type Value = Wire<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, \"NaN\", \"Infinity\" or \"-Infinity\"")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Wire(T::from_f64(value)))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Wire(T::from_f64(value as f64)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Wire(T::from_f64(value as f64)))
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        let value = match text {
            "NaN" => f64::NAN,
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            other => other
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(text), &self))?,
        };
        Ok(Wire(T::from_f64(value)))
    }
}

impl<'de, T: JsonFloat> Deserialize<'de> for Wire<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireVisitor(PhantomData))
    }
}

pub(crate) fn serialize<T: JsonFloat, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    Wire(*value).serialize(serializer)
}

pub(crate) fn deserialize<'de, T: JsonFloat, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
    Wire::deserialize(deserializer).map(|wire| wire.0)
}

/// `null` stays an absent value
pub(crate) mod option {
    use super::{JsonFloat, Wire};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(crate) fn serialize<T: JsonFloat, S: Serializer>(
        value: &Option<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(Wire).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, T: JsonFloat, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<T>, D::Error> {
        Ok(Option::<Wire<T>>::deserialize(deserializer)?.map(|wire| wire.0))
    }
}

pub(crate) mod vec {
    use super::{JsonFloat, Wire};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<T: JsonFloat, S: Serializer>(
        values: &[T],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| Wire(*v)))
    }

    pub(crate) fn deserialize<'de, T: JsonFloat, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<T>, D::Error> {
        let wires = Vec::<Wire<T>>::deserialize(deserializer)?;
        Ok(wires.into_iter().map(|wire| wire.0).collect())
    }
}

/// Lists of wrappers; a `null` element is an absent wrapper
pub(crate) mod vec_option {
    use super::{JsonFloat, Wire};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<T: JsonFloat, S: Serializer>(
        values: &[Option<T>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.map(Wire)))
    }

    pub(crate) fn deserialize<'de, T: JsonFloat, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Option<T>>, D::Error> {
        let wires = Vec::<Option<Wire<T>>>::deserialize(deserializer)?;
        Ok(wires.into_iter().map(|wire| wire.map(|w| w.0)).collect())
    }
}
