//! Encoding of cached values.
//!
//! Every entry file holds a small JSON envelope:
//!
//! ```text
//! {"v":1,"data":<value>}
//! ```
//!
//! The envelope keeps `false`, `0`, `""` and empty containers apart from an
//! empty file, which always means "nothing cached".
//!
//! JSON has no NaN or infinity, and `serde_json` writes them as `null`. Such
//! values are refused at encode time instead of turning into a silent miss.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::ser;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Current envelope version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    v: u32,
    data: &'a T,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    v: u32,
    data: serde_json::Value,
}

/// Encode a value into envelope bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<Bytes> {
    value.serialize(FiniteFloats)?;
    let envelope = EnvelopeRef {
        v: FORMAT_VERSION,
        data: value,
    };
    Ok(Bytes::from(serde_json::to_vec(&envelope)?))
}

/// Check the envelope and return its untyped payload.
///
/// Any failure here means the stored bytes are corrupt.
pub fn decode_envelope(bytes: &[u8]) -> CacheResult<serde_json::Value> {
    if bytes.is_empty() {
        return Err(CacheError::Deserialization("empty payload".to_string()));
    }
    let malformed = |e: serde_json::Error| {
        CacheError::Deserialization(format!("malformed envelope: {}", e))
    };
    // A derived struct also deserializes from a JSON array, so the object
    // shape is checked before the fields are.
    let envelope = match serde_json::from_slice::<serde_json::Value>(bytes).map_err(malformed)? {
        object @ serde_json::Value::Object(_) => {
            serde_json::from_value::<Envelope>(object).map_err(malformed)?
        }
        _ => {
            return Err(CacheError::Deserialization(
                "envelope is not an object".to_string(),
            ))
        }
    };
    if envelope.v != FORMAT_VERSION {
        return Err(CacheError::Deserialization(format!(
            "unsupported envelope version {}",
            envelope.v
        )));
    }
    Ok(envelope.data)
}

/// Convert a decoded payload into the caller's type.
pub fn from_payload<T: DeserializeOwned>(payload: serde_json::Value) -> CacheResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| CacheError::Deserialization(format!("type mismatch: {}", e)))
}

/// Decode envelope bytes straight into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CacheResult<T> {
    from_payload(decode_envelope(bytes)?)
}

/// A serializer that produces nothing and fails on NaN or infinite floats.
#[derive(Clone, Copy)]
struct FiniteFloats;

type Check = Result<(), serde_json::Error>;

fn check_float(finite: bool) -> Check {
    if finite {
        Ok(())
    } else {
        Err(ser::Error::custom("NaN and infinite floats cannot be cached"))
    }
}

impl ser::Serializer for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Check {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> Check {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> Check {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> Check {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> Check {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> Check {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> Check {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> Check {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> Check {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> Check {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> Check {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Check {
        check_float(v.is_finite())
    }

    fn serialize_f64(self, v: f64) -> Check {
        check_float(v.is_finite())
    }

    fn serialize_char(self, _: char) -> Check {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> Check {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> Check {
        Ok(())
    }

    fn serialize_none(self) -> Check {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Check {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Check {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Check {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Check {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Check {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Check {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, serde_json::Error> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, serde_json::Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Check {
        key.serialize(*self)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> Check {
        value.serialize(*self)
    }

    fn end(self) -> Check {
        Ok(())
    }
}
