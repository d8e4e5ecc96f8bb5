//! Fixed-width little-endian binary codec.
//!
//! Numeric kinds occupy their natural width (1/2/4/8 bytes, little-endian,
//! two's complement, IEEE-754 for floats). Strings are encoded as a 1-byte
//! length prefix (0..=254) followed by the UTF-8 bytes; the length 255 is
//! reserved, and decoding it is a hard error. An empty string is the
//! single byte `0x00`.

use crate::codec::{DecodeStep, EncodeStep, PrimitiveCodec, Value};
use crate::error::{EdfError, Result};
use crate::schema::Kind;
use half::f16;

/// Maximum encoded string length in UTF-8 bytes; 255 is reserved.
pub const MAX_STRING_LEN: usize = 254;

/// The canonical on-disk codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl PrimitiveCodec for BinaryCodec {
    fn encode(&self, kind: Kind, value: &Value, dst: &mut [u8]) -> Result<EncodeStep> {
        if kind != value.kind() {
            return Err(wrong_type(kind, value));
        }
        let step = match value {
            Value::Int8(v) => put(dst, &v.to_le_bytes()),
            Value::UInt8(v) => put(dst, &v.to_le_bytes()),
            Value::Int16(v) => put(dst, &v.to_le_bytes()),
            Value::UInt16(v) => put(dst, &v.to_le_bytes()),
            Value::Int32(v) => put(dst, &v.to_le_bytes()),
            Value::UInt32(v) => put(dst, &v.to_le_bytes()),
            Value::Int64(v) => put(dst, &v.to_le_bytes()),
            Value::UInt64(v) => put(dst, &v.to_le_bytes()),
            Value::Half(v) => put(dst, &v.to_le_bytes()),
            Value::Single(v) => put(dst, &v.to_le_bytes()),
            Value::Double(v) => put(dst, &v.to_le_bytes()),
            Value::Char(v) => put(dst, &[*v]),
            Value::Str(s) => write_bstring(s, dst),
        };
        Ok(step)
    }

    fn decode(&self, kind: Kind, src: &[u8]) -> Result<DecodeStep> {
        let width = match kind {
            Kind::Struct => return Err(struct_leaf()),
            Kind::String => {
                return Ok(match read_bstring(src)? {
                    Some((s, n)) => DecodeStep::Decoded(Value::Str(s), n),
                    None => DecodeStep::NeedSrc,
                })
            }
            other => other.size_of(),
        };
        if src.len() < width {
            return Ok(DecodeStep::NeedSrc);
        }
        let b = &src[..width];
        let value = match kind {
            Kind::Int8 => Value::Int8(i8::from_le_bytes([b[0]])),
            Kind::UInt8 => Value::UInt8(b[0]),
            Kind::Int16 => Value::Int16(i16::from_le_bytes([b[0], b[1]])),
            Kind::UInt16 => Value::UInt16(u16::from_le_bytes([b[0], b[1]])),
            Kind::Int32 => Value::Int32(i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Kind::UInt32 => Value::UInt32(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Kind::Int64 => Value::Int64(i64::from_le_bytes(b.try_into().unwrap())),
            Kind::UInt64 => Value::UInt64(u64::from_le_bytes(b.try_into().unwrap())),
            Kind::Half => Value::Half(f16::from_le_bytes([b[0], b[1]])),
            Kind::Single => Value::Single(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            Kind::Double => Value::Double(f64::from_le_bytes(b.try_into().unwrap())),
            Kind::Char => Value::Char(b[0]),
            Kind::Struct | Kind::String => unreachable!(),
        };
        Ok(DecodeStep::Decoded(value, width))
    }
}

/// Write a length-prefixed string: `[len:u8 (0..=254)][utf8 bytes]`.
///
/// Strings longer than 254 encoded bytes are defensively capped at a
/// character boundary; validating length up front is the caller's
/// responsibility.
pub fn write_bstring(s: &str, dst: &mut [u8]) -> EncodeStep {
    let mut end = s.len().min(MAX_STRING_LEN);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let bytes = &s.as_bytes()[..end];
    let needed = 1 + bytes.len();
    if dst.len() < needed {
        return EncodeStep::NeedDst(needed - dst.len());
    }
    dst[0] = bytes.len() as u8;
    dst[1..needed].copy_from_slice(bytes);
    EncodeStep::Written(needed)
}

/// Read a length-prefixed string. Returns `None` when `src` does not hold
/// the complete encoding.
///
/// # Errors
///
/// [`EdfError::Malformed`] for the reserved length 255 or invalid UTF-8.
pub fn read_bstring(src: &[u8]) -> Result<Option<(String, usize)>> {
    if src.is_empty() {
        return Ok(None);
    }
    let len = src[0] as usize;
    if len == 255 {
        return Err(EdfError::Malformed {
            msg: "string length overflow: reserved sentinel 255".to_string(),
        });
    }
    if src.len() < 1 + len {
        return Ok(None);
    }
    let s = std::str::from_utf8(&src[1..1 + len])
        .map_err(|_| EdfError::Malformed {
            msg: "string payload is not valid UTF-8".to_string(),
        })?
        .to_string();
    Ok(Some((s, 1 + len)))
}

fn put(dst: &mut [u8], bytes: &[u8]) -> EncodeStep {
    if dst.len() < bytes.len() {
        return EncodeStep::NeedDst(bytes.len() - dst.len());
    }
    dst[..bytes.len()].copy_from_slice(bytes);
    EncodeStep::Written(bytes.len())
}

pub(crate) fn wrong_type(kind: Kind, value: &Value) -> EdfError {
    EdfError::WrongType {
        msg: format!("schema leaf is {:?} but value is {:?}", kind, value.kind()),
    }
}

pub(crate) fn struct_leaf() -> EdfError {
    EdfError::WrongType {
        msg: "Struct is not a primitive leaf kind".to_string(),
    }
}
