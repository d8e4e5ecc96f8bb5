//! Variable-length integer codec.
//!
//! Integers are packed with a compact varint: seven payload bits per byte,
//! high bit as continuation, and (unlike the protobuf encoding) the
//! continuation byte contributes its full value including the 0x80 bit,
//! with the running value decremented by one per step on encode. This
//! removes encoding redundancy and widens each byte count's value range
//! (one byte reaches 127, two bytes reach 16511, and so on). Signed values
//! are zigzag-mapped first. 64-bit values need at most 10 bytes.
//!
//! Floats and chars have no varint form and pass through the fixed binary
//! encoding unchanged; strings keep their length-prefixed form.

use crate::codec::binary::{wrong_type, BinaryCodec};
use crate::codec::{DecodeStep, EncodeStep, PrimitiveCodec, Value};
use crate::error::{EdfError, Result};
use crate::schema::Kind;

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_BYTES: usize = 10;

/// Encoded length of `x` in bytes.
pub fn encoded_len(mut x: u64) -> usize {
    let mut n = 1;
    while x > 127 {
        n += 1;
        x >>= 7;
        x -= 1;
    }
    n
}

/// Encode `x` into the front of `buf`. Returns `None` when `buf` is too
/// small; nothing is written in that case.
pub fn encode_u64(x: u64, buf: &mut [u8]) -> Option<usize> {
    if buf.len() < encoded_len(x) {
        return None;
    }
    let mut x = x;
    let mut n = 0;
    while x > 127 {
        buf[n] = (x as u8 & 0x7F) | 0x80;
        n += 1;
        x >>= 7;
        x -= 1;
    }
    buf[n] = x as u8;
    Some(n + 1)
}

/// Decode a varint from the front of `buf`. Returns `None` when the
/// encoding continues past the available bytes.
///
/// # Errors
///
/// [`EdfError::Malformed`] when the accumulated value overflows 64 bits or
/// the encoding runs past 10 bytes.
pub fn decode_u64(buf: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut x = 0u64;
    let mut n = 0;
    let mut shift = 0u32;
    while shift < 64 {
        if n >= buf.len() {
            return Ok(None);
        }
        let b = buf[n];
        n += 1;
        let wide = b as u64;
        if shift > 0 && wide >> (64 - shift) != 0 {
            return Err(overflow());
        }
        x = x.checked_add(wide << shift).ok_or_else(overflow)?;
        if b & 0x80 == 0 {
            return Ok(Some((x, n)));
        }
        shift += 7;
    }
    Err(overflow())
}

/// Decode a varint bounded to 32 bits.
pub fn decode_u32(buf: &[u8]) -> Result<Option<(u32, usize)>> {
    match decode_u64(buf)? {
        Some((x, n)) => {
            let x = u32::try_from(x).map_err(|_| overflow())?;
            Ok(Some((x, n)))
        }
        None => Ok(None),
    }
}

/// Decode a varint bounded to 16 bits.
pub fn decode_u16(buf: &[u8]) -> Result<Option<(u16, usize)>> {
    match decode_u64(buf)? {
        Some((x, n)) => {
            let x = u16::try_from(x).map_err(|_| overflow())?;
            Ok(Some((x, n)))
        }
        None => Ok(None),
    }
}

/// Map a signed value onto the unsigned varint domain.
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

fn overflow() -> EdfError {
    EdfError::Malformed {
        msg: "varint value overflow".to_string(),
    }
}

/// Codec packing integer kinds as (zigzag) varints.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarIntCodec;

impl VarIntCodec {
    fn unsigned_of(kind: Kind, value: &Value) -> Option<u64> {
        match (kind, value) {
            (Kind::UInt8, Value::UInt8(v)) => Some(*v as u64),
            (Kind::UInt16, Value::UInt16(v)) => Some(*v as u64),
            (Kind::UInt32, Value::UInt32(v)) => Some(*v as u64),
            (Kind::UInt64, Value::UInt64(v)) => Some(*v),
            (Kind::Int8, Value::Int8(v)) => Some(zigzag_encode(*v as i64)),
            (Kind::Int16, Value::Int16(v)) => Some(zigzag_encode(*v as i64)),
            (Kind::Int32, Value::Int32(v)) => Some(zigzag_encode(*v as i64)),
            (Kind::Int64, Value::Int64(v)) => Some(zigzag_encode(*v)),
            _ => None,
        }
    }

    fn value_of(kind: Kind, raw: u64) -> Result<Value> {
        let out_of_range = || EdfError::Malformed {
            msg: format!("varint value out of range for {:?}", kind),
        };
        Ok(match kind {
            Kind::UInt8 => Value::UInt8(u8::try_from(raw).map_err(|_| out_of_range())?),
            Kind::UInt16 => Value::UInt16(u16::try_from(raw).map_err(|_| out_of_range())?),
            Kind::UInt32 => Value::UInt32(u32::try_from(raw).map_err(|_| out_of_range())?),
            Kind::UInt64 => Value::UInt64(raw),
            Kind::Int8 => {
                Value::Int8(i8::try_from(zigzag_decode(raw)).map_err(|_| out_of_range())?)
            }
            Kind::Int16 => {
                Value::Int16(i16::try_from(zigzag_decode(raw)).map_err(|_| out_of_range())?)
            }
            Kind::Int32 => {
                Value::Int32(i32::try_from(zigzag_decode(raw)).map_err(|_| out_of_range())?)
            }
            Kind::Int64 => Value::Int64(zigzag_decode(raw)),
            _ => unreachable!("non-integer kind"),
        })
    }

    fn is_integer(kind: Kind) -> bool {
        matches!(
            kind,
            Kind::Int8
                | Kind::UInt8
                | Kind::Int16
                | Kind::UInt16
                | Kind::Int32
                | Kind::UInt32
                | Kind::Int64
                | Kind::UInt64
        )
    }
}

impl PrimitiveCodec for VarIntCodec {
    fn encode(&self, kind: Kind, value: &Value, dst: &mut [u8]) -> Result<EncodeStep> {
        if !Self::is_integer(kind) {
            // Fixed-size kinds and strings pass through unchanged.
            return BinaryCodec.encode(kind, value, dst);
        }
        let raw = Self::unsigned_of(kind, value).ok_or_else(|| wrong_type(kind, value))?;
        match encode_u64(raw, dst) {
            Some(n) => Ok(EncodeStep::Written(n)),
            None => Ok(EncodeStep::NeedDst(encoded_len(raw) - dst.len())),
        }
    }

    fn decode(&self, kind: Kind, src: &[u8]) -> Result<DecodeStep> {
        if !Self::is_integer(kind) {
            return BinaryCodec.decode(kind, src);
        }
        match decode_u64(src)? {
            Some((raw, n)) => Ok(DecodeStep::Decoded(Self::value_of(kind, raw)?, n)),
            None => Ok(DecodeStep::NeedSrc),
        }
    }
}
