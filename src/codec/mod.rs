//! Pluggable leaf codecs.
//!
//! The structural walk over a schema is decoupled from the wire
//! representation of individual primitive values: the streaming encoder
//! and decoder drive a [`PrimitiveCodec`], chosen at writer/reader
//! construction. Three interchangeable strategies are provided:
//!
//! * [`BinaryCodec`]: fixed-width little-endian, the canonical on-disk
//!   form;
//! * [`VarIntCodec`]: zigzag + varint packed integers for space-efficient
//!   repacking;
//! * [`TextCodec`]: one-way human-readable rendering for the diagnostic
//!   text mirror.

pub mod binary;
pub mod text;
pub mod varint;

pub use binary::{read_bstring, write_bstring, BinaryCodec, MAX_STRING_LEN};
pub use text::TextCodec;
pub use varint::VarIntCodec;

use crate::error::Result;
use crate::schema::Kind;
use half::f16;

/// One primitive leaf value.
///
/// Values are carried by the pre-order leaf sources consumed by the
/// streaming encoder and produced by the streaming decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 8-bit integer
    Int8(i8),
    /// Unsigned 8-bit integer
    UInt8(u8),
    /// Signed 16-bit integer
    Int16(i16),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// IEEE-754 binary16 float
    Half(f16),
    /// IEEE-754 binary32 float
    Single(f32),
    /// IEEE-754 binary64 float
    Double(f64),
    /// Single byte character
    Char(u8),
    /// UTF-8 string, at most 254 encoded bytes
    Str(String),
}

impl Value {
    /// The schema kind this value conforms to.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int8(_) => Kind::Int8,
            Value::UInt8(_) => Kind::UInt8,
            Value::Int16(_) => Kind::Int16,
            Value::UInt16(_) => Kind::UInt16,
            Value::Int32(_) => Kind::Int32,
            Value::UInt32(_) => Kind::UInt32,
            Value::Int64(_) => Kind::Int64,
            Value::UInt64(_) => Kind::UInt64,
            Value::Half(_) => Kind::Half,
            Value::Single(_) => Kind::Single,
            Value::Double(_) => Kind::Double,
            Value::Char(_) => Kind::Char,
            Value::Str(_) => Kind::String,
        }
    }
}

/// Outcome of encoding one leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStep {
    /// The value was fully written; `n` bytes were consumed from the
    /// destination
    Written(usize),
    /// The destination cannot hold the encoding; at least this many more
    /// bytes are needed. Nothing was written.
    NeedDst(usize),
}

/// Outcome of decoding one leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeStep {
    /// A value was decoded from the first `n` source bytes
    Decoded(Value, usize),
    /// The source does not hold a complete encoding. Nothing was consumed.
    NeedSrc,
}

/// Strategy for encoding and decoding one primitive leaf value.
///
/// An encoding is atomic: the codec either writes the whole value or
/// reports [`EncodeStep::NeedDst`] without side effects, which is what
/// lets the streaming engine guarantee that no leaf is ever split across
/// a block boundary.
pub trait PrimitiveCodec {
    /// Encode `value` as leaf kind `kind` into the front of `dst`.
    ///
    /// # Errors
    ///
    /// [`crate::EdfError::WrongType`] when `kind` is `Struct`, or when the
    /// value's type does not match `kind`.
    fn encode(&self, kind: Kind, value: &Value, dst: &mut [u8]) -> Result<EncodeStep>;

    /// Decode one leaf of kind `kind` from the front of `src`.
    ///
    /// # Errors
    ///
    /// [`crate::EdfError::WrongType`] when `kind` is `Struct`;
    /// [`crate::EdfError::Malformed`] for invalid encodings (reserved
    /// string length sentinel, varint overflow).
    fn decode(&self, kind: Kind, src: &[u8]) -> Result<DecodeStep>;
}
