//! Human-readable text codec.
//!
//! Renders leaf values as locale-invariant text: decimal for integers,
//! shortest round-trip formatting for floats, quoted UTF-8 for strings.
//! This codec backs the diagnostic text mirror of a binary file and is
//! one-way: [`PrimitiveCodec::decode`] is unsupported.

use crate::codec::binary::{struct_leaf, wrong_type};
use crate::codec::{DecodeStep, EncodeStep, PrimitiveCodec, Value};
use crate::error::{EdfError, Result};
use crate::schema::Kind;

/// One-way diagnostic rendering codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    /// Render a value as text.
    pub fn render(value: &Value) -> String {
        match value {
            Value::Int8(v) => v.to_string(),
            Value::UInt8(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::UInt16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Half(v) => v.to_string(),
            Value::Single(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Char(v) => (*v as char).to_string(),
            Value::Str(s) => format!("'{}'", s),
        }
    }
}

impl PrimitiveCodec for TextCodec {
    fn encode(&self, kind: Kind, value: &Value, dst: &mut [u8]) -> Result<EncodeStep> {
        if kind == Kind::Struct {
            return Err(struct_leaf());
        }
        if kind != value.kind() {
            return Err(wrong_type(kind, value));
        }
        let text = Self::render(value);
        let bytes = text.as_bytes();
        if dst.len() < bytes.len() {
            return Ok(EncodeStep::NeedDst(bytes.len() - dst.len()));
        }
        dst[..bytes.len()].copy_from_slice(bytes);
        Ok(EncodeStep::Written(bytes.len()))
    }

    fn decode(&self, _kind: Kind, _src: &[u8]) -> Result<DecodeStep> {
        Err(EdfError::Unsupported {
            msg: "text rendering is one-way and cannot be decoded".to_string(),
        })
    }
}
