//! Typed record binding.
//!
//! [`FixedRecord`] maps a Rust type onto a schema node and a flat
//! pre-order leaf sequence, so strongly-typed values can move through the
//! generic writers and readers without hand-building [`Value`] vectors.
//! Implementations exist for every primitive leaf type and for fixed-size
//! arrays of them; composite records are built by implementing the trait
//! on a struct and delegating to its fields in declaration order.

use half::f16;

use crate::codec::Value;
use crate::error::{EdfError, Result};
use crate::io::{RecordWriter, SchemaRecord};
use crate::schema::{Kind, SchemaNode};

/// A type with a fixed schema shape and a pre-order leaf encoding.
pub trait FixedRecord: Sized {
    /// The schema node describing this type, under the given field name.
    fn schema(name: &str) -> SchemaNode;

    /// Append this value's leaves in pre-order.
    fn leaves(&self, out: &mut Vec<Value>);

    /// Rebuild a value from the front of a pre-order leaf slice,
    /// consuming the leaves used.
    ///
    /// # Errors
    ///
    /// [`EdfError::WrongType`] when a leaf does not match the schema;
    /// [`EdfError::InvalidInput`] when the slice runs out early.
    fn from_leaves(leaves: &mut &[Value]) -> Result<Self>;
}

/// Write one typed record through any [`RecordWriter`].
pub fn write_typed<T: FixedRecord>(writer: &mut dyn RecordWriter, value: &T) -> Result<()> {
    let mut out = Vec::new();
    value.leaves(&mut out);
    writer.write_record(&out)
}

/// Rebuild a typed record from a full decoded leaf vector.
///
/// # Errors
///
/// [`EdfError::InvalidInput`] when leaves remain after the rebuild.
pub fn read_typed<T: FixedRecord>(record: &[Value]) -> Result<T> {
    let mut rest = record;
    let value = T::from_leaves(&mut rest)?;
    if !rest.is_empty() {
        return Err(EdfError::InvalidInput {
            msg: "record holds more leaves than the type consumes".to_string(),
        });
    }
    Ok(value)
}

/// A [`SchemaRecord`] for a typed record, rooted at the type's node.
pub fn typed_schema<T: FixedRecord>(id: u32, name: &str) -> SchemaRecord {
    SchemaRecord::new(id, T::schema(name)).named(name)
}

fn take<'a>(leaves: &mut &'a [Value]) -> Result<&'a Value> {
    let (first, rest) = leaves.split_first().ok_or_else(|| EdfError::InvalidInput {
        msg: "record holds fewer leaves than the type consumes".to_string(),
    })?;
    *leaves = rest;
    Ok(first)
}

fn leaf_mismatch(expected: Kind, found: &Value) -> EdfError {
    EdfError::WrongType {
        msg: format!("expected {:?} leaf, found {:?}", expected, found.kind()),
    }
}

macro_rules! primitive_record {
    ($ty:ty, $kind:expr, $variant:ident) => {
        impl FixedRecord for $ty {
            fn schema(name: &str) -> SchemaNode {
                SchemaNode::leaf(name, $kind)
            }

            fn leaves(&self, out: &mut Vec<Value>) {
                out.push(Value::$variant(self.clone()));
            }

            fn from_leaves(leaves: &mut &[Value]) -> Result<Self> {
                match take(leaves)? {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(leaf_mismatch($kind, other)),
                }
            }
        }
    };
}

primitive_record!(i8, Kind::Int8, Int8);
primitive_record!(u8, Kind::UInt8, UInt8);
primitive_record!(i16, Kind::Int16, Int16);
primitive_record!(u16, Kind::UInt16, UInt16);
primitive_record!(i32, Kind::Int32, Int32);
primitive_record!(u32, Kind::UInt32, UInt32);
primitive_record!(i64, Kind::Int64, Int64);
primitive_record!(u64, Kind::UInt64, UInt64);
primitive_record!(f16, Kind::Half, Half);
primitive_record!(f32, Kind::Single, Single);
primitive_record!(f64, Kind::Double, Double);
primitive_record!(String, Kind::String, Str);

impl<T: FixedRecord, const N: usize> FixedRecord for [T; N] {
    fn schema(name: &str) -> SchemaNode {
        let mut node = T::schema(name);
        node.dims.insert(0, N as u32);
        node
    }

    fn leaves(&self, out: &mut Vec<Value>) {
        for item in self {
            item.leaves(out);
        }
    }

    fn from_leaves(leaves: &mut &[Value]) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::from_leaves(leaves)?);
        }
        items.try_into().map_err(|_| EdfError::InvalidInput {
            msg: "array length mismatch".to_string(),
        })
    }
}
