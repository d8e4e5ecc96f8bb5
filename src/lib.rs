//! EDF: a self-describing streaming container format.
//!
//! An EDF stream is a sequence of framed blocks: one header frame fixing
//! the format version, block size, and CRC policy; schema descriptor
//! frames carrying recursive type trees; and fixed-size data frames
//! holding the records themselves. Because every stream carries its own
//! schema, a reader needs no out-of-band knowledge to decode it.
//!
//! # Architecture
//!
//! * [`schema`]: recursive schema trees and their wire form
//! * [`frame`]: block framing, the file header, and CRC-16 validation
//! * [`codec`]: pluggable primitive leaf codecs (binary, varint, text)
//! * [`stream`]: resumable schema-driven record encoding and decoding
//! * [`io`]: file-level writers and readers composing the layers
//! * [`record`]: typed record binding for Rust structs
//!
//! # Examples
//!
//! ```
//! use edf::codec::Value;
//! use edf::io::{FormatReader, FormatWriter, RecordWriter, SchemaRecord};
//! use edf::schema::{Kind, SchemaNode};
//!
//! # fn main() -> edf::Result<()> {
//! let schema = SchemaRecord::new(
//!     1,
//!     SchemaNode::record(
//!         "sample",
//!         vec![
//!             SchemaNode::leaf("id", Kind::UInt32),
//!             SchemaNode::leaf("reading", Kind::Double),
//!         ],
//!     ),
//! );
//!
//! let mut writer = FormatWriter::new(Vec::new())?;
//! writer.declare_schema_record(&schema)?;
//! writer.write_record(&[Value::UInt32(1), Value::Double(0.5)])?;
//! let bytes = writer.finish()?;
//!
//! let mut reader = FormatReader::new(&bytes[..])?;
//! assert_eq!(
//!     reader.read_value()?,
//!     Some(vec![Value::UInt32(1), Value::Double(0.5)])
//! );
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod frame;
pub mod io;
pub mod record;
pub mod schema;
pub mod stream;

pub use error::{EdfError, Result};
pub use frame::Header;
pub use io::{FormatReader, FormatWriter, SchemaRecord};
pub use schema::{Kind, SchemaNode};
