//! File-level protocol: writers and readers composing header, schema
//! descriptor, and data frames into a stream.
//!
//! [`FormatWriter`] produces the binary container; [`TextWriter`] is its
//! human-readable diagnostic sibling; [`MultiWriter`] fans one record
//! stream out to several sinks at once; [`FormatReader`] reads the binary
//! container back; [`convert_to_text`] re-renders an existing binary file
//! as text.

pub mod convert;
pub mod reader;
pub mod text_writer;
pub mod writer;

pub use convert::convert_to_text;
pub use reader::FormatReader;
pub use text_writer::{Separators, TextWriter};
pub use writer::{FormatWriter, WriteOutcome};

use crate::codec::Value;
use crate::error::Result;
use crate::schema::SchemaNode;

/// A schema declaration: the node tree plus its caller-assigned id and
/// optional name/description, as carried by a SchemaDescriptor frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    /// Caller-assigned numeric id
    pub id: u32,
    /// The schema tree
    pub node: SchemaNode,
    /// Optional display name
    pub name: String,
    /// Optional free-form description
    pub description: String,
}

impl SchemaRecord {
    /// Create a schema record with empty name and description.
    pub fn new(id: u32, node: SchemaNode) -> Self {
        SchemaRecord {
            id,
            node,
            name: String::new(),
            description: String::new(),
        }
    }

    /// Attach a display name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Attach a description.
    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Common surface of record-producing writers, enabling fan-out via
/// [`MultiWriter`].
pub trait RecordWriter {
    /// Declare the schema governing subsequent records.
    fn declare_schema(&mut self, schema: &SchemaRecord) -> Result<()>;

    /// Write one complete record: its leaves in pre-order.
    fn write_record(&mut self, leaves: &[Value]) -> Result<()>;

    /// Flush buffered output to the sink.
    fn flush(&mut self) -> Result<()>;
}

/// Fan-out writer: forwards every declaration and record to each inner
/// writer in order.
#[derive(Default)]
pub struct MultiWriter {
    writers: Vec<Box<dyn RecordWriter>>,
}

impl MultiWriter {
    /// Create an empty fan-out writer.
    pub fn new() -> Self {
        MultiWriter::default()
    }

    /// Add a destination writer.
    pub fn push(&mut self, writer: Box<dyn RecordWriter>) {
        self.writers.push(writer);
    }
}

impl RecordWriter for MultiWriter {
    fn declare_schema(&mut self, schema: &SchemaRecord) -> Result<()> {
        for writer in &mut self.writers {
            writer.declare_schema(schema)?;
        }
        Ok(())
    }

    fn write_record(&mut self, leaves: &[Value]) -> Result<()> {
        for writer in &mut self.writers {
            writer.write_record(leaves)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
