//! Human-readable text mirror of the binary container.
//!
//! [`TextWriter`] renders the same logical stream the binary writer
//! produces (header, schema declarations, records) as line-oriented
//! text for diagnostics and quick inspection. It is write-only and
//! non-resumable: records are rendered whole, so there is no block
//! buffering and no skip-counter state.

use std::io::Write;

use crate::codec::{TextCodec, Value};
use crate::error::{EdfError, Result};
use crate::frame::Header;
use crate::io::{RecordWriter, SchemaRecord};
use crate::schema::{Kind, SchemaNode};

/// Punctuation surrounding rendered structs, arrays, and records.
#[derive(Debug, Clone)]
pub struct Separators {
    /// Before a struct element's fields
    pub begin_struct: String,
    /// After a struct element's fields
    pub end_struct: String,
    /// Before an array's elements
    pub begin_array: String,
    /// After an array's elements
    pub end_array: String,
    /// After every leaf and every closed aggregate
    pub var_end: String,
    /// Before each record
    pub record_begin: String,
    /// After each record
    pub record_end: String,
}

impl Default for Separators {
    fn default() -> Self {
        Separators {
            begin_struct: "{".to_string(),
            end_struct: "}".to_string(),
            begin_array: "[".to_string(),
            end_array: "]".to_string(),
            var_end: ";".to_string(),
            record_begin: "\n= ".to_string(),
            record_end: String::new(),
        }
    }
}

/// Text renderer with the same record surface as [`crate::io::FormatWriter`].
pub struct TextWriter<W: Write> {
    sink: W,
    separators: Separators,
    schema: Option<SchemaRecord>,
}

impl<W: Write> TextWriter<W> {
    /// Create a text writer, emitting the header lines immediately.
    pub fn new(sink: W, header: &Header) -> Result<Self> {
        Self::with_separators(sink, header, Separators::default())
    }

    /// Create a text writer with custom punctuation.
    pub fn with_separators(mut sink: W, header: &Header, separators: Separators) -> Result<Self> {
        writeln!(
            sink,
            "~ version={}.{} bs={} encoding={} flags={}",
            header.vers_major,
            header.vers_minor,
            header.block_size,
            header.code_page,
            header.flags
        )?;
        Ok(TextWriter {
            sink,
            separators,
            schema: None,
        })
    }

    /// Finish writing and return the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn render_node<'v>(&mut self, node: &SchemaNode, leaves: &mut &'v [Value]) -> Result<()> {
        let elements = node.total_elements();
        let arrayed = elements != 1;
        if arrayed {
            write!(self.sink, "{}", self.separators.begin_array)?;
        }
        for _ in 0..elements {
            self.render_element(node, leaves)?;
        }
        if arrayed {
            write!(self.sink, "{}", self.separators.end_array)?;
            write!(self.sink, "{}", self.separators.var_end)?;
        }
        Ok(())
    }

    fn render_element<'v>(&mut self, node: &SchemaNode, leaves: &mut &'v [Value]) -> Result<()> {
        if node.kind == Kind::Struct {
            write!(self.sink, "{}", self.separators.begin_struct)?;
            for child in &node.children {
                self.render_node(child, leaves)?;
            }
            write!(self.sink, "{}", self.separators.end_struct)?;
            write!(self.sink, "{}", self.separators.var_end)?;
        } else {
            let (value, rest) = leaves.split_first().ok_or_else(|| EdfError::InvalidInput {
                msg: "fewer values supplied than schema leaves".to_string(),
            })?;
            *leaves = rest;
            write!(
                self.sink,
                "{}{}",
                TextCodec::render(value),
                self.separators.var_end
            )?;
        }
        Ok(())
    }
}

impl<W: Write> RecordWriter for TextWriter<W> {
    fn declare_schema(&mut self, schema: &SchemaRecord) -> Result<()> {
        if schema.node.total_leaves() == 0 {
            return Err(EdfError::InvalidInput {
                msg: "schema has no primitive leaves".to_string(),
            });
        }
        write!(self.sink, "\n? id={}", schema.id)?;
        if !schema.name.is_empty() {
            write!(self.sink, " name='{}'", schema.name)?;
        }
        if !schema.description.is_empty() {
            write!(self.sink, " # {}", schema.description)?;
        }
        writeln!(self.sink, "\n{}", schema.node)?;
        self.schema = Some(schema.clone());
        Ok(())
    }

    fn write_record(&mut self, leaves: &[Value]) -> Result<()> {
        let schema = self
            .schema
            .take()
            .ok_or(EdfError::NoActiveSchema)?;
        write!(self.sink, "{}", self.separators.record_begin)?;
        let mut remaining = leaves;
        let result = self.render_node(&schema.node, &mut remaining);
        self.schema = Some(schema);
        result?;
        if !remaining.is_empty() {
            return Err(EdfError::InvalidInput {
                msg: "more values supplied than schema leaves".to_string(),
            });
        }
        write!(self.sink, "{}", self.separators.record_end)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}
