//! Binary format writer.
//!
//! [`FormatWriter`] owns one block buffer of the header-declared size and
//! drives the streaming encoder against it. Full blocks are framed and
//! flushed to the sink automatically; partial blocks are flushed on
//! [`FormatWriter::flush`] or [`FormatWriter::finish`]. The header frame
//! is emitted once, by the constructor, which is what enforces the
//! "at most one header per file" invariant.

use std::io::Write;

use crate::codec::{write_bstring, BinaryCodec, EncodeStep, PrimitiveCodec, Value};
use crate::error::{EdfError, Result};
use crate::frame::{write_frame, BlockKind, Header};
use crate::io::{RecordWriter, SchemaRecord};
use crate::stream::{EncodeOutcome, LeafSource, StreamingEncoder};

/// Result of one [`FormatWriter::write_value`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record is complete
    Complete,
    /// The source ran out mid-record; supply more values and call again
    NeedMoreSource,
}

/// Streaming writer for the EDF binary container.
///
/// # Examples
///
/// ```
/// use edf::codec::Value;
/// use edf::io::{FormatWriter, RecordWriter, SchemaRecord};
/// use edf::schema::{Kind, SchemaNode};
///
/// # fn main() -> edf::Result<()> {
/// let mut writer = FormatWriter::new(Vec::new())?;
/// let schema = SchemaRecord::new(1, SchemaNode::leaf("x", Kind::Int32));
/// writer.declare_schema_record(&schema)?;
/// writer.write_record(&[Value::Int32(42)])?;
/// let bytes = writer.finish()?;
/// assert!(!bytes.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct FormatWriter<W: Write> {
    sink: W,
    header: Header,
    /// Block buffer of exactly `header.block_size` bytes
    block: Vec<u8>,
    /// Bytes of `block` currently occupied
    fill: usize,
    /// Next frame sequence number, wrapping modulo 256
    seq: u8,
    schema: Option<SchemaRecord>,
    encoder: StreamingEncoder,
    codec: Box<dyn PrimitiveCodec>,
}

impl<W: Write> FormatWriter<W> {
    /// Create a writer with the default header (block size 256, CRC on)
    /// and the binary codec. The header frame is written immediately.
    pub fn new(sink: W) -> Result<Self> {
        Self::with_codec(sink, Header::default(), Box::new(BinaryCodec))
    }

    /// Create a writer with an explicit header.
    pub fn with_header(sink: W, header: Header) -> Result<Self> {
        Self::with_codec(sink, header, Box::new(BinaryCodec))
    }

    /// Create a writer with an explicit header and leaf codec.
    pub fn with_codec(sink: W, header: Header, codec: Box<dyn PrimitiveCodec>) -> Result<Self> {
        if header.block_size == 0 {
            return Err(EdfError::InvalidInput {
                msg: "block size must be non-zero".to_string(),
            });
        }
        let mut writer = FormatWriter {
            sink,
            block: vec![0u8; header.block_size as usize],
            fill: 0,
            seq: 0,
            schema: None,
            encoder: StreamingEncoder::new(),
            codec,
            header,
        };
        let payload = writer.header.to_bytes();
        writer.emit_frame(BlockKind::Header, &payload)?;
        Ok(writer)
    }

    /// The header this writer was created with.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The currently active schema, if any.
    pub fn active_schema(&self) -> Option<&SchemaRecord> {
        self.schema.as_ref()
    }

    /// Declare the schema governing subsequent records.
    ///
    /// Flushes any pending data frame for the previous schema, resets the
    /// encoder state, and emits a SchemaDescriptor frame carrying the
    /// caller-assigned id, the serialized node tree, and the name and
    /// description strings.
    pub fn declare_schema_record(&mut self, schema: &SchemaRecord) -> Result<()> {
        // Mirror the parse-side rules so the writer never produces a
        // descriptor its own reader rejects.
        if schema.node.has_zero_dim() {
            return Err(EdfError::InvalidInput {
                msg: "schema array dimension is zero".to_string(),
            });
        }
        let leaves = schema
            .node
            .total_leaves_checked()
            .ok_or_else(|| EdfError::InvalidInput {
                msg: "schema leaf count overflows".to_string(),
            })?;
        if leaves == 0 {
            return Err(EdfError::InvalidInput {
                msg: "schema has no primitive leaves".to_string(),
            });
        }
        self.flush()?;
        self.encoder.reset();

        let mut payload = Vec::with_capacity(64);
        payload.extend_from_slice(&schema.id.to_le_bytes());
        payload.extend_from_slice(&schema.node.serialize());
        push_bstring(&mut payload, &schema.name);
        push_bstring(&mut payload, &schema.description);

        // Descriptor frames are framed directly and are not constrained by
        // the data block size, only by the u16 frame length field.
        if payload.len() > u16::MAX as usize {
            return Err(EdfError::InvalidInput {
                msg: "schema descriptor exceeds the maximum frame length".to_string(),
            });
        }
        self.emit_frame(BlockKind::SchemaDescriptor, &payload)?;
        self.schema = Some(schema.clone());
        Ok(())
    }

    /// Drive the streaming encoder against the active schema, pulling
    /// leaves from `source` and auto-flushing full data frames.
    ///
    /// Returns [`WriteOutcome::NeedMoreSource`] when `source` runs dry
    /// mid-record; call again with more values to finish the record.
    pub fn write_value(&mut self, source: &mut dyn LeafSource) -> Result<WriteOutcome> {
        loop {
            let (n, outcome) = {
                let schema = self.schema.as_ref().ok_or(EdfError::NoActiveSchema)?;
                self.encoder.encode(
                    &schema.node,
                    self.codec.as_ref(),
                    source,
                    &mut self.block[self.fill..],
                )?
            };
            self.fill += n;
            match outcome {
                EncodeOutcome::Complete => return Ok(WriteOutcome::Complete),
                EncodeOutcome::NeedMoreSource => return Ok(WriteOutcome::NeedMoreSource),
                EncodeOutcome::DestinationFull => {
                    if self.fill == 0 {
                        // Even an empty block cannot hold this leaf.
                        return Err(EdfError::InvalidInput {
                            msg: "leaf encoding larger than the block size".to_string(),
                        });
                    }
                    self.flush()?;
                }
            }
        }
    }

    /// Emit whatever is in the current block as one data frame. A no-op
    /// when the block is empty: zero-length frames are never written.
    pub fn flush(&mut self) -> Result<()> {
        if self.fill == 0 {
            return Ok(());
        }
        write_frame(
            &mut self.sink,
            BlockKind::Data,
            self.seq,
            &self.block[..self.fill],
            self.header.use_crc(),
        )?;
        self.seq = self.seq.wrapping_add(1);
        self.fill = 0;
        Ok(())
    }

    /// Flush pending data and return the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn emit_frame(&mut self, kind: BlockKind, payload: &[u8]) -> Result<()> {
        write_frame(&mut self.sink, kind, self.seq, payload, self.header.use_crc())?;
        self.seq = self.seq.wrapping_add(1);
        Ok(())
    }
}

impl<W: Write> RecordWriter for FormatWriter<W> {
    fn declare_schema(&mut self, schema: &SchemaRecord) -> Result<()> {
        self.declare_schema_record(schema)
    }

    fn write_record(&mut self, leaves: &[Value]) -> Result<()> {
        let mut source = leaves.iter().cloned();
        match self.write_value(&mut source)? {
            WriteOutcome::Complete => {
                if source.next().is_some() {
                    return Err(EdfError::InvalidInput {
                        msg: "more values supplied than schema leaves".to_string(),
                    });
                }
                Ok(())
            }
            WriteOutcome::NeedMoreSource => Err(EdfError::InvalidInput {
                msg: "fewer values supplied than schema leaves".to_string(),
            }),
        }
    }

    fn flush(&mut self) -> Result<()> {
        FormatWriter::flush(self)
    }
}

/// Append a length-prefixed string to a descriptor payload.
fn push_bstring(payload: &mut Vec<u8>, s: &str) {
    let mut buf = [0u8; 256];
    match write_bstring(s, &mut buf) {
        EncodeStep::Written(n) => payload.extend_from_slice(&buf[..n]),
        // 256 bytes always hold a capped string
        EncodeStep::NeedDst(_) => unreachable!(),
    }
}
