//! Binary format reader.
//!
//! [`FormatReader`] bootstraps from the mandatory header frame, then walks
//! the remaining frames. Schema descriptor frames activate their schema
//! automatically; data frame payloads are fed to the streaming decoder,
//! which reassembles records that the writer split across blocks.

use std::io::Read;

use crate::codec::{read_bstring, BinaryCodec, PrimitiveCodec, Value};
use crate::error::{EdfError, Result};
use crate::frame::{read_frame, read_header_frame, BlockKind, Frame, Header, ReadFrame};
use crate::io::SchemaRecord;
use crate::stream::{DecodeOutcome, StreamingDecoder};

/// Streaming reader for the EDF binary container.
///
/// # Examples
///
/// ```
/// use edf::codec::Value;
/// use edf::io::{FormatReader, FormatWriter, RecordWriter, SchemaRecord};
/// use edf::schema::{Kind, SchemaNode};
///
/// # fn main() -> edf::Result<()> {
/// let mut writer = FormatWriter::new(Vec::new())?;
/// writer.declare_schema_record(&SchemaRecord::new(1, SchemaNode::leaf("x", Kind::Int32)))?;
/// writer.write_record(&[Value::Int32(42)])?;
/// let bytes = writer.finish()?;
///
/// let mut reader = FormatReader::new(&bytes[..])?;
/// assert_eq!(reader.read_value()?, Some(vec![Value::Int32(42)]));
/// assert_eq!(reader.read_value()?, None);
/// # Ok(())
/// # }
/// ```
pub struct FormatReader<R: Read> {
    source: R,
    header: Header,
    schema: Option<SchemaRecord>,
    decoder: StreamingDecoder,
    codec: Box<dyn PrimitiveCodec>,
    /// Payload of the current data frame
    frame: Vec<u8>,
    /// Read position within `frame`
    frame_pos: usize,
    /// Set once EOF has been observed
    done: bool,
}

impl<R: Read> std::fmt::Debug for FormatReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatReader")
            .field("header", &self.header)
            .field("schema", &self.schema)
            .field("frame_pos", &self.frame_pos)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<R: Read> FormatReader<R> {
    /// Open a stream with the binary codec, reading and validating the
    /// mandatory header frame.
    ///
    /// # Errors
    ///
    /// [`EdfError::Malformed`] when the stream is empty or does not begin
    /// with a header frame.
    pub fn new(source: R) -> Result<Self> {
        Self::with_codec(source, Box::new(BinaryCodec))
    }

    /// Open a stream with an explicit leaf codec, which must match the
    /// codec the file was written with.
    pub fn with_codec(mut source: R, codec: Box<dyn PrimitiveCodec>) -> Result<Self> {
        let (_, header) = read_header_frame(&mut source)?.ok_or_else(|| EdfError::Malformed {
            msg: "stream is empty, expected a header frame".to_string(),
        })?;
        Ok(FormatReader {
            source,
            header,
            schema: None,
            decoder: StreamingDecoder::new(),
            codec,
            frame: Vec::new(),
            frame_pos: 0,
            done: false,
        })
    }

    /// The header frame the stream opened with.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The currently active schema, if a descriptor frame has been seen.
    pub fn active_schema(&self) -> Option<&SchemaRecord> {
        self.schema.as_ref()
    }

    /// Unread payload of the current data frame.
    pub fn block_payload(&self) -> &[u8] {
        &self.frame[self.frame_pos..]
    }

    /// Advance to the next frame, returning its kind, or `None` at a clean
    /// end of stream.
    ///
    /// Schema descriptor frames are activated as a side effect: the
    /// descriptor is parsed, the active schema replaced, and any in-flight
    /// decoder state discarded. Data frame payloads become readable via
    /// [`FormatReader::block_payload`] and [`FormatReader::read_buffered_value`].
    ///
    /// # Errors
    ///
    /// [`EdfError::Malformed`] for a second header frame, corruption, or a
    /// CRC mismatch.
    pub fn read_block(&mut self) -> Result<Option<BlockKind>> {
        if self.done {
            return Ok(None);
        }
        let frame = match read_frame(&mut self.source, self.header.use_crc())? {
            ReadFrame::Frame(frame) => frame,
            ReadFrame::End => {
                self.done = true;
                return Ok(None);
            }
        };
        match frame.kind {
            BlockKind::Header => Err(EdfError::Malformed {
                msg: "unexpected second header frame".to_string(),
            }),
            BlockKind::SchemaDescriptor => {
                self.activate_schema(&frame)?;
                Ok(Some(BlockKind::SchemaDescriptor))
            }
            BlockKind::Data => {
                self.frame = frame.payload;
                self.frame_pos = 0;
                Ok(Some(BlockKind::Data))
            }
        }
    }

    /// Decode the next record from the current data frame only, without
    /// reading further frames.
    ///
    /// Returns `None` when the frame's remaining bytes do not complete a
    /// record; the partial state is retained and resumed when the next
    /// data frame arrives.
    pub fn read_buffered_value(&mut self) -> Result<Option<Vec<Value>>> {
        let schema = self.schema.as_ref().ok_or(EdfError::NoActiveSchema)?;
        if schema.node.total_leaves() == 0 {
            return Err(EdfError::InvalidInput {
                msg: "schema has no primitive leaves".to_string(),
            });
        }
        if self.frame_pos >= self.frame.len() && !self.decoder.in_flight() {
            return Ok(None);
        }
        let (consumed, outcome) = self.decoder.decode(
            &schema.node,
            self.codec.as_ref(),
            &self.frame[self.frame_pos..],
        )?;
        self.frame_pos += consumed;
        match outcome {
            DecodeOutcome::Complete(record) => Ok(Some(record)),
            DecodeOutcome::NeedMoreData => Ok(None),
        }
    }

    /// Read the next record, pulling frames as needed.
    ///
    /// Returns `None` at a clean end of stream. Schema descriptor frames
    /// encountered between records take effect transparently.
    ///
    /// # Errors
    ///
    /// [`EdfError::NoActiveSchema`] for a data frame before any descriptor;
    /// [`EdfError::Malformed`] when the stream ends or switches schema
    /// mid-record.
    pub fn read_value(&mut self) -> Result<Option<Vec<Value>>> {
        loop {
            if self.schema.is_some() {
                if let Some(record) = self.read_buffered_value()? {
                    return Ok(Some(record));
                }
            }
            let mid_record = self.decoder.in_flight();
            match self.read_block()? {
                Some(BlockKind::Data) => {
                    if self.schema.is_none() {
                        return Err(EdfError::NoActiveSchema);
                    }
                }
                Some(BlockKind::SchemaDescriptor) => {
                    if mid_record {
                        return Err(EdfError::Malformed {
                            msg: "schema descriptor interrupts a record".to_string(),
                        });
                    }
                }
                Some(BlockKind::Header) => unreachable!("read_block rejects header frames"),
                None => {
                    if mid_record {
                        return Err(EdfError::Malformed {
                            msg: "stream ended mid-record".to_string(),
                        });
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Read all remaining records.
    pub fn read_all(&mut self) -> Result<Vec<Vec<Value>>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_value()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Parse a descriptor payload and make its schema current.
    fn activate_schema(&mut self, frame: &Frame) -> Result<()> {
        let payload = &frame.payload;
        if payload.len() < 4 {
            return Err(EdfError::Malformed {
                msg: "schema descriptor shorter than its id field".to_string(),
            });
        }
        let id = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        // The frame is complete, so a node that ends early is corruption,
        // not a retryable short read.
        let (node, node_len) =
            crate::schema::SchemaNode::parse(&payload[4..]).map_err(|e| match e {
                EdfError::SchemaTruncated => EdfError::Malformed {
                    msg: "schema descriptor ends mid-node".to_string(),
                },
                other => other,
            })?;
        let mut pos = 4 + node_len;

        // Name and description are absent in minimal descriptors; a
        // length prefix whose bytes are missing is corruption, since the
        // frame itself is complete.
        let name = match read_bstring(&payload[pos..])? {
            Some((s, n)) => {
                pos += n;
                s
            }
            None if pos == payload.len() => String::new(),
            None => return Err(truncated_string()),
        };
        let description = match read_bstring(&payload[pos..])? {
            Some((s, _)) => s,
            None if pos == payload.len() => String::new(),
            None => return Err(truncated_string()),
        };

        self.schema = Some(SchemaRecord {
            id,
            node,
            name,
            description,
        });
        self.decoder.reset();
        Ok(())
    }
}

fn truncated_string() -> EdfError {
    EdfError::Malformed {
        msg: "schema descriptor string truncated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::write_frame;
    use crate::io::{FormatWriter, RecordWriter};
    use crate::schema::{Kind, SchemaNode};

    fn point_schema() -> SchemaRecord {
        SchemaRecord::new(
            7,
            SchemaNode::record(
                "point",
                vec![
                    SchemaNode::leaf("x", Kind::Int32),
                    SchemaNode::leaf("y", Kind::Int32),
                ],
            ),
        )
        .named("point")
        .described("2d point")
    }

    fn written(records: &[Vec<Value>], block_size: u16) -> Vec<u8> {
        let header = Header::with_block_size(block_size);
        let mut writer = FormatWriter::with_header(Vec::new(), header).unwrap();
        writer.declare_schema_record(&point_schema()).unwrap();
        for record in records {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn test_roundtrip_single_record() {
        let records = vec![vec![Value::Int32(3), Value::Int32(-4)]];
        let bytes = written(&records, 256);

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.read_all().unwrap(), records);
        let schema = reader.active_schema().unwrap();
        assert_eq!(schema.id, 7);
        assert_eq!(schema.name, "point");
        assert_eq!(schema.description, "2d point");
    }

    #[test]
    fn test_records_split_across_blocks() {
        // 6-byte blocks hold one Int32 leaf each, so every record
        // straddles a block boundary.
        let records: Vec<Vec<Value>> = (0..5)
            .map(|i| vec![Value::Int32(i), Value::Int32(-i)])
            .collect();
        let bytes = written(&records, 6);

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.read_all().unwrap(), records);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Data, 0, &[1, 2, 3, 4], true).unwrap();
        let err = FormatReader::new(&buf[..]).unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_empty_stream_is_malformed() {
        let err = FormatReader::new(&[][..]).unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_data_before_schema_fails() {
        let header = Header::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Header, 0, &header.to_bytes(), true).unwrap();
        write_frame(&mut buf, BlockKind::Data, 1, &[0x2A, 0, 0, 0], true).unwrap();

        let mut reader = FormatReader::new(&buf[..]).unwrap();
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, EdfError::NoActiveSchema));
    }

    #[test]
    fn test_second_header_is_malformed() {
        let header = Header::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Header, 0, &header.to_bytes(), true).unwrap();
        write_frame(&mut buf, BlockKind::Header, 1, &header.to_bytes(), true).unwrap();

        let mut reader = FormatReader::new(&buf[..]).unwrap();
        let err = reader.read_block().unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_truncation_mid_record_is_malformed() {
        let records = vec![vec![Value::Int32(1), Value::Int32(2)]];
        let mut bytes = written(&records, 6);
        // Drop the final data frame entirely so the stream ends cleanly
        // with the record still dangling.
        let keep = bytes.len() - (4 + 4 + 2);
        bytes.truncate(keep);

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_schema_redeclaration_switches_records() {
        let mut writer = FormatWriter::new(Vec::new()).unwrap();
        writer.declare_schema_record(&point_schema()).unwrap();
        writer
            .write_record(&[Value::Int32(1), Value::Int32(2)])
            .unwrap();
        let names = SchemaRecord::new(8, SchemaNode::leaf("name", Kind::String));
        writer.declare_schema_record(&names).unwrap();
        writer
            .write_record(&[Value::Str("hello".to_string())])
            .unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        assert_eq!(
            reader.read_value().unwrap(),
            Some(vec![Value::Int32(1), Value::Int32(2)])
        );
        assert_eq!(
            reader.read_value().unwrap(),
            Some(vec![Value::Str("hello".to_string())])
        );
        assert_eq!(reader.active_schema().unwrap().id, 8);
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn test_overflowing_descriptor_is_malformed() {
        // Dims whose product exceeds u64 must surface as corruption, not
        // wrap into a bogus leaf count.
        let header = Header::default();
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(
            &SchemaNode::array("x", Kind::Int32, vec![u32::MAX; 3]).serialize(),
        );

        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Header, 0, &header.to_bytes(), true).unwrap();
        write_frame(&mut buf, BlockKind::SchemaDescriptor, 1, &payload, true).unwrap();
        write_frame(&mut buf, BlockKind::Data, 2, &[0x2A, 0, 0, 0], true).unwrap();

        let mut reader = FormatReader::new(&buf[..]).unwrap();
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_descriptor_with_truncated_name_is_malformed() {
        let header = Header::default();
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&SchemaNode::leaf("x", Kind::Int32).serialize());
        // Name length prefix announces 5 bytes but only 2 follow.
        payload.extend_from_slice(&[5, b'a', b'b']);

        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Header, 0, &header.to_bytes(), true).unwrap();
        write_frame(&mut buf, BlockKind::SchemaDescriptor, 1, &payload, true).unwrap();

        let mut reader = FormatReader::new(&buf[..]).unwrap();
        let err = reader.read_block().unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_minimal_descriptor_without_names_is_accepted() {
        let header = Header::default();
        let mut payload = Vec::new();
        payload.extend_from_slice(&9u32.to_le_bytes());
        payload.extend_from_slice(&SchemaNode::leaf("x", Kind::Int32).serialize());

        let mut buf = Vec::new();
        write_frame(&mut buf, BlockKind::Header, 0, &header.to_bytes(), true).unwrap();
        write_frame(&mut buf, BlockKind::SchemaDescriptor, 1, &payload, true).unwrap();
        write_frame(&mut buf, BlockKind::Data, 2, &[0x2A, 0, 0, 0], true).unwrap();

        let mut reader = FormatReader::new(&buf[..]).unwrap();
        assert_eq!(reader.read_value().unwrap(), Some(vec![Value::Int32(42)]));
        let schema = reader.active_schema().unwrap();
        assert_eq!(schema.id, 9);
        assert!(schema.name.is_empty());
        assert!(schema.description.is_empty());
    }

    #[test]
    fn test_corrupt_data_frame_fails_crc() {
        let records = vec![vec![Value::Int32(1), Value::Int32(2)]];
        let mut bytes = written(&records, 256);
        let last = bytes.len() - 3; // inside the final data payload
        bytes[last] ^= 0x01;

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, EdfError::Malformed { .. }));
    }

    #[test]
    fn test_crc_disabled_roundtrip() {
        let header = Header::default().without_crc();
        let mut writer = FormatWriter::with_header(Vec::new(), header).unwrap();
        writer.declare_schema_record(&point_schema()).unwrap();
        writer
            .write_record(&[Value::Int32(9), Value::Int32(10)])
            .unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = FormatReader::new(&bytes[..]).unwrap();
        assert!(!reader.header().use_crc());
        assert_eq!(
            reader.read_value().unwrap(),
            Some(vec![Value::Int32(9), Value::Int32(10)])
        );
    }
}
