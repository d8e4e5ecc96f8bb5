//! Binary-to-text conversion.

use std::io::{Read, Write};

use crate::error::Result;
use crate::frame::BlockKind;
use crate::io::{FormatReader, RecordWriter, TextWriter};

/// Re-render a binary stream as its text mirror.
///
/// Reads frames from `source` and writes the equivalent header, schema,
/// and record lines to `sink`. Returns the number of records converted.
///
/// # Errors
///
/// Propagates any corruption the reader detects; a partially-converted
/// sink is left as-is.
pub fn convert_to_text<R: Read, W: Write>(source: R, sink: W) -> Result<usize> {
    let mut reader = FormatReader::new(source)?;
    let mut writer = TextWriter::new(sink, reader.header())?;

    let mut count = 0usize;
    loop {
        // Drain complete records buffered in the current data frame before
        // pulling the next one, so schema switches land between records.
        if reader.active_schema().is_some() {
            while let Some(record) = reader.read_buffered_value()? {
                writer.write_record(&record)?;
                count += 1;
            }
        }
        match reader.read_block()? {
            Some(BlockKind::SchemaDescriptor) => {
                let schema = reader
                    .active_schema()
                    .cloned()
                    .ok_or(crate::EdfError::NoActiveSchema)?;
                writer.declare_schema(&schema)?;
            }
            Some(_) => {}
            None => break,
        }
    }
    RecordWriter::flush(&mut writer)?;
    Ok(count)
}
