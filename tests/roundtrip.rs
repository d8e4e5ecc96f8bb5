//! End-to-end integration tests: full files written and read back through
//! real file handles, corruption detection, schema switching, and the
//! alternate varint codec.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use edf::codec::{Value, VarIntCodec};
use edf::io::{convert_to_text, FormatReader, FormatWriter, RecordWriter, SchemaRecord};
use edf::schema::{Kind, SchemaNode};
use edf::{EdfError, Header};
use tempfile::NamedTempFile;

fn sensor_schema() -> SchemaRecord {
    SchemaRecord::new(
        1,
        SchemaNode::record(
            "sample",
            vec![
                SchemaNode::leaf("id", Kind::UInt32),
                SchemaNode::array("readings", Kind::Double, vec![3]),
                SchemaNode::leaf("tag", Kind::String),
            ],
        ),
    )
    .named("sensor sample")
    .described("one acquisition per record")
}

fn sensor_record(i: u32) -> Vec<Value> {
    vec![
        Value::UInt32(i),
        Value::Double(i as f64 * 0.5),
        Value::Double(-(i as f64)),
        Value::Double(1.0 / (i + 1) as f64),
        Value::Str(format!("sample-{}", i)),
    ]
}

#[test]
fn test_file_roundtrip_through_disk() {
    let temp_file = NamedTempFile::new().unwrap();

    let mut writer = FormatWriter::new(File::create(temp_file.path()).unwrap()).unwrap();
    writer.declare_schema_record(&sensor_schema()).unwrap();
    for i in 0..20 {
        writer.write_record(&sensor_record(i)).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = FormatReader::new(File::open(temp_file.path()).unwrap()).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), 20);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record, &sensor_record(i as u32));
    }
    let schema = reader.active_schema().unwrap();
    assert_eq!(schema.name, "sensor sample");
    assert_eq!(schema.description, "one acquisition per record");
}

#[test]
fn test_small_blocks_split_every_record() {
    // A 5-byte block cannot hold even two Double leaves, so every record
    // spans several frames and most frames end mid-record.
    let header = Header::with_block_size(9);
    let mut writer = FormatWriter::with_header(Vec::new(), header).unwrap();
    writer.declare_schema_record(&sensor_schema()).unwrap();
    for i in 0..5 {
        writer.write_record(&sensor_record(i)).unwrap();
    }
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record, &sensor_record(i as u32));
    }
}

#[test]
fn test_sequence_numbers_wrap() {
    // Force > 256 data frames so the u8 sequence wraps.
    let header = Header::with_block_size(4);
    let mut writer = FormatWriter::with_header(Vec::new(), header).unwrap();
    let schema = SchemaRecord::new(1, SchemaNode::leaf("x", Kind::Int32));
    writer.declare_schema_record(&schema).unwrap();
    for i in 0..300 {
        writer.write_record(&[Value::Int32(i)]).unwrap();
    }
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), 300);
    assert_eq!(records[299], vec![Value::Int32(299)]);
}

#[test]
fn test_corruption_detected_on_disk() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = FormatWriter::new(File::create(temp_file.path()).unwrap()).unwrap();
        writer.declare_schema_record(&sensor_schema()).unwrap();
        writer.write_record(&sensor_record(0)).unwrap();
        writer.finish().unwrap();
    }

    // Flip one bit near the end of the file, inside the last data frame.
    let mut file = File::options()
        .read(true)
        .write(true)
        .open(temp_file.path())
        .unwrap();
    let len = file.metadata().unwrap().len();
    file.seek(SeekFrom::Start(len - 5)).unwrap();
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte).unwrap();
    file.seek(SeekFrom::Start(len - 5)).unwrap();
    file.write_all(&[byte[0] ^ 0x10]).unwrap();

    let mut reader = FormatReader::new(File::open(temp_file.path()).unwrap()).unwrap();
    let err = reader.read_all().unwrap_err();
    assert!(matches!(err, EdfError::Malformed { .. }));
}

#[test]
fn test_multiple_schemas_in_one_file() {
    let mut writer = FormatWriter::new(Vec::new()).unwrap();
    writer.declare_schema_record(&sensor_schema()).unwrap();
    writer.write_record(&sensor_record(1)).unwrap();

    let counters = SchemaRecord::new(2, SchemaNode::leaf("count", Kind::UInt64)).named("counter");
    writer.declare_schema_record(&counters).unwrap();
    writer.write_record(&[Value::UInt64(u64::MAX)]).unwrap();
    writer.write_record(&[Value::UInt64(0)]).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    assert_eq!(reader.read_value().unwrap(), Some(sensor_record(1)));
    assert_eq!(
        reader.read_value().unwrap(),
        Some(vec![Value::UInt64(u64::MAX)])
    );
    assert_eq!(reader.active_schema().unwrap().id, 2);
    assert_eq!(reader.read_value().unwrap(), Some(vec![Value::UInt64(0)]));
    assert_eq!(reader.read_value().unwrap(), None);
}

#[test]
fn test_varint_codec_file_is_smaller_for_small_ints() {
    let schema = SchemaRecord::new(1, SchemaNode::array("xs", Kind::Int64, vec![64]));
    let record: Vec<Value> = (0..64).map(|i| Value::Int64(i)).collect();

    let mut plain = FormatWriter::new(Vec::new()).unwrap();
    plain.declare_schema_record(&schema).unwrap();
    plain.write_record(&record).unwrap();
    let plain_bytes = plain.finish().unwrap();

    let mut packed =
        FormatWriter::with_codec(Vec::new(), Header::default(), Box::new(VarIntCodec)).unwrap();
    packed.declare_schema_record(&schema).unwrap();
    packed.write_record(&record).unwrap();
    let packed_bytes = packed.finish().unwrap();

    assert!(packed_bytes.len() < plain_bytes.len());

    let mut reader = FormatReader::with_codec(&packed_bytes[..], Box::new(VarIntCodec)).unwrap();
    assert_eq!(reader.read_all().unwrap(), vec![record]);
}

#[test]
fn test_explicit_flush_preserves_record_stream() {
    let mut writer = FormatWriter::new(Vec::new()).unwrap();
    writer.declare_schema_record(&sensor_schema()).unwrap();
    writer.write_record(&sensor_record(0)).unwrap();
    // Flush mid-stream: the next record starts in a fresh frame.
    RecordWriter::flush(&mut writer).unwrap();
    writer.write_record(&sensor_record(1)).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    assert_eq!(
        reader.read_all().unwrap(),
        vec![sensor_record(0), sensor_record(1)]
    );
}

#[test]
fn test_crc_free_file_roundtrip() {
    let header = Header::default().without_crc();
    let mut writer = FormatWriter::with_header(Vec::new(), header).unwrap();
    writer.declare_schema_record(&sensor_schema()).unwrap();
    writer.write_record(&sensor_record(3)).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    assert!(!reader.header().use_crc());
    assert_eq!(reader.read_all().unwrap(), vec![sensor_record(3)]);
}

#[test]
fn test_convert_binary_file_to_text() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = FormatWriter::new(File::create(temp_file.path()).unwrap()).unwrap();
        writer.declare_schema_record(&sensor_schema()).unwrap();
        writer.write_record(&sensor_record(2)).unwrap();
        writer.finish().unwrap();
    }

    let mut text = Vec::new();
    let count = convert_to_text(File::open(temp_file.path()).unwrap(), &mut text).unwrap();
    assert_eq!(count, 1);
    let text = String::from_utf8(text).unwrap();
    assert!(text.starts_with("~ version=1.0"));
    assert!(text.contains("? id=1 name='sensor sample'"));
    assert!(text.contains("'sample-2';"));
}

#[test]
fn test_empty_file_has_no_records() {
    let writer = FormatWriter::new(Vec::new()).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    assert_eq!(reader.read_value().unwrap(), None);
    assert!(reader.active_schema().is_none());
}

#[test]
fn test_string_at_max_length_roundtrips() {
    let schema = SchemaRecord::new(1, SchemaNode::leaf("s", Kind::String));
    let long = "x".repeat(edf::codec::MAX_STRING_LEN);

    let mut writer = FormatWriter::new(Vec::new()).unwrap();
    writer.declare_schema_record(&schema).unwrap();
    writer.write_record(&[Value::Str(long.clone())]).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = FormatReader::new(&bytes[..]).unwrap();
    assert_eq!(reader.read_all().unwrap(), vec![vec![Value::Str(long)]]);
}
