//! Property-based tests for the container format.
//!
//! Tests schema wire-form round-trips, record round-trips through full
//! files under both leaf codecs, and invariance of the decoded stream
//! under the writer's block size. Uses proptest for randomized testing.

use edf::codec::{Value, VarIntCodec};
use edf::io::{FormatReader, FormatWriter, RecordWriter, SchemaRecord};
use edf::schema::{Kind, SchemaNode};
use edf::Header;
use half::f16;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Generate arbitrary primitive leaf kinds.
fn arb_leaf_kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Int8),
        Just(Kind::UInt8),
        Just(Kind::Int16),
        Just(Kind::UInt16),
        Just(Kind::Int32),
        Just(Kind::UInt32),
        Just(Kind::Int64),
        Just(Kind::UInt64),
        Just(Kind::Half),
        Just(Kind::Single),
        Just(Kind::Double),
        Just(Kind::Char),
        Just(Kind::String),
    ]
}

/// Generate short field names.
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Generate schema trees: leaves and arrays at depth 0, nested structs
/// above, with small dims to keep leaf counts manageable.
fn arb_schema(depth: u32) -> BoxedStrategy<SchemaNode> {
    let leaf = (arb_name(), arb_leaf_kind(), prop::option::of(1u32..5u32)).prop_map(
        |(name, kind, dim)| match dim {
            Some(d) => SchemaNode::array(&name, kind, vec![d]),
            None => SchemaNode::leaf(&name, kind),
        },
    );
    if depth == 0 {
        leaf.boxed()
    } else {
        let record = (
            arb_name(),
            prop::collection::vec(arb_schema(depth - 1), 1..4),
            prop::option::of(1u32..4u32),
        )
            .prop_map(|(name, children, dim)| match dim {
                Some(d) => SchemaNode::record_array(&name, children, vec![d]),
                None => SchemaNode::record(&name, children),
            });
        prop_oneof![leaf, record].boxed()
    }
}

/// Generate one value of the given kind.
fn arb_value(kind: Kind) -> BoxedStrategy<Value> {
    match kind {
        Kind::Int8 => any::<i8>().prop_map(Value::Int8).boxed(),
        Kind::UInt8 => any::<u8>().prop_map(Value::UInt8).boxed(),
        Kind::Int16 => any::<i16>().prop_map(Value::Int16).boxed(),
        Kind::UInt16 => any::<u16>().prop_map(Value::UInt16).boxed(),
        Kind::Int32 => any::<i32>().prop_map(Value::Int32).boxed(),
        Kind::UInt32 => any::<u32>().prop_map(Value::UInt32).boxed(),
        Kind::Int64 => any::<i64>().prop_map(Value::Int64).boxed(),
        Kind::UInt64 => any::<u64>().prop_map(Value::UInt64).boxed(),
        Kind::Half => any::<u16>()
            .prop_map(|bits| Value::Half(f16::from_bits(bits)))
            .boxed(),
        Kind::Single => any::<u32>()
            .prop_map(|bits| Value::Single(f32::from_bits(bits)))
            .boxed(),
        Kind::Double => any::<u64>()
            .prop_map(|bits| Value::Double(f64::from_bits(bits)))
            .boxed(),
        Kind::Char => any::<u8>().prop_map(Value::Char).boxed(),
        Kind::String => "[ -~]{0,40}".prop_map(Value::Str).boxed(),
        Kind::Struct => unreachable!("struct is not a leaf kind"),
    }
}

/// Pre-order leaf kinds of a schema, one entry per leaf instance.
fn leaf_kinds(node: &SchemaNode, out: &mut Vec<Kind>) {
    for _ in 0..node.total_elements() {
        if node.kind == Kind::Struct {
            for child in &node.children {
                leaf_kinds(child, out);
            }
        } else {
            out.push(node.kind);
        }
    }
}

/// Generate a schema together with a batch of conforming records.
fn arb_schema_and_records() -> impl Strategy<Value = (SchemaNode, Vec<Vec<Value>>)> {
    arb_schema(2).prop_flat_map(|schema| {
        let mut kinds = Vec::new();
        leaf_kinds(&schema, &mut kinds);
        let record = kinds.into_iter().map(arb_value).collect::<Vec<_>>();
        let records = prop::collection::vec(record, 1..4);
        (Just(schema), records)
    })
}

fn write_file(
    schema: &SchemaNode,
    records: &[Vec<Value>],
    block_size: u16,
    varint: bool,
) -> Vec<u8> {
    let header = Header::with_block_size(block_size);
    let mut writer = if varint {
        FormatWriter::with_codec(Vec::new(), header, Box::new(VarIntCodec)).unwrap()
    } else {
        FormatWriter::with_header(Vec::new(), header).unwrap()
    };
    writer
        .declare_schema_record(&SchemaRecord::new(1, schema.clone()))
        .unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.finish().unwrap()
}

fn read_file(bytes: &[u8], varint: bool) -> Vec<Vec<Value>> {
    let mut reader = if varint {
        FormatReader::with_codec(bytes, Box::new(VarIntCodec)).unwrap()
    } else {
        FormatReader::new(bytes).unwrap()
    };
    reader.read_all().unwrap()
}

// Float leaves are compared by bit pattern, so NaN round-trips exactly.
fn bits(value: &Value) -> Value {
    match value {
        Value::Half(v) => Value::UInt16(v.to_bits()),
        Value::Single(v) => Value::UInt32(v.to_bits()),
        Value::Double(v) => Value::UInt64(v.to_bits()),
        other => other.clone(),
    }
}

fn bit_records(records: &[Vec<Value>]) -> Vec<Vec<Value>> {
    records
        .iter()
        .map(|r| r.iter().map(bits).collect())
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_schema_wire_roundtrip(schema in arb_schema(3)) {
        let bytes = schema.serialize();
        let (parsed, consumed) = SchemaNode::parse(&bytes).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(&parsed, &schema);
        prop_assert_eq!(parsed.total_leaves(), schema.total_leaves());
    }

    #[test]
    fn test_binary_file_roundtrip((schema, records) in arb_schema_and_records()) {
        let bytes = write_file(&schema, &records, 256, false);
        let back = read_file(&bytes, false);
        prop_assert_eq!(bit_records(&back), bit_records(&records));
    }

    #[test]
    fn test_varint_file_roundtrip((schema, records) in arb_schema_and_records()) {
        let bytes = write_file(&schema, &records, 256, true);
        let back = read_file(&bytes, true);
        prop_assert_eq!(bit_records(&back), bit_records(&records));
    }

    #[test]
    fn test_block_size_invariance(
        (schema, records) in arb_schema_and_records(),
        block_size in 64u16..512u16,
    ) {
        // The decoded stream must not depend on how the writer chunked it.
        let reference = read_file(&write_file(&schema, &records, 1024, false), false);
        let chunked = read_file(&write_file(&schema, &records, block_size, false), false);
        prop_assert_eq!(bit_records(&chunked), bit_records(&reference));
    }

    #[test]
    fn test_truncated_schema_never_panics(
        schema in arb_schema(2),
        cut in 0usize..64usize,
    ) {
        let bytes = schema.serialize();
        if cut < bytes.len() {
            // Any prefix either parses short or errors, never panics.
            let _ = SchemaNode::parse(&bytes[..cut]);
        }
    }

    #[test]
    fn test_varint_u64_roundtrip(value in any::<u64>()) {
        let mut buf = [0u8; edf::codec::varint::MAX_VARINT_BYTES];
        let n = edf::codec::varint::encode_u64(value, &mut buf).unwrap();
        let (back, consumed) = edf::codec::varint::decode_u64(&buf[..n]).unwrap().unwrap();
        prop_assert_eq!(back, value);
        prop_assert_eq!(consumed, n);
    }

    #[test]
    fn test_zigzag_roundtrip(value in any::<i64>()) {
        let encoded = edf::codec::varint::zigzag_encode(value);
        prop_assert_eq!(edf::codec::varint::zigzag_decode(encoded), value);
    }
}
