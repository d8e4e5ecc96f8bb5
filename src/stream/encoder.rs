//! Resumable schema-driven encoder.
//!
//! One [`StreamingEncoder`] instance serializes one logical record at a
//! time into caller-supplied destination buffers. A record's encoded size
//! may exceed any single buffer: when the destination fills, the encoder
//! suspends *before* the leaf that did not fit, the caller flushes the
//! buffer as one frame, and the next call resumes exactly at that leaf.
//! Suspension bookkeeping lives in two fields: the skip counter (leaves of
//! the in-flight record already committed) and a pending leaf value pulled
//! from the source but not yet placed.

use crate::codec::{EncodeStep, PrimitiveCodec, Value};
use crate::error::Result;
use crate::schema::{Kind, SchemaNode};

/// A pre-order stream of primitive leaf values conforming to a schema:
/// struct fields in declaration order, array elements repeated
/// `total_elements()` times per array node, depth-first.
///
/// Implemented for free by any `Iterator<Item = Value>`, including
/// generated per-type decomposition shims.
pub trait LeafSource {
    /// Pull the next leaf value, or `None` if the source is (currently)
    /// exhausted.
    fn next_leaf(&mut self) -> Option<Value>;
}

impl<I: Iterator<Item = Value>> LeafSource for I {
    fn next_leaf(&mut self) -> Option<Value> {
        self.next()
    }
}

/// Result of one encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The entire record was written; the encoder is ready for the next
    /// record
    Complete,
    /// The destination filled mid-record. Flush the written bytes as one
    /// frame and call again with a fresh buffer; already-written leaves
    /// are skipped.
    DestinationFull,
    /// The source ran out of values mid-record. Supply more upstream
    /// values and call again with the same buffer position.
    NeedMoreSource,
}

/// Schema-driven resumable record encoder.
///
/// # Examples
///
/// ```
/// use edf::codec::{BinaryCodec, Value};
/// use edf::schema::{Kind, SchemaNode};
/// use edf::stream::{EncodeOutcome, StreamingEncoder};
///
/// # fn main() -> edf::Result<()> {
/// let schema = SchemaNode::array("xs", Kind::Int32, vec![3]);
/// let mut source = [Value::Int32(1), Value::Int32(2), Value::Int32(3)]
///     .into_iter();
/// let mut encoder = StreamingEncoder::new();
/// let mut buf = [0u8; 12];
/// let (n, outcome) = encoder.encode(&schema, &BinaryCodec, &mut source, &mut buf)?;
/// assert_eq!(outcome, EncodeOutcome::Complete);
/// assert_eq!(n, 12);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct StreamingEncoder {
    /// Leaves of the in-flight record already committed to earlier buffers
    skip: u64,
    /// Value pulled from the source but not yet placed
    pending: Option<Value>,
}

impl StreamingEncoder {
    /// Create an encoder with no in-flight record.
    pub fn new() -> Self {
        StreamingEncoder::default()
    }

    /// Discard all in-flight record state. Called when a new schema is
    /// declared.
    pub fn reset(&mut self) {
        self.skip = 0;
        self.pending = None;
    }

    /// Whether a record is currently suspended mid-encode.
    pub fn in_flight(&self) -> bool {
        self.skip != 0 || self.pending.is_some()
    }

    /// Drive the record walk, writing into the front of `dst`.
    ///
    /// Returns the number of bytes written together with the outcome.
    /// Flow-control outcomes leave the encoder resumable; a fatal error
    /// ([`crate::EdfError::WrongType`]) leaves it unusable until
    /// [`StreamingEncoder::reset`].
    pub fn encode(
        &mut self,
        schema: &SchemaNode,
        codec: &dyn PrimitiveCodec,
        source: &mut dyn LeafSource,
        dst: &mut [u8],
    ) -> Result<(usize, EncodeOutcome)> {
        let mut pass = Pass {
            codec,
            source,
            pending: &mut self.pending,
            dst,
            pos: 0,
            to_skip: self.skip,
            written: 0,
        };
        let walk = pass.node(schema)?;
        let (pos, written) = (pass.pos, pass.written);
        match walk {
            Walk::Continue => {
                self.skip = 0;
                Ok((pos, EncodeOutcome::Complete))
            }
            Walk::Full => {
                self.skip += written;
                Ok((pos, EncodeOutcome::DestinationFull))
            }
            Walk::Starved => {
                self.skip += written;
                Ok((pos, EncodeOutcome::NeedMoreSource))
            }
        }
    }
}

enum Walk {
    Continue,
    Full,
    Starved,
}

/// One traversal attempt. The cursor fields (`pos`, `to_skip`, `written`)
/// replace the scattered by-reference counters of older designs: they are
/// threaded through the recursive walk by ownership of this struct.
struct Pass<'a> {
    codec: &'a dyn PrimitiveCodec,
    source: &'a mut dyn LeafSource,
    pending: &'a mut Option<Value>,
    dst: &'a mut [u8],
    pos: usize,
    to_skip: u64,
    written: u64,
}

impl Pass<'_> {
    fn node(&mut self, node: &SchemaNode) -> Result<Walk> {
        for _ in 0..node.total_elements() {
            match self.element(node)? {
                Walk::Continue => {}
                suspended => return Ok(suspended),
            }
        }
        Ok(Walk::Continue)
    }

    fn element(&mut self, node: &SchemaNode) -> Result<Walk> {
        if node.kind == Kind::Struct {
            for child in &node.children {
                match self.node(child)? {
                    Walk::Continue => {}
                    suspended => return Ok(suspended),
                }
            }
            Ok(Walk::Continue)
        } else {
            self.leaf(node.kind)
        }
    }

    fn leaf(&mut self, kind: Kind) -> Result<Walk> {
        if self.to_skip > 0 {
            // Committed to an earlier buffer: consume neither a source
            // value nor destination bytes.
            self.to_skip -= 1;
            return Ok(Walk::Continue);
        }
        let value = match self.pending.take().or_else(|| self.source.next_leaf()) {
            Some(value) => value,
            None => return Ok(Walk::Starved),
        };
        match self.codec.encode(kind, &value, &mut self.dst[self.pos..])? {
            EncodeStep::Written(n) => {
                self.pos += n;
                self.written += 1;
                Ok(Walk::Continue)
            }
            EncodeStep::NeedDst(_) => {
                // The leaf is never split: hold the value and suspend.
                *self.pending = Some(value);
                Ok(Walk::Full)
            }
        }
    }
}
