//! Resumable schema-driven decoder.
//!
//! Mirror of the encoder: walks the same schema shape, decoding leaves
//! from accreted input bytes that may span multiple frames, and emits each
//! fully-decoded record as one vector of leaf values in pre-order. By
//! construction a single leaf never spans two frames (the encoder never
//! splits one), but undecoded trailing bytes are still carried from one
//! attempt into the next so that arbitrarily chunked input decodes
//! identically.

use crate::codec::{DecodeStep, PrimitiveCodec, Value};
use crate::error::Result;
use crate::schema::{Kind, SchemaNode};

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A full record was decoded: its leaves in pre-order
    Complete(Vec<Value>),
    /// The input ran out mid-record. Supply the next frame's bytes and
    /// call again; already-decoded leaves are retained.
    NeedMoreData,
}

/// Schema-driven resumable record decoder.
#[derive(Debug, Default)]
pub struct StreamingDecoder {
    /// Leaves of the in-flight record decoded in earlier attempts
    skip: u64,
    /// Leaves decoded so far for the in-flight record
    partial: Vec<Value>,
    /// Undecoded trailing bytes carried into the next attempt
    carry: Vec<u8>,
}

impl StreamingDecoder {
    /// Create a decoder with no in-flight record.
    pub fn new() -> Self {
        StreamingDecoder::default()
    }

    /// Discard all in-flight record state. Called when a new schema is
    /// declared.
    pub fn reset(&mut self) {
        self.skip = 0;
        self.partial.clear();
        self.carry.clear();
    }

    /// Whether a record is currently suspended mid-decode.
    pub fn in_flight(&self) -> bool {
        self.skip != 0 || !self.partial.is_empty() || !self.carry.is_empty()
    }

    /// Drive the record walk over `src` (new bytes, typically the unread
    /// remainder of the current data frame).
    ///
    /// Returns the number of `src` bytes consumed together with the
    /// outcome. On [`DecodeOutcome::NeedMoreData`] all of `src` is
    /// consumed: its unread tail is carried internally.
    pub fn decode(
        &mut self,
        schema: &SchemaNode,
        codec: &dyn PrimitiveCodec,
        src: &[u8],
    ) -> Result<(usize, DecodeOutcome)> {
        let carried = self.carry.len();
        let joined;
        let work: &[u8] = if carried == 0 {
            src
        } else {
            let mut buf = Vec::with_capacity(carried + src.len());
            buf.extend_from_slice(&self.carry);
            buf.extend_from_slice(src);
            joined = buf;
            &joined
        };

        let mut pass = Pass {
            codec,
            buf: work,
            pos: 0,
            to_skip: self.skip,
            out: &mut self.partial,
        };
        let walk = pass.node(schema)?;
        let pos = pass.pos;

        match walk {
            Walk::Continue => {
                let record = std::mem::take(&mut self.partial);
                self.skip = 0;
                let consumed = if pos >= carried {
                    self.carry.clear();
                    pos - carried
                } else {
                    self.carry.drain(..pos);
                    0
                };
                Ok((consumed, DecodeOutcome::Complete(record)))
            }
            Walk::Starved => {
                self.skip = self.partial.len() as u64;
                self.carry = work[pos..].to_vec();
                Ok((src.len(), DecodeOutcome::NeedMoreData))
            }
        }
    }
}

enum Walk {
    Continue,
    Starved,
}

struct Pass<'a> {
    codec: &'a dyn PrimitiveCodec,
    buf: &'a [u8],
    pos: usize,
    to_skip: u64,
    out: &'a mut Vec<Value>,
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
            self.to_skip -= 1;
            return Ok(Walk::Continue);
        }
        match self.codec.decode(kind, &self.buf[self.pos..])? {
            DecodeStep::Decoded(value, n) => {
                self.pos += n;
                self.out.push(value);
                Ok(Walk::Continue)
            }
            DecodeStep::NeedSrc => Ok(Walk::Starved),
        }
    }
}
