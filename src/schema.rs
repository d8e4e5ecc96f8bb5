//! Recursive type descriptors.
//!
//! Every EDF file carries its own schema: a tree of [`SchemaNode`] values
//! describing the shape of the records that follow. A node is either a
//! primitive leaf (integer, float, char, string), optionally repeated along
//! one or more array dimensions, or a `Struct` with an ordered list of
//! children. The streaming encoder and decoder walk this tree in pre-order;
//! no host-language reflection is involved.
//!
//! Schemas are serialized into SchemaDescriptor blocks using a compact wire
//! encoding (see [`SchemaNode::serialize`]) and compared structurally by
//! their canonical bytes.

use crate::error::{EdfError, Result};

/// Primitive kind of a schema node.
///
/// Wire tags are fixed: `Struct` is 0 and the leaf kinds follow in
/// declaration order. Any other tag byte in a schema descriptor is
/// malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Composite node with ordered children
    Struct = 0,
    /// Signed 8-bit integer
    Int8 = 1,
    /// Unsigned 8-bit integer
    UInt8 = 2,
    /// Signed 16-bit integer
    Int16 = 3,
    /// Unsigned 16-bit integer
    UInt16 = 4,
    /// Signed 32-bit integer
    Int32 = 5,
    /// Unsigned 32-bit integer
    UInt32 = 6,
    /// Signed 64-bit integer
    Int64 = 7,
    /// Unsigned 64-bit integer
    UInt64 = 8,
    /// IEEE-754 binary16 float
    Half = 9,
    /// IEEE-754 binary32 float
    Single = 10,
    /// IEEE-754 binary64 float
    Double = 11,
    /// Single byte character
    Char = 12,
    /// Length-prefixed UTF-8 string (variable size)
    String = 13,
}

impl Kind {
    /// Parse a kind from its wire tag.
    pub fn from_u8(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Kind::Struct),
            1 => Ok(Kind::Int8),
            2 => Ok(Kind::UInt8),
            3 => Ok(Kind::Int16),
            4 => Ok(Kind::UInt16),
            5 => Ok(Kind::Int32),
            6 => Ok(Kind::UInt32),
            7 => Ok(Kind::Int64),
            8 => Ok(Kind::UInt64),
            9 => Ok(Kind::Half),
            10 => Ok(Kind::Single),
            11 => Ok(Kind::Double),
            12 => Ok(Kind::Char),
            13 => Ok(Kind::String),
            other => Err(EdfError::Malformed {
                msg: format!("unknown schema kind tag: {}", other),
            }),
        }
    }

    /// Fixed binary width in bytes, when the kind has one.
    ///
    /// `Struct` has no width of its own and `String` is variable (its
    /// width here is the 1-byte length prefix of an empty string).
    pub fn size_of(&self) -> usize {
        match self {
            Kind::Struct => 0,
            Kind::Int8 | Kind::UInt8 | Kind::Char | Kind::String => 1,
            Kind::Int16 | Kind::UInt16 | Kind::Half => 2,
            Kind::Int32 | Kind::UInt32 | Kind::Single => 4,
            Kind::Int64 | Kind::UInt64 | Kind::Double => 8,
        }
    }
}

/// Maximum encoded length of a node name, in UTF-8 bytes.
pub const MAX_NAME_LEN: usize = 255;

/// A node in a schema tree.
///
/// # Invariants
///
/// * `children` is non-empty only when `kind == Kind::Struct`.
/// * `dims` entries are non-zero; an empty `dims` means a scalar.
/// * `name` serializes to at most 255 UTF-8 bytes (longer names are capped
///   at a character boundary on serialization).
///
/// # Examples
///
/// ```
/// use edf::schema::{Kind, SchemaNode};
///
/// let point = SchemaNode::record(
///     "point",
///     vec![
///         SchemaNode::leaf("x", Kind::Double),
///         SchemaNode::leaf("y", Kind::Double),
///     ],
/// );
/// let track = SchemaNode::record_array("track", vec![point], vec![16]);
/// assert_eq!(track.total_elements(), 16);
/// assert_eq!(track.fixed_size(), Some(16 * 16));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Field name (may be empty)
    pub name: String,
    /// Primitive kind, or `Struct` for composites
    pub kind: Kind,
    /// Array dimensions; empty for a scalar
    pub dims: Vec<u32>,
    /// Ordered children; populated only for `Struct`
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    /// Create a scalar leaf node.
    pub fn leaf(name: &str, kind: Kind) -> Self {
        SchemaNode {
            name: name.to_string(),
            kind,
            dims: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an array leaf node.
    pub fn array(name: &str, kind: Kind, dims: Vec<u32>) -> Self {
        SchemaNode {
            name: name.to_string(),
            kind,
            dims,
            children: Vec::new(),
        }
    }

    /// Create a struct node with ordered children.
    pub fn record(name: &str, children: Vec<SchemaNode>) -> Self {
        SchemaNode {
            name: name.to_string(),
            kind: Kind::Struct,
            dims: Vec::new(),
            children,
        }
    }

    /// Create an array-of-struct node.
    pub fn record_array(name: &str, children: Vec<SchemaNode>, dims: Vec<u32>) -> Self {
        SchemaNode {
            name: name.to_string(),
            kind: Kind::Struct,
            dims,
            children,
        }
    }

    /// Total element count of this node: the product of `dims`, 1 for a
    /// scalar. Saturates at `u64::MAX`; wire-parsed schemas are
    /// overflow-checked by [`SchemaNode::parse`].
    pub fn total_elements(&self) -> u64 {
        self.dims
            .iter()
            .fold(1u64, |acc, &d| acc.saturating_mul(d as u64))
    }

    /// Total number of primitive leaves in one record conforming to this
    /// schema (array elements counted individually). Saturates at
    /// `u64::MAX` like [`SchemaNode::total_elements`].
    pub fn total_leaves(&self) -> u64 {
        let per_element = if self.kind == Kind::Struct {
            self.children
                .iter()
                .fold(0u64, |acc, c| acc.saturating_add(c.total_leaves()))
        } else {
            1
        };
        self.total_elements().saturating_mul(per_element)
    }

    /// Leaf count with overflow detection: `None` when the element or
    /// leaf product exceeds `u64`.
    pub fn total_leaves_checked(&self) -> Option<u64> {
        let per_element = if self.kind == Kind::Struct {
            let mut sum = 0u64;
            for child in &self.children {
                sum = sum.checked_add(child.total_leaves_checked()?)?;
            }
            sum
        } else {
            1
        };
        let elements = self
            .dims
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))?;
        elements.checked_mul(per_element)
    }

    /// Whether any array dimension anywhere in the tree is zero. Such
    /// trees have no wire form: [`SchemaNode::parse`] rejects zero dims.
    pub fn has_zero_dim(&self) -> bool {
        self.dims.contains(&0) || self.children.iter().any(|c| c.has_zero_dim())
    }

    /// Fixed encoded byte size of one record under the binary codec, or
    /// `None` if the subtree contains a variable-length leaf (`String`)
    /// or the size exceeds `u64`.
    pub fn fixed_size(&self) -> Option<u64> {
        let per_element = match self.kind {
            Kind::String => return None,
            Kind::Struct => {
                let mut sum = 0u64;
                for child in &self.children {
                    sum = sum.checked_add(child.fixed_size()?)?;
                }
                sum
            }
            other => other.size_of() as u64,
        };
        let elements = self
            .dims
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))?;
        elements.checked_mul(per_element)
    }

    /// Serialize this node (recursively) into its canonical wire bytes.
    ///
    /// Layout: `[kind:u8][dims_count:u8][dims: u32 LE × n][name_len:u8]
    /// [name bytes]` and, for structs, `[child_count:u8][child bytes...]`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        self.serialize_into(&mut out);
        out
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(self.kind as u8);
        out.push(self.dims.len() as u8);
        for dim in &self.dims {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        let name = cap_utf8(&self.name, MAX_NAME_LEN);
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        if self.kind == Kind::Struct {
            out.push(self.children.len() as u8);
            for child in &self.children {
                child.serialize_into(out);
            }
        }
    }

    /// Parse one node from the front of `bytes`, returning the node and
    /// the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// [`EdfError::SchemaTruncated`] when the input ends mid-node (the
    /// caller may retry with more bytes); [`EdfError::Malformed`] for an
    /// unknown kind tag, a zero array dimension, or a tree whose leaf
    /// count overflows `u64`.
    pub fn parse(bytes: &[u8]) -> Result<(SchemaNode, usize)> {
        let mut pos = 0usize;
        let node = Self::parse_at(bytes, &mut pos)?;
        if node.total_leaves_checked().is_none() {
            return Err(EdfError::Malformed {
                msg: "schema leaf count overflows".to_string(),
            });
        }
        Ok((node, pos))
    }

    fn parse_at(bytes: &[u8], pos: &mut usize) -> Result<SchemaNode> {
        if bytes.len() < *pos + 2 {
            return Err(EdfError::SchemaTruncated);
        }
        let kind = Kind::from_u8(bytes[*pos])?;
        *pos += 1;

        let dims_count = bytes[*pos] as usize;
        *pos += 1;
        if bytes.len() < *pos + dims_count * 4 {
            return Err(EdfError::SchemaTruncated);
        }
        let mut dims = Vec::with_capacity(dims_count);
        for _ in 0..dims_count {
            let dim = u32::from_le_bytes([
                bytes[*pos],
                bytes[*pos + 1],
                bytes[*pos + 2],
                bytes[*pos + 3],
            ]);
            *pos += 4;
            if dim == 0 {
                return Err(EdfError::Malformed {
                    msg: "schema array dimension is zero".to_string(),
                });
            }
            dims.push(dim);
        }

        if bytes.len() < *pos + 1 {
            return Err(EdfError::SchemaTruncated);
        }
        let name_len = bytes[*pos] as usize;
        *pos += 1;
        if bytes.len() < *pos + name_len {
            return Err(EdfError::SchemaTruncated);
        }
        let name = std::str::from_utf8(&bytes[*pos..*pos + name_len])
            .map_err(|_| EdfError::Malformed {
                msg: "schema node name is not valid UTF-8".to_string(),
            })?
            .to_string();
        *pos += name_len;

        let mut children = Vec::new();
        if kind == Kind::Struct {
            if bytes.len() < *pos + 1 {
                return Err(EdfError::SchemaTruncated);
            }
            let child_count = bytes[*pos] as usize;
            *pos += 1;
            children.reserve(child_count);
            for _ in 0..child_count {
                children.push(Self::parse_at(bytes, pos)?);
            }
        }

        Ok(SchemaNode {
            name,
            kind,
            dims,
            children,
        })
    }

    fn render(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push('\n');
        out.push_str(&indent);
        out.push_str(&format!("{:?}", self.kind));
        for dim in &self.dims {
            out.push_str(&format!("[{}]", dim));
        }
        out.push_str(&format!(" '{}'", self.name));
        if !self.children.is_empty() {
            out.push('\n');
            out.push_str(&indent);
            out.push('{');
            for child in &self.children {
                child.render(out, depth + 1);
            }
            out.push('\n');
            out.push_str(&indent);
            out.push('}');
        }
        out.push(';');
    }
}

/// Structural equality via canonical serialized bytes.
impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for SchemaNode {}

/// Human-readable schema rendering used by the text mirror writer, e.g.
/// `Int32[3] 'xs';`.
impl std::fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity(512);
        self.render(&mut out, 0);
        f.write_str(out.trim_start_matches('\n'))
    }
}

/// Truncate `s` to at most `max` bytes on a character boundary.
fn cap_utf8(s: &str, max: usize) -> &[u8] {
    if s.len() <= max {
        return s.as_bytes();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].as_bytes()
}
