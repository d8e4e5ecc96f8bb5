//! Frame writing and reading.
//!
//! A frame is one framed unit on the wire: a kind tag, a wrapping sequence
//! number, a little-endian payload length, the payload itself, and, when
//! the file header enables it, a trailing CRC-16 over the four preceding
//! fields. The CRC is chained with [`crc16`] so the fields never need to
//! be assembled into one contiguous buffer.

use std::io::{Read, Write};

use crate::error::{EdfError, Result};
use crate::frame::checksum::{crc16, CRC_SEED};
use crate::frame::header::Header;

/// Frame kind tags. Any other byte read as a kind is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockKind {
    /// File header frame (`~`)
    Header = 0x7E,
    /// Schema descriptor frame (`?`)
    SchemaDescriptor = 0x3F,
    /// Data frame (`=`)
    Data = 0x3D,
}

impl BlockKind {
    /// Parse a kind tag byte.
    pub fn from_u8(tag: u8) -> Result<Self> {
        match tag {
            0x7E => Ok(BlockKind::Header),
            0x3F => Ok(BlockKind::SchemaDescriptor),
            0x3D => Ok(BlockKind::Data),
            other => Err(EdfError::Malformed {
                msg: format!("unknown frame kind tag: 0x{:02X}", other),
            }),
        }
    }
}

/// One frame read back from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind
    pub kind: BlockKind,
    /// Writer-assigned sequence number (wraps modulo 256)
    pub seq: u8,
    /// Frame payload
    pub payload: Vec<u8>,
}

/// Result of one frame read attempt.
#[derive(Debug)]
pub enum ReadFrame {
    /// A complete, validated frame
    Frame(Frame),
    /// Clean end of stream (EOF before a frame, or a zero-length payload)
    End,
}

/// Write one frame.
///
/// The payload must be non-empty; callers never emit zero-length frames
/// (a zero length is the reader's stream-end marker).
pub fn write_frame<W: Write>(
    sink: &mut W,
    kind: BlockKind,
    seq: u8,
    payload: &[u8],
    use_crc: bool,
) -> Result<()> {
    debug_assert!(!payload.is_empty());
    let len = payload.len() as u16;
    let len_bytes = len.to_le_bytes();

    sink.write_all(&[kind as u8, seq])?;
    sink.write_all(&len_bytes)?;
    sink.write_all(payload)?;

    if use_crc {
        let mut crc = crc16(&[kind as u8], CRC_SEED);
        crc = crc16(&[seq], crc);
        crc = crc16(&len_bytes, crc);
        crc = crc16(payload, crc);
        sink.write_all(&crc.to_le_bytes())?;
    }
    Ok(())
}

/// Read and validate one frame.
///
/// Returns [`ReadFrame::End`] at a clean end of stream: EOF before the
/// kind byte, or a frame announcing a zero-length payload.
///
/// # Errors
///
/// [`EdfError::Malformed`] for an unknown kind tag, a truncated frame, or
/// a CRC mismatch. A CRC mismatch indicates on-disk corruption and must
/// not be retried.
pub fn read_frame<R: Read>(source: &mut R, use_crc: bool) -> Result<ReadFrame> {
    let tag = match read_first_byte(source)? {
        Some(b) => b,
        None => return Ok(ReadFrame::End),
    };
    let kind = BlockKind::from_u8(tag)?;

    let mut prefix = [0u8; 3];
    read_exact_frame(source, &mut prefix)?;
    let seq = prefix[0];
    let len = u16::from_le_bytes([prefix[1], prefix[2]]);
    if len == 0 {
        return Ok(ReadFrame::End);
    }

    let mut payload = vec![0u8; len as usize];
    read_exact_frame(source, &mut payload)?;

    if use_crc {
        verify_crc(source, kind, seq, len, &payload)?;
    }

    Ok(ReadFrame::Frame(Frame { kind, seq, payload }))
}

/// Read the bootstrap header frame of a file.
///
/// The reader cannot know whether frames carry a CRC until it has seen the
/// header flags, so the header frame is parsed before its own optional CRC
/// is consumed: kind, seq, and the 16-byte payload are read first, the
/// flags are taken from the payload, and only then is the trailing CRC
/// read and checked.
pub fn read_header_frame<R: Read>(source: &mut R) -> Result<Option<(Frame, Header)>> {
    let tag = match read_first_byte(source)? {
        Some(b) => b,
        None => return Ok(None),
    };
    let kind = BlockKind::from_u8(tag)?;
    if kind != BlockKind::Header {
        return Err(EdfError::Malformed {
            msg: format!("expected header frame, found {:?}", kind),
        });
    }

    let mut prefix = [0u8; 3];
    read_exact_frame(source, &mut prefix)?;
    let seq = prefix[0];
    let len = u16::from_le_bytes([prefix[1], prefix[2]]);

    let mut payload = vec![0u8; len as usize];
    read_exact_frame(source, &mut payload)?;
    let header = Header::parse(&payload)?;

    if header.use_crc() {
        verify_crc(source, kind, seq, len, &payload)?;
    }

    Ok(Some((Frame { kind, seq, payload }, header)))
}

fn verify_crc<R: Read>(
    source: &mut R,
    kind: BlockKind,
    seq: u8,
    len: u16,
    payload: &[u8],
) -> Result<()> {
    let mut crc_bytes = [0u8; 2];
    read_exact_frame(source, &mut crc_bytes)?;
    let stored = u16::from_le_bytes(crc_bytes);

    let mut crc = crc16(&[kind as u8], CRC_SEED);
    crc = crc16(&[seq], crc);
    crc = crc16(&len.to_le_bytes(), crc);
    crc = crc16(payload, crc);

    if crc != stored {
        return Err(EdfError::Malformed {
            msg: format!(
                "CRC mismatch in frame seq {}: stored 0x{:04X}, computed 0x{:04X}",
                seq, stored, crc
            ),
        });
    }
    Ok(())
}

/// Read the kind byte, mapping EOF to `None`.
fn read_first_byte<R: Read>(source: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match source.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// `read_exact` with EOF inside a frame reported as corruption.
fn read_exact_frame<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            EdfError::Malformed {
                msg: "frame truncated mid-field".to_string(),
            }
        } else {
            EdfError::Io(e)
        }
    })
}
