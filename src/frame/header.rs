//! File header.
//!
//! The header is the payload of the first frame in every EDF file. It is
//! exactly 16 bytes and fixes, for the lifetime of the file, the format
//! version, the text code page, the block size used for all subsequent
//! frames, and the option flags.

use crate::error::{EdfError, Result};

/// Byte length of a header payload.
pub const HEADER_LEN: usize = 16;

/// Flag bit: every frame carries a trailing CRC-16.
pub const FLAG_USE_CRC: u32 = 1;

/// EDF file header.
///
/// Layout (little-endian): `[vers_major:u8][vers_minor:u8][code_page:u16]
/// [block_size:u16][flags:u32][reserved: 6 bytes]`.
///
/// A header is written once, by the writer constructor, and is immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Format major version
    pub vers_major: u8,
    /// Format minor version
    pub vers_minor: u8,
    /// Code page identifier for text content (default 65001, UTF-8)
    pub code_page: u16,
    /// Frame payload capacity in bytes, fixed for the file's lifetime
    pub block_size: u16,
    /// Option flags bitset ([`FLAG_USE_CRC`])
    pub flags: u32,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            vers_major: 1,
            vers_minor: 0,
            code_page: 65001,
            block_size: 256,
            flags: FLAG_USE_CRC,
        }
    }
}

impl Header {
    /// Create a header with the given block size; other fields default.
    pub fn with_block_size(block_size: u16) -> Self {
        Header {
            block_size,
            ..Header::default()
        }
    }

    /// Whether frames carry a trailing CRC-16.
    pub fn use_crc(&self) -> bool {
        self.flags & FLAG_USE_CRC != 0
    }

    /// Disable the per-frame CRC.
    pub fn without_crc(mut self) -> Self {
        self.flags &= !FLAG_USE_CRC;
        self
    }

    /// Serialize into the fixed 16-byte payload.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        b[0] = self.vers_major;
        b[1] = self.vers_minor;
        b[2..4].copy_from_slice(&self.code_page.to_le_bytes());
        b[4..6].copy_from_slice(&self.block_size.to_le_bytes());
        b[6..10].copy_from_slice(&self.flags.to_le_bytes());
        b
    }

    /// Parse a header from a frame payload.
    ///
    /// # Errors
    ///
    /// [`EdfError::Malformed`] unless exactly 16 bytes are supplied.
    pub fn parse(b: &[u8]) -> Result<Self> {
        if b.len() != HEADER_LEN {
            return Err(EdfError::Malformed {
                msg: format!("header payload is {} bytes, expected {}", b.len(), HEADER_LEN),
            });
        }
        Ok(Header {
            vers_major: b[0],
            vers_minor: b[1],
            code_page: u16::from_le_bytes([b[2], b[3]]),
            block_size: u16::from_le_bytes([b[4], b[5]]),
            flags: u32::from_le_bytes([b[6], b[7], b[8], b[9]]),
        })
    }
}
