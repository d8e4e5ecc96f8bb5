//! Block framing: wire frames, the file header, and integrity checking.
//!
//! An EDF file is a flat sequence of frames:
//! `[kind:u8][seq:u8][len:u16 LE][payload: len bytes]([crc:u16 LE] if the
//! header's UseCrc flag is set)`. The first frame is always a Header frame
//! whose 16-byte payload fixes the block size and flags for the rest of
//! the file.

pub mod block;
pub mod checksum;
pub mod header;

pub use block::{read_frame, read_header_frame, write_frame, BlockKind, Frame, ReadFrame};
pub use checksum::{crc16, CRC_SEED};
pub use header::{Header, FLAG_USE_CRC, HEADER_LEN};
