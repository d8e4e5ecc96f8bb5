//! Frame integrity checksum.
//!
//! EDF frames carry a CRC-16 in the Modbus configuration: polynomial
//! 0xA001 (0x8005 reflected), initial value 0xFFFF, no final xor. The
//! function is chainable: feeding the previous result back as the seed is
//! equivalent to checksumming the concatenated input. That is how frame
//! writers fold the kind, sequence, length, and payload fields into one
//! checksum without assembling them contiguously.

/// Conventional seed for a fresh checksum.
pub const CRC_SEED: u16 = 0xFFFF;

/// Compute the CRC-16 of `bytes`, continuing from `seed`.
///
/// # Examples
///
/// ```
/// use edf::frame::{crc16, CRC_SEED};
///
/// let whole = crc16(b"123456789", CRC_SEED);
/// assert_eq!(whole, 0x4B37);
///
/// // Chaining is equivalent to one pass over the concatenation.
/// let chained = crc16(b"56789", crc16(b"1234", CRC_SEED));
/// assert_eq!(chained, whole);
/// ```
pub fn crc16(bytes: &[u8], seed: u16) -> u16 {
    let mut crc = seed;
    for &byte in bytes {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_check_value() {
        // Standard CRC-16/MODBUS check input
        assert_eq!(crc16(b"123456789", CRC_SEED), 0x4B37);
    }

    #[test]
    fn test_empty_input_returns_seed() {
        assert_eq!(crc16(&[], CRC_SEED), CRC_SEED);
        assert_eq!(crc16(&[], 0x1234), 0x1234);
    }

    #[test]
    fn test_chaining_matches_single_pass() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc16(data, CRC_SEED);
        for split in 0..data.len() {
            let chained = crc16(&data[split..], crc16(&data[..split], CRC_SEED));
            assert_eq!(chained, whole);
        }
    }

    #[test]
    fn test_single_bit_sensitivity() {
        let data = [0x3D, 0x01, 0x04, 0x00, 0x2A, 0x00, 0x00, 0x00];
        let base = crc16(&data, CRC_SEED);
        for i in 0..data.len() * 8 {
            let mut flipped = data;
            flipped[i / 8] ^= 1 << (i % 8);
            assert_ne!(crc16(&flipped, CRC_SEED), base, "bit {} undetected", i);
        }
    }
}
