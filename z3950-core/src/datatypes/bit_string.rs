//! BIT STRING value type

use crate::error::{CodecError, CodecResult};
use std::fmt;

/// Arbitrary string of bits, most significant bit of the first octet first.
///
/// The bits are borrowed: from the caller when encoding, from the input or
/// the decode arena when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitString<'a> {
    bytes: &'a [u8],
    num_bits: usize,
}

impl<'a> BitString<'a> {
    /// Construct a new bit string.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The octets holding the bits
    /// * `num_bits` - The number of bits in use
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if:
    /// - `num_bits > bytes.len() * 8`
    /// - the last octet would carry more than 7 unused bits
    pub fn new(bytes: &'a [u8], num_bits: usize) -> CodecResult<Self> {
        if num_bits > bytes.len() * 8 {
            return Err(CodecError::InvalidValue(format!(
                "bit string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }
        if bytes.len() * 8 - num_bits > 7 {
            return Err(CodecError::InvalidValue(format!(
                "{} bytes carry more than 7 unused bits for {} bits",
                bytes.len(),
                num_bits
            )));
        }
        Ok(Self { bytes, num_bits })
    }

    /// Build a bit string from its wire form: the unused-bit count and the octets
    pub fn from_wire(unused_bits: u8, bytes: &'a [u8]) -> CodecResult<Self> {
        if unused_bits > 7 {
            return Err(CodecError::ProtocolViolation(format!(
                "Invalid unused bits: {} (must be 0-7)",
                unused_bits
            )));
        }
        if bytes.is_empty() && unused_bits != 0 {
            return Err(CodecError::ProtocolViolation(
                "empty bit string with non-zero unused bits".to_string(),
            ));
        }
        Ok(Self {
            bytes,
            num_bits: bytes.len() * 8 - unused_bits as usize,
        })
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The number of bits in use.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Unused bits in the last octet (0-7)
    pub fn unused_bits(&self) -> u8 {
        (self.bytes.len() * 8 - self.num_bits) as u8
    }

    /// Get the bit at a specific position
    ///
    /// Returns `None` if the index is out of bounds.
    pub fn get_bit(&self, index: usize) -> Option<bool> {
        if index >= self.num_bits {
            return None;
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Some((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }
}

impl fmt::Display for BitString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for index in 0..self.num_bits {
            let bit = (self.bytes[index / 8] >> (7 - index % 8)) & 1;
            f.write_str(if bit == 1 { "1" } else { "0" })?;
        }
        f.write_str("'B")
    }
}
