//! BER identifier and length octets (Tag Codec, Length Codec)

use z3950_core::error::{CodecError, CodecResult};

/// Universal tag numbers used by the built-in value codecs
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const EXTERNAL: u32 = 8;
    pub const ENUMERATED: u32 = 10;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const VISIBLE_STRING: u32 = 26;
    pub const GENERAL_STRING: u32 = 27;
}

/// Continuation octets allowed after a high-tag-number leading octet.
///
/// Four octets carry 28 bits, far beyond any tag a protocol grammar uses;
/// anything longer is treated as malformed input.
pub const MAX_TAG_CONTINUATION: usize = 4;

/// Largest tag number the codec will encode or accept
pub const MAX_TAG_NUMBER: u32 = (1 << (7 * MAX_TAG_CONTINUATION)) - 1;

/// Most identifier octets one tag can occupy
pub const MAX_TAG_OCTETS: usize = 1 + MAX_TAG_CONTINUATION;

/// Most magnitude octets accepted in a long-form length
pub const MAX_LENGTH_MAGNITUDE: usize = 4;

/// Most octets one length field can occupy
pub const MAX_LENGTH_OCTETS: usize = 1 + MAX_LENGTH_MAGNITUDE;

/// BER Tag Class
///
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-wide types (the Z39.50 PDUs)
/// - **Context-specific**: Members of SEQUENCE/SET/CHOICE
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 8-7 of the leading identifier octet)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }

    /// Short label used by the printer and the dumper
    pub fn label(self) -> &'static str {
        match self {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        }
    }
}

/// BER Tag
///
/// An ephemeral (class, number, constructed) triple, produced and consumed
/// immediately by the coders.
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// High-tag-number form (tag number > 30):
/// ```text
/// First byte:      C C P 1 1 1 1 1
/// Following bytes: 1 T T T T T T T ... 0 T T T T T T T
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    class: BerTagClass,
    constructed: bool,
    number: u32,
}

impl BerTag {
    /// Create a new BER tag
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Check class and number, ignoring the constructed bit
    pub fn matches(&self, class: BerTagClass, number: u32) -> bool {
        self.class == class && self.number == number
    }

    /// Encode the identifier octets into `out`
    ///
    /// # Returns
    /// The number of octets written (1 to `MAX_TAG_OCTETS`).
    ///
    /// # Errors
    /// Returns `InvalidValue` if the number exceeds `MAX_TAG_NUMBER`.
    pub fn encode_into(&self, out: &mut [u8; MAX_TAG_OCTETS]) -> CodecResult<usize> {
        let leading = self.class.to_bits() | if self.constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            out[0] = leading | self.number as u8;
            return Ok(1);
        }
        if self.number > MAX_TAG_NUMBER {
            return Err(CodecError::InvalidValue(format!(
                "tag number {} exceeds {}",
                self.number, MAX_TAG_NUMBER
            )));
        }

        out[0] = leading | 0x1F;
        let mut groups = 1;
        while self.number >> (7 * groups) != 0 {
            groups += 1;
        }
        for i in 0..groups {
            let shift = 7 * (groups - 1 - i);
            let continuation = if i + 1 < groups { 0x80 } else { 0x00 };
            out[1 + i] = ((self.number >> shift) & 0x7F) as u8 | continuation;
        }
        Ok(1 + groups)
    }

    /// Encode tag to bytes
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut octets = [0u8; MAX_TAG_OCTETS];
        let n = self.encode_into(&mut octets)?;
        Ok(octets[..n].to_vec())
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful.
    ///
    /// # Error Handling
    /// - `Truncated` if the buffer ends inside the identifier octets; the
    ///   caller may retry once more bytes arrive
    /// - `ProtocolViolation` if the high-tag-number form runs past
    ///   `MAX_TAG_CONTINUATION` octets
    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(CodecError::Truncated(
                "Empty buffer for tag decoding".to_string(),
            ));
        };
        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 0x1F {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut number = 0u32;
        let mut pos = 1;
        loop {
            if pos > MAX_TAG_CONTINUATION {
                return Err(CodecError::ProtocolViolation(
                    "Tag number too large or invalid encoding".to_string(),
                ));
            }
            let Some(&byte) = data.get(pos) else {
                return Err(CodecError::Truncated(
                    "Incomplete high-tag-number encoding".to_string(),
                ));
            };
            number = (number << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, number), pos))
    }
}

/// BER Length
///
/// - **Definite**: a byte count, short form (0-127) or long form
/// - **Indefinite**: `0x80`, content ends with two zero octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    Definite(usize),
    Indefinite,
}

impl BerLength {
    /// Get the definite length, if any
    pub fn definite(&self) -> Option<usize> {
        match self {
            BerLength::Definite(n) => Some(*n),
            BerLength::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Encode length octets into `out`
    ///
    /// # Arguments
    /// * `width` - Reserved width of the length field in octets
    /// * `exact` - Fill exactly `width` octets (for backpatching a reserved field)
    ///
    /// # Encoding Strategy
    /// - Indefinite: single `0x80`
    /// - Length 0-127 with `width == 1` or `!exact`: one short-form octet
    /// - Otherwise long form; `exact` pads the magnitude to `width - 1` octets
    ///
    /// # Errors
    /// Returns `Overflow` if `exact` and the length does not fit `width`.
    pub fn encode_into(
        &self,
        out: &mut [u8; MAX_LENGTH_OCTETS],
        width: u8,
        exact: bool,
    ) -> CodecResult<usize> {
        let length = match self {
            BerLength::Indefinite => {
                out[0] = 0x80;
                return Ok(1);
            }
            BerLength::Definite(n) => *n,
        };

        if length <= 127 && (width <= 1 || !exact) {
            out[0] = length as u8;
            return Ok(1);
        }

        let mut needed = 1;
        while needed < std::mem::size_of::<usize>() && length >> (8 * needed) != 0 {
            needed += 1;
        }
        let magnitude = if exact {
            let available = (width as usize).saturating_sub(1);
            if needed > available {
                return Err(CodecError::Overflow(format!(
                    "length {} does not fit a {}-octet length field",
                    length, width
                )));
            }
            available
        } else {
            needed
        };
        if magnitude > MAX_LENGTH_MAGNITUDE {
            return Err(CodecError::Overflow(format!(
                "length {} needs {} magnitude octets (max {})",
                length, magnitude, MAX_LENGTH_MAGNITUDE
            )));
        }

        out[0] = 0x80 | magnitude as u8;
        for i in 0..magnitude {
            let shift = 8 * (magnitude - 1 - i);
            out[1 + i] = if shift >= usize::BITS as usize {
                0
            } else {
                (length >> shift) as u8
            };
        }
        Ok(1 + magnitude)
    }

    /// Encode length to bytes using the minimal form
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut octets = [0u8; MAX_LENGTH_OCTETS];
        let n = self.encode_into(&mut octets, 1, false)?;
        Ok(octets[..n].to_vec())
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful.
    ///
    /// # Error Handling
    /// - `Truncated` if the buffer ends inside the length octets
    /// - `ProtocolViolation` for the reserved `0xFF` form or a magnitude
    ///   longer than `MAX_LENGTH_MAGNITUDE` octets
    ///
    /// The decoded value is NOT checked against the remaining input here;
    /// every caller validates it against its own bound.
    pub fn decode(data: &[u8]) -> CodecResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(CodecError::Truncated(
                "Empty buffer for length decoding".to_string(),
            ));
        };

        if first_byte & 0x80 == 0 {
            return Ok((BerLength::Definite(first_byte as usize), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, 1));
        }
        if num_bytes == 0x7F {
            return Err(CodecError::ProtocolViolation(
                "reserved length octet 0xFF".to_string(),
            ));
        }
        if num_bytes > MAX_LENGTH_MAGNITUDE {
            return Err(CodecError::ProtocolViolation(format!(
                "Length encoding too large: {} bytes (max {})",
                num_bytes, MAX_LENGTH_MAGNITUDE
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(CodecError::Truncated(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        }

        let length = data[1..=num_bytes]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        Ok((BerLength::Definite(length), 1 + num_bytes))
    }
}
