//! Character set conversion hook
//!
//! Z39.50 InternationalString fields travel as GeneralString octets whose
//! character set is negotiated per association (MARC-8, ISO-8859-1, UTF-8,
//! ...). The codec itself only knows this trait; the conversion tables live
//! in a separate layer that plugs an implementation into the coder.

use crate::error::{CodecError, CodecResult};

/// Transcoding between in-memory UTF-8 text and wire octets
pub trait CharsetConverter {
    /// Name of the wire character set, used in diagnostics
    fn name(&self) -> &'static str;

    /// Convert UTF-8 text to wire octets
    fn to_wire(&self, text: &str) -> CodecResult<Vec<u8>>;

    /// Convert wire octets to UTF-8 text
    fn from_wire(&self, octets: &[u8]) -> CodecResult<String>;
}

/// ISO-8859-1 converter
///
/// Every octet maps to the code point with the same value, so decoding never
/// fails. Encoding fails for characters above U+00FF.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1Converter;

impl CharsetConverter for Latin1Converter {
    fn name(&self) -> &'static str {
        "ISO-8859-1"
    }

    fn to_wire(&self, text: &str) -> CodecResult<Vec<u8>> {
        text.chars()
            .map(|ch| {
                u8::try_from(u32::from(ch)).map_err(|_| {
                    CodecError::InvalidValue(format!(
                        "character {:?} is not representable in ISO-8859-1",
                        ch
                    ))
                })
            })
            .collect()
    }

    fn from_wire(&self, octets: &[u8]) -> CodecResult<String> {
        Ok(octets.iter().map(|&b| char::from(b)).collect())
    }
}
