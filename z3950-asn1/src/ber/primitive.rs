//! Primitive value codecs
//!
//! Every primitive type runs through the same skeleton in
//! [`Coder::primitive`](super::coder::Coder::primitive): resolve the tag
//! (the type's own UNIVERSAL tag or a pending implicit override), write or
//! match it honoring optionality, then transfer the content octets through
//! this trait. Downstream crates implement [`Primitive`] for their own
//! primitive types and get tagging, optionality and printing for free.

use super::arena::Arena;
use super::types::universal;
use std::fmt;
use z3950_core::charset::CharsetConverter;
use z3950_core::datatypes::{
    BitString, Enumerated, GeneralString, GeneralizedTime, Oid, VisibleString,
};
use z3950_core::error::{CodecError, CodecResult};

/// Content transfer for one primitive ASN.1 type
pub trait Primitive<'a>: Sized {
    /// Default UNIVERSAL tag number
    const TAG: u32;

    /// Whether a constructed (segmented) encoding is accepted on decode
    const SEGMENTABLE: bool = false;

    /// Type name for diagnostics
    const TYPE_NAME: &'static str;

    /// Append the content octets of `self` to `out`
    fn encode_content(
        &self,
        out: &mut Vec<u8>,
        charset: Option<&dyn CharsetConverter>,
    ) -> CodecResult<()>;

    /// Build a value from content octets
    ///
    /// `content` borrows the input or the arena; anything else the value
    /// needs must be allocated in `arena`.
    fn decode_content(
        content: &'a [u8],
        arena: &'a Arena,
        charset: Option<&dyn CharsetConverter>,
    ) -> CodecResult<Self>;

    /// Human-readable form used by the printer
    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Minimal two's-complement octets of `value`
///
/// Redundant leading 0x00/0xFF octets are trimmed while the sign bit of the
/// remaining leading octet still matches.
pub fn integer_octets(value: i64, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    out.extend_from_slice(&bytes[start..]);
}

/// Sign-extend big-endian two's-complement octets
pub fn integer_from_octets(content: &[u8]) -> CodecResult<i64> {
    let Some(&first) = content.first() else {
        return Err(CodecError::ProtocolViolation(
            "Empty integer encoding".to_string(),
        ));
    };
    if content.len() > 8 {
        return Err(CodecError::ProtocolViolation(format!(
            "Integer too large: {} bytes (max 8)",
            content.len()
        )));
    }
    let seed: i64 = if first & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(seed, |acc, &byte| (acc << 8) | byte as i64))
}

/// Append one base-128 subidentifier with continuation bits
fn push_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7F) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        out.push(groups[i] | continuation);
    }
}

fn text_from_utf8<'a>(content: &'a [u8], type_name: &str) -> CodecResult<&'a str> {
    std::str::from_utf8(content).map_err(|e| {
        CodecError::ProtocolViolation(format!("{} is not valid text: {}", type_name, e))
    })
}

impl<'a> Primitive<'a> for i64 {
    const TAG: u32 = universal::INTEGER;
    const TYPE_NAME: &'static str = "INTEGER";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        integer_octets(*self, out);
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        integer_from_octets(content)
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

impl<'a> Primitive<'a> for Enumerated {
    const TAG: u32 = universal::ENUMERATED;
    const TYPE_NAME: &'static str = "ENUMERATED";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        integer_octets(self.0, out);
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        integer_from_octets(content).map(Enumerated)
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self.0)
    }
}

impl<'a> Primitive<'a> for bool {
    const TAG: u32 = universal::BOOLEAN;
    const TYPE_NAME: &'static str = "BOOLEAN";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        out.push(if *self { 0xFF } else { 0x00 });
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        match content {
            [byte] => Ok(*byte != 0),
            _ => Err(CodecError::ProtocolViolation(format!(
                "BOOLEAN content must be 1 byte, got {}",
                content.len()
            ))),
        }
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(if *self { "TRUE" } else { "FALSE" })
    }
}

impl<'a> Primitive<'a> for () {
    const TAG: u32 = universal::NULL;
    const TYPE_NAME: &'static str = "NULL";

    fn encode_content(&self, _: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        if !content.is_empty() {
            return Err(CodecError::ProtocolViolation(format!(
                "NULL content must be empty, got {} bytes",
                content.len()
            )));
        }
        Ok(())
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str("NULL")
    }
}

impl<'a> Primitive<'a> for Oid<'a> {
    const TAG: u32 = universal::OBJECT_IDENTIFIER;
    const TYPE_NAME: &'static str = "OBJECT IDENTIFIER";

    /// First two arcs pack into one subidentifier `arc0 * 40 + arc1`, every
    /// later arc is its own base-128 subidentifier.
    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        self.validate()?;
        let arcs = self.arcs();
        push_base128(arcs[0] as u64 * 40 + arcs[1] as u64, out);
        for &arc in &arcs[2..] {
            push_base128(arc as u64, out);
        }
        Ok(())
    }

    fn decode_content(content: &'a [u8], arena: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        if content.is_empty() {
            return Err(CodecError::ProtocolViolation(
                "Empty object identifier encoding".to_string(),
            ));
        }

        let mut arcs: Vec<u32> = Vec::with_capacity(content.len() + 1);
        let mut pos = 0;
        while pos < content.len() {
            if content[pos] == 0x80 {
                return Err(CodecError::ProtocolViolation(
                    "OID subidentifier with redundant leading octet".to_string(),
                ));
            }
            let mut subid = 0u64;
            loop {
                let Some(&byte) = content.get(pos) else {
                    return Err(CodecError::ProtocolViolation(
                        "OID ends inside a subidentifier".to_string(),
                    ));
                };
                pos += 1;
                subid = (subid << 7) | (byte & 0x7F) as u64;
                if subid > u32::MAX as u64 + 80 {
                    return Err(CodecError::ProtocolViolation(
                        "OID component overflow".to_string(),
                    ));
                }
                if byte & 0x80 == 0 {
                    break;
                }
            }

            if arcs.is_empty() {
                let (first, second) = match subid {
                    0..=39 => (0, subid),
                    40..=79 => (1, subid - 40),
                    _ => (2, subid - 80),
                };
                let second = u32::try_from(second).map_err(|_| {
                    CodecError::ProtocolViolation("OID component overflow".to_string())
                })?;
                arcs.push(first);
                arcs.push(second);
            } else {
                let arc = u32::try_from(subid).map_err(|_| {
                    CodecError::ProtocolViolation("OID component overflow".to_string())
                })?;
                arcs.push(arc);
            }
        }

        Ok(Oid::new(arena.alloc_slice(&arcs)))
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

impl<'a> Primitive<'a> for &'a [u8] {
    const TAG: u32 = universal::OCTET_STRING;
    const SEGMENTABLE: bool = true;
    const TYPE_NAME: &'static str = "OCTET STRING";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        out.extend_from_slice(self);
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        Ok(content)
    }

    /// Printable ASCII as quoted text, anything else as hex
    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if self.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            out.write_char('\'')?;
            for &b in self.iter() {
                out.write_char(char::from(b))?;
            }
            out.write_char('\'')
        } else {
            out.write_char('\'')?;
            for b in self.iter() {
                write!(out, "{:02X}", b)?;
            }
            out.write_str("'H")
        }
    }
}

impl<'a> Primitive<'a> for BitString<'a> {
    const TAG: u32 = universal::BIT_STRING;
    const TYPE_NAME: &'static str = "BIT STRING";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        out.push(self.unused_bits());
        out.extend_from_slice(self.as_bytes());
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        let Some((&unused_bits, bytes)) = content.split_first() else {
            return Err(CodecError::ProtocolViolation(
                "Empty bit string encoding".to_string(),
            ));
        };
        BitString::from_wire(unused_bits, bytes)
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

impl<'a> Primitive<'a> for VisibleString<'a> {
    const TAG: u32 = universal::VISIBLE_STRING;
    const SEGMENTABLE: bool = true;
    const TYPE_NAME: &'static str = "VisibleString";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        if !self.0.is_ascii() {
            return Err(CodecError::InvalidValue(format!(
                "VisibleString must be ASCII: {:?}",
                self.0
            )));
        }
        out.extend_from_slice(self.0.as_bytes());
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        text_from_utf8(content, Self::TYPE_NAME).map(VisibleString)
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

impl<'a> Primitive<'a> for GeneralizedTime<'a> {
    const TAG: u32 = universal::GENERALIZED_TIME;
    const SEGMENTABLE: bool = true;
    const TYPE_NAME: &'static str = "GeneralizedTime";

    fn encode_content(&self, out: &mut Vec<u8>, _: Option<&dyn CharsetConverter>) -> CodecResult<()> {
        out.extend_from_slice(self.0.as_bytes());
        Ok(())
    }

    fn decode_content(content: &'a [u8], _: &'a Arena, _: Option<&dyn CharsetConverter>) -> CodecResult<Self> {
        text_from_utf8(content, Self::TYPE_NAME).map(GeneralizedTime)
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}

/// InternationalString: transcoded when the coder carries a converter,
/// UTF-8 on the wire otherwise
impl<'a> Primitive<'a> for GeneralString<'a> {
    const TAG: u32 = universal::GENERAL_STRING;
    const SEGMENTABLE: bool = true;
    const TYPE_NAME: &'static str = "GeneralString";

    fn encode_content(
        &self,
        out: &mut Vec<u8>,
        charset: Option<&dyn CharsetConverter>,
    ) -> CodecResult<()> {
        match charset {
            Some(converter) => out.extend_from_slice(&converter.to_wire(self.0)?),
            None => out.extend_from_slice(self.0.as_bytes()),
        }
        Ok(())
    }

    fn decode_content(
        content: &'a [u8],
        arena: &'a Arena,
        charset: Option<&dyn CharsetConverter>,
    ) -> CodecResult<Self> {
        match charset {
            Some(converter) => {
                let text = converter.from_wire(content)?;
                Ok(GeneralString(arena.alloc_str(&text)))
            }
            None => text_from_utf8(content, Self::TYPE_NAME).map(GeneralString),
        }
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}", self)
    }
}
