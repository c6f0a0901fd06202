//! Schema-less scanning
//!
//! - [`tlv_extent`] / [`complete_pdu`]: how many bytes the first TLV of a
//!   buffer spans, or that more bytes are needed. A front-end reading PDUs
//!   off a socket calls this until it reports a complete PDU.
//! - [`dump_ber`]: indented text dump of any BER input.
//!
//! Both walk the input with an explicit stack, so nesting depth costs heap
//! rather than call stack and is bounded by `max_depth`.

use super::types::{universal, BerLength, BerTag, BerTagClass};
use std::fmt::Write;
use z3950_core::config::CodecConfig;
use z3950_core::error::{CodecError, CodecResult};

/// Byte length of the complete TLV at the start of `bytes`
///
/// # Returns
/// - `Ok(Some(n))`: the first `n` bytes hold one complete TLV
/// - `Ok(None)`: the TLV is not complete yet
///
/// # Errors
/// Returns `ProtocolViolation` for malformed identifiers or lengths, a
/// primitive value with indefinite length, or indefinite nesting deeper than
/// `max_depth`.
///
/// Definite-length values are skipped without looking inside; only
/// indefinite-length values are descended into to find their end.
pub fn tlv_extent(bytes: &[u8], max_depth: usize) -> CodecResult<Option<usize>> {
    let mut pos = 0;
    let mut open = 0usize;

    loop {
        if open > 0 && bytes[pos..].starts_with(&[0x00, 0x00]) {
            pos += 2;
            open -= 1;
            if open == 0 {
                return Ok(Some(pos));
            }
            continue;
        }

        let (tag, tag_len) = match BerTag::decode(&bytes[pos..]) {
            Ok(found) => found,
            Err(CodecError::Truncated(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let (length, len_len) = match BerLength::decode(&bytes[pos + tag_len..]) {
            Ok(found) => found,
            Err(CodecError::Truncated(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        pos += tag_len + len_len;

        match length {
            BerLength::Definite(n) => {
                if bytes.len() - pos < n {
                    return Ok(None);
                }
                pos += n;
                if open == 0 {
                    return Ok(Some(pos));
                }
            }
            BerLength::Indefinite => {
                if !tag.is_constructed() {
                    return Err(CodecError::ProtocolViolation(format!(
                        "primitive {:?} with indefinite length",
                        tag
                    )));
                }
                if open >= max_depth {
                    return Err(CodecError::ProtocolViolation(format!(
                        "constructed nesting exceeds {} levels",
                        max_depth
                    )));
                }
                open += 1;
            }
        }
    }
}

/// [`tlv_extent`] with the limits of `config`
///
/// A PDU whose definite length already exceeds `max_message_size`, or an
/// incomplete one that has grown past it, is rejected without waiting for
/// the rest.
pub fn complete_pdu(bytes: &[u8], config: &CodecConfig) -> CodecResult<Option<usize>> {
    if let Ok((_, tag_len)) = BerTag::decode(bytes) {
        if let Ok((BerLength::Definite(n), len_len)) = BerLength::decode(&bytes[tag_len..]) {
            let total = (tag_len + len_len).saturating_add(n);
            if total > config.max_message_size {
                return Err(CodecError::ProtocolViolation(format!(
                    "PDU of {} bytes exceeds limit {}",
                    total, config.max_message_size
                )));
            }
        }
    }

    match tlv_extent(bytes, config.max_depth)? {
        Some(n) => Ok(Some(n)),
        None if bytes.len() > config.max_message_size => Err(CodecError::ProtocolViolation(
            format!(
                "incomplete PDU already exceeds {} bytes",
                config.max_message_size
            ),
        )),
        None => Ok(None),
    }
}

fn tag_label(tag: &BerTag) -> String {
    if tag.class() == BerTagClass::Universal {
        let name = match tag.number() {
            universal::BOOLEAN => Some("BOOLEAN"),
            universal::INTEGER => Some("INTEGER"),
            universal::BIT_STRING => Some("BIT STRING"),
            universal::OCTET_STRING => Some("OCTET STRING"),
            universal::NULL => Some("NULL"),
            universal::OBJECT_IDENTIFIER => Some("OBJECT IDENTIFIER"),
            universal::EXTERNAL => Some("EXTERNAL"),
            universal::ENUMERATED => Some("ENUMERATED"),
            universal::SEQUENCE => Some("SEQUENCE"),
            universal::SET => Some("SET"),
            universal::GENERALIZED_TIME => Some("GeneralizedTime"),
            universal::VISIBLE_STRING => Some("VisibleString"),
            universal::GENERAL_STRING => Some("GeneralString"),
            _ => None,
        };
        if let Some(name) = name {
            return name.to_string();
        }
    }
    format!("[{} {}]", tag.class().label(), tag.number())
}

/// Dump every TLV in `bytes` as indented text
///
/// ```text
/// [APPLICATION 48] (6)
///   [CONTEXT 211] (1): 04
/// ```
///
/// Primitive contents are shown in hex.
///
/// # Errors
/// `Truncated` if the input ends inside a value, `ProtocolViolation` for
/// malformed input or nesting deeper than `max_depth`.
pub fn dump_ber(bytes: &[u8], max_depth: usize) -> CodecResult<String> {
    let mut out = String::new();
    let mut ends: Vec<Option<usize>> = Vec::new();
    let mut pos = 0;

    loop {
        while let Some(&end) = ends.last() {
            let limit = ends.iter().rev().find_map(|end| *end).unwrap_or(bytes.len());
            match end {
                Some(end) if pos == end => {
                    ends.pop();
                }
                None if bytes
                    .get(pos..limit)
                    .is_some_and(|window| window.starts_with(&[0x00, 0x00])) =>
                {
                    pos += 2;
                    ends.pop();
                }
                _ => break,
            }
        }
        if pos >= bytes.len() && ends.iter().all(Option::is_none) {
            if ends.is_empty() {
                return Ok(out);
            }
            return Err(CodecError::Truncated(
                "input ends inside a constructed value".to_string(),
            ));
        }

        let (bound, enclosed) = match ends.iter().rev().find_map(|end| *end) {
            Some(end) => (end, true),
            None => (bytes.len(), false),
        };
        let overrun = |what: String| {
            if enclosed {
                CodecError::ProtocolViolation(what)
            } else {
                CodecError::Truncated(what)
            }
        };
        let bounded = |error: CodecError| match error {
            CodecError::Truncated(what) => overrun(what),
            other => other,
        };
        let Some(window) = bytes.get(pos..bound) else {
            return Err(CodecError::ProtocolViolation(format!(
                "offset {} lies past the enclosing value ending at {}",
                pos, bound
            )));
        };
        let (tag, tag_len) = BerTag::decode(window).map_err(bounded)?;
        let (length, len_len) = BerLength::decode(&window[tag_len..]).map_err(bounded)?;
        pos += tag_len + len_len;
        let available = bound - pos;

        for _ in 0..ends.len() {
            out.push_str("  ");
        }
        out.push_str(&tag_label(&tag));

        if tag.is_constructed() {
            match length {
                BerLength::Definite(n) if n > available => {
                    return Err(overrun(format!(
                        "{:?} declares {} bytes, {} available",
                        tag, n, available
                    )));
                }
                BerLength::Definite(n) => {
                    let _ = writeln!(out, " ({})", n);
                }
                BerLength::Indefinite => out.push_str(" (indefinite)\n"),
            }
            if ends.len() >= max_depth {
                return Err(CodecError::ProtocolViolation(format!(
                    "constructed nesting exceeds {} levels",
                    max_depth
                )));
            }
            ends.push(length.definite().map(|n| pos + n));
        } else {
            let Some(n) = length.definite() else {
                return Err(CodecError::ProtocolViolation(format!(
                    "primitive {:?} with indefinite length",
                    tag
                )));
            };
            if n > available {
                return Err(overrun(format!(
                    "{:?} declares {} bytes, {} available",
                    tag, n, available
                )));
            }
            let _ = write!(out, " ({})", n);
            if n > 0 {
                out.push(':');
                for byte in &bytes[pos..pos + n] {
                    let _ = write!(out, " {:02X}", byte);
                }
            }
            out.push('\n');
            pos += n;
        }
    }
}
