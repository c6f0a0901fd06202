//! BER encoder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use z3950_asn1::ber::{BerEncoder, Coder};
//!
//! let mut encoder = BerEncoder::new();
//! encoder.integer(&mut Some(12345), false, "value")?;
//! let bytes = encoder.finish()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Length Backpatching
//!
//! A constructed value's length is unknown until its content is written.
//! `constructed_begin` reserves the length field (one octet unless
//! overridden) and `constructed_end` seeks back to fill it in:
//!
//! - content that fits the reserved width is written in place
//! - with the default one-octet reservation, longer content is shifted
//!   right just enough for the minimal long form, so the output is always
//!   the minimal definite encoding
//! - an explicit width of 2..=5 is honored exactly; content too long for it
//!   is an `Overflow`
//!
//! With `indefinite_length` configured, constructed values are written as
//! `0x80 ... 00 00` instead and nothing is backpatched.

use super::arena::Arena;
use super::buffer::OutputBuffer;
use super::coder::{Coder, Direction};
use super::frame::Frame;
use super::primitive::Primitive;
use super::scan::tlv_extent;
use super::state::{CoderState, SharedConverter};
use super::types::{
    BerLength, BerTag, BerTagClass, MAX_LENGTH_OCTETS, MAX_TAG_OCTETS,
};
use bytes::Bytes;
use z3950_core::charset::CharsetConverter;
use z3950_core::config::{CodecConfig, MAX_LENGTH_WIDTH};
use z3950_core::error::{CodecError, CodecFailure, CodecResult};

/// BER encoder writing into a growable [`OutputBuffer`]
#[derive(Debug)]
pub struct BerEncoder {
    state: CoderState,
    buffer: OutputBuffer,
    /// Reused content buffer for primitives
    scratch: Vec<u8>,
}

impl BerEncoder {
    /// Create an encoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create an encoder with `config`
    ///
    /// An invalid configuration is latched as the first failure, so every
    /// call on the encoder reports it.
    pub fn with_config(config: CodecConfig) -> Self {
        let buffer = OutputBuffer::new(config.initial_capacity, config.max_message_size);
        let validated = config.validate();
        let mut state = CoderState::new(config);
        if let Err(e) = validated {
            state.fail(e, "", 0);
        }
        Self {
            state,
            buffer,
            scratch: Vec::new(),
        }
    }

    /// Create an encoder that transcodes GeneralString values
    pub fn with_charset(config: CodecConfig, converter: SharedConverter) -> Self {
        let mut encoder = Self::with_config(config);
        encoder.state.set_charset(Some(converter));
        encoder
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// Bytes encoded so far
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Finish the message and take its bytes
    ///
    /// # Errors
    /// Returns the latched failure, or a `ProtocolViolation` if a
    /// constructed value was left open. The buffer keeps its content on
    /// error.
    pub fn finish(&mut self) -> Result<Bytes, CodecFailure> {
        if self.state.failure().is_none() && !self.state.frames().is_empty() {
            let open = self.state.frames().depth();
            let offset = self.buffer.position();
            self.state.fail(
                CodecError::ProtocolViolation(format!(
                    "{} constructed value(s) left open",
                    open
                )),
                "",
                offset,
            );
        }
        if let Some(failure) = self.state.failure() {
            return Err(failure.clone());
        }
        Ok(self.buffer.take_bytes())
    }

    /// Reuse the encoder for the next message
    ///
    /// The buffer allocation, configuration and charset survive.
    pub fn reset(&mut self) {
        self.state.reset();
        self.buffer.clear();
    }

    fn write_tag(&mut self, tag: BerTag) -> CodecResult<()> {
        let mut octets = [0u8; MAX_TAG_OCTETS];
        let n = tag.encode_into(&mut octets)?;
        self.buffer.write(&octets[..n])
    }

    fn write_tlv(&mut self, tag: BerTag, content: &[u8]) -> CodecResult<()> {
        self.write_tag(tag)?;
        let mut octets = [0u8; MAX_LENGTH_OCTETS];
        let n = BerLength::Definite(content.len()).encode_into(&mut octets, 1, false)?;
        self.buffer.write(&octets[..n])?;
        self.buffer.write(content)
    }

    fn open(&mut self, tag: BerTag, width: u8, name: &str) -> CodecResult<()> {
        if !(1..=MAX_LENGTH_WIDTH).contains(&width) {
            return Err(CodecError::InvalidValue(format!(
                "length width must be 1..={}, got {}",
                MAX_LENGTH_WIDTH, width
            )));
        }
        self.write_tag(tag)?;
        let length_field_offset = self.buffer.position();
        let declared_length = if self.state.config().indefinite_length {
            self.buffer.putc(0x80)?;
            BerLength::Indefinite
        } else {
            self.buffer.write(&[0u8; MAX_LENGTH_OCTETS][..width as usize])?;
            BerLength::Definite(0)
        };
        self.state.frames_mut().push(Frame {
            base_offset: self.buffer.position(),
            length_field_offset,
            declared_length,
            reserved_width: width,
            name: name.to_string(),
        })
    }

    fn close(&mut self) -> CodecResult<()> {
        let frame = self.state.frames_mut().pop()?;
        if frame.is_indefinite() {
            return self.buffer.write(&[0x00, 0x00]);
        }

        let length = self.buffer.position() - frame.base_offset;
        let mut octets = [0u8; MAX_LENGTH_OCTETS];
        let n = if frame.reserved_width == 1 {
            let n = BerLength::Definite(length).encode_into(&mut octets, 1, false)?;
            if n > 1 {
                self.buffer
                    .insert_gap(frame.length_field_offset + 1, n - 1)?;
            }
            n
        } else {
            BerLength::Definite(length).encode_into(&mut octets, frame.reserved_width, true)?
        };

        let mut patch = self.buffer.rewind_to(frame.length_field_offset)?;
        patch.write(&octets[..n])?;
        log::trace!(
            "closed `{}`: {} content bytes, {} length octets",
            frame.name,
            length,
            n
        );
        Ok(())
    }
}

impl Default for BerEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Coder<'a> for BerEncoder {
    fn direction(&self) -> Direction {
        Direction::Encode
    }

    fn state(&self) -> &CoderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoderState {
        &mut self.state
    }

    fn offset(&self) -> usize {
        self.buffer.position()
    }

    fn arena(&self) -> Option<&'a Arena> {
        None
    }

    fn primitive<P: Primitive<'a>>(
        &mut self,
        value: &mut Option<P>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        let (class, number) = self.state.resolve_tag(BerTagClass::Universal, P::TAG);
        let Some(v) = value.as_ref() else {
            return self.missing(opt, name);
        };

        let mut content = std::mem::take(&mut self.scratch);
        content.clear();
        let encoded = {
            let charset = self.state.charset().map(|c| c as &dyn CharsetConverter);
            v.encode_content(&mut content, charset)
        };
        let result =
            encoded.and_then(|()| self.write_tlv(BerTag::new(class, false, number), &content));
        self.scratch = content;
        match result {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e, name)),
        }
    }

    /// Copy a pre-encoded TLV verbatim after checking it is exactly one
    /// complete element
    fn any(&mut self, value: &mut Option<&'a [u8]>, opt: bool, name: &str) -> CodecResult<bool> {
        self.state.check()?;
        if self.state.has_tag_override() {
            self.state.clear_tag_override();
            let error = CodecError::InvalidValue(format!(
                "ANY `{}` cannot be implicitly tagged",
                name
            ));
            return Err(self.fail(error, name));
        }
        let Some(raw) = *value else {
            return self.missing(opt, name);
        };
        let max_depth = self.state.config().max_depth;
        let result = match tlv_extent(raw, max_depth) {
            Ok(Some(n)) if n == raw.len() => self.buffer.write(raw),
            Ok(Some(n)) => Err(CodecError::InvalidValue(format!(
                "ANY value holds {} trailing bytes after its TLV",
                raw.len() - n
            ))),
            Ok(None) => Err(CodecError::InvalidValue(
                "ANY value is not a complete TLV".to_string(),
            )),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e, name)),
        }
    }

    fn constructed_begin(
        &mut self,
        present: bool,
        class: BerTagClass,
        number: u32,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        let (class, number) = self.state.resolve_tag(class, number);
        let width = self.state.take_length_width();
        if !present {
            return self.missing(opt, name);
        }
        match self.open(BerTag::new(class, true, number), width, name) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e, name)),
        }
    }

    fn constructed_more(&mut self) -> CodecResult<bool> {
        self.state.check()?;
        Ok(false)
    }

    fn constructed_end(&mut self) -> CodecResult<()> {
        self.state.check()?;
        let name = self
            .state
            .frames()
            .top()
            .map(|frame| frame.name.clone())
            .unwrap_or_default();
        self.close().map_err(|e| self.fail(e, &name))
    }

    fn peek_tag(&mut self) -> CodecResult<Option<BerTag>> {
        self.state.check()?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z3950_core::error::ErrorKind;

    fn begin(encoder: &mut BerEncoder, number: u32) {
        assert!(
            encoder
                .constructed_begin(true, BerTagClass::Universal, number, false, "seq")
                .unwrap()
        );
    }

    #[test]
    fn test_encode_integer() {
        let mut encoder = BerEncoder::new();
        assert!(encoder.integer(&mut Some(12345), false, "n").unwrap());
        assert_eq!(encoder.finish().unwrap().as_ref(), &[0x02, 0x02, 0x30, 0x39]);
    }

    #[test]
    fn test_short_sequence_in_place() {
        let mut encoder = BerEncoder::new();
        begin(&mut encoder, 16);
        encoder.boolean(&mut Some(true), false, "flag").unwrap();
        encoder.constructed_end().unwrap();
        assert_eq!(encoder.as_bytes(), &[0x30, 0x03, 0x01, 0x01, 0xFF]);
    }

    #[test]
    fn test_long_content_is_relocated() {
        let payload = [0x41u8; 200];
        let mut encoder = BerEncoder::new();
        begin(&mut encoder, 16);
        encoder
            .octet_string(&mut Some(&payload[..]), false, "data")
            .unwrap();
        encoder.constructed_end().unwrap();
        let bytes = encoder.finish().unwrap();
        // 200 content + 3 header bytes of the OCTET STRING = 203
        assert_eq!(&bytes[..6], &[0x30, 0x81, 0xCB, 0x04, 0x81, 0xC8]);
        assert_eq!(bytes.len(), 3 + 203);
    }

    #[test]
    fn test_explicit_width_is_exact() {
        let mut encoder = BerEncoder::new();
        encoder.set_length_width(3);
        begin(&mut encoder, 16);
        encoder.null(&mut Some(()), false, "n").unwrap();
        encoder.constructed_end().unwrap();
        assert_eq!(encoder.as_bytes(), &[0x30, 0x82, 0x00, 0x02, 0x05, 0x00]);
    }

    #[test]
    fn test_width_overflow() {
        let payload = [0u8; 300];
        let mut encoder = BerEncoder::new();
        encoder.set_length_width(2);
        begin(&mut encoder, 16);
        encoder
            .octet_string(&mut Some(&payload[..]), false, "data")
            .unwrap();
        let err = encoder.constructed_end().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(encoder.finish().unwrap_err().kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_indefinite_form() {
        let mut encoder =
            BerEncoder::with_config(CodecConfig::default().with_indefinite_length(true));
        begin(&mut encoder, 16);
        encoder.integer(&mut Some(1), false, "n").unwrap();
        encoder.constructed_end().unwrap();
        assert_eq!(
            encoder.as_bytes(),
            &[0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_missing_required_latches() {
        let mut encoder = BerEncoder::new();
        let err = encoder.integer(&mut None, false, "closeReason").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
        // Later calls fail fast and write nothing
        assert!(encoder.integer(&mut Some(1), false, "x").is_err());
        assert!(encoder.as_bytes().is_empty());
        assert_eq!(encoder.finish().unwrap_err().element_path, "closeReason");
    }

    #[test]
    fn test_optional_absent_writes_nothing() {
        let mut encoder = BerEncoder::new();
        assert!(!encoder.integer(&mut None, true, "x").unwrap());
        assert!(encoder.finish().unwrap().is_empty());
    }

    #[test]
    fn test_unclosed_frame_fails_finish() {
        let mut encoder = BerEncoder::new();
        begin(&mut encoder, 16);
        let failure = encoder.finish().unwrap_err();
        assert_eq!(failure.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_buffer_limit() {
        let payload = [0u8; 64];
        let mut encoder =
            BerEncoder::with_config(CodecConfig::default().with_max_message_size(32));
        let err = encoder
            .octet_string(&mut Some(&payload[..]), false, "data")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferExhausted);
    }

    #[test]
    fn test_any_requires_single_tlv() {
        let mut encoder = BerEncoder::new();
        assert!(encoder.any(&mut Some(&[0x05, 0x00][..]), false, "a").unwrap());
        assert!(encoder.any(&mut Some(&[0x05, 0x00, 0x05][..]), false, "b").is_err());
    }

    #[test]
    fn test_reset_reuses_encoder() {
        let mut encoder = BerEncoder::new();
        encoder.integer(&mut None, false, "x").unwrap_err();
        encoder.reset();
        encoder.integer(&mut Some(5), false, "x").unwrap();
        assert_eq!(encoder.finish().unwrap().as_ref(), &[0x02, 0x01, 0x05]);
    }
}
