//! BER decoder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use z3950_asn1::ber::{Arena, BerDecoder, Coder};
//!
//! let arena = Arena::new();
//! let mut decoder = BerDecoder::new(&arena, &[0x02, 0x02, 0x30, 0x39]);
//! let mut value = None;
//! decoder.integer(&mut value, false, "value")?;
//! assert_eq!(value, Some(12345));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Bounds
//!
//! Every tag and length is read against the innermost definite frame end
//! (or the end of input). A declared length that overruns an enclosing
//! definite value is a `ProtocolViolation`; one that only overruns the end
//! of input at top level is `Truncated`, since more bytes may still arrive.

use super::arena::Arena;
use super::coder::{Coder, Direction};
use super::frame::Frame;
use super::primitive::Primitive;
use super::scan::tlv_extent;
use super::state::{CoderState, SharedConverter};
use super::types::{universal, BerLength, BerTag, BerTagClass};
use bumpalo::collections::Vec as BumpVec;
use z3950_core::charset::CharsetConverter;
use z3950_core::config::CodecConfig;
use z3950_core::error::{CodecError, CodecFailure, CodecResult};

/// BER decoder over a borrowed input buffer
///
/// Decoded values borrow either `input` or `arena`, hence the shared
/// lifetime `'a`.
#[derive(Debug)]
pub struct BerDecoder<'a> {
    state: CoderState,
    input: &'a [u8],
    cursor: usize,
    arena: &'a Arena,
}

impl<'a> BerDecoder<'a> {
    /// Create a decoder with the default configuration
    pub fn new(arena: &'a Arena, input: &'a [u8]) -> Self {
        Self::with_config(arena, input, CodecConfig::default())
    }

    /// Create a decoder with `config`
    ///
    /// An invalid configuration, or input larger than `max_message_size`,
    /// is latched as the first failure.
    pub fn with_config(arena: &'a Arena, input: &'a [u8], config: CodecConfig) -> Self {
        let max_message_size = config.max_message_size;
        let validated = config.validate();
        let mut state = CoderState::new(config);
        if let Err(e) = validated {
            state.fail(e, "", 0);
        } else if input.len() > max_message_size {
            state.fail(
                CodecError::ProtocolViolation(format!(
                    "message of {} bytes exceeds limit {}",
                    input.len(),
                    max_message_size
                )),
                "",
                0,
            );
        }
        Self {
            state,
            input,
            cursor: 0,
            arena,
        }
    }

    /// Create a decoder that transcodes GeneralString values
    pub fn with_charset(
        arena: &'a Arena,
        input: &'a [u8],
        config: CodecConfig,
        converter: SharedConverter,
    ) -> Self {
        let mut decoder = Self::with_config(arena, input, config);
        decoder.state.set_charset(Some(converter));
        decoder
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left in the input
    pub fn remaining(&self) -> usize {
        self.input.len() - self.cursor
    }

    pub fn has_remaining(&self) -> bool {
        self.cursor < self.input.len()
    }

    /// Finish the pass and report how many bytes it consumed
    ///
    /// Trailing bytes are not an error: a stream buffer may already hold
    /// the start of the next PDU.
    ///
    /// # Errors
    /// Returns the latched failure, or a `ProtocolViolation` if a
    /// constructed value was left open.
    pub fn finish(&mut self) -> Result<usize, CodecFailure> {
        if self.state.failure().is_none() && !self.state.frames().is_empty() {
            let open = self.state.frames().depth();
            let offset = self.cursor;
            self.state.fail(
                CodecError::ProtocolViolation(format!(
                    "{} constructed value(s) left open",
                    open
                )),
                "",
                offset,
            );
        }
        match self.state.failure() {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.cursor),
        }
    }

    /// Start over on a new input with the same arena, configuration and
    /// charset
    pub fn reset(&mut self, input: &'a [u8]) {
        self.state.reset();
        self.input = input;
        self.cursor = 0;
        let max_message_size = self.state.config().max_message_size;
        if input.len() > max_message_size {
            self.state.fail(
                CodecError::ProtocolViolation(format!(
                    "message of {} bytes exceeds limit {}",
                    input.len(),
                    max_message_size
                )),
                "",
                0,
            );
        }
    }

    /// End of the innermost definite value, and whether one exists
    fn bound(&self) -> (usize, bool) {
        match self.state.frames().nearest_definite_end() {
            Some(end) => (end, true),
            None => (self.input.len(), false),
        }
    }

    /// Running out of bytes inside a definite value is a structural error;
    /// at top level it means the input is incomplete
    fn overrun(enclosed: bool, what: String) -> CodecError {
        if enclosed {
            CodecError::ProtocolViolation(format!("{} (exceeds enclosing value)", what))
        } else {
            CodecError::Truncated(what)
        }
    }

    fn bounded(error: CodecError, enclosed: bool) -> CodecError {
        match error {
            CodecError::Truncated(what) => Self::overrun(enclosed, what),
            other => other,
        }
    }

    /// Whether an end-of-contents marker starts at the cursor and lies
    /// wholly before `bound`
    fn at_end_of_contents(&self, bound: usize) -> bool {
        self.input
            .get(self.cursor..bound)
            .is_some_and(|window| window.starts_with(&[0x00, 0x00]))
    }

    fn has_more(&self) -> bool {
        let (bound, _) = self.bound();
        if self.cursor >= bound {
            return false;
        }
        match self.state.frames().top() {
            Some(frame) if frame.is_indefinite() => !self.at_end_of_contents(bound),
            _ => true,
        }
    }

    /// Identifier of the next element, without consuming it
    fn peek_header(&self) -> CodecResult<Option<BerTag>> {
        if !self.has_more() {
            return Ok(None);
        }
        let (bound, enclosed) = self.bound();
        BerTag::decode(&self.input[self.cursor..bound])
            .map(|(tag, _)| Some(tag))
            .map_err(|e| Self::bounded(e, enclosed))
    }

    /// Consume identifier and length octets
    ///
    /// Returns the tag, the length, and the offset of the length octets. A
    /// definite length is checked against `bound` before it is trusted.
    fn read_header(
        &mut self,
        bound: usize,
        enclosed: bool,
    ) -> CodecResult<(BerTag, BerLength, usize)> {
        let window = &self.input[self.cursor..bound];
        let (tag, tag_len) = BerTag::decode(window).map_err(|e| Self::bounded(e, enclosed))?;
        let (length, len_len) =
            BerLength::decode(&window[tag_len..]).map_err(|e| Self::bounded(e, enclosed))?;
        let header = tag_len + len_len;
        if let BerLength::Definite(n) = length {
            let available = window.len() - header;
            if n > available {
                return Err(Self::overrun(
                    enclosed,
                    format!(
                        "{:?} declares {} content bytes, {} available",
                        tag, n, available
                    ),
                ));
            }
        }
        let length_offset = self.cursor + tag_len;
        self.cursor += header;
        Ok((tag, length, length_offset))
    }

    fn read_primitive<P: Primitive<'a>>(&mut self) -> CodecResult<P> {
        let (bound, enclosed) = self.bound();
        let (tag, length, _) = self.read_header(bound, enclosed)?;
        let content = if tag.is_constructed() {
            if !P::SEGMENTABLE {
                return Err(CodecError::ProtocolViolation(format!(
                    "{} must use the primitive form",
                    P::TYPE_NAME
                )));
            }
            self.read_segments(length, P::TAG)?
        } else {
            let Some(n) = length.definite() else {
                return Err(CodecError::ProtocolViolation(format!(
                    "primitive {} with indefinite length",
                    P::TYPE_NAME
                )));
            };
            let input = self.input;
            let content = &input[self.cursor..self.cursor + n];
            self.cursor += n;
            content
        };
        let charset = self.state.charset().map(|c| c as &dyn CharsetConverter);
        P::decode_content(content, self.arena, charset)
    }

    /// Reassemble a constructed (segmented) string into one arena slice
    ///
    /// Segments are UNIVERSAL OCTET STRING or the string type's own tag and
    /// may themselves be constructed. Nesting is walked with an explicit
    /// stack bounded by `max_depth`.
    fn read_segments(&mut self, length: BerLength, number: u32) -> CodecResult<&'a [u8]> {
        let input = self.input;
        let outer = self.bound();
        let max_depth = self.state.frames().max_depth();
        let mut collected = BumpVec::new_in(self.arena.bump());
        let mut ends: Vec<Option<usize>> = vec![length.definite().map(|n| self.cursor + n)];

        while let Some(&end) = ends.last() {
            let (bound, enclosed) = ends
                .iter()
                .rev()
                .find_map(|end| *end)
                .map_or(outer, |end| (end, true));
            match end {
                Some(end) if self.cursor == end => {
                    ends.pop();
                    continue;
                }
                None if self.at_end_of_contents(bound) => {
                    self.cursor += 2;
                    ends.pop();
                    continue;
                }
                _ => {}
            }

            if self.cursor >= bound {
                return Err(Self::overrun(
                    enclosed,
                    "segmented string without end-of-contents".to_string(),
                ));
            }

            let (tag, segment_length, _) = self.read_header(bound, enclosed)?;
            let segment_tag = tag.number() == universal::OCTET_STRING || tag.number() == number;
            if tag.class() != BerTagClass::Universal || !segment_tag {
                return Err(CodecError::ProtocolViolation(format!(
                    "unexpected {:?} inside a segmented string",
                    tag
                )));
            }

            if tag.is_constructed() {
                if ends.len() >= max_depth {
                    return Err(CodecError::ProtocolViolation(format!(
                        "segment nesting exceeds {} levels",
                        max_depth
                    )));
                }
                ends.push(segment_length.definite().map(|n| self.cursor + n));
            } else {
                let Some(n) = segment_length.definite() else {
                    return Err(CodecError::ProtocolViolation(
                        "primitive segment with indefinite length".to_string(),
                    ));
                };
                collected.extend_from_slice(&input[self.cursor..self.cursor + n]);
                self.cursor += n;
            }
        }

        Ok(collected.into_bump_slice())
    }

    fn open(&mut self, name: &str) -> CodecResult<()> {
        let (bound, enclosed) = self.bound();
        let (tag, length, length_offset) = self.read_header(bound, enclosed)?;
        if !tag.is_constructed() {
            return Err(CodecError::ProtocolViolation(format!(
                "expected a constructed encoding, found primitive {:?}",
                tag
            )));
        }
        log::trace!("open `{}` at {}: {:?}", name, self.cursor, length);
        self.state.frames_mut().push(Frame {
            base_offset: self.cursor,
            length_field_offset: length_offset,
            declared_length: length,
            reserved_width: 0,
            name: name.to_string(),
        })
    }

    fn close(&mut self) -> CodecResult<()> {
        let frame = self.state.frames_mut().pop()?;
        match frame.declared_length {
            BerLength::Definite(declared) => {
                let consumed = self.cursor - frame.base_offset;
                if consumed != declared {
                    return Err(CodecError::ProtocolViolation(format!(
                        "`{}` declares {} content bytes but {} were decoded",
                        frame.name, declared, consumed
                    )));
                }
            }
            BerLength::Indefinite => {
                let (bound, enclosed) = self.bound();
                let Some(window) = self.input.get(self.cursor..bound) else {
                    return Err(CodecError::ProtocolViolation(format!(
                        "`{}` runs past the end of its enclosing value",
                        frame.name
                    )));
                };
                if window.starts_with(&[0x00, 0x00]) {
                    self.cursor += 2;
                } else if window.len() < 2 && window.iter().all(|b| *b == 0) {
                    return Err(Self::overrun(
                        enclosed,
                        format!("`{}` ends before its end-of-contents", frame.name),
                    ));
                } else {
                    return Err(CodecError::ProtocolViolation(format!(
                        "`{}` has unexpected content before its end-of-contents",
                        frame.name
                    )));
                }
            }
        }
        log::trace!("closed `{}` at {}", frame.name, self.cursor);
        Ok(())
    }
}

impl<'a> Coder<'a> for BerDecoder<'a> {
    fn direction(&self) -> Direction {
        Direction::Decode
    }

    fn state(&self) -> &CoderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoderState {
        &mut self.state
    }

    fn offset(&self) -> usize {
        self.cursor
    }

    fn arena(&self) -> Option<&'a Arena> {
        Some(self.arena)
    }

    fn primitive<P: Primitive<'a>>(
        &mut self,
        value: &mut Option<P>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        let (class, number) = self.state.resolve_tag(BerTagClass::Universal, P::TAG);
        let matched = match self.peek_header() {
            Ok(Some(tag)) => tag.matches(class, number),
            Ok(None) => false,
            Err(e) => return Err(self.fail(e, name)),
        };
        if !matched {
            return self.missing(opt, name);
        }
        match self.read_primitive::<P>() {
            Ok(decoded) => {
                *value = Some(decoded);
                Ok(true)
            }
            Err(e) => Err(self.fail(e, name)),
        }
    }

    /// Capture the next complete TLV, whatever its tag
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
        if !self.has_more() {
            return self.missing(opt, name);
        }
        let (bound, enclosed) = self.bound();
        let input = self.input;
        let window = &input[self.cursor..bound];
        match tlv_extent(window, self.state.config().max_depth) {
            Ok(Some(n)) => {
                *value = Some(&window[..n]);
                self.cursor += n;
                Ok(true)
            }
            Ok(None) => {
                let error = Self::overrun(enclosed, "incomplete ANY value".to_string());
                Err(self.fail(error, name))
            }
            Err(e) => Err(self.fail(e, name)),
        }
    }

    fn constructed_begin(
        &mut self,
        _present: bool,
        class: BerTagClass,
        number: u32,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.state.check()?;
        let (class, number) = self.state.resolve_tag(class, number);
        let matched = match self.peek_header() {
            Ok(Some(tag)) => tag.matches(class, number),
            Ok(None) => false,
            Err(e) => return Err(self.fail(e, name)),
        };
        if !matched {
            return self.missing(opt, name);
        }
        match self.open(name) {
            Ok(()) => Ok(true),
            Err(e) => Err(self.fail(e, name)),
        }
    }

    fn constructed_more(&mut self) -> CodecResult<bool> {
        self.state.check()?;
        Ok(self.has_more())
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
        self.peek_header().map_err(|e| self.fail(e, ""))
    }
}
