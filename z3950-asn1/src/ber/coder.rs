//! Tri-modal coder trait
//!
//! One hand-written (or generated) function per ASN.1 type drives all three
//! directions:
//!
//! ```rust,ignore
//! fn close<'a, C: Coder<'a>>(c: &mut C, v: &mut Option<Close<'a>>, opt: bool, name: &str) -> CodecResult<bool> {
//!     sequence(c, v, opt, name, |c, close| {
//!         implicit(c, BerTagClass::ContextSpecific, 2, &mut close.reference_id, true, "referenceId", C::octet_string)?;
//!         implicit(c, BerTagClass::ContextSpecific, 211, &mut close.close_reason, false, "closeReason", C::integer)?;
//!         Ok(())
//!     })
//! }
//! ```
//!
//! # Slot Protocol
//!
//! Every element codec takes `&mut Option<T>`:
//! - **Encode / Print**: `Some` is emitted, `None` means absent
//! - **Decode**: the slot is filled when the element is present
//!
//! and returns `Ok(true)` when the element was coded, `Ok(false)` when an
//! optional element is absent, or the latched error. Once an error is
//! latched every later call returns it without touching the buffer.

use super::arena::Arena;
use super::primitive::Primitive;
use super::state::{CoderState, SharedConverter};
use super::types::{BerTag, BerTagClass};
use z3950_core::datatypes::{
    BitString, Enumerated, GeneralString, GeneralizedTime, Oid, VisibleString,
};
use z3950_core::error::{CodecError, CodecFailure, CodecResult};

/// Which of the three modes a coder runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encode,
    Decode,
    Print,
}

/// Coder Context shared by the generic combinators
///
/// Implemented by [`BerEncoder`](super::BerEncoder),
/// [`BerDecoder`](super::BerDecoder) and [`BerPrinter`](super::BerPrinter).
pub trait Coder<'a> {
    fn direction(&self) -> Direction;

    fn state(&self) -> &CoderState;

    fn state_mut(&mut self) -> &mut CoderState;

    /// Byte offset for error reports: write cursor, read cursor, or the
    /// length of the printed text
    fn offset(&self) -> usize;

    /// Arena for decoded slices; `None` unless decoding
    fn arena(&self) -> Option<&'a Arena>;

    /// Code one primitive element
    fn primitive<P: Primitive<'a>>(
        &mut self,
        value: &mut Option<P>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool>;

    /// Code one complete TLV without interpreting it (ASN.1 ANY)
    ///
    /// The TLV carries its own tag, so a pending IMPLICIT override is an
    /// `InvalidValue`.
    fn any(&mut self, value: &mut Option<&'a [u8]>, opt: bool, name: &str) -> CodecResult<bool>;

    /// Open a constructed value
    ///
    /// `present` says whether the caller has a value to emit; decoders
    /// ignore it and look at the input instead. Returns `Ok(false)` for an
    /// absent optional value, in which case no frame is opened.
    fn constructed_begin(
        &mut self,
        present: bool,
        class: BerTagClass,
        number: u32,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool>;

    /// Whether the innermost open value has more content to decode
    fn constructed_more(&mut self) -> CodecResult<bool>;

    /// Close the innermost constructed value
    fn constructed_end(&mut self) -> CodecResult<()>;

    /// Tag of the next element without consuming it; `None` at the end of
    /// the enclosing value or outside decode mode
    fn peek_tag(&mut self) -> CodecResult<Option<BerTag>>;

    /// Latch `error` at the current offset
    fn fail(&mut self, error: CodecError, name: &str) -> CodecError {
        let offset = self.offset();
        self.state_mut().fail(error, name, offset)
    }

    /// Apply the optionality policy to an absent element
    fn missing(&mut self, opt: bool, name: &str) -> CodecResult<bool> {
        let offset = self.offset();
        self.state_mut().missing(opt, name, offset)
    }

    /// The latched failure, if any
    fn failure(&self) -> Option<&CodecFailure> {
        self.state().failure()
    }

    /// Reserve `width` length octets for the next constructed value
    fn set_length_width(&mut self, width: u8) {
        self.state_mut().set_length_width(width);
    }

    /// Restrict the next untagged choice to one arm
    fn set_choice_bias(&mut self, id: u32) {
        self.state_mut().set_choice_bias(id);
    }

    fn set_charset(&mut self, converter: Option<SharedConverter>) {
        self.state_mut().set_charset(converter);
    }

    fn integer(&mut self, value: &mut Option<i64>, opt: bool, name: &str) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn boolean(&mut self, value: &mut Option<bool>, opt: bool, name: &str) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn null(&mut self, value: &mut Option<()>, opt: bool, name: &str) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn oid(&mut self, value: &mut Option<Oid<'a>>, opt: bool, name: &str) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn octet_string(
        &mut self,
        value: &mut Option<&'a [u8]>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn bit_string(
        &mut self,
        value: &mut Option<BitString<'a>>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn enumerated(
        &mut self,
        value: &mut Option<Enumerated>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn visible_string(
        &mut self,
        value: &mut Option<VisibleString<'a>>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn general_string(
        &mut self,
        value: &mut Option<GeneralString<'a>>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }

    fn generalized_time(
        &mut self,
        value: &mut Option<GeneralizedTime<'a>>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        self.primitive(value, opt, name)
    }
}
