//! CHOICE dispatch over a static arm table
//!
//! A CHOICE is a Rust enum implementing [`Choice`]. Its `ARMS` table lists
//! the alternatives in schema order with their tagging, and `code_arm`
//! codes the member of one arm:
//!
//! ```rust,ignore
//! enum Addinfo<'a> { V2(VisibleString<'a>), V3(GeneralString<'a>) }
//!
//! impl<'a> Choice<'a> for Addinfo<'a> {
//!     const ARMS: &'static [Arm] = &[Arm::untagged(0, "v2Addinfo"), Arm::untagged(1, "v3Addinfo")];
//!
//!     fn which(&self) -> u32 {
//!         match self { Addinfo::V2(_) => 0, Addinfo::V3(_) => 1 }
//!     }
//!
//!     fn code_arm<C: Coder<'a>>(c: &mut C, arm: &Arm, value: &mut Option<Self>, opt: bool) -> CodecResult<bool> {
//!         match arm.id {
//!             0 => member(c, value, opt, arm.name, |v| match v { Addinfo::V2(s) => Some(*s), _ => None }, Addinfo::V2, C::visible_string),
//!             _ => member(c, value, opt, arm.name, |v| match v { Addinfo::V3(s) => Some(*s), _ => None }, Addinfo::V3, C::general_string),
//!         }
//!     }
//! }
//! ```
//!
//! # Decode Resolution
//!
//! - tagged arms match on the (class, number) of the next identifier,
//!   peeked once
//! - untagged arms are tried in table order with the member codec in
//!   optional mode; the first one that accepts the next element wins
//! - a bias set with [`Coder::set_choice_bias`] restricts the next
//!   resolution to the one arm with that id
//!
//! Encode and print look the arm up by [`Choice::which`] and never scan.

use super::coder::{Coder, Direction};
use super::types::BerTagClass;
use std::collections::HashSet;
use z3950_core::error::{CodecError, CodecResult};

/// How an arm's member is tagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// The member carries its own tag
    None,
    /// The arm's tag replaces the member's tag
    Implicit,
    /// The arm's tag wraps the member's encoding
    Explicit,
}

/// One alternative of a CHOICE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arm {
    pub mode: TagMode,
    pub class: BerTagClass,
    pub number: u32,
    /// Discriminant reported by [`Choice::which`]
    pub id: u32,
    pub name: &'static str,
}

impl Arm {
    pub const fn untagged(id: u32, name: &'static str) -> Self {
        Self {
            mode: TagMode::None,
            class: BerTagClass::Universal,
            number: 0,
            id,
            name,
        }
    }

    pub const fn implicit(class: BerTagClass, number: u32, id: u32, name: &'static str) -> Self {
        Self {
            mode: TagMode::Implicit,
            class,
            number,
            id,
            name,
        }
    }

    pub const fn explicit(class: BerTagClass, number: u32, id: u32, name: &'static str) -> Self {
        Self {
            mode: TagMode::Explicit,
            class,
            number,
            id,
            name,
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.mode != TagMode::None
    }
}

/// A CHOICE type
pub trait Choice<'a>: Sized {
    /// Alternatives in schema order
    const ARMS: &'static [Arm];

    /// Arm id of this value
    fn which(&self) -> u32;

    /// Code the member of `arm`
    ///
    /// Arm tagging has already been applied; decode stores the member
    /// wrapped in the matching variant. See [`member`].
    fn code_arm<C: Coder<'a>>(
        c: &mut C,
        arm: &Arm,
        value: &mut Option<Self>,
        opt: bool,
    ) -> CodecResult<bool>;
}

/// Check an arm table: unique ids and unique tags among tagged arms
pub fn validate_arms(arms: &[Arm]) -> CodecResult<()> {
    let mut ids = HashSet::new();
    let mut tags = HashSet::new();
    for arm in arms {
        if !ids.insert(arm.id) {
            return Err(CodecError::InvalidValue(format!(
                "arm `{}` reuses id {}",
                arm.name, arm.id
            )));
        }
        if arm.is_tagged() && !tags.insert((arm.class, arm.number)) {
            return Err(CodecError::InvalidValue(format!(
                "arm `{}` reuses tag [{} {}]",
                arm.name,
                arm.class.label(),
                arm.number
            )));
        }
    }
    Ok(())
}

/// Code one CHOICE value
///
/// An absent or unmatched CHOICE follows the usual optionality policy. An
/// encode or print value whose discriminant has no arm is `InvalidValue`.
pub fn choice<'a, C, T>(c: &mut C, value: &mut Option<T>, opt: bool, name: &str) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Choice<'a>,
{
    c.state().check()?;
    if c.state().has_tag_override() {
        c.state_mut().clear_tag_override();
        let error = CodecError::InvalidValue(format!(
            "CHOICE `{}` cannot be implicitly tagged",
            name
        ));
        return Err(c.fail(error, name));
    }
    let bias = c.state_mut().take_choice_bias();

    if c.direction() == Direction::Decode {
        return resolve(c, value, opt, name, bias);
    }

    let Some(which) = value.as_ref().map(T::which) else {
        return c.missing(opt, name);
    };
    let Some(arm) = T::ARMS.iter().find(|arm| arm.id == which) else {
        let error = CodecError::InvalidValue(format!(
            "`{}` has no arm with id {}",
            name, which
        ));
        return Err(c.fail(error, name));
    };
    dispatch(c, arm, value, false)
}

fn resolve<'a, C, T>(
    c: &mut C,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    bias: Option<u32>,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Choice<'a>,
{
    let next = if T::ARMS.iter().any(Arm::is_tagged) {
        c.peek_tag()?
    } else {
        None
    };

    let candidates = T::ARMS
        .iter()
        .filter(|arm| bias.is_none_or(|id| arm.id == id));
    for arm in candidates {
        if arm.is_tagged() {
            if next.is_some_and(|tag| tag.matches(arm.class, arm.number)) {
                log::trace!("`{}` resolved to tagged arm `{}`", name, arm.name);
                return dispatch(c, arm, value, false);
            }
        } else if T::code_arm(c, arm, value, true)? {
            log::trace!("`{}` resolved to untagged arm `{}`", name, arm.name);
            return Ok(true);
        }
    }

    log::trace!("`{}`: no arm matches {:?}", name, next);
    c.missing(opt, name)
}

fn dispatch<'a, C, T>(c: &mut C, arm: &Arm, value: &mut Option<T>, opt: bool) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Choice<'a>,
{
    match arm.mode {
        TagMode::None => T::code_arm(c, arm, value, opt),
        TagMode::Implicit => {
            c.state_mut().set_tag_override(arm.class, arm.number);
            let result = T::code_arm(c, arm, value, opt);
            c.state_mut().clear_tag_override();
            result
        }
        TagMode::Explicit => {
            if c.direction() == Direction::Print {
                return T::code_arm(c, arm, value, opt);
            }
            if !c.constructed_begin(value.is_some(), arm.class, arm.number, opt, arm.name)? {
                return Ok(false);
            }
            T::code_arm(c, arm, value, false)?;
            c.constructed_end()?;
            Ok(true)
        }
    }
}

/// Code the member of one arm through a projection and an injection
///
/// `project` extracts the member from a value of the matching variant
/// (encode and print); `inject` wraps a decoded member back into the
/// variant.
pub fn member<'a, C, T, M, P, I, F>(
    c: &mut C,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    project: P,
    inject: I,
    codec: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    P: FnOnce(&T) -> Option<M>,
    I: FnOnce(M) -> T,
    F: FnOnce(&mut C, &mut Option<M>, bool, &str) -> CodecResult<bool>,
{
    let mut slot = value.as_ref().and_then(project);
    let present = codec(c, &mut slot, opt, name)?;
    if present && c.direction() == Direction::Decode {
        if let Some(decoded) = slot {
            *value = Some(inject(decoded));
        }
    }
    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::{Arena, BerDecoder, BerEncoder, BerPrinter};
    use z3950_core::error::ErrorKind;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Term<'a> {
        Number(i64),
        Text(&'a [u8]),
    }

    impl<'a> Choice<'a> for Term<'a> {
        const ARMS: &'static [Arm] = &[Arm::untagged(0, "number"), Arm::untagged(1, "text")];

        fn which(&self) -> u32 {
            match self {
                Term::Number(_) => 0,
                Term::Text(_) => 1,
            }
        }

        fn code_arm<C: Coder<'a>>(
            c: &mut C,
            arm: &Arm,
            value: &mut Option<Self>,
            opt: bool,
        ) -> CodecResult<bool> {
            match arm.id {
                0 => member(
                    c,
                    value,
                    opt,
                    arm.name,
                    |v| match v {
                        Term::Number(n) => Some(*n),
                        _ => None,
                    },
                    Term::Number,
                    C::integer,
                ),
                _ => member(
                    c,
                    value,
                    opt,
                    arm.name,
                    |v| match v {
                        Term::Text(t) => Some(*t),
                        _ => None,
                    },
                    Term::Text,
                    C::octet_string,
                ),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Reason {
        Code(i64),
        Flag(bool),
    }

    impl<'a> Choice<'a> for Reason {
        const ARMS: &'static [Arm] = &[
            Arm::implicit(BerTagClass::ContextSpecific, 1, 0, "code"),
            Arm::explicit(BerTagClass::ContextSpecific, 2, 1, "flag"),
        ];

        fn which(&self) -> u32 {
            match self {
                Reason::Code(_) => 0,
                Reason::Flag(_) => 1,
            }
        }

        fn code_arm<C: Coder<'a>>(
            c: &mut C,
            arm: &Arm,
            value: &mut Option<Self>,
            opt: bool,
        ) -> CodecResult<bool> {
            match arm.id {
                0 => member(
                    c,
                    value,
                    opt,
                    arm.name,
                    |v| match v {
                        Reason::Code(n) => Some(*n),
                        _ => None,
                    },
                    Reason::Code,
                    C::integer,
                ),
                _ => member(
                    c,
                    value,
                    opt,
                    arm.name,
                    |v| match v {
                        Reason::Flag(f) => Some(*f),
                        _ => None,
                    },
                    Reason::Flag,
                    C::boolean,
                ),
            }
        }
    }

    fn decode_term<'a>(arena: &'a Arena, input: &'a [u8]) -> Option<Term<'a>> {
        let mut decoder = BerDecoder::new(arena, input);
        let mut value = None;
        choice(&mut decoder, &mut value, false, "term").unwrap();
        value
    }

    #[test]
    fn test_untagged_arms_are_disjoint() {
        let arena = Arena::new();
        assert_eq!(decode_term(&arena, &[0x02, 0x01, 0x2A]), Some(Term::Number(42)));
        assert_eq!(decode_term(&arena, &[0x04, 0x01, 0x2A]), Some(Term::Text(&[0x2A])));
    }

    #[test]
    fn test_tagged_arms() {
        let mut encoder = BerEncoder::new();
        choice(&mut encoder, &mut Some(Reason::Code(3)), false, "reason").unwrap();
        choice(&mut encoder, &mut Some(Reason::Flag(true)), false, "reason").unwrap();
        let bytes = encoder.finish().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x81, 0x01, 0x03, 0xA2, 0x03, 0x01, 0x01, 0xFF]
        );

        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &bytes);
        let (mut first, mut second) = (None, None);
        choice(&mut decoder, &mut first, false, "reason").unwrap();
        choice(&mut decoder, &mut second, false, "reason").unwrap();
        assert_eq!(first, Some(Reason::Code(3)));
        assert_eq!(second, Some(Reason::Flag(true)));
    }

    #[test]
    fn test_unknown_tag_follows_optionality() {
        let arena = Arena::new();
        let input = [0x83, 0x01, 0x00];
        let mut decoder = BerDecoder::new(&arena, &input);
        let mut value: Option<Reason> = None;
        assert!(!choice(&mut decoder, &mut value, true, "reason").unwrap());
        let err = choice(&mut decoder, &mut value, false, "reason").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
    }

    #[test]
    fn test_bias_restricts_trial() {
        let arena = Arena::new();
        let input = [0x02, 0x01, 0x01];
        let mut decoder = BerDecoder::new(&arena, &input);
        decoder.set_choice_bias(1);
        let mut value: Option<Term> = None;
        assert!(!choice(&mut decoder, &mut value, true, "term").unwrap());
        // bias is one-shot
        assert!(choice(&mut decoder, &mut value, false, "term").unwrap());
        assert_eq!(value, Some(Term::Number(1)));
    }

    #[test]
    fn test_implicit_choice_rejected() {
        let mut encoder = BerEncoder::new();
        encoder
            .state_mut()
            .set_tag_override(BerTagClass::ContextSpecific, 9);
        let err = choice(&mut encoder, &mut Some(Reason::Code(1)), false, "r").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_print_choice() {
        let mut printer = BerPrinter::new();
        choice(&mut printer, &mut Some(Reason::Flag(false)), false, "reason").unwrap();
        assert_eq!(printer.finish().unwrap(), "flag: FALSE\n");
    }

    #[test]
    fn test_validate_arms() {
        assert!(validate_arms(Reason::ARMS).is_ok());
        assert!(validate_arms(Term::ARMS).is_ok());
        let clash = [
            Arm::implicit(BerTagClass::ContextSpecific, 1, 0, "a"),
            Arm::explicit(BerTagClass::ContextSpecific, 1, 1, "b"),
        ];
        assert!(validate_arms(&clash).is_err());
        let same_id = [Arm::untagged(0, "a"), Arm::untagged(0, "b")];
        assert!(validate_arms(&same_id).is_err());
    }
}
