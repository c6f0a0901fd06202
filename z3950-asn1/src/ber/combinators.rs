//! Sequence, collection and tagging combinators
//!
//! Element codecs share one shape,
//! `FnOnce(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>`, so
//! `C::integer`, a generated type codec, or a closure can be passed
//! wherever an inner codec is expected.

use super::coder::{Coder, Direction};
use super::types::{universal, BerTagClass};
use bumpalo::collections::Vec as BumpVec;
use z3950_core::error::{CodecError, CodecResult};

/// A user-defined constructed type with the given tag
///
/// `members` receives the value being encoded or printed, or a
/// `T::default()` that decode fills in.
pub fn constructed<'a, C, T, F>(
    c: &mut C,
    value: &mut Option<T>,
    class: BerTagClass,
    number: u32,
    opt: bool,
    name: &str,
    members: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Default,
    F: FnOnce(&mut C, &mut T) -> CodecResult<()>,
{
    if !c.constructed_begin(value.is_some(), class, number, opt, name)? {
        return Ok(false);
    }
    if c.direction() == Direction::Decode {
        *value = Some(T::default());
    }
    let inner = value.get_or_insert_with(T::default);
    members(c, inner)?;
    c.constructed_end()?;
    Ok(true)
}

/// UNIVERSAL SEQUENCE
pub fn sequence<'a, C, T, F>(
    c: &mut C,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    members: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Default,
    F: FnOnce(&mut C, &mut T) -> CodecResult<()>,
{
    constructed(c, value, BerTagClass::Universal, universal::SEQUENCE, opt, name, members)
}

/// UNIVERSAL SET
///
/// Members are coded in the order the schema lists them; decode expects
/// that same order.
pub fn set<'a, C, T, F>(
    c: &mut C,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    members: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Default,
    F: FnOnce(&mut C, &mut T) -> CodecResult<()>,
{
    constructed(c, value, BerTagClass::Universal, universal::SET, opt, name, members)
}

/// UNIVERSAL SEQUENCE OF
///
/// Decode collects the elements into an arena slice until the enclosing
/// value reports no more content; encode and print walk the slice.
pub fn sequence_of<'a, C, T, F>(
    c: &mut C,
    list: &mut Option<&'a [T]>,
    opt: bool,
    name: &str,
    element: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Clone + 'a,
    F: FnMut(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    collection_of(c, list, universal::SEQUENCE, opt, name, element)
}

/// UNIVERSAL SET OF
pub fn set_of<'a, C, T, F>(
    c: &mut C,
    list: &mut Option<&'a [T]>,
    opt: bool,
    name: &str,
    element: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Clone + 'a,
    F: FnMut(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    collection_of(c, list, universal::SET, opt, name, element)
}

fn collection_of<'a, C, T, F>(
    c: &mut C,
    list: &mut Option<&'a [T]>,
    number: u32,
    opt: bool,
    name: &str,
    mut element: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    T: Clone + 'a,
    F: FnMut(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    if !c.constructed_begin(list.is_some(), BerTagClass::Universal, number, opt, name)? {
        return Ok(false);
    }

    match c.direction() {
        Direction::Decode => {
            let Some(arena) = c.arena() else {
                let error = CodecError::InvalidValue("decoder without an arena".to_string());
                return Err(c.fail(error, name));
            };
            let mut items = BumpVec::new_in(arena.bump());
            while c.constructed_more()? {
                let before = c.offset();
                let mut slot = None;
                element(c, &mut slot, false, name)?;
                match slot {
                    Some(item) if c.offset() > before => items.push(item),
                    _ => {
                        let error = CodecError::ProtocolViolation(format!(
                            "element of `{}` consumed no input",
                            name
                        ));
                        return Err(c.fail(error, name));
                    }
                }
            }
            *list = Some(items.into_bump_slice());
        }
        Direction::Encode | Direction::Print => {
            let items: &'a [T] = list.unwrap_or(&[]);
            for item in items {
                let mut slot = Some(item.clone());
                element(c, &mut slot, false, name)?;
            }
        }
    }

    c.constructed_end()?;
    Ok(true)
}

/// `[class number] IMPLICIT`: the inner codec's own tag is replaced
///
/// The override is one-shot; it is cleared afterwards even if the inner
/// codec never consumed it.
pub fn implicit<'a, C, T, F>(
    c: &mut C,
    class: BerTagClass,
    number: u32,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    inner: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    F: FnOnce(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    c.state().check()?;
    c.state_mut().set_tag_override(class, number);
    let result = inner(c, value, opt, name);
    c.state_mut().clear_tag_override();
    result
}

/// `[class number] EXPLICIT`: a constructed wrapper around the inner
/// codec's own encoding
pub fn explicit<'a, C, T, F>(
    c: &mut C,
    class: BerTagClass,
    number: u32,
    value: &mut Option<T>,
    opt: bool,
    name: &str,
    inner: F,
) -> CodecResult<bool>
where
    C: Coder<'a>,
    F: FnOnce(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    if c.direction() == Direction::Print {
        return inner(c, value, opt, name);
    }
    if !c.constructed_begin(value.is_some(), class, number, opt, name)? {
        return Ok(false);
    }
    inner(c, value, false, name)?;
    c.constructed_end()?;
    Ok(true)
}

/// Code a mandatory member held without `Option`
pub fn required<'a, C, T, F>(c: &mut C, field: &mut T, name: &str, codec: F) -> CodecResult<()>
where
    C: Coder<'a>,
    T: Clone,
    F: FnOnce(&mut C, &mut Option<T>, bool, &str) -> CodecResult<bool>,
{
    let mut slot = Some(field.clone());
    codec(c, &mut slot, false, name)?;
    if let Some(decoded) = slot {
        *field = decoded;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::{Arena, BerDecoder, BerEncoder, BerPrinter};
    use z3950_core::error::ErrorKind;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pair {
        id: i64,
        flag: Option<bool>,
    }

    fn pair<'a, C: Coder<'a>>(
        c: &mut C,
        value: &mut Option<Pair>,
        opt: bool,
        name: &str,
    ) -> CodecResult<bool> {
        sequence(c, value, opt, name, |c, pair| {
            required(c, &mut pair.id, "id", C::integer)?;
            implicit(c, BerTagClass::ContextSpecific, 1, &mut pair.flag, true, "flag", C::boolean)?;
            Ok(())
        })
    }

    #[test]
    fn test_sequence_round_trip() {
        let mut encoder = BerEncoder::new();
        let mut value = Some(Pair { id: 3, flag: Some(false) });
        pair(&mut encoder, &mut value, false, "pair").unwrap();
        let bytes = encoder.finish().unwrap();
        assert_eq!(bytes.as_ref(), &[0x30, 0x06, 0x02, 0x01, 0x03, 0x81, 0x01, 0x00]);

        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &bytes);
        let mut decoded = None;
        pair(&mut decoder, &mut decoded, false, "pair").unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_optional_member_absent() {
        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &[0x30, 0x03, 0x02, 0x01, 0x09]);
        let mut decoded = None;
        pair(&mut decoder, &mut decoded, false, "pair").unwrap();
        assert_eq!(decoded, Some(Pair { id: 9, flag: None }));
    }

    #[test]
    fn test_implicit_override_is_one_shot() {
        let mut encoder = BerEncoder::new();
        // the inner codec never runs, so the override must not leak
        implicit(
            &mut encoder,
            BerTagClass::ContextSpecific,
            7,
            &mut None::<i64>,
            true,
            "skipped",
            |_, _, _, _| Ok(false),
        )
        .unwrap();
        encoder.integer(&mut Some(1), false, "n").unwrap();
        assert_eq!(encoder.as_bytes(), &[0x02, 0x01, 0x01]);
    }

    #[test]
    fn test_explicit_wraps() {
        let mut encoder = BerEncoder::new();
        explicit(
            &mut encoder,
            BerTagClass::ContextSpecific,
            0,
            &mut Some(5i64),
            false,
            "n",
            BerEncoder::integer,
        )
        .unwrap();
        assert_eq!(encoder.as_bytes(), &[0xA0, 0x03, 0x02, 0x01, 0x05]);

        let arena = Arena::new();
        let bytes = encoder.finish().unwrap();
        let mut decoder = BerDecoder::new(&arena, &bytes);
        let mut n = None;
        explicit(&mut decoder, BerTagClass::ContextSpecific, 0, &mut n, false, "n", BerDecoder::integer)
            .unwrap();
        assert_eq!(n, Some(5));
    }

    #[test]
    fn test_sequence_of_round_trip() {
        let ids = [1i64, 200, -3];
        let mut encoder = BerEncoder::new();
        let mut list = Some(&ids[..]);
        sequence_of(&mut encoder, &mut list, false, "ids", BerEncoder::integer).unwrap();
        let bytes = encoder.finish().unwrap();

        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &bytes);
        let mut decoded = None;
        sequence_of(&mut decoder, &mut decoded, false, "ids", BerDecoder::integer).unwrap();
        assert_eq!(decoded, Some(&ids[..]));
    }

    #[test]
    fn test_empty_sequence_of() {
        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &[0x30, 0x00]);
        let mut decoded: Option<&[i64]> = None;
        sequence_of(&mut decoder, &mut decoded, false, "ids", BerDecoder::integer).unwrap();
        assert_eq!(decoded, Some(&[][..]));
    }

    #[test]
    fn test_wrong_element_type_in_set_of() {
        let arena = Arena::new();
        let mut decoder = BerDecoder::new(&arena, &[0x31, 0x02, 0x05, 0x00]);
        let mut decoded: Option<&[i64]> = None;
        let err = set_of(&mut decoder, &mut decoded, false, "ids", BerDecoder::integer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
    }

    #[test]
    fn test_implicit_any_is_rejected() {
        let raw = [0x02, 0x01, 0x05];
        let mut encoder = BerEncoder::new();
        let err = implicit(
            &mut encoder,
            BerTagClass::ContextSpecific,
            4,
            &mut Some(&raw[..]),
            false,
            "raw",
            BerEncoder::any,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(encoder.finish().unwrap_err().element_path, "raw");

        let mut printer = BerPrinter::new();
        let err = implicit(
            &mut printer,
            BerTagClass::ContextSpecific,
            4,
            &mut Some(&raw[..]),
            false,
            "raw",
            BerPrinter::any,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(printer.output(), "");
    }

    #[test]
    fn test_print_sequence() {
        let mut printer = BerPrinter::new();
        let mut value = Some(Pair { id: 3, flag: None });
        pair(&mut printer, &mut value, false, "pair").unwrap();
        assert_eq!(printer.finish().unwrap(), "pair {\n  id: 3\n}\n");
    }
}
