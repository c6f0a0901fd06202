//! Constructed-frame stack
//!
//! One frame per open SEQUENCE/SET/explicit wrapper. The encoder uses a frame
//! to backpatch the length once the content size is known; the decoder uses
//! it to bound the content and to verify that exactly the declared number of
//! bytes (or the end-of-contents marker) was consumed.

use super::types::BerLength;
use z3950_core::error::{CodecError, CodecResult};

/// An open constructed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Offset of the first content byte
    pub base_offset: usize,
    /// Offset of the length octets
    pub length_field_offset: usize,
    /// Decode: length read from the wire. Encode: `Indefinite` when the
    /// frame ends with an end-of-contents marker, otherwise unused
    pub declared_length: BerLength,
    /// Encode: octets reserved for the length field
    pub reserved_width: u8,
    /// Element name, for the error breadcrumb
    pub name: String,
}

impl Frame {
    pub fn is_indefinite(&self) -> bool {
        self.declared_length.is_indefinite()
    }

    /// Decode: offset one past the last content byte of a definite frame
    pub fn content_end(&self) -> Option<usize> {
        self.declared_length
            .definite()
            .map(|length| self.base_offset + length)
    }
}

/// Bounded stack of open frames
///
/// The bound turns maliciously deep nesting into a `ProtocolViolation`
/// instead of unbounded growth.
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl FrameStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame
    ///
    /// # Errors
    /// Returns `ProtocolViolation` if the stack is already `max_depth` deep.
    pub fn push(&mut self, frame: Frame) -> CodecResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(CodecError::ProtocolViolation(format!(
                "constructed nesting exceeds {} levels",
                self.max_depth
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the innermost frame
    ///
    /// # Errors
    /// Returns `ProtocolViolation` if no frame is open (an `end` without a
    /// matching `begin`).
    pub fn pop(&mut self) -> CodecResult<Frame> {
        self.frames.pop().ok_or_else(|| {
            CodecError::ProtocolViolation("end of constructed value without begin".to_string())
        })
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost definite content end, or `None` if every open frame is
    /// indefinite (or none is open)
    pub fn nearest_definite_end(&self) -> Option<usize> {
        self.frames.iter().rev().find_map(Frame::content_end)
    }

    /// Breadcrumb of open frame names followed by `name`
    pub fn path(&self, name: &str) -> String {
        let mut path = String::new();
        for frame in &self.frames {
            if !frame.name.is_empty() {
                path.push_str(&frame.name);
                path.push('.');
            }
        }
        path.push_str(name);
        path
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str, base: usize, length: BerLength) -> Frame {
        Frame {
            base_offset: base,
            length_field_offset: base.saturating_sub(1),
            declared_length: length,
            reserved_width: 1,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_push_pop_order() {
        let mut stack = FrameStack::new(4);
        stack.push(frame("outer", 2, BerLength::Definite(10))).unwrap();
        stack.push(frame("inner", 4, BerLength::Indefinite)).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap().name, "inner");
        assert_eq!(stack.pop().unwrap().name, "outer");
        assert!(stack.pop().is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = FrameStack::new(2);
        stack.push(frame("a", 0, BerLength::Indefinite)).unwrap();
        stack.push(frame("b", 0, BerLength::Indefinite)).unwrap();
        let err = stack.push(frame("c", 0, BerLength::Indefinite)).unwrap_err();
        assert!(matches!(err, CodecError::ProtocolViolation(_)));
    }

    #[test]
    fn test_nearest_definite_end() {
        let mut stack = FrameStack::new(8);
        assert_eq!(stack.nearest_definite_end(), None);
        stack.push(frame("a", 2, BerLength::Definite(20))).unwrap();
        stack.push(frame("b", 4, BerLength::Indefinite)).unwrap();
        assert_eq!(stack.nearest_definite_end(), Some(22));
        stack.push(frame("c", 6, BerLength::Definite(3))).unwrap();
        assert_eq!(stack.nearest_definite_end(), Some(9));
    }

    #[test]
    fn test_path() {
        let mut stack = FrameStack::new(8);
        stack.push(frame("close", 2, BerLength::Indefinite)).unwrap();
        stack.push(frame("", 4, BerLength::Indefinite)).unwrap();
        assert_eq!(stack.path("closeReason"), "close.closeReason");
    }
}
