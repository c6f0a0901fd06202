//! Decode arena
//!
//! Every slice a decode pass produces that does not borrow the input
//! directly (OID arcs, reassembled segmented strings, transcoded text,
//! SEQUENCE OF element lists) is bump-allocated here. There is no per-object
//! free: the whole arena is reset at once when the pass's results are gone,
//! and the borrow checker refuses the reset while any of them is alive.

use bumpalo::Bump;

/// Bump allocator scoped to decode passes
///
/// # Usage
///
/// ```rust,no_run
/// use z3950_asn1::ber::{Arena, BerDecoder};
///
/// let mut arena = Arena::new();
/// for message in [&b"\x02\x01\x05"[..], &b"\x02\x01\x06"[..]] {
///     let decoder = BerDecoder::new(&arena, message);
///     // ... decode, use the values ...
///     drop(decoder);
///     arena.reset();
/// }
/// ```
///
/// Values stored in the arena never have their destructors run, so decoded
/// types hold borrowed slices rather than owned collections.
#[derive(Debug, Default)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create an arena with a pre-allocated first chunk
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// The underlying allocator, for arena-backed collections
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Move a value into the arena
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    /// Copy a slice into the arena
    pub fn alloc_slice<T: Copy>(&self, items: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(items)
    }

    /// Copy a string into the arena
    pub fn alloc_str(&self, text: &str) -> &str {
        self.bump.alloc_str(text)
    }

    /// Total bytes handed out since the last reset
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Release everything allocated so far
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_reset() {
        let mut arena = Arena::new();
        {
            let arcs = arena.alloc_slice(&[1u32, 2, 840]);
            let text = arena.alloc_str("hello");
            assert_eq!(arcs, &[1, 2, 840]);
            assert_eq!(text, "hello");
        }
        assert!(arena.allocated_bytes() > 0);
        arena.reset();
        let again = arena.alloc_slice(&[7u8]);
        assert_eq!(again, &[7]);
    }
}
