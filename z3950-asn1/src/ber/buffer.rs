//! Growable encode buffer with seek and backpatch support
//!
//! `write`, `putc` and `seek` are the only primitives the encoder uses to
//! touch the output. Writing at a position below the high-water mark
//! overwrites; writing past it extends the logical length.

use bytes::{Bytes, BytesMut};
use std::ops::{Deref, DerefMut};
use z3950_core::error::{CodecError, CodecResult};

/// Seek origin for [`OutputBuffer::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    /// Absolute offset from the start
    Start(usize),
    /// Offset relative to the cursor
    Current(isize),
    /// Offset relative to the high-water mark
    End(isize),
}

/// Output buffer of an encoder
#[derive(Debug)]
pub struct OutputBuffer {
    data: BytesMut,
    cursor: usize,
    limit: usize,
}

impl OutputBuffer {
    /// Create a buffer with an initial capacity and a hard size ceiling
    pub fn new(initial_capacity: usize, limit: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(initial_capacity.min(limit)),
            cursor: 0,
            limit,
        }
    }

    /// Current write offset
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Largest offset written so far, i.e. the logical length
    pub fn high_water_mark(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Encoded bytes up to the high-water mark
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the encoded bytes, leaving the buffer empty
    pub fn take_bytes(&mut self) -> Bytes {
        self.cursor = 0;
        self.data.split().freeze()
    }

    /// Forget the content but keep the allocation
    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    /// Make room for at least `min_extra` more bytes past the cursor
    ///
    /// Capacity doubles, or grows to the requested minimum if that is larger.
    ///
    /// # Errors
    /// Returns `BufferExhausted` if the result would exceed the size ceiling.
    pub fn grow(&mut self, min_extra: usize) -> CodecResult<()> {
        let needed = self.cursor.checked_add(min_extra).ok_or_else(|| {
            CodecError::BufferExhausted("encode buffer size overflow".to_string())
        })?;
        if needed > self.limit {
            return Err(CodecError::BufferExhausted(format!(
                "encoded message would reach {} bytes (limit {})",
                needed, self.limit
            )));
        }
        let capacity = self.data.capacity();
        if needed > capacity {
            let target = needed.max(capacity.saturating_mul(2)).min(self.limit);
            self.data.reserve(target - self.data.len());
        }
        Ok(())
    }

    /// Write bytes at the cursor and advance it
    pub fn write(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.grow(bytes.len())?;
        let end = self.cursor + bytes.len();
        let len = self.data.len();
        if self.cursor >= len {
            self.data.extend_from_slice(bytes);
        } else if end <= len {
            self.data[self.cursor..end].copy_from_slice(bytes);
        } else {
            let split = len - self.cursor;
            self.data[self.cursor..].copy_from_slice(&bytes[..split]);
            self.data.extend_from_slice(&bytes[split..]);
        }
        self.cursor = end;
        Ok(())
    }

    /// Write a single byte at the cursor
    pub fn putc(&mut self, byte: u8) -> CodecResult<()> {
        self.write(&[byte])
    }

    /// Move the cursor
    ///
    /// # Errors
    /// Returns `InvalidValue` if the target lies outside `0..=high_water_mark`.
    pub fn seek(&mut self, from: SeekFrom) -> CodecResult<usize> {
        let base = match from {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            SeekFrom::End(delta) => self.data.len().checked_add_signed(delta),
        };
        match base {
            Some(target) if target <= self.data.len() => {
                self.cursor = target;
                Ok(target)
            }
            _ => Err(CodecError::InvalidValue(format!(
                "seek {:?} outside buffer of {} bytes",
                from,
                self.data.len()
            ))),
        }
    }

    /// Seek to `offset` for the lifetime of the returned guard
    ///
    /// The previous cursor is restored when the guard drops, on every exit
    /// path including early returns and unwinding.
    pub fn rewind_to(&mut self, offset: usize) -> CodecResult<Rewind<'_>> {
        let saved = self.cursor;
        self.seek(SeekFrom::Start(offset))?;
        Ok(Rewind { buffer: self, saved })
    }

    /// Insert `count` zero bytes at `offset`, shifting everything after it
    ///
    /// The cursor moves with the shifted content if it lies at or past `offset`.
    pub fn insert_gap(&mut self, offset: usize, count: usize) -> CodecResult<()> {
        if offset > self.data.len() {
            return Err(CodecError::InvalidValue(format!(
                "gap offset {} outside buffer of {} bytes",
                offset,
                self.data.len()
            )));
        }
        let saved = self.cursor;
        self.cursor = self.data.len();
        self.grow(count)?;
        self.cursor = saved;

        let old_len = self.data.len();
        self.data.resize(old_len + count, 0);
        self.data.copy_within(offset..old_len, offset + count);
        self.data[offset..offset + count].fill(0);
        if self.cursor >= offset {
            self.cursor += count;
        }
        Ok(())
    }
}

/// Cursor guard returned by [`OutputBuffer::rewind_to`]
pub struct Rewind<'b> {
    buffer: &'b mut OutputBuffer,
    saved: usize,
}

impl Deref for Rewind<'_> {
    type Target = OutputBuffer;

    fn deref(&self) -> &OutputBuffer {
        self.buffer
    }
}

impl DerefMut for Rewind<'_> {
    fn deref_mut(&mut self) -> &mut OutputBuffer {
        self.buffer
    }
}

impl Drop for Rewind<'_> {
    fn drop(&mut self) {
        self.buffer.cursor = self.saved;
    }
}
