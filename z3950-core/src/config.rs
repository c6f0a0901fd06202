//! Codec configuration
//!
//! Limits and length-encoding policy shared by all coders. A server usually
//! loads one `CodecConfig` at startup and hands a clone to every connection.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};

/// Default ceiling on nested constructed values
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Default ceiling on a single message, in bytes (16 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Widest length field the encoder can reserve: `0x84` plus four octets
pub const MAX_LENGTH_WIDTH: u8 = 5;

/// Codec configuration
///
/// # Length Width
///
/// `length_width` is the number of octets the encoder reserves for the length
/// of every constructed value before its content is known:
/// - **1** (default): a short-form octet. Content longer than 127 bytes is
///   moved up to make room for the minimal long form once the frame closes.
/// - **2..=5**: an exact long form `0x80 | (w - 1)` followed by `w - 1` octets.
///   Content that does not fit fails with `Overflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum number of simultaneously open constructed values
    pub max_depth: usize,
    /// Maximum size of a decoded input or an encoded output
    pub max_message_size: usize,
    /// Reserved width of constructed length fields
    pub length_width: u8,
    /// Encode constructed values with the indefinite form
    pub indefinite_length: bool,
    /// Initial capacity of the encode buffer
    pub initial_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            length_width: 1,
            indefinite_length: false,
            initial_capacity: 1024,
        }
    }
}

impl CodecConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum message size
    #[must_use]
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Set the reserved length width for constructed values
    #[must_use]
    pub fn with_length_width(mut self, length_width: u8) -> Self {
        self.length_width = length_width;
        self
    }

    /// Encode constructed values with indefinite length
    #[must_use]
    pub fn with_indefinite_length(mut self, indefinite: bool) -> Self {
        self.indefinite_length = indefinite;
        self
    }

    /// Check that every field is in range
    ///
    /// # Errors
    /// Returns `InvalidValue` if:
    /// - `max_depth` is zero
    /// - `max_message_size` is zero
    /// - `length_width` is outside `1..=5`
    pub fn validate(&self) -> CodecResult<()> {
        if self.max_depth == 0 {
            return Err(CodecError::InvalidValue(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(CodecError::InvalidValue(
                "max_message_size must be at least 1".to_string(),
            ));
        }
        if self.length_width == 0 || self.length_width > MAX_LENGTH_WIDTH {
            return Err(CodecError::InvalidValue(format!(
                "length_width must be 1-{}, got {}",
                MAX_LENGTH_WIDTH, self.length_width
            )));
        }
        Ok(())
    }
}
