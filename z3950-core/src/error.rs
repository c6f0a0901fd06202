use std::fmt;
use thiserror::Error;

/// Error taxonomy of the BER codec
///
/// The kind tells a caller what to do with a failed message:
/// - `Truncated`: more bytes may still arrive, keep reading
/// - `ProtocolViolation`, `RequiredFieldMissing`: the peer sent garbage, reject
/// - `BufferExhausted`, `Overflow`, `InvalidValue`: the local side asked for
///   something the encoder cannot produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Truncated,
    ProtocolViolation,
    RequiredFieldMissing,
    BufferExhausted,
    Overflow,
    InvalidValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Truncated => "truncated",
            ErrorKind::ProtocolViolation => "protocol violation",
            ErrorKind::RequiredFieldMissing => "required field missing",
            ErrorKind::BufferExhausted => "buffer exhausted",
            ErrorKind::Overflow => "length overflow",
            ErrorKind::InvalidValue => "invalid value",
        };
        f.write_str(name)
    }
}

/// Main error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not enough bytes to complete a tag, length or value (decode only)
    #[error("Truncated input: {0}")]
    Truncated(String),

    /// Malformed tag, reserved length form, content-length mismatch,
    /// depth or size ceiling exceeded
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A non-optional element was absent
    #[error("Required element missing: {0}")]
    RequiredFieldMissing(String),

    /// The encode buffer could not grow
    #[error("Buffer exhausted: {0}")]
    BufferExhausted(String),

    /// A backpatched length does not fit its reserved width
    #[error("Length overflow: {0}")]
    Overflow(String),

    /// A value that cannot be represented on the wire
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl CodecError {
    /// Get the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Truncated(_) => ErrorKind::Truncated,
            CodecError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            CodecError::RequiredFieldMissing(_) => ErrorKind::RequiredFieldMissing,
            CodecError::BufferExhausted(_) => ErrorKind::BufferExhausted,
            CodecError::Overflow(_) => ErrorKind::Overflow,
            CodecError::InvalidValue(_) => ErrorKind::InvalidValue,
        }
    }

    /// Whether more input could turn this failure into a success
    pub fn is_incomplete(&self) -> bool {
        self.kind() == ErrorKind::Truncated
    }
}

/// A latched codec failure
///
/// Recorded by a coder the first time any combinator fails. `element_path`
/// is the breadcrumb of open constructed values followed by the name of the
/// element that failed, e.g. `close.diagnosticInformation`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error} (element `{element_path}`, offset {offset})")]
pub struct CodecFailure {
    pub error: CodecError,
    pub element_path: String,
    pub offset: usize,
}

impl CodecFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CodecError::Truncated("x".into()).kind(), ErrorKind::Truncated);
        assert_eq!(CodecError::Overflow("x".into()).kind(), ErrorKind::Overflow);
        assert!(CodecError::Truncated("x".into()).is_incomplete());
        assert!(!CodecError::ProtocolViolation("x".into()).is_incomplete());
    }

    #[test]
    fn test_failure_display() {
        let failure = CodecFailure {
            error: CodecError::RequiredFieldMissing("closeReason".into()),
            element_path: "close.closeReason".into(),
            offset: 7,
        };
        let text = failure.to_string();
        assert!(text.contains("close.closeReason"));
        assert!(text.contains("offset 7"));
        assert_eq!(failure.kind(), ErrorKind::RequiredFieldMissing);
    }
}
