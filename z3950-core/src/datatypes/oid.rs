//! OBJECT IDENTIFIER value type

use crate::error::{CodecError, CodecResult};
use std::fmt;

/// Object identifier: a borrowed sequence of integer arcs
///
/// # Why Borrowed?
/// Decoded arcs live in the decode arena, encoded arcs belong to the caller.
/// Well-known identifiers are plain `&'static [u32]` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Oid<'a>(&'a [u32]);

impl<'a> Oid<'a> {
    /// Wrap a list of arcs
    pub const fn new(arcs: &'a [u32]) -> Self {
        Self(arcs)
    }

    /// Get the arcs
    pub fn arcs(&self) -> &'a [u32] {
        self.0
    }

    /// Number of arcs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that the arcs can be carried by BER
    ///
    /// # Errors
    /// Returns `InvalidValue` if:
    /// - there are fewer than two arcs
    /// - the first arc is greater than 2
    /// - the second arc is 40 or more under a first arc of 0 or 1
    pub fn validate(&self) -> CodecResult<()> {
        if self.0.len() < 2 {
            return Err(CodecError::InvalidValue(
                "Object identifier must have at least 2 components".to_string(),
            ));
        }
        if self.0[0] > 2 {
            return Err(CodecError::InvalidValue(format!(
                "first OID arc must be 0, 1 or 2, got {}",
                self.0[0]
            )));
        }
        if self.0[0] < 2 && self.0[1] >= 40 {
            return Err(CodecError::InvalidValue(format!(
                "second OID arc must be below 40 under arc {}, got {}",
                self.0[0], self.0[1]
            )));
        }
        Ok(())
    }

    /// Check whether this identifier starts with `prefix`
    pub fn starts_with(&self, prefix: &[u32]) -> bool {
        self.0.starts_with(prefix)
    }
}

/// Parse dotted notation (`1.2.840.10003.5.10`) into arcs
pub fn parse_dotted(text: &str) -> CodecResult<Vec<u32>> {
    text.split('.')
        .map(|arc| {
            arc.parse::<u32>().map_err(|_| {
                CodecError::InvalidValue(format!("invalid OID arc {:?} in {:?}", arc, text))
            })
        })
        .collect()
}

impl fmt::Display for Oid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Oid::new(&[1, 2, 840, 10003, 5, 10]).to_string(), "1.2.840.10003.5.10");
    }

    #[test]
    fn test_validate() {
        assert!(Oid::new(&[1]).validate().is_err());
        assert!(Oid::new(&[3, 1]).validate().is_err());
        assert!(Oid::new(&[1, 40]).validate().is_err());
        assert!(Oid::new(&[2, 999, 3]).validate().is_ok());
    }

    #[test]
    fn test_parse_dotted() {
        assert_eq!(parse_dotted("1.2.840.10003").unwrap(), vec![1, 2, 840, 10003]);
        assert!(parse_dotted("1..2").is_err());
        assert!(parse_dotted("1.x").is_err());
    }

    #[test]
    fn test_starts_with() {
        let oid = Oid::new(&[1, 2, 840, 10003, 3, 1]);
        assert!(oid.starts_with(&[1, 2, 840, 10003]));
        assert!(!oid.starts_with(&[1, 3]));
    }
}
