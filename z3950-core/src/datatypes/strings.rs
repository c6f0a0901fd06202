//! Restricted character string and enumerated value types
//!
//! Each newtype selects a distinct universal tag in the codec while sharing
//! the `&str` representation.

use std::fmt;

/// VisibleString (universal 26)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisibleString<'a>(pub &'a str);

/// GeneralString (universal 27), used by Z39.50 as InternationalString
///
/// Transcoded through the coder's charset converter when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GeneralString<'a>(pub &'a str);

/// GeneralizedTime (universal 24), kept as its textual form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GeneralizedTime<'a>(pub &'a str);

/// ENUMERATED (universal 10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Enumerated(pub i64);

macro_rules! text_accessors {
    ($($name:ident),*) => {
        $(
            impl<'a> $name<'a> {
                pub fn as_str(&self) -> &'a str {
                    self.0
                }
            }

            impl fmt::Display for $name<'_> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{:?}", self.0)
                }
            }

            impl<'a> From<&'a str> for $name<'a> {
                fn from(text: &'a str) -> Self {
                    Self(text)
                }
            }
        )*
    };
}

text_accessors!(VisibleString, GeneralString, GeneralizedTime);

impl Enumerated {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Enumerated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
