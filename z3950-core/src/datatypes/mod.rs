//! Value types exchanged with the BER codec

pub mod bit_string;
pub mod oid;
pub mod strings;

// Re-export types
pub use bit_string::BitString;
pub use oid::{Oid, parse_dotted};
pub use strings::{Enumerated, GeneralString, GeneralizedTime, VisibleString};
