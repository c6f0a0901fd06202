//! BER (Basic Encoding Rules) engine for the Z39.50 abstract syntax
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number**: 0-30 in the leading octet, larger numbers in base-128
//!   continuation octets (Z39.50 uses context tags up to 5000+, e.g. `[211]`
//!   for closeReason)
//!
//! ## Length Encoding
//!
//! - **Short form**: one octet for lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian octets
//! - **Indefinite form**: `0x80`, content terminated by `00 00`
//!
//! # One Schema, Three Directions
//!
//! Schema-shaped code is written once against the [`Coder`] trait and run
//! with a [`BerEncoder`], a [`BerDecoder`] or a [`BerPrinter`]. The
//! combinators ([`sequence`], [`implicit`], [`explicit`], [`sequence_of`],
//! [`choice`], ...) are generic over the coder.
//!
//! # Implementation Notes
//!
//! 1. **Error latching**: the first failure is recorded in the coder with
//!    its element path; every later call returns it without side effects.
//! 2. **Decode output**: decoded values borrow the input or the [`Arena`],
//!    never the heap.
//! 3. **Bounded nesting**: frame stacks and the scanners are limited by
//!    `max_depth`, so hostile nesting ends in a `ProtocolViolation`.

pub mod arena;
pub mod buffer;
pub mod choice;
pub mod coder;
pub mod combinators;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod primitive;
pub mod printer;
pub mod scan;
pub mod state;
pub mod types;

pub use arena::Arena;
pub use buffer::{OutputBuffer, SeekFrom};
pub use choice::{choice, member, validate_arms, Arm, Choice, TagMode};
pub use coder::{Coder, Direction};
pub use combinators::{
    constructed, explicit, implicit, required, sequence, sequence_of, set, set_of,
};
pub use decoder::BerDecoder;
pub use encoder::BerEncoder;
pub use frame::{Frame, FrameStack};
pub use primitive::Primitive;
pub use printer::BerPrinter;
pub use scan::{complete_pdu, dump_ber, tlv_extent};
pub use state::{CoderState, SharedConverter};
pub use types::{universal, BerLength, BerTag, BerTagClass};
