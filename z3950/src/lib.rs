//! z3950 - Rust toolkit for the Z39.50 information retrieval protocol
//!
//! This crate is the entry point for PDU definitions, front-end servers and
//! dump utilities built on the BER codec.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `z3950-core`: error taxonomy, configuration, charset hook, value types
//! - `z3950-asn1`: BER codec engine (encoder, decoder, printer, combinators)
//!
//! # Usage
//!
//! ```no_run
//! use z3950::ber::{Arena, BerDecoder, BerEncoder, Coder};
//!
//! let mut encoder = BerEncoder::new();
//! encoder.integer(&mut Some(42), false, "value").ok();
//! let bytes = encoder.finish().expect("encode");
//!
//! let arena = Arena::new();
//! let mut decoder = BerDecoder::new(&arena, &bytes);
//! let mut value = None;
//! decoder.integer(&mut value, false, "value").ok();
//! assert_eq!(value, Some(42));
//! ```

// Re-export core types
pub use z3950_core::datatypes::*;
pub use z3950_core::{
    CharsetConverter, CodecConfig, CodecError, CodecFailure, CodecResult, ErrorKind,
    Latin1Converter,
};

// Re-export the codec engine
pub mod ber {
    pub use z3950_asn1::ber::*;
}

pub use z3950_asn1::ber::{
    choice, complete_pdu, dump_ber, explicit, implicit, required, sequence, sequence_of, set,
    set_of, Arena, Arm, BerDecoder, BerEncoder, BerPrinter, BerTagClass, Choice, Coder,
    Direction, Primitive, TagMode,
};
