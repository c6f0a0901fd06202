//! ASN.1/BER processing module for the Z39.50 protocol
//!
//! This crate provides the codec engine the Z39.50 PDU layer is written
//! against: tag and length codecs, the constructed-frame stack, primitive
//! value codecs, sequence/tagging/choice combinators, and schema-less
//! scanning for front-ends and dump tools.
//!
//! # Implementation Status
//!
//! ## BER
//! - [x] Tag codec (all classes, high tag numbers)
//! - [x] Length codec (short, long, indefinite; backpatch widths)
//! - [x] Encoder / decoder / printer behind one `Coder` trait
//! - [x] INTEGER, BOOLEAN, NULL, OID, OCTET STRING, BIT STRING, ENUMERATED
//! - [x] VisibleString, GeneralString (charset hook), GeneralizedTime
//! - [x] Segmented (constructed) string decoding
//! - [x] SEQUENCE, SET, SEQUENCE OF, SET OF, IMPLICIT, EXPLICIT, CHOICE
//! - [x] ANY / open types as raw TLVs
//! - [x] PDU framing (`complete_pdu`) and schema-less dump

pub mod ber;

pub use ber::{
    choice, complete_pdu, dump_ber, explicit, implicit, required, sequence, sequence_of, set,
    set_of, Arena, Arm, BerDecoder, BerEncoder, BerLength, BerPrinter, BerTag, BerTagClass,
    Choice, Coder, Direction, Primitive, TagMode,
};
pub use z3950_core::{CodecConfig, CodecError, CodecFailure, CodecResult, ErrorKind};
