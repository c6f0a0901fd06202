//! Core types and utilities for the Z39.50 toolkit
//!
//! This crate provides the error taxonomy, codec configuration, the
//! character-set conversion hook and the value types used throughout the
//! BER codec engine.

pub mod charset;
pub mod config;
pub mod datatypes;
pub mod error;

pub use charset::{CharsetConverter, Latin1Converter};
pub use config::CodecConfig;
pub use datatypes::{BitString, Enumerated, GeneralString, GeneralizedTime, Oid, VisibleString};
pub use error::{CodecError, CodecFailure, CodecResult, ErrorKind};
