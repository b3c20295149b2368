/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! # fixlane Tag-Value
//!
//! FIX tag=value framing, decoding, validation and encoding.
//!
//! The pipeline for inbound bytes is:
//!
//! 1. [`FrameScanner`] carves one complete message out of a byte buffer
//! 2. [`MessageFilter`] optionally rejects it on raw `tag=value` patterns
//! 3. [`Tokenizer`] splits it into ordered [`RawField`](fixlane_core::RawField)s
//! 4. [`StructuralDecoder`] builds a typed tree (or a raw form) from them
//! 5. [`Validator`] checks required fields, enumerations and group counts
//!
//! [`StructuralEncoder`] goes the other way. Every stage is stateless apart
//! from the cursor the caller passes to the scanner.
//!
//! ## Features
//!
//! - **Zero-copy tokenizing**: raw field values reference the frame buffer
//! - **Configurable separator**: SOH by default, any byte string otherwise
//! - **Fast delimiter search**: `memchr` for single bytes, `memmem` otherwise

pub mod checksum;
pub mod coerce;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod scanner;
pub mod separator;
pub mod subdoc;
pub mod tokenizer;
pub mod validator;

pub use checksum::calculate_checksum;
pub use config::CodecConfig;
pub use decoder::{DecodedContent, DecodedMessage, RawEntry, RawForm, StructuralDecoder};
pub use encoder::{Encoder, StructuralEncoder};
pub use error::{ConfigError, DecodeFailure, FramingFault};
pub use filter::MessageFilter;
pub use scanner::FrameScanner;
pub use separator::{SOH, Separator};
pub use tokenizer::{RawFields, Tokenizer};
pub use validator::Validator;
