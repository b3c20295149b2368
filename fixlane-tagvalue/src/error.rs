/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Codec-level fault wrappers.
//!
//! The stage errors live in `fixlane-core`; this module adds the context a
//! caller needs to audit a fault: where in the stream it happened and which
//! bytes were given up.

use bytes::Bytes;
use fixlane_core::{DecodeError, FramingError};
use thiserror::Error;

/// A framing fault with its position in the scanned buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("framing fault at offset {offset} ({discarded} bytes discarded): {cause}")]
pub struct FramingFault {
    /// Buffer offset where the rejected bytes start.
    pub offset: usize,
    /// Number of bytes the cursor moved past.
    pub discarded: usize,
    /// What was wrong with the bytes.
    pub cause: FramingError,
}

impl FramingFault {
    /// Returns the discarded bytes of `buffer` for audit.
    #[must_use]
    pub fn discarded_bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        let end = (self.offset + self.discarded).min(buffer.len());
        &buffer[self.offset.min(end)..end]
    }
}

/// A message that was framed but could not be decoded.
///
/// `raw` always holds the exact frame so the caller can store or forward it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("decode failed: {cause}")]
pub struct DecodeFailure {
    /// The complete frame bytes.
    pub raw: Bytes,
    /// Why decoding stopped.
    pub cause: DecodeError,
}

impl DecodeFailure {
    /// Creates a failure for the given frame.
    #[must_use]
    pub fn new(raw: impl Into<Bytes>, cause: impl Into<DecodeError>) -> Self {
        Self {
            raw: raw.into(),
            cause: cause.into(),
        }
    }
}

/// Invalid codec configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The field separator is empty.
    #[error("field separator must not be empty")]
    EmptySeparator,

    /// A filter term could not be parsed.
    #[error("invalid filter term '{term}': {reason}")]
    InvalidFilter {
        /// The offending term.
        term: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlane_core::TokenizeError;

    #[test]
    fn test_discarded_bytes() {
        let fault = FramingFault {
            offset: 2,
            discarded: 3,
            cause: FramingError::GarbageBeforeBeginString { skipped: 3 },
        };
        assert_eq!(fault.discarded_bytes(b"abcdefg"), b"cde");
        assert_eq!(fault.discarded_bytes(b"abc"), b"c");
    }

    #[test]
    fn test_decode_failure_keeps_raw() {
        let failure = DecodeFailure::new(
            Bytes::from_static(b"8=FIX.4.4\x01"),
            TokenizeError::EmptyPair { position: 1 },
        );
        assert_eq!(&failure.raw[..], b"8=FIX.4.4\x01");
        assert_eq!(
            failure.to_string(),
            "decode failed: empty tag-value pair at field 1"
        );
    }
}
