/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Field separator handling.

use crate::error::ConfigError;
use memchr::memmem;
use smallvec::SmallVec;
use std::fmt;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Field separator byte sequence.
///
/// Defaults to SOH; any non-empty byte string is accepted so logs written
/// with `|` or `^A` can be replayed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Separator(SmallVec<[u8; 4]>);

impl Separator {
    /// Creates a separator from raw bytes.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptySeparator` if `bytes` is empty.
    pub fn new(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(Self(SmallVec::from_slice(bytes)))
    }

    /// Parses a configured separator.
    ///
    /// `"SOH"`, `"\x01"` (escaped) and `"^A"` are aliases of the SOH byte.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptySeparator` for an empty string.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        match text {
            "SOH" | "\\x01" | "^A" | "\u{1}" => Ok(Self::soh()),
            other => Self::new(other.as_bytes()),
        }
    }

    /// Returns the SOH separator.
    #[must_use]
    pub fn soh() -> Self {
        Self(SmallVec::from_slice(&[SOH]))
    }

    /// Returns the separator bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the separator length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finds the first occurrence of the separator in `haystack`.
    #[inline]
    #[must_use]
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self.0.as_slice() {
            [byte] => memchr::memchr(*byte, haystack),
            needle => memmem::find(haystack, needle),
        }
    }

    /// Splits `data` into separator-delimited segments.
    ///
    /// A trailing separator does not produce a final empty segment.
    pub fn split<'s, 'a>(&'s self, data: &'a [u8]) -> Segments<'s, 'a> {
        Segments {
            separator: self,
            rest: data,
        }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Self::soh()
    }
}

impl fmt::Debug for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Separator({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Iterator over the segments of a separator-delimited buffer.
#[derive(Debug)]
pub struct Segments<'s, 'a> {
    separator: &'s Separator,
    rest: &'a [u8],
}

impl<'a> Iterator for Segments<'_, 'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match self.separator.find(self.rest) {
            Some(pos) => {
                let segment = &self.rest[..pos];
                self.rest = &self.rest[pos + self.separator.len()..];
                Some(segment)
            }
            None => {
                let segment = self.rest;
                self.rest = &[];
                Some(segment)
            }
        }
    }
}
