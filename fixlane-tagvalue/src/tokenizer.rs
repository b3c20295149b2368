/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Zero-copy field tokenizer.
//!
//! Splits a framed message into ordered [`RawField`]s that borrow from the
//! frame. Each segment is split on its first `=`; later `=` bytes belong to
//! the value.

use crate::separator::Separator;
use fixlane_core::{RawField, TokenizeError};
use fixlane_dictionary::Dictionary;
use memchr::memchr;
use smallvec::SmallVec;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Fields of one message, inline for typical sizes.
pub type RawFields<'a> = SmallVec<[RawField<'a>; 32]>;

/// Splits frames into raw fields.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    separator: Separator,
    normalize_empty: bool,
}

impl Tokenizer {
    /// Creates a tokenizer for the given separator.
    #[must_use]
    pub const fn new(separator: Separator) -> Self {
        Self {
            separator,
            normalize_empty: false,
        }
    }

    /// Sets whether empty segments are skipped instead of rejected.
    #[must_use]
    pub const fn with_empty_normalization(mut self, normalize: bool) -> Self {
        self.normalize_empty = normalize;
        self
    }

    /// Tokenizes a frame whose keys are tag numbers.
    ///
    /// # Errors
    /// Returns `TokenizeError` for a segment without `=`, an empty segment,
    /// or a key that is not a positive integer.
    pub fn tokenize<'a>(&self, frame: &'a [u8]) -> Result<RawFields<'a>, TokenizeError> {
        self.run(frame, None)
    }

    /// Tokenizes a frame whose keys may be field names.
    ///
    /// Numeric keys are taken as tags; other keys are looked up in the
    /// dictionary and kept as unresolved fields when unknown.
    ///
    /// # Errors
    /// Same as [`Tokenizer::tokenize`], except that non-numeric keys are
    /// accepted.
    pub fn tokenize_names<'a>(
        &self,
        frame: &'a [u8],
        dictionary: &Dictionary,
    ) -> Result<RawFields<'a>, TokenizeError> {
        self.run(frame, Some(dictionary))
    }

    fn run<'a>(
        &self,
        frame: &'a [u8],
        names: Option<&Dictionary>,
    ) -> Result<RawFields<'a>, TokenizeError> {
        let mut fields = RawFields::new();
        for (index, segment) in self.separator.split(frame).enumerate() {
            let position = index + 1;
            if segment.is_empty() {
                if self.normalize_empty {
                    continue;
                }
                return Err(TokenizeError::EmptyPair { position });
            }

            let eq = memchr(EQUALS, segment)
                .ok_or(TokenizeError::MissingTagValueSeparator { position })?;
            let key = &segment[..eq];
            let value = &segment[eq + 1..];

            let field = match (parse_tag(key), names) {
                (Some(tag), _) => RawField::new(tag, value),
                (None, Some(dictionary)) => {
                    let label = std::str::from_utf8(key)
                        .ok()
                        .filter(|label| !label.is_empty())
                        .ok_or_else(|| invalid_tag(position, key))?;
                    match dictionary.tag_for_name(label) {
                        Some(tag) => RawField::new(tag, value),
                        None => RawField::unresolved(label, value),
                    }
                }
                (None, None) => return Err(invalid_tag(position, key)),
            };
            fields.push(field);
        }
        Ok(fields)
    }
}

fn invalid_tag(position: usize, key: &[u8]) -> TokenizeError {
    TokenizeError::InvalidTag {
        position,
        tag: String::from_utf8_lossy(key).into_owned(),
    }
}

/// Parses a positive tag number from ASCII digits.
#[inline]
pub(crate) fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    let tag = bytes.iter().try_fold(0u32, |acc, &b| {
        if b.is_ascii_digit() {
            acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
        } else {
            None
        }
    })?;
    (tag > 0).then_some(tag)
}
