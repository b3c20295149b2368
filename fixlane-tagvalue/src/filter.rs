/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Pre-decode message filter.
//!
//! A filter expression is a list of terms separated by `;` or `,`:
//! - `35:D` the field must be present with this value
//! - `35:D|8` any of the alternatives
//! - `58:*` the field must be present
//!
//! All terms must match. Matching is a substring search on the raw frame,
//! so it runs before tokenization.

use crate::error::ConfigError;
use crate::separator::Separator;
use crate::tokenizer::parse_tag;
use fixlane_core::DecodeError;
use memchr::memmem;

#[derive(Debug, Clone)]
struct Term {
    text: String,
    /// `tag=value` needles, or just `tag=` for a presence term.
    needles: Vec<Vec<u8>>,
    presence: bool,
}

/// Compiled filter expression.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    separator: Separator,
    terms: Vec<Term>,
}

impl MessageFilter {
    /// Compiles a filter expression.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidFilter` for a malformed term.
    pub fn parse(expression: &str, separator: Separator) -> Result<Self, ConfigError> {
        let mut terms = Vec::new();
        for text in expression.split([';', ',']).map(str::trim) {
            if text.is_empty() {
                continue;
            }
            let invalid = |reason| ConfigError::InvalidFilter {
                term: text.to_string(),
                reason,
            };
            let (tag, values) = text.split_once(':').ok_or_else(|| invalid("expected tag:value"))?;
            let tag = tag.trim();
            parse_tag(tag.as_bytes()).ok_or_else(|| invalid("tag must be a positive integer"))?;

            let values = values.trim();
            let presence = values == "*";
            let needles = if presence {
                vec![format!("{tag}=").into_bytes()]
            } else {
                values
                    .split('|')
                    .map(|value| {
                        if value.is_empty() {
                            Err(invalid("empty value"))
                        } else {
                            Ok(format!("{tag}={value}").into_bytes())
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };
            terms.push(Term {
                text: text.to_string(),
                needles,
                presence,
            });
        }
        Ok(Self { separator, terms })
    }

    /// Returns true if the expression has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Checks a raw frame against every term.
    ///
    /// # Errors
    /// Returns `DecodeError::Filtered` naming the first term that fails.
    pub fn check(&self, frame: &[u8]) -> Result<(), DecodeError> {
        match self.terms.iter().find(|term| !self.term_matches(term, frame)) {
            Some(term) => Err(DecodeError::Filtered {
                term: term.text.clone(),
            }),
            None => Ok(()),
        }
    }

    fn term_matches(&self, term: &Term, frame: &[u8]) -> bool {
        term.needles.iter().any(|needle| {
            let mut pattern = Vec::with_capacity(needle.len() + 2 * self.separator.len());
            pattern.extend_from_slice(self.separator.as_bytes());
            pattern.extend_from_slice(needle);
            if !term.presence {
                pattern.extend_from_slice(self.separator.as_bytes());
            }
            let at_start = frame.starts_with(&pattern[self.separator.len()..]);
            at_start || memmem::find(frame, &pattern).is_some()
        })
    }
}
