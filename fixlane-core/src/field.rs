/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Field types for FIX protocol messages.
//!
//! This module provides:
//! - [`FieldTag`]: Type-safe wrapper for FIX field tag numbers
//! - [`RawField`]: Zero-copy `(tag, value)` pair produced by the tokenizer
//! - [`FieldValue`]: Typed value held by a message tree leaf

use crate::error::CoercionError;
use crate::types::{SeqNum, Timestamp};
use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FIX field tag number.
///
/// Tags are positive integers that identify fields within a FIX message.
/// Standard tags occupy the 1-5000 range,
/// while user-defined tags use the 5001+ range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct FieldTag(u32);

impl FieldTag {
    /// Creates a new field tag.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Returns the raw tag number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns true if this is a user-defined tag (5001+).
    #[inline]
    #[must_use]
    pub const fn is_user_defined(self) -> bool {
        self.0 > 5000
    }
}

impl From<u32> for FieldTag {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}

impl From<FieldTag> for u32 {
    fn from(tag: FieldTag) -> Self {
        tag.0
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-copy `(tag, value)` pair cut out of a framed message.
///
/// Order of raw fields within a message is significant and is preserved by
/// every stage that consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField<'a> {
    /// The field tag number, `0` when the field name could not be resolved.
    pub tag: u32,
    /// Reference to the field value bytes (without delimiters).
    pub value: &'a [u8],
    /// Field name as written on the wire when it did not resolve to a tag.
    pub label: Option<&'a str>,
}

impl<'a> RawField<'a> {
    /// Creates a new field reference.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32, value: &'a [u8]) -> Self {
        Self {
            tag,
            value,
            label: None,
        }
    }

    /// Creates a field whose textual key did not resolve to a tag.
    #[inline]
    #[must_use]
    pub const fn unresolved(label: &'a str, value: &'a [u8]) -> Self {
        Self {
            tag: 0,
            value,
            label: Some(label),
        }
    }

    /// Returns true if the field name could not be resolved to a tag.
    #[inline]
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.label.is_some()
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `CoercionError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str, CoercionError> {
        std::str::from_utf8(self.value).map_err(|_| CoercionError::InvalidUtf8 { tag: self.tag })
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `CoercionError::InvalidValue` if parsing fails.
    pub fn parse<T: FromStr>(&self, expected: &'static str) -> Result<T, CoercionError> {
        let s = self.as_str()?;
        s.parse().map_err(|_| CoercionError::InvalidValue {
            tag: self.tag,
            value: s.to_string(),
            expected,
        })
    }

    /// Returns the value with invalid UTF-8 replaced, for diagnostics.
    #[must_use]
    pub fn lossy(&self) -> String {
        String::from_utf8_lossy(self.value).into_owned()
    }
}

/// Typed value of a message tree leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// String value.
    String(String),
    /// Integer value (also lengths, counters and sequence numbers).
    Int(i64),
    /// Decimal value (prices, quantities, amounts).
    Decimal(Decimal),
    /// Boolean value (Y/N).
    Bool(bool),
    /// Single character value.
    Char(char),
    /// Raw bytes (for data fields).
    Data(Bytes),
    /// Space-separated multi-value string.
    MultiValue(Vec<String>),
    /// Date only (`YYYYMMDD`).
    Date(NaiveDate),
    /// Time only (`HH:MM:SS[.fff]`).
    Time(NaiveTime),
    /// UTC timestamp.
    Timestamp(Timestamp),
}

impl FieldValue {
    /// Returns the value as a string, if it is a String variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a Bool variant.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a char, if it is a Char variant.
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a timestamp, if it is a Timestamp variant.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<char> for FieldValue {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<SeqNum> for FieldValue {
    fn from(value: SeqNum) -> Self {
        Self::Int(i64::try_from(value.value()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", if *v { "Y" } else { "N" }),
            Self::Char(c) => write!(f, "{}", c),
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
            Self::MultiValue(values) => write!(f, "{}", values.join(" ")),
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.3f")),
            Self::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_tag() {
        let tag = FieldTag::new(35);
        assert_eq!(tag.value(), 35);
        assert!(!tag.is_user_defined());
        assert!(FieldTag::new(5001).is_user_defined());
    }

    #[test]
    fn test_raw_field_as_str() {
        let field = RawField::new(11, b"ORDER123");
        assert_eq!(field.as_str().unwrap(), "ORDER123");
        assert!(!field.is_unknown());
    }

    #[test]
    fn test_raw_field_parse_failure_names_tag() {
        let field = RawField::new(34, b"12x");
        let err = field.parse::<i64>("integer").unwrap_err();
        assert_eq!(
            err,
            CoercionError::InvalidValue {
                tag: 34,
                value: "12x".to_string(),
                expected: "integer",
            }
        );
    }

    #[test]
    fn test_raw_field_unresolved() {
        let field = RawField::unresolved("Bogus", b"1");
        assert!(field.is_unknown());
        assert_eq!(field.tag, 0);
        assert_eq!(field.label, Some("Bogus"));
    }

    #[test]
    fn test_raw_field_invalid_utf8() {
        let field = RawField::new(1, &[0xFF, 0xFE]);
        assert_eq!(field.as_str(), Err(CoercionError::InvalidUtf8 { tag: 1 }));
        assert_eq!(field.lossy(), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::String("test".to_string()).to_string(), "test");
        assert_eq!(FieldValue::Int(42).to_string(), "42");
        assert_eq!(FieldValue::Bool(true).to_string(), "Y");
        assert_eq!(
            FieldValue::MultiValue(vec!["A".to_string(), "B".to_string()]).to_string(),
            "A B"
        );
    }
}
