/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Codec configuration.
//!
//! [`CodecConfig`] is a plain value: build it with `with_*` methods or
//! deserialize it from any serde format. Unset keys take their defaults.

use crate::error::ConfigError;
use crate::separator::Separator;
use fixlane_core::TimePrecision;
use serde::{Deserialize, Serialize};

/// Default maximum frame size (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Configuration shared by the scanner, decoder and encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject body fields the message schema does not define.
    pub verify_tags: bool,
    /// Keep undefined fields as unknown leaves when `verify_tags` is off.
    pub allow_unknown_fields: bool,
    /// Run structural validation as part of decode.
    pub verify_fields: bool,
    /// Emit milliseconds in timestamps without an explicit precision.
    pub include_milliseconds: bool,
    /// Emit microseconds in timestamps without an explicit precision.
    pub include_microseconds: bool,
    /// Strip trailing fractional zeros from decimals.
    pub remove_trailing_zeros: bool,
    /// Field separator; `"SOH"`, `"\x01"` and `"^A"` mean 0x01.
    pub field_separator: String,
    /// Pre-decode `tag:value` allow-list.
    pub filter_expression: Option<String>,
    /// Decode against the dictionary; false selects raw mode.
    pub decode_by_dictionary: bool,
    /// Field keys are dictionary names instead of tag numbers.
    pub field_name_mode: bool,
    /// Collapse empty segments before tokenizing.
    pub normalize_empty_fields: bool,
    /// Compare the declared CheckSum against the computed one.
    pub validate_checksum: bool,
    /// Largest frame accepted by the scanner.
    pub max_message_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            verify_tags: true,
            allow_unknown_fields: true,
            verify_fields: true,
            include_milliseconds: true,
            include_microseconds: false,
            remove_trailing_zeros: false,
            field_separator: "\u{1}".to_string(),
            filter_expression: None,
            decode_by_dictionary: true,
            field_name_mode: false,
            normalize_empty_fields: false,
            validate_checksum: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl CodecConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether undefined body fields are rejected.
    #[must_use]
    pub const fn with_verify_tags(mut self, verify: bool) -> Self {
        self.verify_tags = verify;
        self
    }

    /// Sets whether undefined fields are kept when not rejected.
    #[must_use]
    pub const fn with_allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    /// Sets whether decode runs structural validation.
    #[must_use]
    pub const fn with_verify_fields(mut self, verify: bool) -> Self {
        self.verify_fields = verify;
        self
    }

    /// Sets millisecond timestamp output.
    #[must_use]
    pub const fn with_milliseconds(mut self, include: bool) -> Self {
        self.include_milliseconds = include;
        self
    }

    /// Sets microsecond timestamp output.
    #[must_use]
    pub const fn with_microseconds(mut self, include: bool) -> Self {
        self.include_microseconds = include;
        self
    }

    /// Sets decimal trailing-zero normalization.
    #[must_use]
    pub const fn with_remove_trailing_zeros(mut self, remove: bool) -> Self {
        self.remove_trailing_zeros = remove;
        self
    }

    /// Sets the field separator.
    #[must_use]
    pub fn with_field_separator(mut self, separator: impl Into<String>) -> Self {
        self.field_separator = separator.into();
        self
    }

    /// Sets the pre-decode filter expression.
    #[must_use]
    pub fn with_filter_expression(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    /// Selects dictionary or raw decoding.
    #[must_use]
    pub const fn with_decode_by_dictionary(mut self, by_dictionary: bool) -> Self {
        self.decode_by_dictionary = by_dictionary;
        self
    }

    /// Sets field-name tokenization.
    #[must_use]
    pub const fn with_field_name_mode(mut self, enabled: bool) -> Self {
        self.field_name_mode = enabled;
        self
    }

    /// Sets empty segment normalization.
    #[must_use]
    pub const fn with_normalize_empty_fields(mut self, normalize: bool) -> Self {
        self.normalize_empty_fields = normalize;
        self
    }

    /// Sets checksum validation.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Parses the configured separator.
    ///
    /// # Errors
    /// Returns `ConfigError::EmptySeparator` for an empty separator.
    pub fn separator(&self) -> Result<Separator, ConfigError> {
        Separator::parse(&self.field_separator)
    }

    /// Returns the timestamp precision used when a field has none.
    #[must_use]
    pub const fn default_precision(&self) -> TimePrecision {
        if self.include_microseconds {
            TimePrecision::Micros
        } else if self.include_milliseconds {
            TimePrecision::Millis
        } else {
            TimePrecision::Seconds
        }
    }
}
