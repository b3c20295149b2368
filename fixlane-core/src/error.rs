/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Error types for the fixlane codec.
//!
//! Faults are split by the stage that raises them so callers can decide what
//! to do with each class:
//! - [`FramingError`]: stream-level faults raised by the frame scanner
//! - [`TokenizeError`]: malformed `tag=value` segments inside one frame
//! - [`SchemaError`]: structural violations against the dictionary
//! - [`CoercionError`]: a value that does not match its declared type
//! - [`ExtractionError`]: sequence diagnostics that could not be parsed
//!
//! None of these are fatal to the process; they are plain values returned to
//! the session boundary.

use std::fmt;
use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixlane operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Stream framing fault.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Sequence diagnostic extraction failure.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stream-level framing faults raised by the frame scanner.
///
/// A framing fault is always fatal to the message being framed and never to
/// the stream: the scanner resumes at the next BeginString marker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Bytes that are not a BeginString marker precede the next message.
    #[error("garbage before begin string: {skipped} bytes skipped")]
    GarbageBeforeBeginString {
        /// Number of bytes skipped.
        skipped: usize,
    },

    /// A new message starts before the current one carried its checksum.
    #[error("checksum field missing before next message start")]
    MissingChecksum,

    /// BodyLength (tag 9) is not the second field.
    #[error("length field missing or not second")]
    LengthFieldMisplaced,

    /// BodyLength value is not a non-negative integer.
    #[error("invalid body length value: {0}")]
    InvalidBodyLength(String),

    /// Declared BodyLength does not match the measured body.
    #[error("body length mismatch: declared {declared}, measured {measured}")]
    BodyLengthMismatch {
        /// Value carried in tag 9.
        declared: usize,
        /// Byte count between the length field and the checksum field.
        measured: usize,
    },

    /// CheckSum value is not three decimal digits.
    #[error("invalid checksum format: {0}")]
    InvalidChecksum(String),

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// Candidate frame grew past the configured maximum without a checksum.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Bytes scanned so far.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

/// Faults raised while splitting a frame into `tag=value` pairs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// Segment has no `=` between tag and value.
    #[error("missing tag-value separator in field {position}")]
    MissingTagValueSeparator {
        /// Zero-based index of the segment.
        position: usize,
    },

    /// Two consecutive separators, or a dangling trailing separator.
    #[error("empty tag-value pair at field {position}")]
    EmptyPair {
        /// Zero-based index of the segment.
        position: usize,
    },

    /// Tag is not a positive integer.
    #[error("invalid tag '{tag}' at field {position}")]
    InvalidTag {
        /// Zero-based index of the segment.
        position: usize,
        /// The offending tag text.
        tag: String,
    },
}

/// Structural violations of a message against its dictionary schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// MsgType (tag 35) is absent.
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// MsgType is not defined in the dictionary.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// Field is not defined for this message.
    #[error("tag {tag} not defined for message type {msg_type}")]
    TagNotDefined {
        /// The unexpected tag.
        tag: u32,
        /// The message type being decoded.
        msg_type: String,
    },

    /// A required field or group is absent.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Value is outside the field's enumeration.
    #[error("value '{value}' is not allowed for tag {tag}")]
    InvalidEnumValue {
        /// The tag number of the field.
        tag: u32,
        /// The rejected wire value.
        value: String,
    },

    /// Group counter disagrees with the number of instances.
    #[error("group count mismatch for tag {count_tag}: declared {declared}, actual {actual}")]
    GroupCountMismatch {
        /// The NumInGroup tag.
        count_tag: u32,
        /// Count carried by the counter field.
        declared: usize,
        /// Number of instances present.
        actual: usize,
    },
}

/// Classification of a [`SchemaError`] for validation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// MsgType absent.
    MissingMsgType,
    /// MsgType not in the dictionary.
    UnknownMessageType,
    /// Field not defined for the message.
    TagNotDefined,
    /// Required field or group absent.
    MissingRequired,
    /// Enumeration violation.
    InvalidEnumValue,
    /// Group counter mismatch.
    GroupCountMismatch,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingMsgType => "missing-msg-type",
            Self::UnknownMessageType => "unknown-message-type",
            Self::TagNotDefined => "tag-not-defined",
            Self::MissingRequired => "missing-required",
            Self::InvalidEnumValue => "invalid-enum-value",
            Self::GroupCountMismatch => "group-count-mismatch",
        };
        f.write_str(name)
    }
}

impl SchemaError {
    /// Returns the tag the violation refers to, if any.
    #[must_use]
    pub const fn tag(&self) -> Option<u32> {
        match self {
            Self::MissingMsgType | Self::UnknownMessageType(_) => Some(35),
            Self::TagNotDefined { tag, .. }
            | Self::MissingRequiredField { tag }
            | Self::InvalidEnumValue { tag, .. } => Some(*tag),
            Self::GroupCountMismatch { count_tag, .. } => Some(*count_tag),
        }
    }

    /// Returns the violation kind.
    #[must_use]
    pub const fn kind(&self) -> ValidationKind {
        match self {
            Self::MissingMsgType => ValidationKind::MissingMsgType,
            Self::UnknownMessageType(_) => ValidationKind::UnknownMessageType,
            Self::TagNotDefined { .. } => ValidationKind::TagNotDefined,
            Self::MissingRequiredField { .. } => ValidationKind::MissingRequired,
            Self::InvalidEnumValue { .. } => ValidationKind::InvalidEnumValue,
            Self::GroupCountMismatch { .. } => ValidationKind::GroupCountMismatch,
        }
    }
}

/// A wire value that does not match its declared primitive type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    /// Value could not be parsed as the declared type.
    #[error("cannot coerce '{value}' for tag {tag} to {expected}")]
    InvalidValue {
        /// The tag number of the field.
        tag: u32,
        /// The raw value (lossy UTF-8).
        value: String,
        /// Name of the expected primitive type.
        expected: &'static str,
    },

    /// Value is not valid UTF-8 for a text type.
    #[error("invalid utf-8 in field {tag}")]
    InvalidUtf8 {
        /// The tag number of the field.
        tag: u32,
    },
}

impl CoercionError {
    /// Returns the offending tag.
    #[must_use]
    pub const fn tag(&self) -> u32 {
        match self {
            Self::InvalidValue { tag, .. } | Self::InvalidUtf8 { tag } => *tag,
        }
    }
}

/// Errors that abort the decode of a single framed message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame could not be split into fields.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// Message violates its schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Field value does not match its type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Message rejected by the configured pre-decode filter.
    #[error("message rejected by filter term '{term}'")]
    Filtered {
        /// The filter term that did not match.
        term: String,
    },

    /// Embedded document payload is malformed.
    #[error("invalid embedded document in tag {tag}: {reason}")]
    SubDocument {
        /// The tag carrying the payload.
        tag: u32,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Errors that occur during message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field needed to frame the message is absent.
    #[error("missing required field: tag {tag}")]
    MissingField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// MsgType is not defined in the dictionary.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// Value cannot be rendered for this field.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Non-fatal failures while recovering sequence numbers from diagnostic text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The message carries no diagnostic text.
    #[error("no diagnostic text to inspect")]
    NoText,

    /// Neither the configured pattern nor a known phrasing matched.
    #[error("no sequence number found in '{text}'")]
    NoMatch {
        /// The inspected text.
        text: String,
    },

    /// A matched number did not parse or adjust to a valid sequence number.
    #[error("invalid sequence number '{value}'")]
    InvalidNumber {
        /// The captured text.
        value: String,
    },

    /// A configured pattern is not a valid regular expression.
    #[error("invalid sequence pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The configured pattern.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },
}
